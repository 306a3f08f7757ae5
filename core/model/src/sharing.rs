//! REST model of the equipment sharing workflow: requests, agreements,
//! transfers and the change-feed events tying them together.

mod agreement;
mod event;
mod request;
mod transfer;

pub use agreement::{Agreement, AgreementState, MaintenanceResponsibility, Party, Reason};
pub use event::{SharingEvent, SharingEventType};
pub use request::{
    Decision, DecisionOutcome, NewRequest, Request, RequestDecision, RequestState, RequestType,
    Urgency,
};
pub use transfer::{Transfer, TransferState, TransferType, TransferUpdate};
