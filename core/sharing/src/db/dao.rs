mod agreement;
mod events;
mod request;
mod transfer;

pub use agreement::{AgreementDao, AgreementDaoError};
pub use events::EventsDao;
pub use request::{RequestDao, RequestDaoError};
pub use transfer::{TransferDao, TransferDaoError};
