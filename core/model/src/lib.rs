//! Client-facing data model for the MedShare equipment sharing service.
//!
//! Everything here is part of the public REST contract: serde field names are
//! camelCase and timestamps serialize as ISO-8601 UTC strings. Services keep
//! their own database representations and convert at the boundary.

pub mod error;
mod ids;
pub mod sharing;

pub use error::ErrorMessage;
pub use ids::{
    AgreementId, AgreementIdParseError, EquipmentId, EquipmentIdParseError, RequestId,
    RequestIdParseError, TenantId, TenantIdParseError, TransferId, TransferIdParseError,
};
