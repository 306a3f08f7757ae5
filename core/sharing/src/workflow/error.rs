use chrono::{DateTime, Utc};
use thiserror::Error;

use medshare_client_model::sharing::Party;
use medshare_client_model::{AgreementId, EquipmentId, RequestId, TenantId, TransferId};

use crate::db::model::{AgreementState, RequestState, TransferState};
use crate::db::DbError;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Request start date {start} must precede end date {end}.")]
    InvalidDateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("Equipment [{0}] not found in the directory.")]
    EquipmentNotFound(EquipmentId),
    #[error("Equipment [{0}] is not owned by tenant [{1}].")]
    NotOwnedBy(EquipmentId, TenantId),
    #[error("Tenant [{0}] can't request custody of its own equipment [{1}].")]
    OwnEquipment(TenantId, EquipmentId),
    #[error("Request [{0}] not found.")]
    NotFound(RequestId),
    #[error("Failed to save Request. Error: {0}.")]
    Save(DbError),
    #[error("Failed to get Request [{0}]. Error: {1}.")]
    Get(RequestId, DbError),
    #[error("Failed to list Requests. Error: {0}.")]
    List(DbError),
}

#[derive(Error, Debug)]
pub enum CancelError {
    #[error("Request [{0}] not found.")]
    NotFound(RequestId),
    #[error("Only the requesting tenant may cancel Request [{0}].")]
    Unauthorized(RequestId, TenantId),
    #[error("Can't cancel Request [{0}] in state {1}.")]
    InvalidState(RequestId, RequestState),
    #[error("Request [{0}] was decided concurrently.")]
    Conflict(RequestId),
    #[error("Failed to cancel Request [{0}]. Error: {1}.")]
    Db(RequestId, DbError),
}

#[derive(Error, Debug)]
pub enum RespondError {
    #[error("Request [{0}] not found.")]
    NotFound(RequestId),
    #[error("Only the owning tenant may decide Request [{0}].")]
    Unauthorized(RequestId, TenantId),
    #[error("Can't decide Request [{0}] in state {1}.")]
    InvalidState(RequestId, RequestState),
    #[error("Request [{0}] was already decided concurrently.")]
    Conflict(RequestId),
    #[error("Failed to respond to Request [{0}]. Error: {1}.")]
    Db(RequestId, DbError),
}

#[derive(Error, Debug)]
pub enum AgreementError {
    #[error("Agreement [{0}] not found.")]
    NotFound(AgreementId),
    #[error("Tenant is not a party of Agreement [{0}].")]
    Unauthorized(AgreementId, TenantId),
    #[error("Agreement [{0}] is already signed by the {1:?} side.")]
    AlreadySigned(AgreementId, Party),
    #[error("Agreement [{id}] is in state {from}, expected {expected}.")]
    InvalidState {
        id: AgreementId,
        from: AgreementState,
        expected: AgreementState,
    },
    #[error("Agreement [{0}] was changed concurrently.")]
    Conflict(AgreementId),
    #[error("Failed to update Agreement [{0}]. Error: {1}.")]
    Db(AgreementId, DbError),
}

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Transfer [{0}] not found.")]
    NotFound(TransferId),
    #[error("Can't move Transfer [{id}] from {from} to {to}.")]
    InvalidTransition {
        id: TransferId,
        from: TransferState,
        to: TransferState,
    },
    #[error("Transfer [{0}] was changed concurrently.")]
    Conflict(TransferId),
    #[error("Failed to update Transfer [{0}]. Error: {1}.")]
    Db(TransferId, DbError),
    #[error("Failed to list Transfers for Request [{0}]. Error: {1}.")]
    List(RequestId, DbError),
}

#[derive(Error, Debug)]
pub enum QueryEventsError {
    #[error("Invalid maxEvents '{0}', should be between 1 and {1}.")]
    InvalidMaxEvents(i32, i32),
    #[error("Can't query events. Error: {0}.")]
    Db(DbError),
}
