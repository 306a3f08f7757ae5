use actix_web::{HttpResponse, ResponseError};

use medshare_client_model::ErrorMessage;

use crate::db::model::{AgreementState, RequestState};
use crate::workflow::error::{
    AgreementError, CancelError, QueryEventsError, RequestError, RespondError, TransferError,
};

impl ResponseError for RequestError {
    fn error_response(&self) -> HttpResponse {
        let msg = ErrorMessage::new(self.to_string());
        match self {
            RequestError::InvalidDateRange { .. } | RequestError::OwnEquipment(..) => {
                HttpResponse::BadRequest().json(msg)
            }
            RequestError::NotFound(_)
            | RequestError::EquipmentNotFound(_)
            | RequestError::NotOwnedBy(..) => HttpResponse::NotFound().json(msg),
            RequestError::Save(_) | RequestError::Get(..) | RequestError::List(_) => {
                HttpResponse::InternalServerError().json(msg)
            }
        }
    }
}

impl ResponseError for CancelError {
    fn error_response(&self) -> HttpResponse {
        let msg = ErrorMessage::new(self.to_string());
        match self {
            CancelError::NotFound(_) => HttpResponse::NotFound().json(msg),
            CancelError::Unauthorized(..) => HttpResponse::Forbidden().json(msg),
            CancelError::InvalidState(_, state) => match state {
                RequestState::Rejected | RequestState::Cancelled | RequestState::Completed => {
                    HttpResponse::Gone().json(msg)
                }
                _ => HttpResponse::Conflict().json(msg),
            },
            CancelError::Conflict(_) => HttpResponse::Conflict().json(msg),
            CancelError::Db(..) => HttpResponse::InternalServerError().json(msg),
        }
    }
}

impl ResponseError for RespondError {
    fn error_response(&self) -> HttpResponse {
        let msg = ErrorMessage::new(self.to_string());
        match self {
            RespondError::NotFound(_) => HttpResponse::NotFound().json(msg),
            RespondError::Unauthorized(..) => HttpResponse::Forbidden().json(msg),
            RespondError::InvalidState(_, state) => match state {
                RequestState::Cancelled | RequestState::Completed => {
                    HttpResponse::Gone().json(msg)
                }
                _ => HttpResponse::Conflict().json(msg),
            },
            RespondError::Conflict(_) => HttpResponse::Conflict().json(msg),
            RespondError::Db(..) => HttpResponse::InternalServerError().json(msg),
        }
    }
}

impl ResponseError for AgreementError {
    fn error_response(&self) -> HttpResponse {
        let msg = ErrorMessage::new(self.to_string());
        match self {
            AgreementError::NotFound(_) => HttpResponse::NotFound().json(msg),
            AgreementError::Unauthorized(..) => HttpResponse::Forbidden().json(msg),
            AgreementError::AlreadySigned(..) => HttpResponse::Conflict().json(msg),
            AgreementError::InvalidState { from, .. } => match from {
                AgreementState::Completed
                | AgreementState::Terminated
                | AgreementState::Disputed => HttpResponse::Gone().json(msg),
                _ => HttpResponse::Conflict().json(msg),
            },
            AgreementError::Conflict(_) => HttpResponse::Conflict().json(msg),
            AgreementError::Db(..) => HttpResponse::InternalServerError().json(msg),
        }
    }
}

impl ResponseError for TransferError {
    fn error_response(&self) -> HttpResponse {
        let msg = ErrorMessage::new(self.to_string());
        match self {
            TransferError::NotFound(_) => HttpResponse::NotFound().json(msg),
            TransferError::InvalidTransition { .. } | TransferError::Conflict(_) => {
                HttpResponse::Conflict().json(msg)
            }
            TransferError::Db(..) | TransferError::List(..) => {
                HttpResponse::InternalServerError().json(msg)
            }
        }
    }
}

impl ResponseError for QueryEventsError {
    fn error_response(&self) -> HttpResponse {
        let msg = ErrorMessage::new(self.to_string());
        match self {
            QueryEventsError::InvalidMaxEvents(..) => HttpResponse::BadRequest().json(msg),
            QueryEventsError::Db(_) => HttpResponse::InternalServerError().json(msg),
        }
    }
}
