//! Sharing REST endpoints.
//!
//! Responsibility of these functions is calling respective functions from
//! within workflow brokers and mapping return values to http responses.
//! No workflow logic is allowed here.

use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::web::PathConfig;
use actix_web::{FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use serde::Deserialize;

use medshare_client_model::sharing::{Party, TransferState, TransferUpdate};
use medshare_client_model::{AgreementId, ErrorMessage, RequestId, TenantId, TransferId};

pub(crate) mod agreements;
mod error;
pub(crate) mod events;
pub(crate) mod requests;
pub(crate) mod transfers;

pub const SHARING_API_PATH: &str = "/sharing-api/v1";

/// Header carrying the caller's tenant, filled in by the identity middleware
/// in front of this service.
pub const TENANT_HEADER: &str = "X-MedShare-Tenant";

pub fn path_config() -> PathConfig {
    PathConfig::default().error_handler(|err, _req| {
        InternalError::new(
            serde_json::to_string(&ErrorMessage::new(err.to_string())).unwrap(),
            StatusCode::BAD_REQUEST,
        )
        .into()
    })
}

/// The caller's tenant identity, resolved from the [`TENANT_HEADER`] header.
/// Authentication itself happens outside this service; here the header value
/// only has to parse as a tenant id.
#[derive(Clone, Debug)]
pub struct TenantIdentity {
    pub tenant: TenantId,
}

impl FromRequest for TenantIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<TenantIdentity, actix_web::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(resolve_tenant(req))
    }
}

fn resolve_tenant(req: &HttpRequest) -> Result<TenantIdentity, actix_web::Error> {
    let header = req
        .headers()
        .get(TENANT_HEADER)
        .ok_or_else(|| identity_error(format!("Missing {} header.", TENANT_HEADER)))?;
    let tenant = header
        .to_str()
        .map_err(|_| identity_error(format!("Invalid {} header encoding.", TENANT_HEADER)))?
        .parse::<TenantId>()
        .map_err(|e| identity_error(e.to_string()))?;
    Ok(TenantIdentity { tenant })
}

fn identity_error(message: String) -> actix_web::Error {
    InternalError::new(
        serde_json::to_string(&ErrorMessage::new(message)).unwrap(),
        StatusCode::UNAUTHORIZED,
    )
    .into()
}

#[derive(Deserialize)]
pub struct PathRequest {
    pub request_id: RequestId,
}

#[derive(Deserialize)]
pub struct PathAgreement {
    pub agreement_id: AgreementId,
}

#[derive(Deserialize)]
pub struct PathTransfer {
    pub transfer_id: TransferId,
}

#[derive(Deserialize, Debug)]
pub struct QueryEvents {
    /// highest event id the caller has already seen
    #[serde(rename = "afterEventId", default)]
    pub after_event_id: i32,
    /// maximum count of events to return
    #[serde(rename = "maxEvents")]
    pub max_events: Option<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePayload {
    pub party: Party,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAdvanceBody {
    pub new_state: TransferState,
    #[serde(flatten)]
    pub update: TransferUpdate,
}
