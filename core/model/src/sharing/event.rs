use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AgreementId, RequestId, TenantId, TransferId};

/// What happened to a workflow record. The set is closed; consumers must
/// re-fetch authoritative state instead of reconstructing it from events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SharingEventType {
    RequestCreated,
    RequestApproved,
    RequestRejected,
    RequestCancelled,
    RequestCompleted,
    AgreementSigned,
    AgreementActivated,
    AgreementTerminated,
    AgreementDisputed,
    AgreementCompleted,
    TransferAdvanced,
    TransferCancelled,
    ReturnScheduled,
}

/// One page entry of the change feed. Delivery is best-effort and
/// at-least-once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharingEvent {
    pub event_id: i32,
    pub event_type: SharingEventType,
    pub request_id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement_id: Option<AgreementId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<TransferId>,
    pub issuer_tenant_id: TenantId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub event_date: DateTime<Utc>,
}
