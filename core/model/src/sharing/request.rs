use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EquipmentId, RequestId, TenantId};
use crate::sharing::agreement::Agreement;
use crate::sharing::transfer::Transfer;

/// What kind of custody the requesting tenant is asking for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestType {
    Borrow,
    Lease,
    Purchase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestState {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    InTransit,
    Active,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Urgency {
    Low,
    Normal,
    High,
    Critical,
}

impl Default for Urgency {
    fn default() -> Self {
        Urgency::Normal
    }
}

/// A sharing request as returned by the service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub request_id: RequestId,
    pub equipment_id: EquipmentId,
    pub requesting_tenant_id: TenantId,
    pub owning_tenant_id: TenantId,
    pub request_type: RequestType,
    pub status: RequestState,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a sharing request. The requesting tenant comes from
/// the caller's identity, never from the body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
    pub equipment_id: EquipmentId,
    pub owning_tenant_id: TenantId,
    pub request_type: RequestType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub urgency: Urgency,
}

/// The owning tenant's verdict on a pending request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    Approved,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDecision {
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_notes: Option<String>,
}

/// Everything derived from a decision: the updated request and, on approval,
/// the draft agreement and the scheduled outgoing transfer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutcome {
    pub request: Request,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement: Option<Agreement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<Transfer>,
}
