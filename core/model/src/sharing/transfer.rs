use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AgreementId, EquipmentId, RequestId, TenantId, TransferId};

/// Direction of a physical custody movement, seen from the lender's side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferType {
    Outgoing,
    Incoming,
    Return,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransferState {
    Scheduled,
    PickedUp,
    InTransit,
    Delivered,
    Returned,
    Cancelled,
}

/// One tracked movement of equipment between tenants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub transfer_id: TransferId,
    pub request_id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement_id: Option<AgreementId>,
    pub equipment_id: EquipmentId,
    pub from_tenant_id: TenantId,
    pub to_tenant_id: TenantId,
    pub transfer_type: TransferType,
    pub status: TransferState,
    pub scheduled_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_scheduled_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_on_pickup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_on_delivery: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Logistics details supplied alongside a state advance. Fields left `None`
/// keep their stored values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_on_pickup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_on_delivery: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
