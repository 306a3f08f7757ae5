use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AgreementId, EquipmentId, RequestId, TenantId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AgreementState {
    Draft,
    Active,
    Completed,
    Terminated,
    Disputed,
}

/// Which tenant keeps the equipment serviceable for the duration of the
/// agreement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaintenanceResponsibility {
    Lender,
    Borrower,
    Shared,
}

impl Default for MaintenanceResponsibility {
    fn default() -> Self {
        MaintenanceResponsibility::Lender
    }
}

/// One of the two signing sides of an agreement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Party {
    Lender,
    Borrower,
}

/// Free-form justification attached to terminations and disputes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reason {
    pub message: String,
}

impl Reason {
    pub fn new(message: impl ToString) -> Self {
        Reason {
            message: message.to_string(),
        }
    }
}

/// Binding terms derived from one approved request. Created by the service,
/// never directly by a caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub agreement_id: AgreementId,
    pub request_id: RequestId,
    pub equipment_id: EquipmentId,
    pub lender_tenant_id: TenantId,
    pub borrower_tenant_id: TenantId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_amount: Option<f64>,
    pub insurance_required: bool,
    pub maintenance_responsibility: MaintenanceResponsibility,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: AgreementState,
    pub signed_by_lender: bool,
    pub signed_by_borrower: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
