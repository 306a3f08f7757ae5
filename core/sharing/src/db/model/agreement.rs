use chrono::{NaiveDateTime, TimeZone, Utc};
use diesel::sql_types::Integer;
use num_derive::FromPrimitive;

use medshare_client_model::sharing::{
    Agreement as ClientAgreement, AgreementState as ClientAgreementState,
    MaintenanceResponsibility as ClientMaintenance,
};
use medshare_client_model::{AgreementId, EquipmentId, RequestId, TenantId};

use crate::db::model::SharingRequest;
use crate::db::schema::sharing_agreement;

#[derive(
    FromPrimitive, AsExpression, FromSqlRow, PartialEq, Eq, Debug, Clone, Copy, derive_more::Display,
)]
#[sql_type = "Integer"]
pub enum AgreementState {
    /// Created at approval, waiting for both signatures.
    Draft = 0,
    /// Both parties signed; terms are binding.
    Active = 1,
    Completed = 2,
    /// Ended early by one party (e.g. equipment recall).
    Terminated = 3,
    /// Contested; terminal for this workflow.
    Disputed = 4,
}

#[derive(
    FromPrimitive, AsExpression, FromSqlRow, PartialEq, Eq, Debug, Clone, Copy, derive_more::Display,
)]
#[sql_type = "Integer"]
pub enum MaintenanceResponsibility {
    Lender = 0,
    Borrower = 1,
    Shared = 2,
}

integer_enum_sql!(AgreementState);
integer_enum_sql!(MaintenanceResponsibility);

#[derive(Clone, Debug, Identifiable, Insertable, Queryable)]
#[table_name = "sharing_agreement"]
pub struct SharingAgreement {
    pub id: AgreementId,
    pub request_id: RequestId,
    pub equipment_id: EquipmentId,
    pub lender_tenant_id: TenantId,
    pub borrower_tenant_id: TenantId,
    pub terms: Option<String>,
    pub daily_rate: Option<f64>,
    pub deposit_amount: Option<f64>,
    pub insurance_required: bool,
    pub maintenance_responsibility: MaintenanceResponsibility,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub state: AgreementState,
    pub signed_by_lender: bool,
    pub signed_by_borrower: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SharingAgreement {
    /// The draft derived from an approved request. Commercial terms start
    /// empty; parties fill them in before signing through channels outside
    /// this workflow.
    pub fn draft_for(request: &SharingRequest) -> SharingAgreement {
        let now = Utc::now().naive_utc();
        SharingAgreement {
            id: AgreementId::generate(),
            request_id: request.id.clone(),
            equipment_id: request.equipment_id.clone(),
            lender_tenant_id: request.owning_tenant_id.clone(),
            borrower_tenant_id: request.requesting_tenant_id.clone(),
            terms: None,
            daily_rate: None,
            deposit_amount: None,
            insurance_required: false,
            maintenance_responsibility: MaintenanceResponsibility::Lender,
            start_date: request.start_date,
            end_date: request.end_date,
            state: AgreementState::Draft,
            signed_by_lender: false,
            signed_by_borrower: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_client(self) -> ClientAgreement {
        ClientAgreement {
            agreement_id: self.id,
            request_id: self.request_id,
            equipment_id: self.equipment_id,
            lender_tenant_id: self.lender_tenant_id,
            borrower_tenant_id: self.borrower_tenant_id,
            terms: self.terms,
            daily_rate: self.daily_rate,
            deposit_amount: self.deposit_amount,
            insurance_required: self.insurance_required,
            maintenance_responsibility: self.maintenance_responsibility.into(),
            start_date: Utc.from_utc_datetime(&self.start_date),
            end_date: Utc.from_utc_datetime(&self.end_date),
            status: self.state.into(),
            signed_by_lender: self.signed_by_lender,
            signed_by_borrower: self.signed_by_borrower,
            created_at: Utc.from_utc_datetime(&self.created_at),
            updated_at: Utc.from_utc_datetime(&self.updated_at),
        }
    }
}

impl From<AgreementState> for ClientAgreementState {
    fn from(state: AgreementState) -> Self {
        match state {
            AgreementState::Draft => ClientAgreementState::Draft,
            AgreementState::Active => ClientAgreementState::Active,
            AgreementState::Completed => ClientAgreementState::Completed,
            AgreementState::Terminated => ClientAgreementState::Terminated,
            AgreementState::Disputed => ClientAgreementState::Disputed,
        }
    }
}

impl From<MaintenanceResponsibility> for ClientMaintenance {
    fn from(responsibility: MaintenanceResponsibility) -> Self {
        match responsibility {
            MaintenanceResponsibility::Lender => ClientMaintenance::Lender,
            MaintenanceResponsibility::Borrower => ClientMaintenance::Borrower,
            MaintenanceResponsibility::Shared => ClientMaintenance::Shared,
        }
    }
}
