use chrono::{NaiveDateTime, TimeZone, Utc};
use diesel::sql_types::Integer;
use num_derive::FromPrimitive;

use medshare_client_model::sharing::{
    NewRequest, Request as ClientRequest, RequestState as ClientRequestState,
    RequestType as ClientRequestType, Urgency as ClientUrgency,
};
use medshare_client_model::{EquipmentId, RequestId, TenantId};

use crate::db::schema::sharing_request;

#[derive(
    FromPrimitive, AsExpression, FromSqlRow, PartialEq, Eq, Debug, Clone, Copy, derive_more::Display,
)]
#[sql_type = "Integer"]
pub enum RequestType {
    Borrow = 0,
    Lease = 1,
    Purchase = 2,
}

#[derive(
    FromPrimitive, AsExpression, FromSqlRow, PartialEq, Eq, Debug, Clone, Copy, derive_more::Display,
)]
#[sql_type = "Integer"]
pub enum RequestState {
    /// Waiting for the owning tenant's decision.
    Pending = 0,
    /// Accepted by the owner; agreement and outgoing transfer exist.
    Approved = 1,
    Rejected = 2,
    /// Withdrawn by the requester while still pending.
    Cancelled = 3,
    /// Equipment left the owner's custody.
    InTransit = 4,
    /// Equipment in the requester's custody for the agreed period.
    Active = 5,
    Completed = 6,
}

#[derive(
    FromPrimitive,
    AsExpression,
    FromSqlRow,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    Clone,
    Copy,
    derive_more::Display,
)]
#[sql_type = "Integer"]
pub enum Urgency {
    Low = 0,
    Normal = 1,
    High = 2,
    Critical = 3,
}

integer_enum_sql!(RequestType);
integer_enum_sql!(RequestState);
integer_enum_sql!(Urgency);

impl RequestState {
    /// The request lifecycle graph. Pending is decided once; post-approval
    /// states are driven by transfer progress only.
    pub fn allows(self, to: RequestState) -> bool {
        use RequestState::*;
        matches!(
            (self, to),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, InTransit)
                | (Approved, Active)
                | (Approved, Completed)
                | (InTransit, Active)
                | (InTransit, Completed)
                | (Active, Completed)
        )
    }
}

#[derive(Clone, Debug, Identifiable, Insertable, Queryable)]
#[table_name = "sharing_request"]
pub struct SharingRequest {
    pub id: RequestId,
    pub equipment_id: EquipmentId,
    pub requesting_tenant_id: TenantId,
    pub owning_tenant_id: TenantId,
    pub request_type: RequestType,
    pub state: RequestState,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub urgency: Urgency,
    pub response_notes: Option<String>,
    pub responded_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SharingRequest {
    pub fn new(requesting_tenant_id: TenantId, body: NewRequest) -> SharingRequest {
        let now = Utc::now().naive_utc();
        SharingRequest {
            id: RequestId::generate(),
            equipment_id: body.equipment_id,
            requesting_tenant_id,
            owning_tenant_id: body.owning_tenant_id,
            request_type: body.request_type.into(),
            state: RequestState::Pending,
            start_date: body.start_date.naive_utc(),
            end_date: body.end_date.naive_utc(),
            purpose: body.purpose,
            notes: body.notes,
            urgency: body.urgency.into(),
            response_notes: None,
            responded_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_client(self) -> ClientRequest {
        ClientRequest {
            request_id: self.id,
            equipment_id: self.equipment_id,
            requesting_tenant_id: self.requesting_tenant_id,
            owning_tenant_id: self.owning_tenant_id,
            request_type: self.request_type.into(),
            status: self.state.into(),
            start_date: Utc.from_utc_datetime(&self.start_date),
            end_date: Utc.from_utc_datetime(&self.end_date),
            purpose: self.purpose,
            notes: self.notes,
            urgency: self.urgency.into(),
            response_notes: self.response_notes,
            responded_at: self.responded_at.map(|ts| Utc.from_utc_datetime(&ts)),
            created_at: Utc.from_utc_datetime(&self.created_at),
            updated_at: Utc.from_utc_datetime(&self.updated_at),
        }
    }
}

impl From<ClientRequestType> for RequestType {
    fn from(request_type: ClientRequestType) -> Self {
        match request_type {
            ClientRequestType::Borrow => RequestType::Borrow,
            ClientRequestType::Lease => RequestType::Lease,
            ClientRequestType::Purchase => RequestType::Purchase,
        }
    }
}

impl From<RequestType> for ClientRequestType {
    fn from(request_type: RequestType) -> Self {
        match request_type {
            RequestType::Borrow => ClientRequestType::Borrow,
            RequestType::Lease => ClientRequestType::Lease,
            RequestType::Purchase => ClientRequestType::Purchase,
        }
    }
}

impl From<RequestState> for ClientRequestState {
    fn from(state: RequestState) -> Self {
        match state {
            RequestState::Pending => ClientRequestState::Pending,
            RequestState::Approved => ClientRequestState::Approved,
            RequestState::Rejected => ClientRequestState::Rejected,
            RequestState::Cancelled => ClientRequestState::Cancelled,
            RequestState::InTransit => ClientRequestState::InTransit,
            RequestState::Active => ClientRequestState::Active,
            RequestState::Completed => ClientRequestState::Completed,
        }
    }
}

impl From<ClientUrgency> for Urgency {
    fn from(urgency: ClientUrgency) -> Self {
        match urgency {
            ClientUrgency::Low => Urgency::Low,
            ClientUrgency::Normal => Urgency::Normal,
            ClientUrgency::High => Urgency::High,
            ClientUrgency::Critical => Urgency::Critical,
        }
    }
}

impl From<Urgency> for ClientUrgency {
    fn from(urgency: Urgency) -> Self {
        match urgency {
            Urgency::Low => ClientUrgency::Low,
            Urgency::Normal => ClientUrgency::Normal,
            Urgency::High => ClientUrgency::High,
            Urgency::Critical => ClientUrgency::Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_decides_once() {
        assert!(RequestState::Pending.allows(RequestState::Approved));
        assert!(RequestState::Pending.allows(RequestState::Rejected));
        assert!(RequestState::Pending.allows(RequestState::Cancelled));
        assert!(!RequestState::Approved.allows(RequestState::Pending));
        assert!(!RequestState::Rejected.allows(RequestState::Approved));
    }

    #[test]
    fn terminal_states_have_no_edges() {
        for terminal in [
            RequestState::Rejected,
            RequestState::Cancelled,
            RequestState::Completed,
        ] {
            for to in [
                RequestState::Pending,
                RequestState::Approved,
                RequestState::Rejected,
                RequestState::Cancelled,
                RequestState::InTransit,
                RequestState::Active,
                RequestState::Completed,
            ] {
                assert!(!terminal.allows(to), "{} -> {} should be closed", terminal, to);
            }
        }
    }

    #[test]
    fn custody_progress_is_forward_only() {
        assert!(RequestState::Approved.allows(RequestState::InTransit));
        assert!(RequestState::InTransit.allows(RequestState::Active));
        assert!(RequestState::Active.allows(RequestState::Completed));
        assert!(!RequestState::Active.allows(RequestState::InTransit));
        assert!(!RequestState::InTransit.allows(RequestState::Approved));
    }
}
