use chrono::{NaiveDateTime, TimeZone, Utc};
use diesel::sql_types::Integer;
use num_derive::FromPrimitive;

use medshare_client_model::sharing::{
    Transfer as ClientTransfer, TransferState as ClientTransferState,
    TransferType as ClientTransferType, TransferUpdate,
};
use medshare_client_model::{AgreementId, EquipmentId, RequestId, TenantId, TransferId};

use crate::db::model::SharingRequest;
use crate::db::schema::sharing_transfer;

#[derive(
    FromPrimitive, AsExpression, FromSqlRow, PartialEq, Eq, Debug, Clone, Copy, derive_more::Display,
)]
#[sql_type = "Integer"]
pub enum TransferType {
    /// Lender to borrower, the initial leg.
    Outgoing = 0,
    /// Borrower-side mirror of an outgoing movement.
    Incoming = 1,
    /// Borrower back to lender at term end.
    Return = 2,
}

#[derive(
    FromPrimitive, AsExpression, FromSqlRow, PartialEq, Eq, Debug, Clone, Copy, derive_more::Display,
)]
#[sql_type = "Integer"]
pub enum TransferState {
    Scheduled = 0,
    PickedUp = 1,
    InTransit = 2,
    Delivered = 3,
    Returned = 4,
    Cancelled = 5,
}

integer_enum_sql!(TransferType);
integer_enum_sql!(TransferState);

impl TransferState {
    /// Custody moves strictly forward; a movement can be abandoned only
    /// before the equipment reaches the receiving dock.
    pub fn allows(self, to: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, to),
            (Scheduled, PickedUp)
                | (PickedUp, InTransit)
                | (InTransit, Delivered)
                | (Delivered, Returned)
                | (Scheduled, Cancelled)
                | (PickedUp, Cancelled)
                | (InTransit, Cancelled)
        )
    }
}

#[derive(Clone, Debug, Identifiable, Insertable, Queryable)]
#[table_name = "sharing_transfer"]
pub struct SharingTransfer {
    pub id: TransferId,
    pub request_id: RequestId,
    pub agreement_id: Option<AgreementId>,
    pub equipment_id: EquipmentId,
    pub from_tenant_id: TenantId,
    pub to_tenant_id: TenantId,
    pub transfer_type: TransferType,
    pub state: TransferState,
    pub scheduled_date: NaiveDateTime,
    pub pickup_date: Option<NaiveDateTime>,
    pub delivery_date: Option<NaiveDateTime>,
    pub return_scheduled_date: Option<NaiveDateTime>,
    pub return_date: Option<NaiveDateTime>,
    pub condition_on_pickup: Option<String>,
    pub condition_on_delivery: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SharingTransfer {
    /// The initial movement scheduled at approval: owner's dock to
    /// requester's dock on the requested start date.
    pub fn outgoing(request: &SharingRequest, agreement_id: &AgreementId) -> SharingTransfer {
        let now = Utc::now().naive_utc();
        SharingTransfer {
            id: TransferId::generate(),
            request_id: request.id.clone(),
            agreement_id: Some(agreement_id.clone()),
            equipment_id: request.equipment_id.clone(),
            from_tenant_id: request.owning_tenant_id.clone(),
            to_tenant_id: request.requesting_tenant_id.clone(),
            transfer_type: TransferType::Outgoing,
            state: TransferState::Scheduled,
            scheduled_date: request.start_date,
            pickup_date: None,
            delivery_date: None,
            return_scheduled_date: Some(request.end_date),
            return_date: None,
            condition_on_pickup: None,
            condition_on_delivery: None,
            tracking_number: None,
            carrier: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The return leg scheduled once a borrowed or leased item is delivered:
    /// requester's dock back to the owner at the end of the term.
    pub fn return_leg(request: &SharingRequest, outgoing: &SharingTransfer) -> SharingTransfer {
        let now = Utc::now().naive_utc();
        SharingTransfer {
            id: TransferId::generate(),
            request_id: request.id.clone(),
            agreement_id: outgoing.agreement_id.clone(),
            equipment_id: request.equipment_id.clone(),
            from_tenant_id: request.requesting_tenant_id.clone(),
            to_tenant_id: request.owning_tenant_id.clone(),
            transfer_type: TransferType::Return,
            state: TransferState::Scheduled,
            scheduled_date: request.end_date,
            pickup_date: None,
            delivery_date: None,
            return_scheduled_date: None,
            return_date: None,
            condition_on_pickup: None,
            condition_on_delivery: None,
            tracking_number: None,
            carrier: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_client(self) -> ClientTransfer {
        ClientTransfer {
            transfer_id: self.id,
            request_id: self.request_id,
            agreement_id: self.agreement_id,
            equipment_id: self.equipment_id,
            from_tenant_id: self.from_tenant_id,
            to_tenant_id: self.to_tenant_id,
            transfer_type: self.transfer_type.into(),
            status: self.state.into(),
            scheduled_date: Utc.from_utc_datetime(&self.scheduled_date),
            pickup_date: self.pickup_date.map(|ts| Utc.from_utc_datetime(&ts)),
            delivery_date: self.delivery_date.map(|ts| Utc.from_utc_datetime(&ts)),
            return_scheduled_date: self
                .return_scheduled_date
                .map(|ts| Utc.from_utc_datetime(&ts)),
            return_date: self.return_date.map(|ts| Utc.from_utc_datetime(&ts)),
            condition_on_pickup: self.condition_on_pickup,
            condition_on_delivery: self.condition_on_delivery,
            tracking_number: self.tracking_number,
            carrier: self.carrier,
            notes: self.notes,
            created_at: Utc.from_utc_datetime(&self.created_at),
            updated_at: Utc.from_utc_datetime(&self.updated_at),
        }
    }
}

/// Changeset applied by [`crate::db::dao::TransferDao::advance`]. `None`
/// fields keep their stored values, which is how already-stamped timestamps
/// survive later updates.
#[derive(AsChangeset)]
#[table_name = "sharing_transfer"]
pub struct TransferAdvance {
    pub state: TransferState,
    pub pickup_date: Option<NaiveDateTime>,
    pub delivery_date: Option<NaiveDateTime>,
    pub return_date: Option<NaiveDateTime>,
    pub condition_on_pickup: Option<String>,
    pub condition_on_delivery: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub notes: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl TransferAdvance {
    /// Stamps the timestamp matching the newly reached state and merges the
    /// caller-supplied logistics details.
    pub fn new(
        transfer: &SharingTransfer,
        to: TransferState,
        update: TransferUpdate,
        now: NaiveDateTime,
    ) -> TransferAdvance {
        TransferAdvance {
            state: to,
            pickup_date: match (to, transfer.pickup_date) {
                (TransferState::PickedUp, None) => Some(now),
                _ => None,
            },
            delivery_date: match (to, transfer.delivery_date) {
                (TransferState::Delivered, None) => Some(now),
                _ => None,
            },
            return_date: match (to, transfer.return_date) {
                (TransferState::Returned, None) => Some(now),
                _ => None,
            },
            condition_on_pickup: update.condition_on_pickup,
            condition_on_delivery: update.condition_on_delivery,
            tracking_number: update.tracking_number,
            carrier: update.carrier,
            notes: update.notes,
            updated_at: now,
        }
    }

    /// The advanced row as it exists after the update commits.
    pub fn apply(self, mut transfer: SharingTransfer) -> SharingTransfer {
        transfer.state = self.state;
        transfer.pickup_date = self.pickup_date.or(transfer.pickup_date);
        transfer.delivery_date = self.delivery_date.or(transfer.delivery_date);
        transfer.return_date = self.return_date.or(transfer.return_date);
        transfer.condition_on_pickup = self.condition_on_pickup.or(transfer.condition_on_pickup);
        transfer.condition_on_delivery = self
            .condition_on_delivery
            .or(transfer.condition_on_delivery);
        transfer.tracking_number = self.tracking_number.or(transfer.tracking_number);
        transfer.carrier = self.carrier.or(transfer.carrier);
        transfer.notes = self.notes.or(transfer.notes);
        transfer.updated_at = self.updated_at;
        transfer
    }
}

impl From<ClientTransferState> for TransferState {
    fn from(state: ClientTransferState) -> Self {
        match state {
            ClientTransferState::Scheduled => TransferState::Scheduled,
            ClientTransferState::PickedUp => TransferState::PickedUp,
            ClientTransferState::InTransit => TransferState::InTransit,
            ClientTransferState::Delivered => TransferState::Delivered,
            ClientTransferState::Returned => TransferState::Returned,
            ClientTransferState::Cancelled => TransferState::Cancelled,
        }
    }
}

impl From<TransferState> for ClientTransferState {
    fn from(state: TransferState) -> Self {
        match state {
            TransferState::Scheduled => ClientTransferState::Scheduled,
            TransferState::PickedUp => ClientTransferState::PickedUp,
            TransferState::InTransit => ClientTransferState::InTransit,
            TransferState::Delivered => ClientTransferState::Delivered,
            TransferState::Returned => ClientTransferState::Returned,
            TransferState::Cancelled => ClientTransferState::Cancelled,
        }
    }
}

impl From<TransferType> for ClientTransferType {
    fn from(transfer_type: TransferType) -> Self {
        match transfer_type {
            TransferType::Outgoing => ClientTransferType::Outgoing,
            TransferType::Incoming => ClientTransferType::Incoming,
            TransferType::Return => ClientTransferType::Return,
        }
    }
}
