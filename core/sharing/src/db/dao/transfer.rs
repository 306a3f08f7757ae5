use chrono::Utc;
use diesel::prelude::*;

use medshare_client_model::sharing::TransferUpdate;
use medshare_client_model::{RequestId, TenantId, TransferId};
use medshare_persistence::executor::{
    do_with_transaction, readonly_transaction, AsDao, ConnType, PoolType,
};

use crate::db::dao::events::add_event;
use crate::db::dao::request::advance_request_state;
use crate::db::model::{
    NewSharingEvent, RequestState, RequestType, SharingEventType, SharingRequest, SharingTransfer,
    TransferAdvance, TransferState, TransferType,
};
use crate::db::schema::sharing_request::dsl as request_dsl;
use crate::db::schema::sharing_transfer::dsl;
use crate::db::{DbError, DbResult};

#[derive(thiserror::Error, Debug)]
pub enum TransferDaoError {
    #[error("Transfer [{0}] not found.")]
    NotFound(TransferId),
    #[error("Can't move Transfer [{id}] from {from} to {to}.")]
    InvalidTransition {
        id: TransferId,
        from: TransferState,
        to: TransferState,
    },
    #[error("Transfer [{0}] was changed by a concurrent operation.")]
    Concurrent(TransferId),
    #[error("Transfer DAO error: {0}.")]
    Db(DbError),
}

impl<ErrorType: Into<DbError>> From<ErrorType> for TransferDaoError {
    fn from(err: ErrorType) -> Self {
        TransferDaoError::Db(err.into())
    }
}

pub struct TransferDao<'c> {
    pool: &'c PoolType,
}

impl<'a> AsDao<'a> for TransferDao<'a> {
    fn as_dao(pool: &'a PoolType) -> Self {
        Self { pool }
    }
}

impl<'c> TransferDao<'c> {
    pub async fn get(&self, id: &TransferId) -> DbResult<Option<SharingTransfer>> {
        let id = id.clone();
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::sharing_transfer
                .filter(dsl::id.eq(&id))
                .first::<SharingTransfer>(conn)
                .optional()?)
        })
        .await
    }

    pub async fn list_for_request(
        &self,
        request_id: &RequestId,
    ) -> DbResult<Vec<SharingTransfer>> {
        let request_id = request_id.clone();
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::sharing_transfer
                .filter(dsl::request_id.eq(&request_id))
                .order_by(dsl::created_at.asc())
                .load::<SharingTransfer>(conn)?)
        })
        .await
    }

    /// Moves a transfer one step along the custody chain and, in the same
    /// transaction, pulls the coordinating request forward: pickup and
    /// transit put it InTransit, delivery makes it Active (or Completed for a
    /// purchase), a completed return leg completes it. Delivery of a borrowed
    /// or leased item also schedules the return leg.
    ///
    /// Returns the advanced transfer and, when the request moved too, its
    /// updated row.
    pub async fn advance(
        &self,
        id: &TransferId,
        to: TransferState,
        update: TransferUpdate,
        caller: &TenantId,
    ) -> Result<(SharingTransfer, Option<SharingRequest>), TransferDaoError> {
        let id = id.clone();
        let caller = caller.clone();
        do_with_transaction(self.pool, move |conn| {
            let transfer: SharingTransfer = dsl::sharing_transfer
                .filter(dsl::id.eq(&id))
                .first(conn)
                .optional()?
                .ok_or_else(|| TransferDaoError::NotFound(id.clone()))?;

            if !transfer.state.allows(to) {
                return Err(TransferDaoError::InvalidTransition {
                    id,
                    from: transfer.state,
                    to,
                });
            }

            let now = Utc::now().naive_utc();
            let advance = TransferAdvance::new(&transfer, to, update, now);
            let num_updated = diesel::update(
                dsl::sharing_transfer
                    .filter(dsl::id.eq(&id))
                    .filter(dsl::state.eq(transfer.state)),
            )
            .set(&advance)
            .execute(conn)?;
            if num_updated == 0 {
                return Err(TransferDaoError::Concurrent(id));
            }
            let transfer = advance.apply(transfer);

            let event_type = match to {
                TransferState::Cancelled => SharingEventType::TransferCancelled,
                _ => SharingEventType::TransferAdvanced,
            };
            add_event(
                conn,
                NewSharingEvent::transfer(
                    event_type,
                    &transfer,
                    &caller,
                    Some(to.to_string()),
                ),
            )?;

            let request: SharingRequest = request_dsl::sharing_request
                .filter(request_dsl::id.eq(&transfer.request_id))
                .first(conn)?;

            let updated_request =
                propagate_to_request(conn, &transfer, request, to, &caller)?;

            Ok((transfer, updated_request))
        })
        .await
    }
}

/// The request-progress policy: which custody events drive the coordinating
/// request forward, and when the return leg comes into existence.
fn request_target(
    transfer_type: TransferType,
    to: TransferState,
    request_type: RequestType,
) -> Option<RequestState> {
    match (transfer_type, to) {
        (TransferType::Outgoing, TransferState::PickedUp)
        | (TransferType::Outgoing, TransferState::InTransit) => Some(RequestState::InTransit),
        (TransferType::Outgoing, TransferState::Delivered) => match request_type {
            RequestType::Purchase => Some(RequestState::Completed),
            RequestType::Borrow | RequestType::Lease => Some(RequestState::Active),
        },
        (TransferType::Return, TransferState::Returned) => Some(RequestState::Completed),
        _ => None,
    }
}

fn propagate_to_request(
    conn: &ConnType,
    transfer: &SharingTransfer,
    mut request: SharingRequest,
    to: TransferState,
    caller: &TenantId,
) -> Result<Option<SharingRequest>, TransferDaoError> {
    // A borrowed item that arrived needs a way home.
    if transfer.transfer_type == TransferType::Outgoing
        && to == TransferState::Delivered
        && request.request_type != RequestType::Purchase
        && !return_leg_exists(conn, &request.id)?
    {
        let return_leg = SharingTransfer::return_leg(&request, transfer);
        diesel::insert_into(dsl::sharing_transfer)
            .values(&return_leg)
            .execute(conn)?;
        add_event(
            conn,
            NewSharingEvent::transfer(SharingEventType::ReturnScheduled, &return_leg, caller, None),
        )?;
    }

    let target = match request_target(transfer.transfer_type, to, request.request_type) {
        Some(target) => target,
        None => return Ok(None),
    };
    // Physical events may arrive after the request already moved past the
    // state they imply (e.g. InTransit reported after Delivered). Those are
    // not errors; there is just nothing left to record.
    if !request.state.allows(target) {
        return Ok(None);
    }

    let now = Utc::now().naive_utc();
    if !advance_request_state(conn, &request, target, now)? {
        return Ok(None);
    }
    request.state = target;
    request.updated_at = now;

    if target == RequestState::Completed {
        add_event(
            conn,
            NewSharingEvent::request(SharingEventType::RequestCompleted, &request, caller, None),
        )?;
    }
    Ok(Some(request))
}

fn return_leg_exists(
    conn: &ConnType,
    request_id: &RequestId,
) -> Result<bool, diesel::result::Error> {
    let existing: Option<SharingTransfer> = dsl::sharing_transfer
        .filter(dsl::request_id.eq(request_id))
        .filter(dsl::transfer_type.eq(TransferType::Return))
        .first(conn)
        .optional()?;
    Ok(existing.is_some())
}
