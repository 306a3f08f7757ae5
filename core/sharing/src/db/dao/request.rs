use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use medshare_client_model::sharing::Decision;
use medshare_client_model::{EquipmentId, RequestId, TenantId};
use medshare_persistence::executor::{
    do_with_transaction, readonly_transaction, AsDao, ConnType, PoolType,
};

use crate::db::dao::events::add_event;
use crate::db::model::{
    NewSharingEvent, RequestState, SharingAgreement, SharingEventType, SharingRequest,
    SharingTransfer,
};
use crate::db::schema::sharing_agreement::dsl as agreement_dsl;
use crate::db::schema::sharing_request::dsl;
use crate::db::schema::sharing_transfer::dsl as transfer_dsl;
use crate::db::{DbError, DbResult};

#[derive(thiserror::Error, Debug)]
pub enum RequestDaoError {
    #[error("Request [{0}] not found.")]
    NotFound(RequestId),
    #[error("Request [{0}] can be mutated only by tenant [{1}].")]
    Unauthorized(RequestId, TenantId),
    #[error("Can't change Request [{id}] state from {from} to {to}.")]
    InvalidTransition {
        id: RequestId,
        from: RequestState,
        to: RequestState,
    },
    #[error("Request [{0}] was changed by a concurrent operation.")]
    Concurrent(RequestId),
    #[error("Request DAO error: {0}.")]
    Db(DbError),
}

impl<ErrorType: Into<DbError>> From<ErrorType> for RequestDaoError {
    fn from(err: ErrorType) -> Self {
        RequestDaoError::Db(err.into())
    }
}

pub struct RequestDao<'c> {
    pool: &'c PoolType,
}

impl<'a> AsDao<'a> for RequestDao<'a> {
    fn as_dao(pool: &'a PoolType) -> Self {
        Self { pool }
    }
}

impl<'c> RequestDao<'c> {
    pub async fn create(&self, request: SharingRequest) -> DbResult<SharingRequest> {
        do_with_transaction(self.pool, move |conn| {
            diesel::insert_into(dsl::sharing_request)
                .values(&request)
                .execute(conn)?;
            add_event(
                conn,
                NewSharingEvent::request(
                    SharingEventType::RequestCreated,
                    &request,
                    &request.requesting_tenant_id,
                    None,
                ),
            )?;
            Ok(request)
        })
        .await
    }

    pub async fn get(&self, id: &RequestId) -> DbResult<Option<SharingRequest>> {
        let id = id.clone();
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::sharing_request
                .filter(dsl::id.eq(&id))
                .first::<SharingRequest>(conn)
                .optional()?)
        })
        .await
    }

    /// Requests visible to a tenant: those it filed and those filed against
    /// its equipment. Newest first.
    pub async fn list_for_tenant(&self, tenant: &TenantId) -> DbResult<Vec<SharingRequest>> {
        let tenant = tenant.clone();
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::sharing_request
                .filter(
                    dsl::requesting_tenant_id
                        .eq(&tenant)
                        .or(dsl::owning_tenant_id.eq(&tenant)),
                )
                .order_by(dsl::created_at.desc())
                .load::<SharingRequest>(conn)?)
        })
        .await
    }

    /// Withdraws a pending request. Only the tenant that filed it may do so,
    /// and only while the owner has not decided yet.
    pub async fn cancel(
        &self,
        id: &RequestId,
        caller: &TenantId,
    ) -> Result<SharingRequest, RequestDaoError> {
        let id = id.clone();
        let caller = caller.clone();
        do_with_transaction(self.pool, move |conn| {
            let mut request: SharingRequest = dsl::sharing_request
                .filter(dsl::id.eq(&id))
                .first(conn)
                .optional()?
                .ok_or_else(|| RequestDaoError::NotFound(id.clone()))?;

            if request.requesting_tenant_id != caller {
                return Err(RequestDaoError::Unauthorized(
                    id,
                    request.requesting_tenant_id.clone(),
                ));
            }
            if request.state != RequestState::Pending {
                return Err(RequestDaoError::InvalidTransition {
                    id,
                    from: request.state,
                    to: RequestState::Cancelled,
                });
            }

            let now = Utc::now().naive_utc();
            let num_updated = diesel::update(
                dsl::sharing_request
                    .filter(dsl::id.eq(&id))
                    .filter(dsl::state.eq(RequestState::Pending)),
            )
            .set((
                dsl::state.eq(RequestState::Cancelled),
                dsl::updated_at.eq(now),
            ))
            .execute(conn)?;
            if num_updated == 0 {
                return Err(RequestDaoError::Concurrent(id));
            }

            request.state = RequestState::Cancelled;
            request.updated_at = now;
            add_event(
                conn,
                NewSharingEvent::request(
                    SharingEventType::RequestCancelled,
                    &request,
                    &caller,
                    None,
                ),
            )?;
            Ok(request)
        })
        .await
    }

    /// The owner's decision, as one atomic unit: the pending-state guard, the
    /// state flip, and (on approval) the derived agreement and outgoing
    /// transfer all commit or roll back together. A concurrent decision makes
    /// the conditional update match zero rows, so the loser observes
    /// [`RequestDaoError::Concurrent`] and leaves no side effects.
    pub async fn respond(
        &self,
        id: &RequestId,
        caller: &TenantId,
        decision: Decision,
        response_notes: Option<String>,
    ) -> Result<
        (
            SharingRequest,
            Option<SharingAgreement>,
            Option<SharingTransfer>,
        ),
        RequestDaoError,
    > {
        let id = id.clone();
        let caller = caller.clone();
        do_with_transaction(self.pool, move |conn| {
            let mut request: SharingRequest = dsl::sharing_request
                .filter(dsl::id.eq(&id))
                .first(conn)
                .optional()?
                .ok_or_else(|| RequestDaoError::NotFound(id.clone()))?;

            if request.owning_tenant_id != caller {
                return Err(RequestDaoError::Unauthorized(
                    id,
                    request.owning_tenant_id.clone(),
                ));
            }

            let to = match decision {
                Decision::Approved => RequestState::Approved,
                Decision::Rejected => RequestState::Rejected,
            };
            if request.state != RequestState::Pending {
                return Err(RequestDaoError::InvalidTransition {
                    id,
                    from: request.state,
                    to,
                });
            }

            let now = Utc::now().naive_utc();
            let num_updated = diesel::update(
                dsl::sharing_request
                    .filter(dsl::id.eq(&id))
                    .filter(dsl::state.eq(RequestState::Pending)),
            )
            .set((
                dsl::state.eq(to),
                dsl::response_notes.eq(response_notes.clone()),
                dsl::responded_at.eq(now),
                dsl::updated_at.eq(now),
            ))
            .execute(conn)?;
            if num_updated == 0 {
                return Err(RequestDaoError::Concurrent(id));
            }

            request.state = to;
            request.response_notes = response_notes.clone();
            request.responded_at = Some(now);
            request.updated_at = now;

            if decision == Decision::Rejected {
                add_event(
                    conn,
                    NewSharingEvent::request(
                        SharingEventType::RequestRejected,
                        &request,
                        &caller,
                        response_notes,
                    ),
                )?;
                return Ok((request, None, None));
            }

            // The CAS above already guarantees a single winner; the unique
            // request_id column on sharing_agreement backs it at the schema
            // level.
            if find_agreement_for_request(conn, &request.id)?.is_some() {
                return Err(RequestDaoError::Concurrent(request.id.clone()));
            }

            let agreement = SharingAgreement::draft_for(&request);
            diesel::insert_into(agreement_dsl::sharing_agreement)
                .values(&agreement)
                .execute(conn)?;

            let transfer = SharingTransfer::outgoing(&request, &agreement.id);
            diesel::insert_into(transfer_dsl::sharing_transfer)
                .values(&transfer)
                .execute(conn)?;

            add_event(
                conn,
                NewSharingEvent {
                    event_type: SharingEventType::RequestApproved,
                    request_id: request.id.clone(),
                    agreement_id: Some(agreement.id.clone()),
                    transfer_id: Some(transfer.id.clone()),
                    issuer_tenant_id: caller.clone(),
                    reason: response_notes,
                },
            )?;

            Ok((request, Some(agreement), Some(transfer)))
        })
        .await
    }

    /// Ids of other requests already granted custody of this equipment for an
    /// overlapping period. Used for operator warnings only; overlaps are not
    /// rejected here.
    pub async fn approved_overlapping(
        &self,
        equipment_id: &EquipmentId,
        start_date: NaiveDateTime,
        end_date: NaiveDateTime,
        exclude: &RequestId,
    ) -> DbResult<Vec<RequestId>> {
        let equipment_id = equipment_id.clone();
        let exclude = exclude.clone();
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::sharing_request
                .filter(dsl::equipment_id.eq(&equipment_id))
                .filter(dsl::state.eq_any(vec![
                    RequestState::Approved,
                    RequestState::InTransit,
                    RequestState::Active,
                ]))
                .filter(dsl::start_date.lt(end_date))
                .filter(dsl::end_date.gt(start_date))
                .filter(dsl::id.ne(&exclude))
                .select(dsl::id)
                .load::<RequestId>(conn)?)
        })
        .await
    }
}

pub(crate) fn find_agreement_for_request(
    conn: &ConnType,
    request_id: &RequestId,
) -> Result<Option<SharingAgreement>, diesel::result::Error> {
    agreement_dsl::sharing_agreement
        .filter(agreement_dsl::request_id.eq(request_id))
        .first::<SharingAgreement>(conn)
        .optional()
}

/// Conditional request-state advance used when transfer progress drives the
/// request forward. Zero updated rows means another operation moved the
/// request first; callers treat that as "already handled".
pub(crate) fn advance_request_state(
    conn: &ConnType,
    request: &SharingRequest,
    to: RequestState,
    now: NaiveDateTime,
) -> Result<bool, diesel::result::Error> {
    let num_updated = diesel::update(
        dsl::sharing_request
            .filter(dsl::id.eq(&request.id))
            .filter(dsl::state.eq(request.state)),
    )
    .set((dsl::state.eq(to), dsl::updated_at.eq(now)))
    .execute(conn)?;
    Ok(num_updated > 0)
}
