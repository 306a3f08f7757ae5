use chrono::Utc;
use diesel::prelude::*;

use medshare_client_model::sharing::Party;
use medshare_client_model::{AgreementId, RequestId, TenantId};
use medshare_persistence::executor::{
    do_with_transaction, readonly_transaction, AsDao, PoolType,
};

use crate::db::dao::events::add_event;
use crate::db::model::{AgreementState, NewSharingEvent, SharingAgreement, SharingEventType};
use crate::db::schema::sharing_agreement::dsl;
use crate::db::{DbError, DbResult};

#[derive(thiserror::Error, Debug)]
pub enum AgreementDaoError {
    #[error("Agreement [{0}] not found.")]
    NotFound(AgreementId),
    #[error("Agreement [{0}] can be mutated only by tenant [{1}].")]
    Unauthorized(AgreementId, TenantId),
    #[error("Agreement [{0}] is already signed by the {1:?} side.")]
    AlreadySigned(AgreementId, Party),
    #[error("Agreement [{id}] is in state {from}, expected {expected}.")]
    InvalidState {
        id: AgreementId,
        from: AgreementState,
        expected: AgreementState,
    },
    #[error("Agreement [{0}] was changed by a concurrent operation.")]
    Concurrent(AgreementId),
    #[error("Agreement DAO error: {0}.")]
    Db(DbError),
}

impl<ErrorType: Into<DbError>> From<ErrorType> for AgreementDaoError {
    fn from(err: ErrorType) -> Self {
        AgreementDaoError::Db(err.into())
    }
}

pub struct AgreementDao<'c> {
    pool: &'c PoolType,
}

impl<'a> AsDao<'a> for AgreementDao<'a> {
    fn as_dao(pool: &'a PoolType) -> Self {
        Self { pool }
    }
}

impl<'c> AgreementDao<'c> {
    pub async fn get(&self, id: &AgreementId) -> DbResult<Option<SharingAgreement>> {
        let id = id.clone();
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::sharing_agreement
                .filter(dsl::id.eq(&id))
                .first::<SharingAgreement>(conn)
                .optional()?)
        })
        .await
    }

    pub async fn find_for_request(
        &self,
        request_id: &RequestId,
    ) -> DbResult<Option<SharingAgreement>> {
        let request_id = request_id.clone();
        readonly_transaction(self.pool, move |conn| {
            Ok(dsl::sharing_agreement
                .filter(dsl::request_id.eq(&request_id))
                .first::<SharingAgreement>(conn)
                .optional()?)
        })
        .await
    }

    /// Records one party's signature. The agreement becomes Active in the
    /// same row update that stores the second signature, so there is no
    /// window where both flags are set but the state still reads Draft.
    pub async fn sign(
        &self,
        id: &AgreementId,
        party: Party,
        caller: &TenantId,
    ) -> Result<SharingAgreement, AgreementDaoError> {
        let id = id.clone();
        let caller = caller.clone();
        do_with_transaction(self.pool, move |conn| {
            let mut agreement: SharingAgreement = dsl::sharing_agreement
                .filter(dsl::id.eq(&id))
                .first(conn)
                .optional()?
                .ok_or_else(|| AgreementDaoError::NotFound(id.clone()))?;

            let signing_tenant = match party {
                Party::Lender => &agreement.lender_tenant_id,
                Party::Borrower => &agreement.borrower_tenant_id,
            };
            if signing_tenant != &caller {
                return Err(AgreementDaoError::Unauthorized(id, signing_tenant.clone()));
            }

            if agreement.state != AgreementState::Draft {
                return Err(AgreementDaoError::InvalidState {
                    id,
                    from: agreement.state,
                    expected: AgreementState::Draft,
                });
            }

            let already_signed = match party {
                Party::Lender => agreement.signed_by_lender,
                Party::Borrower => agreement.signed_by_borrower,
            };
            if already_signed {
                return Err(AgreementDaoError::AlreadySigned(id, party));
            }

            let other_signed = match party {
                Party::Lender => agreement.signed_by_borrower,
                Party::Borrower => agreement.signed_by_lender,
            };
            let new_state = match other_signed {
                true => AgreementState::Active,
                false => AgreementState::Draft,
            };

            let now = Utc::now().naive_utc();
            let num_updated = match party {
                Party::Lender => diesel::update(
                    dsl::sharing_agreement
                        .filter(dsl::id.eq(&id))
                        .filter(dsl::state.eq(AgreementState::Draft))
                        .filter(dsl::signed_by_lender.eq(false)),
                )
                .set((
                    dsl::signed_by_lender.eq(true),
                    dsl::state.eq(new_state),
                    dsl::updated_at.eq(now),
                ))
                .execute(conn)?,
                Party::Borrower => diesel::update(
                    dsl::sharing_agreement
                        .filter(dsl::id.eq(&id))
                        .filter(dsl::state.eq(AgreementState::Draft))
                        .filter(dsl::signed_by_borrower.eq(false)),
                )
                .set((
                    dsl::signed_by_borrower.eq(true),
                    dsl::state.eq(new_state),
                    dsl::updated_at.eq(now),
                ))
                .execute(conn)?,
            };
            if num_updated == 0 {
                return Err(AgreementDaoError::Concurrent(id));
            }

            match party {
                Party::Lender => agreement.signed_by_lender = true,
                Party::Borrower => agreement.signed_by_borrower = true,
            }
            agreement.state = new_state;
            agreement.updated_at = now;

            add_event(
                conn,
                NewSharingEvent::agreement(
                    SharingEventType::AgreementSigned,
                    &agreement,
                    &caller,
                    Some(format!("{:?}", party)),
                ),
            )?;
            if new_state == AgreementState::Active {
                add_event(
                    conn,
                    NewSharingEvent::agreement(
                        SharingEventType::AgreementActivated,
                        &agreement,
                        &caller,
                        None,
                    ),
                )?;
            }
            Ok(agreement)
        })
        .await
    }

    pub async fn terminate(
        &self,
        id: &AgreementId,
        caller: &TenantId,
        reason: Option<String>,
    ) -> Result<SharingAgreement, AgreementDaoError> {
        self.close(
            id,
            caller,
            reason,
            AgreementState::Terminated,
            SharingEventType::AgreementTerminated,
        )
        .await
    }

    pub async fn dispute(
        &self,
        id: &AgreementId,
        caller: &TenantId,
        reason: Option<String>,
    ) -> Result<SharingAgreement, AgreementDaoError> {
        self.close(
            id,
            caller,
            reason,
            AgreementState::Disputed,
            SharingEventType::AgreementDisputed,
        )
        .await
    }

    /// Active -> Completed, driven by the request reaching Completed. Returns
    /// `None` when there is nothing to complete (the agreement was never
    /// activated, or another operation closed it first).
    pub async fn complete(
        &self,
        id: &AgreementId,
        issuer: &TenantId,
    ) -> DbResult<Option<SharingAgreement>> {
        let id = id.clone();
        let issuer = issuer.clone();
        do_with_transaction(self.pool, move |conn| {
            let agreement: Option<SharingAgreement> = dsl::sharing_agreement
                .filter(dsl::id.eq(&id))
                .first(conn)
                .optional()?;
            let mut agreement = match agreement {
                Some(agreement) if agreement.state == AgreementState::Active => agreement,
                _ => return Ok(None),
            };

            let now = Utc::now().naive_utc();
            let num_updated = diesel::update(
                dsl::sharing_agreement
                    .filter(dsl::id.eq(&id))
                    .filter(dsl::state.eq(AgreementState::Active)),
            )
            .set((
                dsl::state.eq(AgreementState::Completed),
                dsl::updated_at.eq(now),
            ))
            .execute(conn)?;
            if num_updated == 0 {
                return Ok(None);
            }

            agreement.state = AgreementState::Completed;
            agreement.updated_at = now;
            add_event(
                conn,
                NewSharingEvent::agreement(
                    SharingEventType::AgreementCompleted,
                    &agreement,
                    &issuer,
                    None,
                ),
            )?;
            Ok(Some(agreement))
        })
        .await
    }

    /// Shared Active -> {Terminated, Disputed} path. Either signing party may
    /// invoke it; transfer state is deliberately not consulted (early recall
    /// of equipment still in the field is a legitimate case).
    async fn close(
        &self,
        id: &AgreementId,
        caller: &TenantId,
        reason: Option<String>,
        to: AgreementState,
        event_type: SharingEventType,
    ) -> Result<SharingAgreement, AgreementDaoError> {
        let id = id.clone();
        let caller = caller.clone();
        do_with_transaction(self.pool, move |conn| {
            let mut agreement: SharingAgreement = dsl::sharing_agreement
                .filter(dsl::id.eq(&id))
                .first(conn)
                .optional()?
                .ok_or_else(|| AgreementDaoError::NotFound(id.clone()))?;

            if agreement.lender_tenant_id != caller && agreement.borrower_tenant_id != caller {
                return Err(AgreementDaoError::Unauthorized(
                    id,
                    agreement.lender_tenant_id.clone(),
                ));
            }
            if agreement.state != AgreementState::Active {
                return Err(AgreementDaoError::InvalidState {
                    id,
                    from: agreement.state,
                    expected: AgreementState::Active,
                });
            }

            let now = Utc::now().naive_utc();
            let num_updated = diesel::update(
                dsl::sharing_agreement
                    .filter(dsl::id.eq(&id))
                    .filter(dsl::state.eq(AgreementState::Active)),
            )
            .set((dsl::state.eq(to), dsl::updated_at.eq(now)))
            .execute(conn)?;
            if num_updated == 0 {
                return Err(AgreementDaoError::Concurrent(id));
            }

            agreement.state = to;
            agreement.updated_at = now;
            add_event(
                conn,
                NewSharingEvent::agreement(event_type, &agreement, &caller, reason),
            )?;
            Ok(agreement)
        })
        .await
    }
}
