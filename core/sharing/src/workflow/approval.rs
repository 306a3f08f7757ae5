use chrono::{TimeZone, Utc};
use metrics::counter;

use medshare_client_model::sharing::{
    Decision, DecisionOutcome, RequestDecision, SharingEventType,
};
use medshare_client_model::{RequestId, TenantId};

use crate::db::dao::{RequestDao, RequestDaoError};
use crate::db::model::RequestState;
use crate::notification::SharingNotification;
use crate::workflow::common::CommonBroker;
use crate::workflow::error::RespondError;

/// Processes the owning tenant's decision on a pending request. This is the
/// single concurrency-critical path of the workflow: the decision, the draft
/// agreement and the scheduled outgoing transfer commit as one unit, and at
/// most one of any number of racing decisions wins.
#[derive(Clone)]
pub struct ApprovalCoordinator {
    pub(crate) common: CommonBroker,
}

impl ApprovalCoordinator {
    pub fn new(common: CommonBroker) -> ApprovalCoordinator {
        counter!("sharing.requests.approved", 0);
        counter!("sharing.requests.rejected", 0);

        ApprovalCoordinator { common }
    }

    pub async fn respond(
        &self,
        request_id: &RequestId,
        caller: &TenantId,
        decision: RequestDecision,
    ) -> Result<DecisionOutcome, RespondError> {
        let (request, agreement, transfer) = self
            .common
            .db
            .as_dao::<RequestDao>()
            .respond(
                request_id,
                caller,
                decision.decision,
                decision.response_notes,
            )
            .await
            .map_err(|e| match e {
                RequestDaoError::NotFound(id) => RespondError::NotFound(id),
                RequestDaoError::Unauthorized(id, owner) => RespondError::Unauthorized(id, owner),
                // A request the owner already decided is the lost-race
                // outcome, whichever call observes it. Cancellation is not a
                // decision, so it stays an invalid-state failure.
                RequestDaoError::InvalidTransition { id, from, .. } => match from {
                    RequestState::Approved | RequestState::Rejected => RespondError::Conflict(id),
                    _ => RespondError::InvalidState(id, from),
                },
                RequestDaoError::Concurrent(id) => RespondError::Conflict(id),
                RequestDaoError::Db(e) => RespondError::Db(request_id.clone(), e),
            })?;

        match decision.decision {
            Decision::Approved => {
                counter!("sharing.requests.approved", 1);
                log::info!(
                    "Request [{}] approved by [{}]. Agreement [{}] drafted, Transfer [{}] scheduled.",
                    request.id,
                    caller,
                    agreement.as_ref().map(|a| a.id.to_string()).unwrap_or_default(),
                    transfer.as_ref().map(|t| t.id.to_string()).unwrap_or_default(),
                );
                self.warn_about_overlaps(&request).await;
            }
            Decision::Rejected => {
                counter!("sharing.requests.rejected", 1);
                log::info!("Request [{}] rejected by [{}].", request.id, caller);
            }
        }

        let event_type = match decision.decision {
            Decision::Approved => SharingEventType::RequestApproved,
            Decision::Rejected => SharingEventType::RequestRejected,
        };
        let mut notification =
            SharingNotification::request(event_type, &request.id, caller);
        if let Some(agreement) = &agreement {
            notification = notification.with_agreement(&agreement.id);
        }
        if let Some(transfer) = &transfer {
            notification = notification.with_transfer(&transfer.id);
        }
        self.common.broadcast(notification).await;

        Ok(DecisionOutcome {
            request: request.into_client(),
            agreement: agreement.map(|a| a.into_client()),
            transfer: transfer.map(|t| t.into_client()),
        })
    }

    /// Overlapping approvals for one piece of equipment are allowed (dispatch
    /// resolves them off-system), but operators want to know.
    async fn warn_about_overlaps(&self, request: &crate::db::model::SharingRequest) {
        match self
            .common
            .db
            .as_dao::<RequestDao>()
            .approved_overlapping(
                &request.equipment_id,
                request.start_date,
                request.end_date,
                &request.id,
            )
            .await
        {
            Ok(overlapping) if !overlapping.is_empty() => {
                log::warn!(
                    "Equipment [{}] now has {} approved requests with overlapping dates \
                     ({} .. {}): {:?}.",
                    request.equipment_id,
                    overlapping.len() + 1,
                    Utc.from_utc_datetime(&request.start_date),
                    Utc.from_utc_datetime(&request.end_date),
                    overlapping
                );
            }
            Ok(_) => (),
            Err(e) => log::debug!("Overlap check for Request [{}] failed: {}.", request.id, e),
        }
    }
}
