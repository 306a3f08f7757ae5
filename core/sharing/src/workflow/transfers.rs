use metrics::counter;

use medshare_client_model::sharing::{
    SharingEventType, Transfer as ClientTransfer, TransferState as ClientTransferState,
    TransferUpdate,
};
use medshare_client_model::{RequestId, TenantId, TransferId};

use crate::db::dao::{AgreementDao, TransferDao, TransferDaoError};
use crate::db::model::{RequestState, SharingRequest, SharingTransfer, TransferState};
use crate::notification::SharingNotification;
use crate::workflow::common::CommonBroker;
use crate::workflow::error::TransferError;

/// Tracks equipment through physical custody states and pulls the
/// coordinating request and agreement along as movements complete.
#[derive(Clone)]
pub struct TransferTracker {
    pub(crate) common: CommonBroker,
}

impl TransferTracker {
    pub fn new(common: CommonBroker) -> TransferTracker {
        counter!("sharing.transfers.advanced", 0);
        counter!("sharing.transfers.cancelled", 0);
        counter!("sharing.transfers.returns-scheduled", 0);
        counter!("sharing.requests.completed", 0);
        counter!("sharing.agreements.completed", 0);

        TransferTracker { common }
    }

    pub async fn advance(
        &self,
        transfer_id: &TransferId,
        caller: &TenantId,
        new_state: ClientTransferState,
        update: TransferUpdate,
    ) -> Result<ClientTransfer, TransferError> {
        let to = TransferState::from(new_state);
        let (transfer, request) = self
            .common
            .db
            .as_dao::<TransferDao>()
            .advance(transfer_id, to, update, caller)
            .await
            .map_err(|e| match e {
                TransferDaoError::NotFound(id) => TransferError::NotFound(id),
                TransferDaoError::InvalidTransition { id, from, to } => {
                    TransferError::InvalidTransition { id, from, to }
                }
                TransferDaoError::Concurrent(id) => TransferError::Conflict(id),
                TransferDaoError::Db(e) => TransferError::Db(transfer_id.clone(), e),
            })?;

        match to {
            TransferState::Cancelled => counter!("sharing.transfers.cancelled", 1),
            _ => counter!("sharing.transfers.advanced", 1),
        }
        log::info!(
            "Transfer [{}] ({}) moved to {} by [{}].",
            transfer.id,
            transfer.transfer_type,
            transfer.state,
            caller
        );

        if let Some(request) = &request {
            log::info!(
                "Request [{}] advanced to {} by Transfer [{}].",
                request.id,
                request.state,
                transfer.id
            );
            if request.state == RequestState::Completed {
                counter!("sharing.requests.completed", 1);
                self.complete_agreement(request, &transfer, caller).await?;
                self.common
                    .broadcast(
                        SharingNotification::request(
                            SharingEventType::RequestCompleted,
                            &request.id,
                            caller,
                        )
                        .with_transfer(&transfer.id),
                    )
                    .await;
            }
        }

        let event_type = match to {
            TransferState::Cancelled => SharingEventType::TransferCancelled,
            _ => SharingEventType::TransferAdvanced,
        };
        self.common
            .broadcast(
                SharingNotification::request(event_type, &transfer.request_id, caller)
                    .with_transfer(&transfer.id)
                    .with_reason(Some(transfer.state.to_string())),
            )
            .await;

        Ok(transfer.into_client())
    }

    pub async fn get_transfer(
        &self,
        transfer_id: &TransferId,
    ) -> Result<ClientTransfer, TransferError> {
        Ok(self
            .common
            .db
            .as_dao::<TransferDao>()
            .get(transfer_id)
            .await
            .map_err(|e| TransferError::Db(transfer_id.clone(), e))?
            .ok_or_else(|| TransferError::NotFound(transfer_id.clone()))?
            .into_client())
    }

    pub async fn list_transfers(
        &self,
        request_id: &RequestId,
    ) -> Result<Vec<ClientTransfer>, TransferError> {
        Ok(self
            .common
            .db
            .as_dao::<TransferDao>()
            .list_for_request(request_id)
            .await
            .map_err(|e| TransferError::List(request_id.clone(), e))?
            .into_iter()
            .map(SharingTransfer::into_client)
            .collect())
    }

    /// A completed request finishes its agreement, provided both parties got
    /// around to signing. A still-draft agreement is left untouched.
    async fn complete_agreement(
        &self,
        request: &SharingRequest,
        transfer: &SharingTransfer,
        caller: &TenantId,
    ) -> Result<(), TransferError> {
        let dao = self.common.db.as_dao::<AgreementDao>();
        let agreement = match &transfer.agreement_id {
            Some(agreement_id) => dao
                .complete(agreement_id, caller)
                .await
                .map_err(|e| TransferError::Db(transfer.id.clone(), e))?,
            None => match dao
                .find_for_request(&request.id)
                .await
                .map_err(|e| TransferError::Db(transfer.id.clone(), e))?
            {
                Some(agreement) => dao
                    .complete(&agreement.id, caller)
                    .await
                    .map_err(|e| TransferError::Db(transfer.id.clone(), e))?,
                None => None,
            },
        };
        if let Some(agreement) = agreement {
            counter!("sharing.agreements.completed", 1);
            log::info!(
                "Agreement [{}] completed; Request [{}] fulfilled.",
                agreement.id,
                request.id
            );
            self.common
                .broadcast(
                    SharingNotification::request(
                        SharingEventType::AgreementCompleted,
                        &request.id,
                        caller,
                    )
                    .with_agreement(&agreement.id),
                )
                .await;
        }
        Ok(())
    }
}
