use metrics::counter;

use medshare_client_model::sharing::{
    Agreement as ClientAgreement, Party, Reason, SharingEventType,
};
use medshare_client_model::{AgreementId, TenantId};

use crate::db::dao::{AgreementDao, AgreementDaoError};
use crate::db::model::AgreementState;
use crate::notification::SharingNotification;
use crate::workflow::common::CommonBroker;
use crate::workflow::error::AgreementError;

/// Manages signature state and lifecycle of the binding terms record tied to
/// an approved request. Completion is driven by [`super::TransferTracker`];
/// everything else here is invoked by the signing parties.
#[derive(Clone)]
pub struct AgreementManager {
    pub(crate) common: CommonBroker,
}

impl AgreementManager {
    pub fn new(common: CommonBroker) -> AgreementManager {
        counter!("sharing.agreements.signed", 0);
        counter!("sharing.agreements.activated", 0);
        counter!("sharing.agreements.terminated", 0);
        counter!("sharing.agreements.disputed", 0);

        AgreementManager { common }
    }

    /// Records `party`'s signature. The agreement turns Active in the same
    /// row update that stores the second signature.
    pub async fn sign(
        &self,
        agreement_id: &AgreementId,
        caller: &TenantId,
        party: Party,
    ) -> Result<ClientAgreement, AgreementError> {
        let agreement = self
            .common
            .db
            .as_dao::<AgreementDao>()
            .sign(agreement_id, party, caller)
            .await
            .map_err(|e| map_dao_error(agreement_id, e))?;

        counter!("sharing.agreements.signed", 1);
        log::info!(
            "Agreement [{}] signed by the {:?} side [{}].",
            agreement.id,
            party,
            caller
        );

        let mut notification = SharingNotification::request(
            SharingEventType::AgreementSigned,
            &agreement.request_id,
            caller,
        )
        .with_agreement(&agreement.id);
        if agreement.state == AgreementState::Active {
            counter!("sharing.agreements.activated", 1);
            log::info!("Agreement [{}] is now active; both parties signed.", agreement.id);
            notification.event_type = SharingEventType::AgreementActivated;
        }
        self.common.broadcast(notification).await;

        Ok(agreement.into_client())
    }

    /// Ends an active agreement early, independent of transfer state.
    pub async fn terminate(
        &self,
        agreement_id: &AgreementId,
        caller: &TenantId,
        reason: Reason,
    ) -> Result<ClientAgreement, AgreementError> {
        let agreement = self
            .common
            .db
            .as_dao::<AgreementDao>()
            .terminate(agreement_id, caller, Some(reason.message.clone()))
            .await
            .map_err(|e| map_dao_error(agreement_id, e))?;

        counter!("sharing.agreements.terminated", 1);
        log::info!(
            "Agreement [{}] terminated by [{}]. Reason: {}.",
            agreement.id,
            caller,
            reason.message
        );

        self.common
            .broadcast(
                SharingNotification::request(
                    SharingEventType::AgreementTerminated,
                    &agreement.request_id,
                    caller,
                )
                .with_agreement(&agreement.id)
                .with_reason(Some(reason.message)),
            )
            .await;
        Ok(agreement.into_client())
    }

    /// Marks an active agreement as contested. Disputed is terminal here;
    /// resolution happens outside this workflow.
    pub async fn dispute(
        &self,
        agreement_id: &AgreementId,
        caller: &TenantId,
        reason: Reason,
    ) -> Result<ClientAgreement, AgreementError> {
        let agreement = self
            .common
            .db
            .as_dao::<AgreementDao>()
            .dispute(agreement_id, caller, Some(reason.message.clone()))
            .await
            .map_err(|e| map_dao_error(agreement_id, e))?;

        counter!("sharing.agreements.disputed", 1);
        log::info!(
            "Agreement [{}] disputed by [{}]. Reason: {}.",
            agreement.id,
            caller,
            reason.message
        );

        self.common
            .broadcast(
                SharingNotification::request(
                    SharingEventType::AgreementDisputed,
                    &agreement.request_id,
                    caller,
                )
                .with_agreement(&agreement.id)
                .with_reason(Some(reason.message)),
            )
            .await;
        Ok(agreement.into_client())
    }

    pub async fn get_agreement(
        &self,
        agreement_id: &AgreementId,
    ) -> Result<ClientAgreement, AgreementError> {
        Ok(self
            .common
            .db
            .as_dao::<AgreementDao>()
            .get(agreement_id)
            .await
            .map_err(|e| AgreementError::Db(agreement_id.clone(), e))?
            .ok_or_else(|| AgreementError::NotFound(agreement_id.clone()))?
            .into_client())
    }
}

fn map_dao_error(agreement_id: &AgreementId, e: AgreementDaoError) -> AgreementError {
    match e {
        AgreementDaoError::NotFound(id) => AgreementError::NotFound(id),
        AgreementDaoError::Unauthorized(id, party) => AgreementError::Unauthorized(id, party),
        AgreementDaoError::AlreadySigned(id, party) => AgreementError::AlreadySigned(id, party),
        AgreementDaoError::InvalidState { id, from, expected } => {
            AgreementError::InvalidState { id, from, expected }
        }
        AgreementDaoError::Concurrent(id) => AgreementError::Conflict(id),
        AgreementDaoError::Db(e) => AgreementError::Db(agreement_id.clone(), e),
    }
}
