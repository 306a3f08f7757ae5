use medshare_client_model::sharing::SharingEventType;
use medshare_client_model::{AgreementId, RequestId, TenantId, TransferId};

/// User-facing description of one workflow state change, handed to the
/// notification sink after the change has committed.
#[derive(Clone, Debug, PartialEq)]
pub struct SharingNotification {
    pub event_type: SharingEventType,
    pub request_id: RequestId,
    pub agreement_id: Option<AgreementId>,
    pub transfer_id: Option<TransferId>,
    pub issuer_tenant_id: TenantId,
    pub reason: Option<String>,
}

impl SharingNotification {
    pub fn request(
        event_type: SharingEventType,
        request_id: &RequestId,
        issuer: &TenantId,
    ) -> SharingNotification {
        SharingNotification {
            event_type,
            request_id: request_id.clone(),
            agreement_id: None,
            transfer_id: None,
            issuer_tenant_id: issuer.clone(),
            reason: None,
        }
    }

    pub fn with_agreement(mut self, agreement_id: &AgreementId) -> SharingNotification {
        self.agreement_id = Some(agreement_id.clone());
        self
    }

    pub fn with_transfer(mut self, transfer_id: &TransferId) -> SharingNotification {
        self.transfer_id = Some(transfer_id.clone());
        self
    }

    pub fn with_reason(mut self, reason: Option<String>) -> SharingNotification {
        self.reason = reason;
        self
    }
}

/// Delivery channel for user-facing alerts. Implementations must swallow
/// their own failures; workflow correctness never depends on a notification
/// arriving.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: &SharingNotification);
}

/// Default sink: notifications end up in the service log only.
pub struct LoggingSink;

#[async_trait::async_trait]
impl NotificationSink for LoggingSink {
    async fn notify(&self, notification: &SharingNotification) {
        log::debug!(
            "Notification: {:?} for Request [{}] issued by [{}].",
            notification.event_type,
            notification.request_id,
            notification.issuer_tenant_id
        );
    }
}
