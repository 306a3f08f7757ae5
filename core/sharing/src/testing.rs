//! Internals re-exported for integration tests, plus in-memory stand-ins for
//! the external collaborators.

use std::collections::HashMap;
use std::sync::Mutex;

use medshare_client_model::{EquipmentId, TenantId};

use crate::notification::{NotificationSink, SharingNotification};

pub use crate::db::dao::{AgreementDao, EventsDao, RequestDao, TransferDao};
pub use crate::db::model::{
    AgreementState, RequestState, RequestType, SharingAgreement, SharingRequest, SharingTransfer,
    TransferState, TransferType,
};
pub use crate::workflow::error::{
    AgreementError, CancelError, QueryEventsError, RequestError, RespondError, TransferError,
};
pub use crate::workflow::{EventNotifier, NotifierError};

/// Equipment directory with a fixed ownership table.
#[derive(Default)]
pub struct StaticEquipmentDirectory {
    owners: HashMap<EquipmentId, TenantId>,
}

impl StaticEquipmentDirectory {
    pub fn new(entries: Vec<(EquipmentId, TenantId)>) -> StaticEquipmentDirectory {
        StaticEquipmentDirectory {
            owners: entries.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl crate::equipment::EquipmentDirectory for StaticEquipmentDirectory {
    async fn resolve_owner(&self, equipment_id: &EquipmentId) -> Option<TenantId> {
        self.owners.get(equipment_id).cloned()
    }
}

/// Notification sink remembering everything it was handed.
#[derive(Default)]
pub struct CollectingSink {
    notifications: Mutex<Vec<SharingNotification>>,
}

impl CollectingSink {
    pub fn collected(&self) -> Vec<SharingNotification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotificationSink for CollectingSink {
    async fn notify(&self, notification: &SharingNotification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }
}
