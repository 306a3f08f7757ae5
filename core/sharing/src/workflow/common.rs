use std::sync::Arc;

use medshare_client_model::RequestId;
use medshare_persistence::executor::DbExecutor;

use crate::notification::{NotificationSink, SharingNotification};
use crate::workflow::notifier::EventNotifier;

/// State shared by all workflow brokers: the database handle, the in-process
/// wake-up channel keyed by request and the external notification sink.
#[derive(Clone)]
pub struct CommonBroker {
    pub(crate) db: DbExecutor,
    pub(crate) request_notifier: EventNotifier<RequestId>,
    pub(crate) sink: Arc<dyn NotificationSink>,
}

impl CommonBroker {
    pub fn new(
        db: DbExecutor,
        request_notifier: EventNotifier<RequestId>,
        sink: Arc<dyn NotificationSink>,
    ) -> CommonBroker {
        CommonBroker {
            db,
            request_notifier,
            sink,
        }
    }

    /// Fans a state change out to observers. Strictly fire-and-forget: the
    /// workflow has already committed and must not fail here.
    pub(crate) async fn broadcast(&self, notification: SharingNotification) {
        self.request_notifier
            .notify(&notification.request_id)
            .await;
        self.sink.notify(&notification).await;
    }
}
