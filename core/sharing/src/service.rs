use actix_web::web::Data;
use std::sync::Arc;
use thiserror::Error;

use medshare_client_model::sharing::SharingEvent as ClientEvent;
use medshare_client_model::RequestId;
use medshare_persistence::executor::DbExecutor;

use crate::config::Config;
use crate::db::dao::EventsDao;
use crate::db::model::SharingEvent;
use crate::equipment::EquipmentDirectory;
use crate::notification::NotificationSink;
use crate::rest_api;
use crate::workflow::error::QueryEventsError;
use crate::workflow::{
    AgreementManager, ApprovalCoordinator, CommonBroker, EventNotifier, RequestLedger,
    TransferTracker,
};

#[derive(Error, Debug)]
pub enum SharingInitError {
    #[error("Failed to migrate sharing database. Error: {0}.")]
    Migration(#[from] anyhow::Error),
    #[error("Failed to initialize config. Error: {0}.")]
    Config(#[from] clap::Error),
}

/// Structure connecting all sharing workflow objects. Owns its database
/// handle and the in-process notifier; created once at daemon startup (or per
/// test) and shared behind an `Arc`.
pub struct SharingService {
    pub db: DbExecutor,
    pub requests: RequestLedger,
    pub approvals: ApprovalCoordinator,
    pub agreements: AgreementManager,
    pub transfers: TransferTracker,
    config: Arc<Config>,
    notifier: EventNotifier<RequestId>,
}

impl SharingService {
    pub fn new(
        db: &DbExecutor,
        equipment: Arc<dyn EquipmentDirectory>,
        sink: Arc<dyn NotificationSink>,
        config: Arc<Config>,
    ) -> Result<Self, SharingInitError> {
        db.apply_migration(crate::db::migrations::run_with_output)?;

        let notifier = EventNotifier::<RequestId>::new();
        let common = CommonBroker::new(db.clone(), notifier.clone(), sink);

        Ok(SharingService {
            db: db.clone(),
            requests: RequestLedger::new(common.clone(), equipment),
            approvals: ApprovalCoordinator::new(common.clone()),
            agreements: AgreementManager::new(common.clone()),
            transfers: TransferTracker::new(common),
            config,
            notifier,
        })
    }

    pub fn bind_rest(myself: Arc<SharingService>) -> actix_web::Scope {
        let scope = actix_web::web::scope(rest_api::SHARING_API_PATH)
            .app_data(Data::new(myself))
            .app_data(rest_api::path_config());
        let scope = rest_api::requests::register_endpoints(scope);
        let scope = rest_api::agreements::register_endpoints(scope);
        let scope = rest_api::transfers::register_endpoints(scope);
        rest_api::events::register_endpoints(scope)
    }

    /// Wake-up channel observers can use to learn that "something happened"
    /// to a request. Best-effort; woken observers re-read state.
    pub fn notifier(&self) -> EventNotifier<RequestId> {
        self.notifier.clone()
    }

    /// One page of the change feed, oldest first, starting after
    /// `after_event_id`.
    pub async fn query_events(
        &self,
        after_event_id: i32,
        max_events: Option<i32>,
    ) -> Result<Vec<ClientEvent>, QueryEventsError> {
        let max_allowed = self.config.events.max_events_max;
        let max_events = max_events.unwrap_or(self.config.events.max_events_default);
        if max_events < 1 || max_events > max_allowed {
            return Err(QueryEventsError::InvalidMaxEvents(max_events, max_allowed));
        }

        Ok(self
            .db
            .as_dao::<EventsDao>()
            .take_events(after_event_id, max_events)
            .await
            .map_err(QueryEventsError::Db)?
            .into_iter()
            .map(SharingEvent::into_client)
            .collect())
    }
}
