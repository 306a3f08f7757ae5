use actix_web::web::{Data, Query};
use actix_web::{HttpResponse, Responder, Scope};
use std::sync::Arc;

use super::{QueryEvents, TenantIdentity};
use crate::service::SharingService;

pub fn register_endpoints(scope: Scope) -> Scope {
    scope.service(query_events)
}

#[actix_web::get("/events")]
async fn query_events(
    service: Data<Arc<SharingService>>,
    query: Query<QueryEvents>,
    _id: TenantIdentity,
) -> impl Responder {
    let query = query.into_inner();
    service
        .query_events(query.after_event_id, query.max_events)
        .await
        .map(|events| HttpResponse::Ok().json(events))
}
