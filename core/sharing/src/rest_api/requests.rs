use actix_web::web::{Data, Json, Path};
use actix_web::{HttpResponse, Responder, Scope};
use std::sync::Arc;

use medshare_client_model::sharing::{NewRequest, RequestDecision};

use super::{PathRequest, TenantIdentity};
use crate::service::SharingService;

pub fn register_endpoints(scope: Scope) -> Scope {
    scope
        .service(create_request)
        .service(list_requests)
        .service(get_request)
        .service(cancel_request)
        .service(respond_to_request)
        .service(list_request_transfers)
}

#[actix_web::post("/requests")]
async fn create_request(
    service: Data<Arc<SharingService>>,
    body: Json<NewRequest>,
    id: TenantIdentity,
) -> impl Responder {
    service
        .requests
        .create_request(id.tenant, body.into_inner())
        .await
        .map(|request| HttpResponse::Created().json(request))
}

#[actix_web::get("/requests")]
async fn list_requests(service: Data<Arc<SharingService>>, id: TenantIdentity) -> impl Responder {
    service
        .requests
        .list_requests(&id.tenant)
        .await
        .map(|requests| HttpResponse::Ok().json(requests))
}

#[actix_web::get("/requests/{request_id}")]
async fn get_request(
    service: Data<Arc<SharingService>>,
    path: Path<PathRequest>,
    _id: TenantIdentity,
) -> impl Responder {
    service
        .requests
        .get_request(&path.into_inner().request_id)
        .await
        .map(|request| HttpResponse::Ok().json(request))
}

#[actix_web::post("/requests/{request_id}/cancel")]
async fn cancel_request(
    service: Data<Arc<SharingService>>,
    path: Path<PathRequest>,
    id: TenantIdentity,
) -> impl Responder {
    service
        .requests
        .cancel_request(&path.into_inner().request_id, &id.tenant)
        .await
        .map(|request| HttpResponse::Ok().json(request))
}

#[actix_web::post("/requests/{request_id}/respond")]
async fn respond_to_request(
    service: Data<Arc<SharingService>>,
    path: Path<PathRequest>,
    body: Json<RequestDecision>,
    id: TenantIdentity,
) -> impl Responder {
    service
        .approvals
        .respond(&path.into_inner().request_id, &id.tenant, body.into_inner())
        .await
        .map(|outcome| HttpResponse::Ok().json(outcome))
}

#[actix_web::get("/requests/{request_id}/transfers")]
async fn list_request_transfers(
    service: Data<Arc<SharingService>>,
    path: Path<PathRequest>,
    _id: TenantIdentity,
) -> impl Responder {
    service
        .transfers
        .list_transfers(&path.into_inner().request_id)
        .await
        .map(|transfers| HttpResponse::Ok().json(transfers))
}
