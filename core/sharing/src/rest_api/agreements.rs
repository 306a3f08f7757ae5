use actix_web::web::{Data, Json, Path};
use actix_web::{HttpResponse, Responder, Scope};
use std::sync::Arc;

use medshare_client_model::sharing::Reason;

use super::{PathAgreement, SignaturePayload, TenantIdentity};
use crate::service::SharingService;

pub fn register_endpoints(scope: Scope) -> Scope {
    scope
        .service(get_agreement)
        .service(sign_agreement)
        .service(terminate_agreement)
        .service(dispute_agreement)
}

#[actix_web::get("/agreements/{agreement_id}")]
async fn get_agreement(
    service: Data<Arc<SharingService>>,
    path: Path<PathAgreement>,
    _id: TenantIdentity,
) -> impl Responder {
    service
        .agreements
        .get_agreement(&path.into_inner().agreement_id)
        .await
        .map(|agreement| HttpResponse::Ok().json(agreement))
}

#[actix_web::post("/agreements/{agreement_id}/sign")]
async fn sign_agreement(
    service: Data<Arc<SharingService>>,
    path: Path<PathAgreement>,
    body: Json<SignaturePayload>,
    id: TenantIdentity,
) -> impl Responder {
    service
        .agreements
        .sign(&path.into_inner().agreement_id, &id.tenant, body.party)
        .await
        .map(|agreement| HttpResponse::Ok().json(agreement))
}

#[actix_web::post("/agreements/{agreement_id}/terminate")]
async fn terminate_agreement(
    service: Data<Arc<SharingService>>,
    path: Path<PathAgreement>,
    body: Json<Reason>,
    id: TenantIdentity,
) -> impl Responder {
    service
        .agreements
        .terminate(&path.into_inner().agreement_id, &id.tenant, body.into_inner())
        .await
        .map(|agreement| HttpResponse::Ok().json(agreement))
}

#[actix_web::post("/agreements/{agreement_id}/dispute")]
async fn dispute_agreement(
    service: Data<Arc<SharingService>>,
    path: Path<PathAgreement>,
    body: Json<Reason>,
    id: TenantIdentity,
) -> impl Responder {
    service
        .agreements
        .dispute(&path.into_inner().agreement_id, &id.tenant, body.into_inner())
        .await
        .map(|agreement| HttpResponse::Ok().json(agreement))
}
