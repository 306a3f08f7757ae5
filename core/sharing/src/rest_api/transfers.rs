use actix_web::web::{Data, Json, Path};
use actix_web::{HttpResponse, Responder, Scope};
use std::sync::Arc;

use super::{PathTransfer, TenantIdentity, TransferAdvanceBody};
use crate::service::SharingService;

pub fn register_endpoints(scope: Scope) -> Scope {
    scope.service(get_transfer).service(advance_transfer)
}

#[actix_web::get("/transfers/{transfer_id}")]
async fn get_transfer(
    service: Data<Arc<SharingService>>,
    path: Path<PathTransfer>,
    _id: TenantIdentity,
) -> impl Responder {
    service
        .transfers
        .get_transfer(&path.into_inner().transfer_id)
        .await
        .map(|transfer| HttpResponse::Ok().json(transfer))
}

#[actix_web::post("/transfers/{transfer_id}/advance")]
async fn advance_transfer(
    service: Data<Arc<SharingService>>,
    path: Path<PathTransfer>,
    body: Json<TransferAdvanceBody>,
    id: TenantIdentity,
) -> impl Responder {
    let TransferAdvanceBody { new_state, update } = body.into_inner();
    service
        .transfers
        .advance(&path.into_inner().transfer_id, &id.tenant, new_state, update)
        .await
        .map(|transfer| HttpResponse::Ok().json(transfer))
}
