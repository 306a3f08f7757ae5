use metrics::counter;
use std::sync::Arc;

use medshare_client_model::sharing::{NewRequest, Request as ClientRequest, SharingEventType};
use medshare_client_model::{RequestId, TenantId};

use crate::db::dao::{RequestDao, RequestDaoError};
use crate::db::model::SharingRequest;
use crate::equipment::EquipmentDirectory;
use crate::notification::SharingNotification;
use crate::workflow::common::CommonBroker;
use crate::workflow::error::{CancelError, RequestError};

/// Entry point of the workflow: files and withdraws sharing requests.
#[derive(Clone)]
pub struct RequestLedger {
    pub(crate) common: CommonBroker,
    equipment: Arc<dyn EquipmentDirectory>,
}

impl RequestLedger {
    pub fn new(common: CommonBroker, equipment: Arc<dyn EquipmentDirectory>) -> RequestLedger {
        // Initialize counters to 0 value. Otherwise they won't appear on
        // metrics endpoint until first change to value will be made.
        counter!("sharing.requests.created", 0);
        counter!("sharing.requests.cancelled", 0);

        RequestLedger { common, equipment }
    }

    pub async fn create_request(
        &self,
        caller: TenantId,
        body: NewRequest,
    ) -> Result<ClientRequest, RequestError> {
        if body.start_date >= body.end_date {
            return Err(RequestError::InvalidDateRange {
                start: body.start_date,
                end: body.end_date,
            });
        }
        if caller == body.owning_tenant_id {
            return Err(RequestError::OwnEquipment(caller, body.equipment_id));
        }

        let owner = self
            .equipment
            .resolve_owner(&body.equipment_id)
            .await
            .ok_or_else(|| RequestError::EquipmentNotFound(body.equipment_id.clone()))?;
        if owner != body.owning_tenant_id {
            return Err(RequestError::NotOwnedBy(
                body.equipment_id,
                body.owning_tenant_id,
            ));
        }

        let request = SharingRequest::new(caller, body);
        let request = self
            .common
            .db
            .as_dao::<RequestDao>()
            .create(request)
            .await
            .map_err(RequestError::Save)?;

        counter!("sharing.requests.created", 1);
        log::info!(
            "Tenant [{}] requested {} of equipment [{}] from [{}]. Request [{}].",
            request.requesting_tenant_id,
            request.request_type,
            request.equipment_id,
            request.owning_tenant_id,
            request.id
        );

        self.common
            .broadcast(SharingNotification::request(
                SharingEventType::RequestCreated,
                &request.id,
                &request.requesting_tenant_id,
            ))
            .await;
        Ok(request.into_client())
    }

    pub async fn cancel_request(
        &self,
        request_id: &RequestId,
        caller: &TenantId,
    ) -> Result<ClientRequest, CancelError> {
        let request = self
            .common
            .db
            .as_dao::<RequestDao>()
            .cancel(request_id, caller)
            .await
            .map_err(|e| match e {
                RequestDaoError::NotFound(id) => CancelError::NotFound(id),
                RequestDaoError::Unauthorized(id, owner) => CancelError::Unauthorized(id, owner),
                RequestDaoError::InvalidTransition { id, from, .. } => {
                    CancelError::InvalidState(id, from)
                }
                RequestDaoError::Concurrent(id) => CancelError::Conflict(id),
                RequestDaoError::Db(e) => CancelError::Db(request_id.clone(), e),
            })?;

        counter!("sharing.requests.cancelled", 1);
        log::info!("Request [{}] cancelled by requester.", request.id);

        self.common
            .broadcast(SharingNotification::request(
                SharingEventType::RequestCancelled,
                &request.id,
                caller,
            ))
            .await;
        Ok(request.into_client())
    }

    pub async fn get_request(&self, request_id: &RequestId) -> Result<ClientRequest, RequestError> {
        Ok(self
            .common
            .db
            .as_dao::<RequestDao>()
            .get(request_id)
            .await
            .map_err(|e| RequestError::Get(request_id.clone(), e))?
            .ok_or_else(|| RequestError::NotFound(request_id.clone()))?
            .into_client())
    }

    pub async fn list_requests(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<ClientRequest>, RequestError> {
        Ok(self
            .common
            .db
            .as_dao::<RequestDao>()
            .list_for_tenant(tenant)
            .await
            .map_err(RequestError::List)?
            .into_iter()
            .map(SharingRequest::into_client)
            .collect())
    }
}
