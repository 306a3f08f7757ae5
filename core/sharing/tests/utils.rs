#![allow(dead_code)]

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};

use medshare_client_model::sharing::{
    Decision, DecisionOutcome, NewRequest, RequestDecision, RequestType, Urgency,
};
use medshare_client_model::{EquipmentId, TenantId};
use medshare_persistence::executor::DbExecutor;
use medshare_sharing::testing::{CollectingSink, StaticEquipmentDirectory};
use medshare_sharing::{Config, SharingService};

/// One in-process sharing service over a fresh database, together with
/// handles to its test collaborators.
pub struct SharingHarness {
    pub service: Arc<SharingService>,
    pub sink: Arc<CollectingSink>,
}

impl SharingHarness {
    /// Builds a service over a clean database under
    /// `tests/test-workdir/<name>`, with a fixed equipment ownership table.
    pub fn new<Str: AsRef<str>>(
        name: Str,
        equipment: Vec<(&str, &str)>,
    ) -> Result<SharingHarness> {
        let test_dir = prepare_test_dir(name.as_ref())?;
        let db = DbExecutor::from_data_dir(&test_dir, "medshare")
            .map_err(|e| anyhow!("Failed to create db in [{:?}]. Error: {}", test_dir, e))?;

        let entries = equipment
            .into_iter()
            .map(|(equipment, owner)| Ok((equipment.parse()?, owner.parse()?)))
            .collect::<Result<Vec<(EquipmentId, TenantId)>>>()?;

        let sink = Arc::new(CollectingSink::default());
        let service = Arc::new(SharingService::new(
            &db,
            Arc::new(StaticEquipmentDirectory::new(entries)),
            sink.clone(),
            Arc::new(Config::from_env()?),
        )?);
        Ok(SharingHarness { service, sink })
    }
}

pub fn tenant(name: &str) -> TenantId {
    name.parse().unwrap()
}

pub fn equipment(name: &str) -> EquipmentId {
    name.parse().unwrap()
}

/// A plausible two-week borrow starting tomorrow.
pub fn borrow_request(equipment_id: &str, owner: &str) -> NewRequest {
    new_request(equipment_id, owner, RequestType::Borrow)
}

pub fn purchase_request(equipment_id: &str, owner: &str) -> NewRequest {
    new_request(equipment_id, owner, RequestType::Purchase)
}

pub fn new_request(equipment_id: &str, owner: &str, request_type: RequestType) -> NewRequest {
    NewRequest {
        equipment_id: equipment(equipment_id),
        owning_tenant_id: tenant(owner),
        request_type,
        start_date: Utc::now() + Duration::days(1),
        end_date: Utc::now() + Duration::days(14),
        purpose: Some("Ward overflow".to_string()),
        notes: None,
        urgency: Urgency::Normal,
    }
}

pub fn approve() -> RequestDecision {
    RequestDecision {
        decision: Decision::Approved,
        response_notes: None,
    }
}

pub fn reject(notes: &str) -> RequestDecision {
    RequestDecision {
        decision: Decision::Rejected,
        response_notes: Some(notes.to_string()),
    }
}

/// Files a request as `requester` and approves it as `owner`, returning the
/// full decision outcome.
pub async fn approved_request(
    service: &SharingService,
    body: NewRequest,
    requester: &str,
    owner: &str,
) -> Result<DecisionOutcome> {
    let request = service
        .requests
        .create_request(tenant(requester), body)
        .await?;
    Ok(service
        .approvals
        .respond(&request.request_id, &tenant(owner), approve())
        .await?)
}

fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/test-workdir")
}

fn prepare_test_dir(dir_name: &str) -> Result<PathBuf> {
    let test_dir: PathBuf = test_data_dir().join(dir_name);

    if test_dir.exists() {
        fs::remove_dir_all(&test_dir)
            .with_context(|| format!("Removing test directory: {}", test_dir.display()))?;
    }
    fs::create_dir_all(&test_dir)
        .with_context(|| format!("Creating test directory: {}", test_dir.display()))?;
    Ok(test_dir)
}
