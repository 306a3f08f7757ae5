use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use medshare_client_model::{EquipmentId, TenantId};

/// Lookup into the external equipment catalog. Wrapped in a trait so tests
/// can substitute a static directory for the real one.
#[async_trait::async_trait]
pub trait EquipmentDirectory: Send + Sync {
    /// Resolves a piece of equipment to the tenant owning it, or `None` when
    /// the directory doesn't know the id.
    async fn resolve_owner(&self, equipment_id: &EquipmentId) -> Option<TenantId>;
}

/// Directory backed by a JSON registry file mapping equipment ids to owning
/// tenants, loaded once at startup.
pub struct RegistryFile {
    owners: HashMap<EquipmentId, TenantId>,
}

impl RegistryFile {
    pub fn load(path: &Path) -> anyhow::Result<RegistryFile> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Reading equipment registry: {}", path.display()))?;
        let raw: HashMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("Parsing equipment registry: {}", path.display()))?;

        let mut owners = HashMap::new();
        for (equipment, tenant) in raw {
            owners.insert(
                equipment
                    .parse::<EquipmentId>()
                    .with_context(|| format!("Invalid equipment id [{}] in registry", equipment))?,
                tenant
                    .parse::<TenantId>()
                    .with_context(|| format!("Invalid tenant id [{}] in registry", tenant))?,
            );
        }
        log::info!(
            "Loaded {} equipment entries from {}.",
            owners.len(),
            path.display()
        );
        Ok(RegistryFile { owners })
    }
}

#[async_trait::async_trait]
impl EquipmentDirectory for RegistryFile {
    async fn resolve_owner(&self, equipment_id: &EquipmentId) -> Option<TenantId> {
        self.owners.get(equipment_id).cloned()
    }
}
