use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use auditdesk_config::AuditDeskConfig;
use auditdesk_core::identity::Actor;
use auditdesk_db::service::AuditService;
use auditdesk_engine::{AuditItemStore, StoreSettings};
use auditdesk_storage::EvidenceBucket;

pub type Store = AuditItemStore<AuditService, EvidenceBucket>;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: Arc<AuditService>,
    pub store: Store,
    pub actor: Actor,
}

impl AppContext {
    pub async fn init(config: &AuditDeskConfig, actor: Actor) -> anyhow::Result<Self> {
        if !config.database.is_in_memory()
            && let Some(parent) = Path::new(&config.database.path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let service = Arc::new(
            AuditService::new_local(&config.database.path)
                .await
                .with_context(|| format!("failed to open database {}", config.database.path))?,
        );

        let bucket = EvidenceBucket::from_config(&config.storage)
            .context("failed to initialize evidence storage")?;
        tracing::debug!(
            backend = ?config.storage.backend,
            prefix = bucket.prefix(),
            "evidence storage ready"
        );

        let store = AuditItemStore::new(
            Arc::clone(&service),
            Arc::new(bucket),
            StoreSettings::from(config),
        );

        Ok(Self {
            service,
            store,
            actor,
        })
    }
}
