use std::sync::Arc;

use slateforge_core::{AuditStore, Config, PipelineOrchestrator, SanitizedConfig, SlateStore};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn SlateStore>,
    orchestrator: Arc<PipelineOrchestrator>,
    audit_store: Arc<dyn AuditStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn SlateStore>,
        orchestrator: Arc<PipelineOrchestrator>,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            config,
            store,
            orchestrator,
            audit_store,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &Arc<dyn SlateStore> {
        &self.store
    }

    pub fn orchestrator(&self) -> &Arc<PipelineOrchestrator> {
        &self.orchestrator
    }

    pub fn audit_store(&self) -> &Arc<dyn AuditStore> {
        &self.audit_store
    }
}
