use std::sync::Arc;

use crate::config::{AppConfig, PaginationConfig, SecurityConfig};
use crate::database::store::Store;
use crate::services::branch_service::BranchService;

/// Shared handler state; cheap to clone per request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub branches: BranchService,
    pub pagination: PaginationConfig,
    pub security: SecurityConfig,
    pub request_logging: bool,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        pagination: PaginationConfig,
        security: SecurityConfig,
    ) -> Self {
        Self {
            branches: BranchService::new(store.clone()),
            store,
            pagination,
            security,
            request_logging: true,
        }
    }

    pub fn from_config(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        Self::new(store, config.pagination.clone(), config.security.clone())
            .with_request_logging(config.server.enable_request_logging)
    }

    /// Toggle the per-request `TraceLayer`
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }
}
