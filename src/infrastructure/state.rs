//! Application state wiring the store, audit log and pipeline services

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{AuditLog, CatalogRepository};
use crate::infrastructure::config::Config;
use crate::infrastructure::{SeaOrmCatalogRepository, TracingAuditLog};
use crate::services::{FieldNormalizer, IngestionDriver, ScopeFilter};

#[derive(Clone)]
pub struct AppState {
    /// Catalog repository
    pub repo: Arc<dyn CatalogRepository>,
    /// Audit sink for rejections and purges
    pub audit: Arc<dyn AuditLog>,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState backed by SeaORM and the tracing audit log
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self {
            repo: Arc::new(SeaOrmCatalogRepository::new(db)),
            audit: Arc::new(TracingAuditLog),
            config,
        }
    }

    pub fn ingestion_driver(&self) -> IngestionDriver {
        IngestionDriver::new(
            self.repo.clone(),
            FieldNormalizer::default(),
            self.audit.clone(),
        )
    }

    pub fn scope_filter(&self) -> ScopeFilter {
        ScopeFilter::new(self.config.scope.clone(), self.audit.clone())
    }
}
