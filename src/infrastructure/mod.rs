//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Database connection and migrations (db)
//! - Configuration loading (config)
//! - Repository implementations (repositories)
//! - Audit logging over tracing (audit)
//! - Application state (state)

pub mod audit;
pub mod config;
pub mod db;
pub mod repositories;
pub mod state;

pub use audit::TracingAuditLog;
pub use repositories::*;
pub use state::AppState;
