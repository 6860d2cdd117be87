//! Domain layer - Pure pipeline abstractions
//!
//! This layer contains NO framework dependencies (no SeaORM entities).
//! Only value types, trait definitions and domain error types.

pub mod audit;
pub mod catalog;
pub mod errors;
pub mod repositories;

pub use audit::{AuditContext, AuditLog, ScopeFailures};
pub use catalog::*;
pub use errors::DomainError;
pub use repositories::*;
