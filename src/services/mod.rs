//! Services Layer
//!
//! Pipeline logic: normalization, version resolution, ingestion and scope
//! filtering. Services receive their store and audit handles explicitly.

pub mod ingestion_service;
pub mod normalizer;
pub mod scope_filter;
pub mod version_resolver;

// Re-export for convenience
pub use ingestion_service::{IngestReport, IngestionDriver};
pub use normalizer::{FieldNormalizer, NormalizedRecord, TagRegistry};
pub use scope_filter::{ScopeFilter, ScopePolicy, ScopeReport};
pub use version_resolver::{ResolveOutcome, Resolution};
