//! Repository trait definitions
//!
//! These traits define the contract for catalog storage.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::DomainError;
use super::catalog::{
    FieldKind, FileType, RecordRef, RecordType, SourceFile, StoredField, StoredSubfield,
};

/// Row-level catalog store operations.
///
/// Implemented both by the repository itself (autocommit) and by a unit of
/// work, so services can run the same code inside or outside a transaction.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Find a registered source file by its identity
    async fn find_source_file(
        &self,
        institution_code: &str,
        filename: &str,
        modification_timestamp: i64,
    ) -> Result<Option<SourceFile>, DomainError>;

    /// Register a newly discovered source file
    async fn insert_source_file(
        &self,
        institution_code: &str,
        filename: &str,
        modification_timestamp: i64,
        file_type: FileType,
    ) -> Result<SourceFile, DomainError>;

    /// Flag a source file as fully ingested
    async fn mark_source_file_completed(&self, file_id: i32) -> Result<(), DomainError>;

    async fn get_source_file(&self, file_id: i32) -> Result<Option<SourceFile>, DomainError>;

    /// Find the current record for a dedup key
    async fn find_record(
        &self,
        institution_code: &str,
        record_type: RecordType,
        control_identifier: &str,
    ) -> Result<Option<RecordRef>, DomainError>;

    async fn get_record(&self, record_id: i32) -> Result<Option<RecordRef>, DomainError>;

    async fn get_modification_timestamp(&self, record_id: i32) -> Result<f64, DomainError>;

    /// Insert a record owned by `file_id`; the institution is taken from the file
    async fn insert_record(
        &self,
        file_id: i32,
        record_type: RecordType,
        control_identifier: &str,
        modification_timestamp: f64,
    ) -> Result<i32, DomainError>;

    async fn update_modification_timestamp(
        &self,
        record_id: i32,
        modification_timestamp: f64,
    ) -> Result<(), DomainError>;

    /// Re-point a record at `file_id` and clear its processed/exported flags
    async fn reset_record(&self, record_id: i32, file_id: i32) -> Result<(), DomainError>;

    async fn insert_field(
        &self,
        record_id: i32,
        tag: &str,
        value: &str,
        kind: FieldKind,
    ) -> Result<i32, DomainError>;

    async fn insert_subfield(
        &self,
        field_id: i32,
        code: &str,
        value: &str,
    ) -> Result<i32, DomainError>;

    async fn list_field_ids(&self, record_id: i32) -> Result<Vec<i32>, DomainError>;

    async fn list_fields(&self, record_id: i32) -> Result<Vec<StoredField>, DomainError>;

    async fn list_subfields(&self, field_id: i32) -> Result<Vec<StoredSubfield>, DomainError>;

    async fn delete_subfields(&self, field_id: i32) -> Result<(), DomainError>;

    async fn delete_fields(&self, record_id: i32) -> Result<(), DomainError>;

    async fn delete_record(&self, record_id: i32) -> Result<(), DomainError>;

    async fn list_unprocessed_record_ids(&self) -> Result<Vec<i32>, DomainError>;

    async fn mark_processed(&self, record_id: i32) -> Result<(), DomainError>;

    /// Values of every field with `tag`, in insertion order
    async fn field_values(&self, record_id: i32, tag: &str) -> Result<Vec<String>, DomainError>;

    /// Value of the first field with `tag`
    async fn field_value(&self, record_id: i32, tag: &str) -> Result<Option<String>, DomainError> {
        Ok(self.field_values(record_id, tag).await?.into_iter().next())
    }

    /// Values of subfield `code` across every field with `tag`
    async fn subfield_values(
        &self,
        record_id: i32,
        tag: &str,
        code: &str,
    ) -> Result<Vec<String>, DomainError>;

    async fn count_records(&self) -> Result<u64, DomainError>;
}

/// An open unit of work. Dropping it without `commit` discards every write.
#[async_trait]
pub trait CatalogUnit: CatalogStore {
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}

/// Entry point handed to services: a store that can open units of work.
#[async_trait]
pub trait CatalogRepository: CatalogStore {
    async fn begin(&self) -> Result<Box<dyn CatalogUnit>, DomainError>;
}
