//! Version Resolver - one current version per control key
//!
//! `decide` is the pure state machine; `resolve` runs it against a store and
//! performs the matching mutation. Callers run `resolve` inside a unit of work
//! so the read and the writes commit together.

use serde::Serialize;

use crate::domain::{CatalogStore, DomainError, FieldKind, RecordRef, SourceFile};
use crate::services::normalizer::NormalizedRecord;

/// What to do with an incoming record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// No stored record for the key
    Insert,
    /// Stored record is older than the incoming one
    Replace { record_id: i32, stored_timestamp: f64 },
    /// Stored record is as fresh or fresher
    Skip { record_id: i32, stored_timestamp: f64 },
}

/// Outcome of resolving one record against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveOutcome {
    Inserted { record_id: i32 },
    Replaced { record_id: i32 },
    Skipped { record_id: i32 },
}

impl ResolveOutcome {
    pub fn record_id(&self) -> i32 {
        match self {
            ResolveOutcome::Inserted { record_id }
            | ResolveOutcome::Replaced { record_id }
            | ResolveOutcome::Skipped { record_id } => *record_id,
        }
    }
}

/// Equal timestamps are not fresher: re-reading a file never mutates the store.
pub fn decide(existing: Option<&RecordRef>, incoming_timestamp: f64) -> Resolution {
    match existing {
        None => Resolution::Insert,
        Some(stored) if incoming_timestamp > stored.modification_timestamp => Resolution::Replace {
            record_id: stored.id,
            stored_timestamp: stored.modification_timestamp,
        },
        Some(stored) => Resolution::Skip {
            record_id: stored.id,
            stored_timestamp: stored.modification_timestamp,
        },
    }
}

/// Resolve `record` from `file` against `store` and apply the decision.
pub async fn resolve<S>(
    store: &S,
    file: &SourceFile,
    record: &NormalizedRecord,
) -> Result<ResolveOutcome, DomainError>
where
    S: CatalogStore + ?Sized,
{
    if record.control_identifier.trim().is_empty() {
        return Err(DomainError::MissingControlKey);
    }

    let existing = store
        .find_record(
            &file.institution_code,
            record.record_type,
            &record.control_identifier,
        )
        .await?;

    match decide(existing.as_ref(), record.modification_timestamp) {
        Resolution::Insert => {
            let record_id = store
                .insert_record(
                    file.id,
                    record.record_type,
                    &record.control_identifier,
                    record.modification_timestamp,
                )
                .await?;
            persist_fields(store, record_id, record).await?;

            tracing::debug!(
                "Inserted {} {} as record #{}",
                record.record_type,
                record.control_identifier,
                record_id
            );
            Ok(ResolveOutcome::Inserted { record_id })
        }
        Resolution::Replace {
            record_id,
            stored_timestamp,
        } => {
            clear_fields(store, record_id).await?;
            store
                .update_modification_timestamp(record_id, record.modification_timestamp)
                .await?;
            store.reset_record(record_id, file.id).await?;
            persist_fields(store, record_id, record).await?;

            tracing::debug!(
                "Replaced record #{} ({} -> {})",
                record_id,
                stored_timestamp,
                record.modification_timestamp
            );
            Ok(ResolveOutcome::Replaced { record_id })
        }
        Resolution::Skip {
            record_id,
            stored_timestamp,
        } => {
            tracing::debug!(
                "Skipped {} {}: stored version {} is not older than {}",
                record.record_type,
                record.control_identifier,
                stored_timestamp,
                record.modification_timestamp
            );
            Ok(ResolveOutcome::Skipped { record_id })
        }
    }
}

/// Delete every subfield of every field of the record, then the fields.
pub async fn clear_fields<S>(store: &S, record_id: i32) -> Result<(), DomainError>
where
    S: CatalogStore + ?Sized,
{
    for field_id in store.list_field_ids(record_id).await? {
        store.delete_subfields(field_id).await?;
    }
    store.delete_fields(record_id).await
}

/// Cascade delete: subfields, fields, then the record.
pub async fn purge_record<S>(store: &S, record_id: i32) -> Result<(), DomainError>
where
    S: CatalogStore + ?Sized,
{
    clear_fields(store, record_id).await?;
    store.delete_record(record_id).await
}

async fn persist_fields<S>(
    store: &S,
    record_id: i32,
    record: &NormalizedRecord,
) -> Result<(), DomainError>
where
    S: CatalogStore + ?Sized,
{
    for field in &record.fields {
        let field_id = store
            .insert_field(record_id, &field.tag, &field.value, field.kind)
            .await?;
        if field.kind == FieldKind::Data {
            for (code, value) in &field.subfields {
                store.insert_subfield(field_id, code, value).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordType;

    fn stored(id: i32, timestamp: f64) -> RecordRef {
        RecordRef {
            id,
            file_id: 1,
            institution_code: "XYZ".to_string(),
            record_type: Some(RecordType::Bib),
            control_identifier: "A123".to_string(),
            modification_timestamp: timestamp,
            processed: true,
            exported: false,
        }
    }

    #[test]
    fn test_no_match_inserts() {
        assert_eq!(decide(None, 100.0), Resolution::Insert);
    }

    #[test]
    fn test_fresher_replaces() {
        assert_eq!(
            decide(Some(&stored(7, 100.0)), 101.0),
            Resolution::Replace {
                record_id: 7,
                stored_timestamp: 100.0
            }
        );
    }

    #[test]
    fn test_equal_or_older_skips() {
        assert!(matches!(
            decide(Some(&stored(7, 100.0)), 100.0),
            Resolution::Skip { record_id: 7, .. }
        ));
        assert!(matches!(
            decide(Some(&stored(7, 100.0)), 0.0),
            Resolution::Skip { record_id: 7, .. }
        ));
    }
}
