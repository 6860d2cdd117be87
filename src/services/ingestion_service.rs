//! Ingestion Driver - source file to stored records
//!
//! Each decoded record is normalized and resolved inside its own unit of
//! work. Per-record problems are audited and skipped; store and filesystem
//! failures abort the file.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{
    AuditContext, AuditLog, CatalogRepository, DecodedRecord, DomainError, FileType, SourceFile,
};
use crate::modules::cataloguing::{RecordDecoder, decoder_for};
use crate::services::normalizer::FieldNormalizer;
use crate::services::version_resolver::{self, ResolveOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub filename: String,
    pub inserted: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub rejected: usize,
    /// True when the file had already been ingested with this timestamp
    pub unchanged_file: bool,
}

impl IngestReport {
    fn count(&mut self, outcome: &ResolveOutcome) {
        match outcome {
            ResolveOutcome::Inserted { .. } => self.inserted += 1,
            ResolveOutcome::Replaced { .. } => self.replaced += 1,
            ResolveOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

pub struct IngestionDriver {
    repo: Arc<dyn CatalogRepository>,
    normalizer: FieldNormalizer,
    audit: Arc<dyn AuditLog>,
}

impl IngestionDriver {
    pub fn new(
        repo: Arc<dyn CatalogRepository>,
        normalizer: FieldNormalizer,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            repo,
            normalizer,
            audit,
        }
    }

    /// Register a source file. Returns `None` when this exact file
    /// (institution, name, timestamp) has already been fully ingested; a
    /// file left incomplete by an aborted run is handed back for a retry.
    pub async fn register_source_file(
        &self,
        institution_code: &str,
        filename: &str,
        modification_timestamp: i64,
        file_type: FileType,
    ) -> Result<Option<SourceFile>, DomainError> {
        if let Some(known) = self
            .repo
            .find_source_file(institution_code, filename, modification_timestamp)
            .await?
        {
            if known.completed {
                tracing::info!(
                    "Source file {} ({}) unchanged since last ingestion",
                    filename,
                    institution_code
                );
                return Ok(None);
            }
            tracing::info!(
                "Resuming incomplete source file #{} {} ({})",
                known.id,
                filename,
                institution_code
            );
            return Ok(Some(known));
        }

        let file = self
            .repo
            .insert_source_file(institution_code, filename, modification_timestamp, file_type)
            .await?;
        tracing::info!(
            "Registered source file #{} {} ({}, {})",
            file.id,
            filename,
            institution_code,
            file_type
        );
        Ok(Some(file))
    }

    /// Normalize, resolve and persist one record atomically.
    pub async fn ingest_record(
        &self,
        file: &SourceFile,
        record: &DecodedRecord,
    ) -> Result<ResolveOutcome, DomainError> {
        let normalized = self.normalizer.normalize(record, &file.institution_code);

        let unit = self.repo.begin().await?;
        let outcome = version_resolver::resolve(&*unit, file, &normalized).await?;
        if matches!(outcome, ResolveOutcome::Skipped { .. }) {
            // Nothing written; dropping the unit releases it
            return Ok(outcome);
        }
        unit.commit().await?;

        Ok(outcome)
    }

    pub async fn ingest_records<I>(
        &self,
        file: &SourceFile,
        records: I,
    ) -> Result<IngestReport, DomainError>
    where
        I: IntoIterator<Item = DecodedRecord>,
    {
        let mut report = IngestReport {
            filename: file.filename.clone(),
            ..Default::default()
        };

        for record in records {
            match self.ingest_record(file, &record).await {
                Ok(outcome) => report.count(&outcome),
                Err(e) if e.is_fatal() => {
                    tracing::error!("Ingestion of {} aborted: {}", file.filename, e);
                    return Err(e);
                }
                Err(e) => {
                    report.rejected += 1;
                    let context = AuditContext {
                        institution_code: file.institution_code.clone(),
                        filename: file.filename.clone(),
                        control_identifier: record
                            .control_value("001")
                            .unwrap_or_default()
                            .trim()
                            .to_string(),
                    };
                    self.audit.record_rejected(&context, &e.to_string());
                }
            }
        }

        tracing::info!(
            "Ingested {}: {} inserted, {} replaced, {} skipped, {} rejected",
            report.filename,
            report.inserted,
            report.replaced,
            report.skipped,
            report.rejected
        );
        Ok(report)
    }

    /// Register, decode and ingest a file from disk with the decoder shipped
    /// for its type.
    pub async fn ingest_path(
        &self,
        institution_code: &str,
        path: &Path,
    ) -> Result<IngestReport, DomainError> {
        let file_type = FileType::from_path(path)
            .ok_or_else(|| DomainError::UnsupportedFileType(path.display().to_string()))?;
        let decoder = decoder_for(file_type)
            .ok_or_else(|| DomainError::UnsupportedFileType(file_type.to_string()))?;
        self.ingest_path_with(institution_code, path, file_type, decoder.as_ref())
            .await
    }

    /// Same as [`ingest_path`](Self::ingest_path) with a caller-provided decoder.
    pub async fn ingest_path_with(
        &self,
        institution_code: &str,
        path: &Path,
        file_type: FileType,
        decoder: &dyn RecordDecoder,
    ) -> Result<IngestReport, DomainError> {
        let metadata = tokio::fs::metadata(path).await?;
        let modified = chrono::DateTime::<chrono::Utc>::from(metadata.modified()?).timestamp();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        // Decode before registering so an undecodable file is retried next run
        let bytes = tokio::fs::read(path).await?;
        let records = decoder.decode(&bytes)?;
        tracing::debug!("Decoded {} records from {}", records.len(), filename);

        let Some(file) = self
            .register_source_file(institution_code, &filename, modified, file_type)
            .await?
        else {
            return Ok(IngestReport {
                filename,
                unchanged_file: true,
                ..Default::default()
            });
        };

        let report = self.ingest_records(&file, records).await?;
        self.repo.mark_source_file_completed(file.id).await?;
        Ok(report)
    }
}
