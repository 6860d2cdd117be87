#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use sea_orm::{ConnectionTrait, Statement};

use catalog_ingest::db;
use catalog_ingest::domain::{
    AuditContext, AuditLog, CatalogStore, DecodedRecord, FileType, ScopeFailures, SourceFile,
};
use catalog_ingest::infrastructure::SeaOrmCatalogRepository;
use catalog_ingest::services::{FieldNormalizer, IngestionDriver};

/// Audit log that keeps every event for assertions
#[derive(Default)]
pub struct RecordingAudit {
    pub rejected: Mutex<Vec<(AuditContext, String)>>,
    pub scope_failed: Mutex<Vec<(AuditContext, ScopeFailures)>>,
}

impl AuditLog for RecordingAudit {
    fn record_rejected(&self, context: &AuditContext, reason: &str) {
        self.rejected
            .lock()
            .unwrap()
            .push((context.clone(), reason.to_string()));
    }

    fn scope_failed(&self, context: &AuditContext, failures: ScopeFailures) {
        self.scope_failed
            .lock()
            .unwrap()
            .push((context.clone(), failures));
    }
}

pub struct Harness {
    pub repo: Arc<SeaOrmCatalogRepository>,
    pub audit: Arc<RecordingAudit>,
    pub driver: IngestionDriver,
}

// Helper to create a test database and pipeline
pub async fn setup() -> Harness {
    let conn = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let repo = Arc::new(SeaOrmCatalogRepository::new(conn));
    let audit = Arc::new(RecordingAudit::default());
    let driver = IngestionDriver::new(repo.clone(), FieldNormalizer::default(), audit.clone());
    Harness {
        repo,
        audit,
        driver,
    }
}

impl Harness {
    pub async fn source_file(&self, institution: &str, filename: &str) -> SourceFile {
        self.driver
            .register_source_file(institution, filename, 1_700_000_000, FileType::Xml)
            .await
            .expect("register source file")
            .expect("file should be new")
    }

    /// Run raw SQL against the test database, e.g. to install a failing trigger
    pub async fn exec_sql(&self, sql: &str) {
        let conn = self.repo.connection();
        conn.execute(Statement::from_string(
            conn.get_database_backend(),
            sql.to_owned(),
        ))
        .await
        .expect("execute sql");
    }

    /// Every field of a record as `(tag, value, [(code, value)])`
    pub async fn snapshot(&self, record_id: i32) -> Vec<(String, String, Vec<(String, String)>)> {
        let mut out = Vec::new();
        for field in self.repo.list_fields(record_id).await.expect("list fields") {
            let subfields = self
                .repo
                .list_subfields(field.id)
                .await
                .expect("list subfields")
                .into_iter()
                .map(|s| (s.code, s.value))
                .collect();
            out.push((field.tag, field.value, subfields));
        }
        out
    }
}

pub fn bib(control_id: &str, timestamp: &str, fixed: &str) -> DecodedRecord {
    DecodedRecord::new()
        .with_control("001", control_id)
        .with_control("005", timestamp)
        .with_control("008", fixed)
}

/// MARC 21 bibliographic 008 with the given Date 1 and language
pub fn bib_008(date1: &str, language: &str) -> String {
    format!("790618s{:<4}    xxu           000 0 {:<3} d", date1, language)
}

/// Write `xml` to a fresh file in the temp dir
pub async fn write_temp_xml(label: &str, xml: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "catalog_ingest_{}_{}_{}.xml",
        label,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    tokio::fs::write(&path, xml).await.expect("write temp file");
    path
}
