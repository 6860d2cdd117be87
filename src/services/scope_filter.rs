//! Scope Filter - keep or purge stored records by date, language and place
//!
//! Evaluation is a pure function of a [`RecordView`] and a [`ScopePolicy`];
//! the batch pass loads each unprocessed record inside its own unit of work,
//! then marks it processed or purges it.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{
    AuditContext, AuditLog, CatalogRepository, CatalogStore, DomainError, RecordRef, RecordType,
    ScopeFailures,
};
use crate::modules::cataloguing::fixed_field::{code_in_window, year_tokens, zero_filled_year};
use crate::services::version_resolver::purge_record;

/// Fixed-length data elements
pub const FIXED_FIELD_TAG: &str = "008";

const BIB_LANGUAGE_WINDOW: (usize, usize) = (35, 37);
const HOLDING_LANGUAGE_WINDOW: (usize, usize) = (22, 24);
const BIB_PLACE_WINDOW: (usize, usize) = (15, 17);
/// Start positions of Date 1 and Date 2, four characters each
const DATE_WINDOWS: [usize; 2] = [7, 11];

/// Notes fields whose whole value is mined for years
pub const DEFAULT_DATE_NOTE_TAGS: &[&str] = &[
    "240", "500", "501", "504", "518", "524", "545", "561", "590", "591", "592", "593", "594",
    "595", "596", "597", "598", "599",
];

/// `(tag, code)` subfields mined for years.
///
/// `234$c` has shipped with this list since the first release; `534$c` may have
/// been meant. Override through configuration rather than editing this table.
pub const DEFAULT_DATE_SUBFIELDS: &[(&str, &str)] = &[
    ("260", "c"),
    ("264", "c"),
    ("362", "c"),
    ("520", "a"),
    ("520", "c"),
    ("534", "a"),
    ("234", "c"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct ScopePolicy {
    /// Inclusive lower year bound
    pub date_from: i32,
    /// Inclusive upper year bound
    pub date_to: i32,
    /// Allowed language codes; empty means unrestricted
    pub languages: Vec<String>,
    /// Allowed place-of-publication codes; empty disables the check
    pub places: Vec<String>,
    /// Let records of unknown type through the language and place checks
    pub liberal: bool,
    pub date_note_tags: Vec<String>,
    pub date_subfields: Vec<(String, String)>,
}

impl Default for ScopePolicy {
    fn default() -> Self {
        Self {
            date_from: i32::MIN,
            date_to: i32::MAX,
            languages: Vec::new(),
            places: Vec::new(),
            liberal: false,
            date_note_tags: DEFAULT_DATE_NOTE_TAGS.iter().map(|t| t.to_string()).collect(),
            date_subfields: DEFAULT_DATE_SUBFIELDS
                .iter()
                .map(|(tag, code)| (tag.to_string(), code.to_string()))
                .collect(),
        }
    }
}

/// The stored data scope evaluation looks at.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordView {
    pub record_type: Option<RecordType>,
    pub fixed_field: Option<String>,
    /// Values of the configured notes fields
    pub notes: Vec<String>,
    /// Values of the configured date subfields
    pub date_subfields: Vec<String>,
}

impl RecordView {
    pub async fn load<S>(
        store: &S,
        record: &RecordRef,
        policy: &ScopePolicy,
    ) -> Result<Self, DomainError>
    where
        S: CatalogStore + ?Sized,
    {
        let fixed_field = store.field_value(record.id, FIXED_FIELD_TAG).await?;

        let mut notes = Vec::new();
        for tag in &policy.date_note_tags {
            notes.extend(store.field_values(record.id, tag).await?);
        }

        let mut date_subfields = Vec::new();
        for (tag, code) in &policy.date_subfields {
            date_subfields.extend(store.subfield_values(record.id, tag, code).await?);
        }

        Ok(Self {
            record_type: record.record_type,
            fixed_field,
            notes,
            date_subfields,
        })
    }
}

fn matches_code(allowed: &[String], code: &str) -> bool {
    allowed.iter().any(|a| a.trim().eq_ignore_ascii_case(code))
}

pub fn language_code(view: &RecordView) -> Option<String> {
    let (start, end) = match view.record_type? {
        RecordType::Bib => BIB_LANGUAGE_WINDOW,
        RecordType::Holding => HOLDING_LANGUAGE_WINDOW,
    };
    code_in_window(view.fixed_field.as_deref()?, start, end)
}

pub fn language_scope(view: &RecordView, policy: &ScopePolicy) -> bool {
    if policy.languages.is_empty() {
        return true;
    }
    match (view.record_type, language_code(view)) {
        (None, _) => policy.liberal,
        (Some(_), Some(code)) => matches_code(&policy.languages, &code),
        (Some(RecordType::Holding), None) => true,
        (Some(RecordType::Bib), None) => false,
    }
}

pub fn place_scope(view: &RecordView, policy: &ScopePolicy) -> bool {
    if policy.places.is_empty() {
        return true;
    }
    match view.record_type {
        None => policy.liberal,
        Some(RecordType::Holding) => true,
        Some(RecordType::Bib) => {
            let (start, end) = BIB_PLACE_WINDOW;
            view.fixed_field
                .as_deref()
                .and_then(|f| code_in_window(f, start, end))
                .is_some_and(|code| matches_code(&policy.places, &code))
        }
    }
}

/// Every year the record offers: fixed-field dates, notes, date subfields.
pub fn candidate_years(view: &RecordView) -> Vec<i32> {
    let mut years = Vec::new();

    if let Some(fixed) = view.fixed_field.as_deref() {
        years.extend(
            DATE_WINDOWS
                .iter()
                .filter_map(|start| zero_filled_year(fixed, *start)),
        );
    }

    for text in view.notes.iter().chain(view.date_subfields.iter()) {
        years.extend(year_tokens(text));
    }

    years
}

pub fn date_scope(view: &RecordView, policy: &ScopePolicy) -> bool {
    if view.record_type == Some(RecordType::Holding) {
        return true;
    }
    candidate_years(view)
        .into_iter()
        .any(|year| (policy.date_from..=policy.date_to).contains(&year))
}

pub fn evaluate(view: &RecordView, policy: &ScopePolicy) -> ScopeFailures {
    ScopeFailures {
        language: !language_scope(view, policy),
        date: !date_scope(view, policy),
        place: !place_scope(view, policy),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopeReport {
    pub evaluated: usize,
    pub retained: usize,
    pub purged: usize,
    pub language_failures: usize,
    pub date_failures: usize,
    pub place_failures: usize,
    /// Records that disappeared or were already processed when reached
    pub skipped: usize,
    /// Per-record errors that did not abort the pass
    pub errors: usize,
}

pub struct ScopeFilter {
    policy: ScopePolicy,
    audit: Arc<dyn AuditLog>,
}

impl ScopeFilter {
    pub fn new(policy: ScopePolicy, audit: Arc<dyn AuditLog>) -> Self {
        Self { policy, audit }
    }

    /// Evaluate every unprocessed record. A store failure aborts the pass;
    /// records already decided stay decided.
    pub async fn run<R>(&self, repo: &R) -> Result<ScopeReport, DomainError>
    where
        R: CatalogRepository + ?Sized,
    {
        let ids = repo.list_unprocessed_record_ids().await?;
        tracing::info!("Scope pass started: {} unprocessed records", ids.len());

        let mut report = ScopeReport::default();
        for record_id in ids {
            match self.process_record(repo, record_id).await {
                Ok(Some(failures)) => {
                    report.evaluated += 1;
                    if failures.any() {
                        report.purged += 1;
                        report.language_failures += usize::from(failures.language);
                        report.date_failures += usize::from(failures.date);
                        report.place_failures += usize::from(failures.place);
                    } else {
                        report.retained += 1;
                    }
                }
                Ok(None) => report.skipped += 1,
                Err(e) if e.is_fatal() => {
                    tracing::error!("Scope pass aborted at record #{}: {}", record_id, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Scope check failed for record #{}: {}", record_id, e);
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            "Scope pass finished: {} retained, {} purged",
            report.retained,
            report.purged
        );
        Ok(report)
    }

    /// Decide one record. Returns `None` when there was nothing to decide.
    pub async fn process_record<R>(
        &self,
        repo: &R,
        record_id: i32,
    ) -> Result<Option<ScopeFailures>, DomainError>
    where
        R: CatalogRepository + ?Sized,
    {
        let unit = repo.begin().await?;

        let record = match unit.get_record(record_id).await? {
            Some(record) if !record.processed => record,
            _ => return Ok(None),
        };

        let view = RecordView::load(&*unit, &record, &self.policy).await?;
        let failures = evaluate(&view, &self.policy);

        if !failures.any() {
            unit.mark_processed(record_id).await?;
            unit.commit().await?;
            tracing::debug!("Record #{} in scope", record_id);
            return Ok(Some(failures));
        }

        let file = unit.get_source_file(record.file_id).await?;
        purge_record(&*unit, record_id).await?;
        unit.commit().await?;

        let context = AuditContext {
            institution_code: record.institution_code.clone(),
            filename: file.map(|f| f.filename).unwrap_or_default(),
            control_identifier: record.control_identifier.clone(),
        };
        self.audit.scope_failed(&context, failures);

        Ok(Some(failures))
    }
}
