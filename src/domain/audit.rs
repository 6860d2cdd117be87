//! Audit capability injected into the ingestion driver and scope filter
//!
//! Every rejection and every purge goes through this trait so that no
//! decision is dropped without a trace.

use serde::Serialize;

/// Where a record came from, for audit lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditContext {
    pub institution_code: String,
    pub filename: String,
    pub control_identifier: String,
}

/// Which scope checks a record failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScopeFailures {
    pub language: bool,
    pub date: bool,
    pub place: bool,
}

impl ScopeFailures {
    pub fn any(&self) -> bool {
        self.language || self.date || self.place
    }

    /// Failed check names joined with `+`, e.g. `language+date`.
    pub fn describe(&self) -> String {
        let mut names = Vec::new();
        if self.language {
            names.push("language");
        }
        if self.date {
            names.push("date");
        }
        if self.place {
            names.push("place");
        }
        names.join("+")
    }
}

pub trait AuditLog: Send + Sync {
    /// A decoded record was refused before reaching the store
    fn record_rejected(&self, context: &AuditContext, reason: &str);

    /// A stored record failed scope and was purged
    fn scope_failed(&self, context: &AuditContext, failures: ScopeFailures);
}
