//! `tracing`-backed audit log

use crate::domain::{AuditContext, AuditLog, ScopeFailures};

/// Emits audit events as structured `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn record_rejected(&self, context: &AuditContext, reason: &str) {
        tracing::warn!(
            institution = %context.institution_code,
            filename = %context.filename,
            control_id = %context.control_identifier,
            reason,
            "Record rejected"
        );
    }

    fn scope_failed(&self, context: &AuditContext, failures: ScopeFailures) {
        tracing::warn!(
            institution = %context.institution_code,
            filename = %context.filename,
            control_id = %context.control_identifier,
            checks = %failures.describe(),
            "Record out of scope, purged"
        );
    }
}
