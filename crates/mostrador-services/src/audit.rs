//! # Audit Trail
//!
//! Best-effort recording of access decisions and sensitive actions.
//!
//! ## Best-Effort Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The trail must NEVER fail its caller.                                  │
//! │                                                                         │
//! │  guard decision ──► AuditTrail::record ──► sink write                  │
//! │                           │                   │                         │
//! │                           │                   └── Err? → tracing::warn │
//! │                           │                              and DISCARD   │
//! │                           ▼                                             │
//! │                   caller gets the decision either way                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each trail carries its own session id, generated at construction and
//! threaded through every entry - there is no process-wide logger state.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};
use uuid::Uuid;

use mostrador_db::repository::audit::NewAuditEntry;
use mostrador_db::{AuditRepository, DbError};

/// One auditable event, before the session id is attached.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// What was attempted ("check_module_access", "guard_action:create", ...).
    pub action: String,
    /// Module context (lowercase module name or "system").
    pub module: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub success: bool,
    /// Stable reason code on denial.
    pub reason_code: Option<String>,
    /// Free-form context (role name, redirect target, ...).
    pub detail: Option<String>,
}

/// Where audit entries go.
///
/// Implementations report failures normally; swallowing them is
/// [`AuditTrail`]'s job, not the sink's.
pub trait AuditSink: Send + Sync {
    fn record(
        &self,
        session_id: &str,
        event: AuditEvent,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;
}

/// Sink that persists entries to the `audit_logs` table.
#[derive(Debug, Clone)]
pub struct SqliteAuditSink {
    repo: AuditRepository,
}

impl SqliteAuditSink {
    pub fn new(repo: AuditRepository) -> Self {
        SqliteAuditSink { repo }
    }
}

impl AuditSink for SqliteAuditSink {
    async fn record(&self, session_id: &str, event: AuditEvent) -> Result<(), DbError> {
        self.repo
            .append(NewAuditEntry {
                action: event.action,
                module: event.module,
                user_id: event.user_id,
                user_email: event.user_email,
                session_id: session_id.to_string(),
                success: event.success,
                reason_code: event.reason_code,
                detail: event.detail,
            })
            .await?;
        Ok(())
    }
}

/// In-memory sink for tests and headless tooling.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<(String, AuditEvent)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// Everything recorded so far, as (session_id, event) pairs.
    pub fn entries(&self) -> Vec<(String, AuditEvent)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemorySink {
    async fn record(&self, session_id: &str, event: AuditEvent) -> Result<(), DbError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((session_id.to_string(), event));
        Ok(())
    }
}

/// The write side the guard talks to: a sink plus this trail's session id
/// and the enabled flag from configuration.
#[derive(Debug, Clone)]
pub struct AuditTrail<S: AuditSink> {
    sink: S,
    session_id: String,
    enabled: bool,
}

impl<S: AuditSink> AuditTrail<S> {
    /// Creates a trail with a freshly generated session id.
    pub fn new(sink: S, enabled: bool) -> Self {
        AuditTrail {
            sink,
            session_id: Uuid::new_v4().to_string(),
            enabled,
        }
    }

    /// This trail's session id (appears in every entry it writes).
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Records an event, best-effort.
    ///
    /// Failures are logged locally and discarded - an unreachable audit
    /// table must never block or change an access decision.
    pub async fn record(&self, event: AuditEvent) {
        if !self.enabled {
            return;
        }

        debug!(
            action = %event.action,
            module = %event.module,
            success = event.success,
            "Audit event"
        );

        if let Err(err) = self.sink.record(&self.session_id, event).await {
            warn!(error = %err, "Audit write failed; entry discarded");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn event(success: bool) -> AuditEvent {
        AuditEvent {
            action: "check_module_access".to_string(),
            module: "caja".to_string(),
            user_id: Some("e-1".to_string()),
            user_email: Some("marta@mostrador.test".to_string()),
            success,
            reason_code: if success {
                None
            } else {
                Some("PERMISOS_INSUFICIENTES".to_string())
            },
            detail: None,
        }
    }

    #[tokio::test]
    async fn test_trail_stamps_its_session_id() {
        let sink = MemorySink::new();
        let trail = AuditTrail::new(sink.clone(), true);

        trail.record(event(true)).await;
        trail.record(event(false)).await;

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|(sid, _)| sid == trail.session_id()));
    }

    #[tokio::test]
    async fn test_disabled_trail_writes_nothing() {
        let sink = MemorySink::new();
        let trail = AuditTrail::new(sink.clone(), false);

        trail.record(event(true)).await;
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_two_trails_have_distinct_session_ids() {
        let sink = MemorySink::new();
        let a = AuditTrail::new(sink.clone(), true);
        let b = AuditTrail::new(sink, true);
        assert_ne!(a.session_id(), b.session_id());
    }
}
