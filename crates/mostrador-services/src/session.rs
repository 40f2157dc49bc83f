//! # Session State
//!
//! Holds who is logged in right now.
//!
//! ## Thread Safety
//! The session is wrapped in `Arc<Mutex<_>>`: UI callbacks and background
//! refreshes may read it concurrently, and login/logout must swap it
//! atomically. Locks are held only long enough to clone the value out.
//!
//! Credential verification is the identity provider's job and happens
//! before `login` is called; this module only tracks the verified result.
//! The `activo` flag is NOT checked at login on purpose - the permission
//! evaluator owns that rule and applies it on every access check, so a
//! mid-session deactivation locks the employee out immediately.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mostrador_core::permissions::AuthenticatedUser;
use mostrador_core::Employee;

/// One logged-in employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthenticatedUser,
    /// Correlates audit rows written during this session.
    pub session_id: String,
    pub started_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether the session has outlived the configured idle lifetime.
    pub fn is_expired(&self, timeout_secs: i64) -> bool {
        Utc::now() - self.started_at > chrono::Duration::seconds(timeout_secs)
    }
}

/// Shared, mutable "who is logged in" cell.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    inner: Arc<Mutex<Option<AuthSession>>>,
}

impl SessionState {
    /// Creates an empty (logged out) session state.
    pub fn new() -> Self {
        SessionState::default()
    }

    /// Starts a session for a verified employee, replacing any previous one.
    pub fn login(&self, employee: &Employee) -> AuthSession {
        let session = AuthSession {
            user: AuthenticatedUser::from_employee(employee),
            session_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
        };

        tracing::info!(
            empleado = %session.user.email,
            session_id = %session.session_id,
            "Session started"
        );

        *self.lock() = Some(session.clone());
        session
    }

    /// Ends the current session. Returns whether one was active.
    pub fn logout(&self) -> bool {
        let previous = self.lock().take();
        if let Some(session) = &previous {
            tracing::info!(
                empleado = %session.user.email,
                session_id = %session.session_id,
                "Session ended"
            );
        }
        previous.is_some()
    }

    /// The current session, if any.
    pub fn current(&self) -> Option<AuthSession> {
        self.lock().clone()
    }

    /// The current user, if any - what permission checks consume.
    pub fn current_user(&self) -> Option<AuthenticatedUser> {
        self.lock().as_ref().map(|s| s.user.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<AuthSession>> {
        // A poisoned lock only means another thread panicked mid-swap;
        // the Option inside is still a valid value.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn empleada() -> Employee {
        Employee {
            id: "e-1".to_string(),
            nombre: "Marta Díaz".to_string(),
            email: "marta@mostrador.test".to_string(),
            rol: "Cajero".to_string(),
            module_grants: vec![],
            activo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_login_logout_cycle() {
        let state = SessionState::new();
        assert!(state.current_user().is_none());

        let session = state.login(&empleada());
        assert_eq!(state.current_user().unwrap().email, "marta@mostrador.test");
        assert_eq!(state.current().unwrap().session_id, session.session_id);

        assert!(state.logout());
        assert!(state.current_user().is_none());
        assert!(!state.logout());
    }

    #[test]
    fn test_relogin_replaces_session() {
        let state = SessionState::new();
        let first = state.login(&empleada());
        let second = state.login(&empleada());

        assert_ne!(first.session_id, second.session_id);
        assert_eq!(state.current().unwrap().session_id, second.session_id);
    }

    #[test]
    fn test_inactive_employee_still_logs_in() {
        // The evaluator denies an inactive user on every check; login
        // itself stays permissive so the denial is observable (and
        // auditable) instead of a silent login failure.
        let state = SessionState::new();
        let mut empleada = empleada();
        empleada.activo = false;

        state.login(&empleada);
        assert!(!state.current_user().unwrap().activo);
    }

    #[test]
    fn test_expiry_window() {
        let state = SessionState::new();
        let mut session = state.login(&empleada());
        assert!(!session.is_expired(3600));

        session.started_at = Utc::now() - chrono::Duration::hours(2);
        assert!(session.is_expired(3600));
    }
}
