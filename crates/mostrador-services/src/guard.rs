//! # Permission Guard
//!
//! The audited wrapper around the pure permission evaluator.
//!
//! ## Pure vs. Audited
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  can_access / can_perform      → pure predicates, no side effects      │
//! │    (navigation filters, button enable/disable - called constantly)     │
//! │                                                                         │
//! │  check_module_access           → same decision + audit entry           │
//! │    (route guards - every outcome is recorded with a reason code)       │
//! │                                                                         │
//! │  authorize_action              → access + verb check + audit entry     │
//! │    (mutating actions - "can Marta delete in productos?")               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Denials are returned as structured [`AccessCheck`] values, never as
//! errors. Audit writes are best-effort through [`AuditTrail`]; a failed
//! write never changes or blocks the decision.

use mostrador_core::permissions::{
    AccessCheck, AuthenticatedUser, DenialReason, Module, Permission, PermissionEvaluator,
};

use crate::audit::{AuditEvent, AuditSink, AuditTrail};

/// Audited permission guard.
pub struct PermissionGuard<S: AuditSink> {
    evaluator: PermissionEvaluator,
    trail: AuditTrail<S>,
}

impl<S: AuditSink> PermissionGuard<S> {
    pub fn new(evaluator: PermissionEvaluator, trail: AuditTrail<S>) -> Self {
        PermissionGuard { evaluator, trail }
    }

    /// The wrapped pure evaluator, for non-audited UI predicates.
    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    /// Pure passthrough: may the user enter the module?
    pub fn can_access(&self, user: Option<&AuthenticatedUser>, module: Module) -> bool {
        self.evaluator.can_access(user, module)
    }

    /// Pure passthrough: may the user perform the verb in the module?
    pub fn can_perform(
        &self,
        user: Option<&AuthenticatedUser>,
        module: Module,
        permission: Permission,
    ) -> bool {
        self.evaluator.can_perform(user, module, permission)
    }

    /// Pure passthrough: navigation filter.
    pub fn accessible_modules(&self, user: Option<&AuthenticatedUser>) -> Vec<Module> {
        self.evaluator.accessible_modules(user)
    }

    /// Full module-access check, audited.
    ///
    /// Every outcome is recorded: grants with `success = true`, denials
    /// with the stable reason code and the redirect target in the detail.
    pub async fn check_module_access(
        &self,
        user: Option<&AuthenticatedUser>,
        module: Module,
    ) -> AccessCheck {
        let check = self.evaluator.check_module_access(user, module);
        self.trail
            .record(event_for("check_module_access", user, module, &check))
            .await;
        check
    }

    /// Action gate: module access plus the specific verb, audited.
    ///
    /// The caller proceeds with the mutating action only when the result
    /// is granted.
    pub async fn authorize_action(
        &self,
        user: Option<&AuthenticatedUser>,
        module: Module,
        permission: Permission,
    ) -> AccessCheck {
        let mut check = self.evaluator.check_module_access(user, module);

        if check.granted && !self.evaluator.can_perform(user, module, permission) {
            check = AccessCheck::denied(DenialReason::PermisosInsuficientes { module });
        }

        let action = format!("authorize_action:{permission:?}").to_lowercase();
        self.trail
            .record(event_for(&action, user, module, &check))
            .await;
        check
    }
}

/// Builds the audit event for one decision.
fn event_for(
    action: &str,
    user: Option<&AuthenticatedUser>,
    module: Module,
    check: &AccessCheck,
) -> AuditEvent {
    let detail = match (user, &check.redirect_to) {
        (Some(u), Some(redirect)) => Some(format!("rol={} redirect={redirect}", u.rol)),
        (Some(u), None) => Some(format!("rol={}", u.rol)),
        (None, Some(redirect)) => Some(format!("redirect={redirect}")),
        (None, None) => None,
    };

    AuditEvent {
        action: action.to_string(),
        module: module.name().to_string(),
        user_id: user.map(|u| u.id.clone()),
        user_email: user.map(|u| u.email.clone()),
        success: check.granted,
        reason_code: check.reason.map(|r| r.code().to_string()),
        detail,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemorySink;
    use mostrador_core::permissions::AccessMode;
    use mostrador_db::{Database, DbConfig, DbError};

    fn user(rol: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            id: "e-1".to_string(),
            nombre: "Prueba".to_string(),
            email: "prueba@mostrador.test".to_string(),
            rol: rol.to_string(),
            module_grants: vec![],
            activo: true,
        }
    }

    fn guard_with_sink() -> (PermissionGuard<MemorySink>, MemorySink) {
        let sink = MemorySink::new();
        let guard = PermissionGuard::new(
            PermissionEvaluator::with_builtin_roles(AccessMode::Strict),
            AuditTrail::new(sink.clone(), true),
        );
        (guard, sink)
    }

    #[tokio::test]
    async fn test_granted_check_is_audited() {
        let (guard, sink) = guard_with_sink();
        let cajera = user("Cajero");

        let check = guard.check_module_access(Some(&cajera), Module::Caja).await;
        assert!(check.granted);

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        let (_, event) = &entries[0];
        assert!(event.success);
        assert_eq!(event.module, "caja");
        assert_eq!(event.reason_code, None);
        assert_eq!(event.detail.as_deref(), Some("rol=Cajero"));
    }

    #[tokio::test]
    async fn test_denied_check_carries_reason_and_redirect() {
        let (guard, sink) = guard_with_sink();
        let ayudante = user("Ayudante");

        let check = guard
            .check_module_access(Some(&ayudante), Module::Empleados)
            .await;
        assert!(!check.granted);
        assert_eq!(check.redirect_to.as_deref(), Some("/dashboard"));

        let (_, event) = &sink.entries()[0];
        assert_eq!(event.reason_code.as_deref(), Some("PERMISOS_INSUFICIENTES"));
        assert!(event.detail.as_deref().unwrap().contains("redirect=/dashboard"));
    }

    #[tokio::test]
    async fn test_authorize_action_denies_missing_verb() {
        let (guard, sink) = guard_with_sink();
        let cajera = user("Cajero");

        // Cajero can enter ventas but cannot delete there.
        let check = guard
            .authorize_action(Some(&cajera), Module::Ventas, Permission::Delete)
            .await;
        assert!(!check.granted);

        let allowed = guard
            .authorize_action(Some(&cajera), Module::Ventas, Permission::Create)
            .await;
        assert!(allowed.granted);

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].1.action.contains("delete"));
        assert!(!entries[0].1.success);
        assert!(entries[1].1.success);
    }

    #[tokio::test]
    async fn test_unauthenticated_check_is_audited_without_user() {
        let (guard, sink) = guard_with_sink();

        let check = guard.check_module_access(None, Module::Caja).await;
        assert!(!check.granted);

        let (_, event) = &sink.entries()[0];
        assert_eq!(event.user_id, None);
        assert_eq!(event.reason_code.as_deref(), Some("USUARIO_NO_AUTENTICADO"));
    }

    /// Sink that always fails, to prove audit failures are swallowed.
    #[derive(Clone)]
    struct BrokenSink;

    impl AuditSink for BrokenSink {
        async fn record(&self, _: &str, _: AuditEvent) -> Result<(), DbError> {
            Err(DbError::Internal("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn test_audit_failure_never_changes_the_decision() {
        let guard = PermissionGuard::new(
            PermissionEvaluator::with_builtin_roles(AccessMode::Strict),
            AuditTrail::new(BrokenSink, true),
        );
        let admin = user("Administrador");

        let check = guard.check_module_access(Some(&admin), Module::Caja).await;
        assert!(check.granted);

        let denied = guard.check_module_access(None, Module::Caja).await;
        assert!(!denied.granted);
    }

    #[tokio::test]
    async fn test_sqlite_sink_end_to_end() {
        use crate::audit::SqliteAuditSink;

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let guard = PermissionGuard::new(
            PermissionEvaluator::with_builtin_roles(AccessMode::Strict),
            AuditTrail::new(SqliteAuditSink::new(db.audit()), true),
        );

        guard
            .check_module_access(Some(&user("Vendedor")), Module::Empleados)
            .await;

        let rows = db.audit().recent(10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].module, "empleados");
        assert!(!rows[0].success);
        assert_eq!(rows[0].reason_code.as_deref(), Some("PERMISOS_INSUFICIENTES"));
    }
}
