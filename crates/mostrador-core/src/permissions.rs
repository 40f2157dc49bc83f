//! # Permissions Module
//!
//! Role-based access control: answers module-access and action-permission
//! queries for the current user.
//!
//! ## Evaluation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Permission Evaluation                               │
//! │                                                                         │
//! │  can_access(user, module)                                               │
//! │       │                                                                 │
//! │       ├── No user / session?  ───────────────► DENY (not an error)     │
//! │       │                                                                 │
//! │       ├── user.activo == false? ─────────────► DENY                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RoleTable[user.rol][module]                                            │
//! │       │                                                                 │
//! │       ├── Strict mode: ≥1 permission? ───────► GRANT / DENY            │
//! │       │                                                                 │
//! │       └── Legacy mode: role grant OR module                             │
//! │           in user.module_grants (union) ─────► GRANT / DENY            │
//! │                                                                         │
//! │  can_perform(user, module, verb)                                        │
//! │       └── can_access AND ("manage" wildcard OR verb in role list)      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Notes
//! - The evaluator is an explicitly constructed value (`RoleTable` +
//!   `AccessMode` chosen at startup). There is no process-global table and
//!   no runtime flag checked ad hoc inside each call.
//! - Evaluation never errors: absence of data is a denial, not a failure.
//! - Legacy mode exists for employees created before the role table; their
//!   explicit grant list *widens* access (union), it never narrows it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Employee;

// =============================================================================
// Modules and Permission Verbs
// =============================================================================

/// A named application area subject to access control.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Dashboard,
    Empleados,
    Productos,
    Clientes,
    Ventas,
    Caja,
    Calendario,
    Reportes,
}

impl Module {
    /// All modules, in navigation order.
    pub const ALL: [Module; 8] = [
        Module::Dashboard,
        Module::Empleados,
        Module::Productos,
        Module::Clientes,
        Module::Ventas,
        Module::Caja,
        Module::Calendario,
        Module::Reportes,
    ];

    /// The stable lowercase name used in routes and audit rows.
    pub const fn name(&self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Empleados => "empleados",
            Module::Productos => "productos",
            Module::Clientes => "clientes",
            Module::Ventas => "ventas",
            Module::Caja => "caja",
            Module::Calendario => "calendario",
            Module::Reportes => "reportes",
        }
    }
}

/// Permission verbs. `Manage` is a wildcard implying all the others.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Create,
    Update,
    Delete,
    Manage,
}

// =============================================================================
// Role Table
// =============================================================================

/// Static role name → module → permission list mapping.
///
/// Constructed once at startup and handed to the evaluator; constant for
/// the life of the process, never mutated at runtime. Role names that are
/// not in the table simply grant nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleTable {
    roles: BTreeMap<String, BTreeMap<Module, Vec<Permission>>>,
}

impl RoleTable {
    /// Builds a table from an explicit mapping.
    pub fn new(roles: BTreeMap<String, BTreeMap<Module, Vec<Permission>>>) -> Self {
        RoleTable { roles }
    }

    /// The house roles for the shop.
    ///
    /// ## Roles
    /// - **Administrador** - everything, including employee management.
    /// - **Encargado** - day-to-day management; no deletes on empleados.
    /// - **Cajero** - drawer work: sales and caja, read-only elsewhere.
    /// - **Vendedor** - counter sales; read-only caja (no counts).
    /// - **Carnicero** - production: product/stock updates only.
    /// - **Ayudante** - dashboard only.
    pub fn builtin() -> Self {
        use Permission::{Create, Delete, Manage, Read, Update};

        let mut roles = BTreeMap::new();

        roles.insert(
            "Administrador".to_string(),
            BTreeMap::from([
                (Module::Dashboard, vec![Read]),
                (Module::Empleados, vec![Read, Create, Update, Delete, Manage]),
                (Module::Productos, vec![Read, Create, Update, Delete, Manage]),
                (Module::Clientes, vec![Read, Create, Update, Delete, Manage]),
                (Module::Ventas, vec![Read, Create, Update, Delete, Manage]),
                (Module::Caja, vec![Read, Create, Update, Delete, Manage]),
                (Module::Calendario, vec![Read, Create, Update, Delete]),
                (Module::Reportes, vec![Read, Create, Manage]),
            ]),
        );

        roles.insert(
            "Encargado".to_string(),
            BTreeMap::from([
                (Module::Dashboard, vec![Read]),
                (Module::Empleados, vec![Read, Create, Update]),
                (Module::Productos, vec![Read, Create, Update, Delete]),
                (Module::Clientes, vec![Read, Create, Update, Delete]),
                (Module::Ventas, vec![Read, Create, Update, Delete]),
                (Module::Caja, vec![Read, Create, Update, Manage]),
                (Module::Calendario, vec![Read, Create, Update]),
                (Module::Reportes, vec![Read, Create]),
            ]),
        );

        roles.insert(
            "Cajero".to_string(),
            BTreeMap::from([
                (Module::Dashboard, vec![Read]),
                (Module::Productos, vec![Read]),
                (Module::Clientes, vec![Read]),
                (Module::Ventas, vec![Read, Create]),
                (Module::Caja, vec![Read, Create, Update]),
                (Module::Calendario, vec![Read]),
            ]),
        );

        roles.insert(
            "Vendedor".to_string(),
            BTreeMap::from([
                (Module::Dashboard, vec![Read]),
                (Module::Productos, vec![Read]),
                (Module::Clientes, vec![Read, Create, Update]),
                (Module::Ventas, vec![Read, Create]),
                (Module::Caja, vec![Read]),
                (Module::Calendario, vec![Read, Create]),
            ]),
        );

        roles.insert(
            "Carnicero".to_string(),
            BTreeMap::from([
                (Module::Dashboard, vec![Read]),
                (Module::Productos, vec![Read, Update]),
                (Module::Calendario, vec![Read]),
            ]),
        );

        roles.insert(
            "Ayudante".to_string(),
            BTreeMap::from([(Module::Dashboard, vec![Read])]),
        );

        RoleTable { roles }
    }

    /// The permission list a role holds on a module (empty when the role or
    /// the module entry doesn't exist).
    pub fn permissions(&self, role: &str, module: Module) -> &[Permission] {
        self.roles
            .get(role)
            .and_then(|modules| modules.get(&module))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a role holds at least one permission on a module.
    pub fn grants_any(&self, role: &str, module: Module) -> bool {
        !self.permissions(role, module).is_empty()
    }

    /// Whether the table knows a role by this name.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// The role names the table knows, in alphabetical order.
    pub fn role_names(&self) -> Vec<String> {
        self.roles.keys().cloned().collect()
    }
}

// =============================================================================
// Authenticated User
// =============================================================================

/// The session-scoped view of who is asking.
///
/// Created on login from the employee directory row, dropped on logout.
/// The evaluator reads it on every check - in particular the `activo`
/// flag, so deactivating an employee locks them out mid-session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AuthenticatedUser {
    pub id: String,
    pub nombre: String,
    pub email: String,
    /// Role name looked up in the role table.
    pub rol: String,
    /// Legacy explicit per-user module grants (union'd in legacy mode).
    pub module_grants: Vec<Module>,
    pub activo: bool,
}

impl AuthenticatedUser {
    /// Builds the session view from a directory row.
    pub fn from_employee(employee: &Employee) -> Self {
        AuthenticatedUser {
            id: employee.id.clone(),
            nombre: employee.nombre.clone(),
            email: employee.email.clone(),
            rol: employee.rol.clone(),
            module_grants: employee.module_grants.clone(),
            activo: employee.activo,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.rol == "Administrador"
    }

    pub fn is_manager(&self) -> bool {
        self.is_admin() || self.rol == "Encargado"
    }
}

// =============================================================================
// Access Decisions
// =============================================================================

/// Why an access check denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenialReason {
    /// No authenticated user (or the session lost its profile).
    UsuarioNoAutenticado,
    /// The user exists but is flagged inactive.
    UsuarioInactivo,
    /// Authenticated and active, but the role grants nothing here.
    PermisosInsuficientes { module: Module },
}

impl DenialReason {
    /// Stable reason code for audit rows.
    pub const fn code(&self) -> &'static str {
        match self {
            DenialReason::UsuarioNoAutenticado => "USUARIO_NO_AUTENTICADO",
            DenialReason::UsuarioInactivo => "USUARIO_INACTIVO",
            DenialReason::PermisosInsuficientes { .. } => "PERMISOS_INSUFICIENTES",
        }
    }

    /// Operator-facing message.
    pub fn message(&self) -> String {
        match self {
            DenialReason::UsuarioNoAutenticado => "Usuario no autenticado".to_string(),
            DenialReason::UsuarioInactivo => "Usuario inactivo".to_string(),
            DenialReason::PermisosInsuficientes { module } => {
                format!("Sin permisos para acceder al módulo {}", module.name())
            }
        }
    }

    /// Where the UI should send the denied user.
    pub const fn redirect_to(&self) -> &'static str {
        match self {
            DenialReason::UsuarioNoAutenticado => "/login",
            DenialReason::UsuarioInactivo => "/unauthorized",
            DenialReason::PermisosInsuficientes { .. } => "/dashboard",
        }
    }
}

/// Result of a full module-access check: the decision plus, on denial, a
/// structured reason and a suggested redirect target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AccessCheck {
    pub granted: bool,
    pub reason: Option<DenialReason>,
    pub redirect_to: Option<String>,
}

impl AccessCheck {
    pub fn granted() -> Self {
        AccessCheck {
            granted: true,
            reason: None,
            redirect_to: None,
        }
    }

    pub fn denied(reason: DenialReason) -> Self {
        AccessCheck {
            granted: false,
            redirect_to: Some(reason.redirect_to().to_string()),
            reason: Some(reason),
        }
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// Which grant sources `can_access` consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Only the role table decides.
    Strict,
    /// Role table OR the user's explicit grant list (union). A
    /// backward-compatibility widening for pre-table employees, not a
    /// security tightening.
    Legacy,
}

/// Answers module-access and action-permission queries.
///
/// Pure and infallible: every query returns a boolean or a structured
/// check; missing users, unknown roles and unknown modules all evaluate
/// to "deny".
#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    table: RoleTable,
    mode: AccessMode,
}

impl PermissionEvaluator {
    pub fn new(table: RoleTable, mode: AccessMode) -> Self {
        PermissionEvaluator { table, mode }
    }

    /// Evaluator over the built-in role table.
    pub fn with_builtin_roles(mode: AccessMode) -> Self {
        PermissionEvaluator::new(RoleTable::builtin(), mode)
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn table(&self) -> &RoleTable {
        &self.table
    }

    /// Can this user enter the module at all?
    pub fn can_access(&self, user: Option<&AuthenticatedUser>, module: Module) -> bool {
        let Some(user) = user else {
            return false;
        };
        if !user.activo {
            return false;
        }

        let role_grants = self.table.grants_any(&user.rol, module);
        match self.mode {
            AccessMode::Strict => role_grants,
            AccessMode::Legacy => role_grants || user.module_grants.contains(&module),
        }
    }

    /// Can this user perform a specific action in the module?
    ///
    /// `manage` in the role's list is a wildcard that satisfies any
    /// requested verb.
    pub fn can_perform(
        &self,
        user: Option<&AuthenticatedUser>,
        module: Module,
        permission: Permission,
    ) -> bool {
        if !self.can_access(user, module) {
            return false;
        }
        // can_access granted, so user is present and active here.
        let Some(user) = user else {
            return false;
        };

        let permissions = self.table.permissions(&user.rol, module);
        permissions.contains(&Permission::Manage) || permissions.contains(&permission)
    }

    /// Full module-access check with denial reason and redirect hint.
    pub fn check_module_access(
        &self,
        user: Option<&AuthenticatedUser>,
        module: Module,
    ) -> AccessCheck {
        let Some(user) = user else {
            return AccessCheck::denied(DenialReason::UsuarioNoAutenticado);
        };

        if !user.activo {
            return AccessCheck::denied(DenialReason::UsuarioInactivo);
        }

        if !self.can_access(Some(user), module) {
            return AccessCheck::denied(DenialReason::PermisosInsuficientes { module });
        }

        AccessCheck::granted()
    }

    /// Modules the user may navigate to, in navigation order.
    pub fn accessible_modules(&self, user: Option<&AuthenticatedUser>) -> Vec<Module> {
        Module::ALL
            .into_iter()
            .filter(|module| self.can_access(user, *module))
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
