//! # Employee Repository
//!
//! Database operations for the staff directory.
//!
//! ## The grants column
//! `module_grants` is a JSON array of module names - the legacy per-user
//! override list. Unknown names in stored data are skipped on load
//! (deny-by-default), so an old grant pointing at a removed module can
//! never widen access.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::permissions::Module;
use mostrador_core::Employee;

/// Input for creating an employee.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub nombre: String,
    pub email: String,
    pub rol: String,
    pub module_grants: Vec<Module>,
}

/// Repository for employee database operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Creates a new EmployeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Inserts a new employee and returns it.
    pub async fn create(&self, new: NewEmployee) -> DbResult<Employee> {
        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            nombre: new.nombre,
            email: new.email,
            rol: new.rol,
            module_grants: new.module_grants,
            activo: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %employee.id, email = %employee.email, "Inserting employee");

        let grants = encode_grants(&employee.module_grants)?;

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, nombre, email, rol, module_grants, activo, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.nombre)
        .bind(&employee.email)
        .bind(&employee.rol)
        .bind(&grants)
        .bind(employee.activo)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Gets an employee by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let row = sqlx::query(
            "SELECT id, nombre, email, rol, module_grants, activo, created_at, updated_at
             FROM employees WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_employee(&r)).transpose()
    }

    /// Gets an employee by login email (business identifier).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Employee>> {
        let row = sqlx::query(
            "SELECT id, nombre, email, rol, module_grants, activo, created_at, updated_at
             FROM employees WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_employee(&r)).transpose()
    }

    /// Lists all employees, active first, then by name.
    pub async fn list(&self) -> DbResult<Vec<Employee>> {
        let rows = sqlx::query(
            "SELECT id, nombre, email, rol, module_grants, activo, created_at, updated_at
             FROM employees
             ORDER BY activo DESC, nombre",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_employee).collect()
    }

    /// Updates name, role and grant list.
    pub async fn update(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, "Updating employee");

        let grants = encode_grants(&employee.module_grants)?;

        let result = sqlx::query(
            "UPDATE employees SET
                nombre = ?1, rol = ?2, module_grants = ?3, updated_at = ?4
             WHERE id = ?5",
        )
        .bind(&employee.nombre)
        .bind(&employee.rol)
        .bind(&grants)
        .bind(Utc::now())
        .bind(&employee.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", &employee.id));
        }
        Ok(())
    }

    /// Activates or deactivates an employee.
    ///
    /// Deactivation locks the employee out on the next permission check;
    /// the directory row and their history stay.
    pub async fn set_active(&self, id: &str, activo: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE employees SET activo = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(activo)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }
        Ok(())
    }
}

fn encode_grants(grants: &[Module]) -> DbResult<String> {
    serde_json::to_string(grants).map_err(|e| DbError::invalid_payload("employees", e))
}

/// Maps an employees row to the domain type.
///
/// Grant names that no longer parse as modules are skipped, not errors.
fn map_employee(row: &SqliteRow) -> DbResult<Employee> {
    let raw_grants: String = row.try_get("module_grants").map_err(DbError::from)?;
    let names: Vec<String> = serde_json::from_str(&raw_grants)
        .map_err(|e| DbError::invalid_payload("employees", e))?;
    let module_grants = names
        .into_iter()
        .filter_map(|name| serde_json::from_value::<Module>(serde_json::Value::String(name)).ok())
        .collect();

    Ok(Employee {
        id: row.try_get("id").map_err(DbError::from)?,
        nombre: row.try_get("nombre").map_err(DbError::from)?,
        email: row.try_get("email").map_err(DbError::from)?,
        rol: row.try_get("rol").map_err(DbError::from)?,
        module_grants,
        activo: row.try_get("activo").map_err(DbError::from)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(DbError::from)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(DbError::from)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn cajera() -> NewEmployee {
        NewEmployee {
            nombre: "Marta Díaz".to_string(),
            email: "marta@mostrador.test".to_string(),
            rol: "Cajero".to_string(),
            module_grants: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_by_email() {
        let db = db().await;
        let repo = db.employees();

        let created = repo.create(cajera()).await.unwrap();
        let fetched = repo
            .get_by_email("marta@mostrador.test")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.rol, "Cajero");
        assert!(fetched.activo);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let db = db().await;
        let repo = db.employees();

        repo.create(cajera()).await.unwrap();
        let err = repo.create(cajera()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_grants_round_trip() {
        let db = db().await;
        let repo = db.employees();

        let mut new = cajera();
        new.module_grants = vec![Module::Productos, Module::Reportes];
        let created = repo.create(new).await.unwrap();

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(
            fetched.module_grants,
            vec![Module::Productos, Module::Reportes]
        );
    }

    #[tokio::test]
    async fn test_unknown_grant_names_are_skipped() {
        let db = db().await;
        let repo = db.employees();
        let created = repo.create(cajera()).await.unwrap();

        // Simulate a stale grant written by an older client.
        sqlx::query("UPDATE employees SET module_grants = ?1 WHERE id = ?2")
            .bind(r#"["productos", "facturacion", "caja"]"#)
            .bind(&created.id)
            .execute(db.pool())
            .await
            .unwrap();

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.module_grants, vec![Module::Productos, Module::Caja]);
    }

    #[tokio::test]
    async fn test_set_active() {
        let db = db().await;
        let repo = db.employees();
        let created = repo.create(cajera()).await.unwrap();

        repo.set_active(&created.id, false).await.unwrap();
        assert!(!repo.get_by_id(&created.id).await.unwrap().unwrap().activo);

        assert!(matches!(
            repo.set_active("ghost", true).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
