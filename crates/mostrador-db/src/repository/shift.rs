//! # Shift Repository
//!
//! Database operations for shifts ("turnos").
//!
//! ## Shift Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shift Lifecycle                                   │
//! │                                                                         │
//! │  1. OPEN                                                               │
//! │     └── open() → Shift { status: Abierta, opening_amount }             │
//! │                                                                         │
//! │  2. ACCRUE                                                             │
//! │     └── sales and expenses reference shift_id                          │
//! │     └── total_ventas updated inside the sale transaction               │
//! │                                                                         │
//! │  3. CLOSE                                                              │
//! │     └── close() → Shift { status: Cerrada, closed_at }                 │
//! │         (the cash count record speaks for the drawer from here on)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business rules (one open shift per employee, no operations on closed
//! shifts) are enforced by the services layer; this repository stays dumb.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::{Money, Shift, ShiftPeriod, ShiftStatus};

/// Input for opening a shift.
#[derive(Debug, Clone)]
pub struct NewShift {
    pub empleado_id: String,
    pub empleado_nombre: Option<String>,
    pub fecha: NaiveDate,
    pub periodo: ShiftPeriod,
    pub opening_amount: Money,
}

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Opens a shift.
    pub async fn open(&self, new: NewShift) -> DbResult<Shift> {
        let shift = Shift {
            id: Uuid::new_v4().to_string(),
            empleado_id: new.empleado_id,
            empleado_nombre: new.empleado_nombre,
            fecha: new.fecha,
            periodo: new.periodo,
            opening_amount: new.opening_amount,
            status: ShiftStatus::Abierta,
            total_ventas: Money::zero(),
            opened_at: Utc::now(),
            closed_at: None,
        };

        debug!(id = %shift.id, empleado = %shift.empleado_id, "Opening shift");

        sqlx::query(
            r#"
            INSERT INTO shifts (
                id, empleado_id, empleado_nombre, fecha, periodo,
                opening_centavos, status, total_ventas_centavos, opened_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.empleado_id)
        .bind(&shift.empleado_nombre)
        .bind(shift.fecha)
        .bind(shift.periodo)
        .bind(shift.opening_amount)
        .bind(shift.status)
        .bind(shift.total_ventas)
        .bind(shift.opened_at)
        .bind(shift.closed_at)
        .execute(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Gets a shift by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let row = sqlx::query(
            "SELECT id, empleado_id, empleado_nombre, fecha, periodo, opening_centavos,
                    status, total_ventas_centavos, opened_at, closed_at
             FROM shifts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_shift(&r)).transpose().map_err(DbError::from)
    }

    /// The open shift for an employee, if any.
    pub async fn active_for_employee(&self, empleado_id: &str) -> DbResult<Option<Shift>> {
        let row = sqlx::query(
            "SELECT id, empleado_id, empleado_nombre, fecha, periodo, opening_centavos,
                    status, total_ventas_centavos, opened_at, closed_at
             FROM shifts
             WHERE empleado_id = ?1 AND status = 'abierta'
             ORDER BY opened_at DESC
             LIMIT 1",
        )
        .bind(empleado_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_shift(&r)).transpose().map_err(DbError::from)
    }

    /// All shifts for a calendar date, morning first.
    pub async fn list_by_date(&self, fecha: NaiveDate) -> DbResult<Vec<Shift>> {
        let rows = sqlx::query(
            "SELECT id, empleado_id, empleado_nombre, fecha, periodo, opening_centavos,
                    status, total_ventas_centavos, opened_at, closed_at
             FROM shifts
             WHERE fecha = ?1
             ORDER BY opened_at",
        )
        .bind(fecha)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(map_shift)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)
    }

    /// Closes an open shift.
    ///
    /// Fails with `NotFound` when the shift doesn't exist or is already
    /// closed - closing is not idempotent on purpose, a double close is a
    /// caller bug worth surfacing.
    pub async fn close(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Closing shift");

        let result = sqlx::query(
            "UPDATE shifts SET status = 'cerrada', closed_at = ?1
             WHERE id = ?2 AND status = 'abierta'",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open shift", id));
        }
        Ok(())
    }
}

/// Maps a shifts row to the domain type.
pub(crate) fn map_shift(row: &SqliteRow) -> Result<Shift, sqlx::Error> {
    Ok(Shift {
        id: row.try_get("id")?,
        empleado_id: row.try_get("empleado_id")?,
        empleado_nombre: row.try_get("empleado_nombre")?,
        fecha: row.try_get::<NaiveDate, _>("fecha")?,
        periodo: row.try_get::<ShiftPeriod, _>("periodo")?,
        opening_amount: row.try_get::<Money, _>("opening_centavos")?,
        status: row.try_get::<ShiftStatus, _>("status")?,
        total_ventas: row.try_get::<Money, _>("total_ventas_centavos")?,
        opened_at: row.try_get::<DateTime<Utc>, _>("opened_at")?,
        closed_at: row.try_get::<Option<DateTime<Utc>>, _>("closed_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::employee::NewEmployee;

    async fn db_with_employee() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let employee = db
            .employees()
            .create(NewEmployee {
                nombre: "Marta Díaz".to_string(),
                email: "marta@mostrador.test".to_string(),
                rol: "Cajero".to_string(),
                module_grants: vec![],
            })
            .await
            .unwrap();
        (db, employee.id)
    }

    fn fecha() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }

    #[tokio::test]
    async fn test_open_and_fetch() {
        let (db, empleado_id) = db_with_employee().await;
        let repo = db.shifts();

        let shift = repo
            .open(NewShift {
                empleado_id: empleado_id.clone(),
                empleado_nombre: Some("Marta Díaz".to_string()),
                fecha: fecha(),
                periodo: ShiftPeriod::Manana,
                opening_amount: Money::from_pesos(500),
            })
            .await
            .unwrap();

        let fetched = repo.get_by_id(&shift.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, ShiftStatus::Abierta);
        assert_eq!(fetched.opening_amount, Money::from_pesos(500));
        assert_eq!(fetched.periodo, ShiftPeriod::Manana);
        assert_eq!(fetched.fecha, fecha());

        let active = repo.active_for_employee(&empleado_id).await.unwrap();
        assert_eq!(active.unwrap().id, shift.id);
    }

    #[tokio::test]
    async fn test_close_is_not_idempotent() {
        let (db, empleado_id) = db_with_employee().await;
        let repo = db.shifts();
        let shift = repo
            .open(NewShift {
                empleado_id: empleado_id.clone(),
                empleado_nombre: None,
                fecha: fecha(),
                periodo: ShiftPeriod::Tarde,
                opening_amount: Money::zero(),
            })
            .await
            .unwrap();

        repo.close(&shift.id).await.unwrap();

        let closed = repo.get_by_id(&shift.id).await.unwrap().unwrap();
        assert_eq!(closed.status, ShiftStatus::Cerrada);
        assert!(closed.closed_at.is_some());
        assert!(repo.active_for_employee(&empleado_id).await.unwrap().is_none());

        // Second close fails
        assert!(matches!(
            repo.close(&shift.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_list_by_date() {
        let (db, empleado_id) = db_with_employee().await;
        let repo = db.shifts();

        for periodo in [ShiftPeriod::Manana, ShiftPeriod::Tarde] {
            let shift = repo
                .open(NewShift {
                    empleado_id: empleado_id.clone(),
                    empleado_nombre: None,
                    fecha: fecha(),
                    periodo,
                    opening_amount: Money::zero(),
                })
                .await
                .unwrap();
            repo.close(&shift.id).await.unwrap();
        }

        let shifts = repo.list_by_date(fecha()).await.unwrap();
        assert_eq!(shifts.len(), 2);

        let other_day = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert!(repo.list_by_date(other_day).await.unwrap().is_empty());
    }
}
