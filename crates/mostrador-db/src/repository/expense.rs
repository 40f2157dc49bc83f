//! # Expense Repository
//!
//! Database operations for shift expenses and purchases.
//!
//! Expenses are method-tagged: the reconciliation subtracts each expense
//! from the expected total of its own tender (a cash expense leaves the
//! drawer, a transfer expense never touched it).

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::arqueo::TenderLine;
use mostrador_core::{Expense, ExpenseKind, Money, PaymentMethod};

/// Input for recording an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub shift_id: String,
    pub empleado_id: String,
    pub kind: ExpenseKind,
    pub metodo_pago: PaymentMethod,
    pub amount: Money,
    pub description: String,
    pub proveedor: Option<String>,
}

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records an expense against a shift.
    pub async fn record(&self, new: NewExpense) -> DbResult<Expense> {
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            shift_id: new.shift_id,
            empleado_id: new.empleado_id,
            kind: new.kind,
            metodo_pago: new.metodo_pago,
            amount: new.amount,
            description: new.description,
            proveedor: new.proveedor,
            created_at: Utc::now(),
        };

        debug!(
            id = %expense.id,
            shift_id = %expense.shift_id,
            amount = %expense.amount,
            "Recording expense"
        );

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, shift_id, empleado_id, kind, metodo_pago,
                amount_centavos, description, proveedor, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.shift_id)
        .bind(&expense.empleado_id)
        .bind(expense.kind)
        .bind(expense.metodo_pago.tag())
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(&expense.proveedor)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    /// All expenses for a shift, oldest first.
    pub async fn list_by_shift(&self, shift_id: &str) -> DbResult<Vec<Expense>> {
        let rows = sqlx::query(
            "SELECT id, shift_id, empleado_id, kind, metodo_pago, amount_centavos,
                    description, proveedor, created_at
             FROM expenses
             WHERE shift_id = ?1
             ORDER BY created_at",
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_expense).collect()
    }

    /// Expenses in a timestamp range, newest first.
    pub async fn list_by_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Expense>> {
        let rows = sqlx::query(
            "SELECT id, shift_id, empleado_id, kind, metodo_pago, amount_centavos,
                    description, proveedor, created_at
             FROM expenses
             WHERE created_at >= ?1 AND created_at <= ?2
             ORDER BY created_at DESC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_expense).collect()
    }

    /// Method-tagged amounts for a shift, ready for the reconciliation.
    ///
    /// Raw tags are resolved here, so rows written by older clients fold
    /// into the cash bucket on the way out.
    pub async fn tenders_by_shift(&self, shift_id: &str) -> DbResult<Vec<TenderLine>> {
        let rows = sqlx::query(
            "SELECT metodo_pago, amount_centavos FROM expenses WHERE shift_id = ?1",
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let tag: String = row.try_get("metodo_pago")?;
                let amount: Money = row.try_get("amount_centavos")?;
                Ok(TenderLine::from_raw(Some(&tag), None, amount))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(DbError::from)
    }
}

/// Maps an expenses row to the domain type.
fn map_expense(row: &SqliteRow) -> DbResult<Expense> {
    let raw_tag: String = row.try_get("metodo_pago").map_err(DbError::from)?;

    Ok(Expense {
        id: row.try_get("id").map_err(DbError::from)?,
        shift_id: row.try_get("shift_id").map_err(DbError::from)?,
        empleado_id: row.try_get("empleado_id").map_err(DbError::from)?,
        kind: row.try_get::<ExpenseKind, _>("kind").map_err(DbError::from)?,
        metodo_pago: PaymentMethod::resolve(Some(&raw_tag), None),
        amount: row.try_get::<Money, _>("amount_centavos").map_err(DbError::from)?,
        description: row.try_get("description").map_err(DbError::from)?,
        proveedor: row.try_get("proveedor").map_err(DbError::from)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
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
    use crate::repository::employee::NewEmployee;
    use crate::repository::shift::NewShift;
    use chrono::NaiveDate;
    use mostrador_core::ShiftPeriod;

    async fn db_with_shift() -> (Database, String, String) {
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
        let shift = db
            .shifts()
            .open(NewShift {
                empleado_id: employee.id.clone(),
                empleado_nombre: None,
                fecha: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
                periodo: ShiftPeriod::Manana,
                opening_amount: Money::from_pesos(500),
            })
            .await
            .unwrap();
        (db, employee.id, shift.id)
    }

    fn hielo(shift_id: &str, empleado_id: &str) -> NewExpense {
        NewExpense {
            shift_id: shift_id.to_string(),
            empleado_id: empleado_id.to_string(),
            kind: ExpenseKind::Gasto,
            metodo_pago: PaymentMethod::Efectivo,
            amount: Money::from_pesos(120),
            description: "Hielo en barra".to_string(),
            proveedor: None,
        }
    }

    #[tokio::test]
    async fn test_record_and_list() {
        let (db, empleado_id, shift_id) = db_with_shift().await;
        let repo = db.expenses();

        repo.record(hielo(&shift_id, &empleado_id)).await.unwrap();
        repo.record(NewExpense {
            kind: ExpenseKind::Compra,
            metodo_pago: PaymentMethod::Transferencia,
            amount: Money::from_pesos(18000),
            description: "Media res".to_string(),
            proveedor: Some("Frigorífico Sur".to_string()),
            ..hielo(&shift_id, &empleado_id)
        })
        .await
        .unwrap();

        let expenses = repo.list_by_shift(&shift_id).await.unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].description, "Hielo en barra");
        assert_eq!(expenses[1].kind, ExpenseKind::Compra);
        assert_eq!(expenses[1].proveedor.as_deref(), Some("Frigorífico Sur"));
    }

    #[tokio::test]
    async fn test_tenders_resolve_stale_tags() {
        let (db, empleado_id, shift_id) = db_with_shift().await;
        let repo = db.expenses();
        repo.record(hielo(&shift_id, &empleado_id)).await.unwrap();

        // A row written by an older client with an unknown tag.
        sqlx::query(
            "INSERT INTO expenses (id, shift_id, empleado_id, kind, metodo_pago,
                                   amount_centavos, description, created_at)
             VALUES ('old-1', ?1, ?2, 'gasto', 'vale', 5000, 'Vale papelera', ?3)",
        )
        .bind(&shift_id)
        .bind(&empleado_id)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

        let tenders = repo.tenders_by_shift(&shift_id).await.unwrap();
        assert_eq!(tenders.len(), 2);
        assert!(tenders
            .iter()
            .all(|t| t.method == PaymentMethod::Efectivo));

        // And the row loads with the same fallback applied.
        let expenses = repo.list_by_shift(&shift_id).await.unwrap();
        assert!(expenses
            .iter()
            .all(|e| e.metodo_pago == PaymentMethod::Efectivo));
    }

    #[tokio::test]
    async fn test_nonpositive_amount_is_rejected_by_schema() {
        let (db, empleado_id, shift_id) = db_with_shift().await;
        let repo = db.expenses();

        let err = repo
            .record(NewExpense {
                amount: Money::zero(),
                ..hielo(&shift_id, &empleado_id)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)));
    }
}
