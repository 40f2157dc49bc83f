//! # Cash Count Repository
//!
//! Persistence for saved arqueos.
//!
//! ## Insert-Only
//! Cash count records are written exactly once per shift close and never
//! updated. The tallies and ledger entry lists are stored as JSON payload
//! columns; the aggregate totals are materialized into their own columns
//! so date-range reports never parse JSON.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mostrador_core::arqueo::CashCountRecord;
use mostrador_core::Money;

/// Repository for cash count records.
#[derive(Debug, Clone)]
pub struct CashCountRepository {
    pool: SqlitePool,
}

impl CashCountRepository {
    /// Creates a new CashCountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashCountRepository { pool }
    }

    /// Inserts a saved record.
    ///
    /// The `shift_id` UNIQUE index backstops the one-count-per-shift rule;
    /// a second insert surfaces as `UniqueViolation`.
    pub async fn insert(&self, record: &CashCountRecord) -> DbResult<()> {
        debug!(
            id = %record.id,
            shift_id = %record.shift_id,
            difference = %record.final_difference,
            "Inserting cash count"
        );

        let tallies = serde_json::to_string(&record.tallies)
            .map_err(|e| DbError::invalid_payload("cash_counts", e))?;
        let incomes = serde_json::to_string(&record.additional_incomes)
            .map_err(|e| DbError::invalid_payload("cash_counts", e))?;
        let expenses = serde_json::to_string(&record.additional_expenses)
            .map_err(|e| DbError::invalid_payload("cash_counts", e))?;

        sqlx::query(
            r#"
            INSERT INTO cash_counts (
                id, shift_id, empleado_id, tallies,
                additional_incomes, additional_expenses,
                total_expected_centavos, total_counted_centavos,
                final_expected_centavos, final_total_centavos,
                final_difference_centavos, observaciones, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&record.id)
        .bind(&record.shift_id)
        .bind(&record.empleado_id)
        .bind(&tallies)
        .bind(&incomes)
        .bind(&expenses)
        .bind(record.total_expected)
        .bind(record.total_counted)
        .bind(record.final_expected)
        .bind(record.final_total)
        .bind(record.final_difference)
        .bind(&record.observaciones)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Whether a shift already has a saved count.
    pub async fn exists_for_shift(&self, shift_id: &str) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cash_counts WHERE shift_id = ?1")
                .bind(shift_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// The saved count for a shift, if any.
    pub async fn get_by_shift(&self, shift_id: &str) -> DbResult<Option<CashCountRecord>> {
        let row = sqlx::query(
            "SELECT id, shift_id, empleado_id, tallies, additional_incomes,
                    additional_expenses, total_expected_centavos, total_counted_centavos,
                    final_expected_centavos, final_total_centavos,
                    final_difference_centavos, observaciones, created_at
             FROM cash_counts WHERE shift_id = ?1",
        )
        .bind(shift_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_record(&r)).transpose()
    }

    /// Saved counts in a timestamp range, newest first.
    pub async fn list_by_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<CashCountRecord>> {
        let rows = sqlx::query(
            "SELECT id, shift_id, empleado_id, tallies, additional_incomes,
                    additional_expenses, total_expected_centavos, total_counted_centavos,
                    final_expected_centavos, final_total_centavos,
                    final_difference_centavos, observaciones, created_at
             FROM cash_counts
             WHERE created_at >= ?1 AND created_at <= ?2
             ORDER BY created_at DESC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_record).collect()
    }
}

/// Maps a cash_counts row, decoding the JSON payload columns.
fn map_record(row: &SqliteRow) -> DbResult<CashCountRecord> {
    let tallies_json: String = row.try_get("tallies").map_err(DbError::from)?;
    let incomes_json: String = row.try_get("additional_incomes").map_err(DbError::from)?;
    let expenses_json: String = row.try_get("additional_expenses").map_err(DbError::from)?;

    Ok(CashCountRecord {
        id: row.try_get("id").map_err(DbError::from)?,
        shift_id: row.try_get("shift_id").map_err(DbError::from)?,
        empleado_id: row.try_get("empleado_id").map_err(DbError::from)?,
        tallies: serde_json::from_str(&tallies_json)
            .map_err(|e| DbError::invalid_payload("cash_counts", e))?,
        additional_incomes: serde_json::from_str(&incomes_json)
            .map_err(|e| DbError::invalid_payload("cash_counts", e))?,
        additional_expenses: serde_json::from_str(&expenses_json)
            .map_err(|e| DbError::invalid_payload("cash_counts", e))?,
        total_expected: row
            .try_get::<Money, _>("total_expected_centavos")
            .map_err(DbError::from)?,
        total_counted: row
            .try_get::<Money, _>("total_counted_centavos")
            .map_err(DbError::from)?,
        final_expected: row
            .try_get::<Money, _>("final_expected_centavos")
            .map_err(DbError::from)?,
        final_total: row
            .try_get::<Money, _>("final_total_centavos")
            .map_err(DbError::from)?,
        final_difference: row
            .try_get::<Money, _>("final_difference_centavos")
            .map_err(DbError::from)?,
        observaciones: row.try_get("observaciones").map_err(DbError::from)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(DbError::from)?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
