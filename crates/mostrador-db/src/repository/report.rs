//! # Report Repository
//!
//! Read-only aggregate queries for the reporting screens.
//!
//! Aggregation happens in SQL (GROUP BY over the raw tender tags); tag
//! resolution happens in Rust afterwards so unknown tags merge into the
//! cash bucket exactly like the reconciliation does. Export formatting
//! (PDF/CSV) is someone else's job - these return plain tabular data.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mostrador_core::{Money, PaymentMethod};

/// Sales aggregate for one tender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodBreakdownRow {
    pub method: PaymentMethod,
    pub operations: i64,
    pub total: Money,
}

/// Aggregates for one shift.
#[derive(Debug, Clone)]
pub struct ShiftSummary {
    pub shift_id: String,
    pub sales_count: i64,
    pub sales_total: Money,
    pub expenses_total: Money,
    pub by_method: Vec<MethodBreakdownRow>,
}

/// Aggregates for one calendar date across all its shifts.
#[derive(Debug, Clone)]
pub struct DailySummary {
    pub fecha: NaiveDate,
    pub shifts_count: i64,
    pub sales_count: i64,
    pub sales_total: Money,
    pub expenses_total: Money,
    pub movements_count: i64,
    pub by_method: Vec<MethodBreakdownRow>,
}

/// Repository for report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Per-shift summary: totals plus the per-tender sales breakdown.
    pub async fn shift_summary(&self, shift_id: &str) -> DbResult<ShiftSummary> {
        debug!(shift_id = %shift_id, "Building shift summary");

        let by_method = self
            .method_breakdown(
                "SELECT metodo_pago, card_kind, COUNT(*) AS operations,
                        COALESCE(SUM(total_centavos), 0) AS total
                 FROM sales
                 WHERE shift_id = ?1
                 GROUP BY metodo_pago, card_kind",
                shift_id,
            )
            .await?;

        let sales_count: i64 = by_method.iter().map(|r| r.operations).sum();
        let sales_total: Money = by_method.iter().map(|r| r.total).sum();

        let expenses_total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_centavos), 0) FROM expenses WHERE shift_id = ?1",
        )
        .bind(shift_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ShiftSummary {
            shift_id: shift_id.to_string(),
            sales_count,
            sales_total,
            expenses_total: Money::from_centavos(expenses_total),
            by_method,
        })
    }

    /// Daily summary across every shift of a calendar date.
    pub async fn daily_summary(&self, fecha: NaiveDate) -> DbResult<DailySummary> {
        debug!(%fecha, "Building daily summary");

        let shifts_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shifts WHERE fecha = ?1")
                .bind(fecha)
                .fetch_one(&self.pool)
                .await?;

        let by_method = self
            .method_breakdown(
                "SELECT s.metodo_pago, s.card_kind, COUNT(*) AS operations,
                        COALESCE(SUM(s.total_centavos), 0) AS total
                 FROM sales s
                 JOIN shifts t ON t.id = s.shift_id
                 WHERE t.fecha = ?1
                 GROUP BY s.metodo_pago, s.card_kind",
                &fecha.to_string(),
            )
            .await?;

        let sales_count: i64 = by_method.iter().map(|r| r.operations).sum();
        let sales_total: Money = by_method.iter().map(|r| r.total).sum();

        let expenses_total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(e.amount_centavos), 0)
             FROM expenses e
             JOIN shifts t ON t.id = e.shift_id
             WHERE t.fecha = ?1",
        )
        .bind(fecha)
        .fetch_one(&self.pool)
        .await?;

        // Bind full timestamps for the day window so both sides of the
        // comparison use the same text encoding.
        let day_start = fecha.and_time(chrono::NaiveTime::MIN).and_utc();
        let day_end = day_start + chrono::Duration::days(1);
        let movements_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stock_movements
             WHERE created_at >= ?1 AND created_at < ?2",
        )
        .bind(day_start)
        .bind(day_end)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailySummary {
            fecha,
            shifts_count,
            sales_count,
            sales_total,
            expenses_total: Money::from_centavos(expenses_total),
            movements_count,
            by_method,
        })
    }

    /// Runs a tag-grouped aggregate query and merges the rows by resolved
    /// method (so `'tarjeta' + credito` and `'tarjetaCredito'` land in the
    /// same bucket, and unknown tags land in cash).
    ///
    /// `param` is bound as text; dates arrive as their `YYYY-MM-DD` form.
    async fn method_breakdown(&self, sql: &str, param: &str) -> DbResult<Vec<MethodBreakdownRow>> {
        let rows = sqlx::query(sql).bind(param).fetch_all(&self.pool).await?;

        let mut merged: BTreeMap<PaymentMethod, (i64, Money)> = BTreeMap::new();
        for row in &rows {
            let tag: String = row.try_get("metodo_pago").map_err(DbError::from)?;
            let card_kind: Option<String> = row.try_get("card_kind").map_err(DbError::from)?;
            let operations: i64 = row.try_get("operations").map_err(DbError::from)?;
            let total: Money = row.try_get("total").map_err(DbError::from)?;

            let method = PaymentMethod::resolve(Some(&tag), card_kind.as_deref());
            let bucket = merged.entry(method).or_insert((0, Money::zero()));
            bucket.0 += operations;
            bucket.1 += total;
        }

        Ok(merged
            .into_iter()
            .map(|(method, (operations, total))| MethodBreakdownRow {
                method,
                operations,
                total,
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
