//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! ## The Sale Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    SINGLE TRANSACTION                                   │
//! │                                                                         │
//! │  1. INSERT INTO sales (...)                                             │
//! │                                                                         │
//! │  2. For each line:                                                      │
//! │     a. INSERT INTO sale_items (...)        ← product snapshot          │
//! │     b. UPDATE products SET stock = stock - qty                         │
//! │     c. INSERT INTO stock_movements ('venta', -qty, resulting stock)    │
//! │                                                                         │
//! │  3. UPDATE shifts SET total_ventas += sale.total                       │
//! │                                                                         │
//! │  COMMIT ← all rows land or none do                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock checks happen in the services layer before this runs; two
//! terminals racing on the same cut resolve last-write-wins.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::arqueo::TenderLine;
use mostrador_core::{Money, PaymentMethod, Sale, SaleItem};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Inserts a sale with its lines, deducts stock, writes the movement
    /// rows and bumps the shift total - all in one transaction.
    pub async fn create(&self, sale: &Sale, items: &[SaleItem]) -> DbResult<()> {
        debug!(
            id = %sale.id,
            shift_id = %sale.shift_id,
            total = %sale.total,
            lines = items.len(),
            "Inserting sale"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, shift_id, empleado_id, metodo_pago, card_kind,
                total_centavos, cliente, notas, created_at
            ) VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.shift_id)
        .bind(&sale.empleado_id)
        .bind(sale.metodo_pago.tag())
        .bind(sale.total)
        .bind(&sale.cliente)
        .bind(&sale.notas)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, sku_snapshot, nombre_snapshot,
                    unit_price_centavos, quantity, line_total_centavos
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.sku_snapshot)
            .bind(&item.nombre_snapshot)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.line_total)
            .execute(&mut *tx)
            .await?;

            // Deduct stock and leave a movement row with the resulting level.
            let stock: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                .bind(&item.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;

            let resulting = stock - item.quantity;

            sqlx::query("UPDATE products SET stock = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(resulting)
                .bind(Utc::now())
                .bind(&item.product_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO stock_movements (
                    id, product_id, kind, quantity, stock_resultante, motivo, created_at
                ) VALUES (?1, ?2, 'venta', ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&item.product_id)
            .bind(-item.quantity)
            .bind(resulting)
            .bind(format!("Venta {}", sale.id))
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE shifts
             SET total_ventas_centavos = total_ventas_centavos + ?1
             WHERE id = ?2",
        )
        .bind(sale.total)
        .bind(&sale.shift_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query(
            "SELECT id, shift_id, empleado_id, metodo_pago, card_kind, total_centavos,
                    cliente, notas, created_at
             FROM sales WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_sale(&r)).transpose().map_err(DbError::from)
    }

    /// All lines for a sale.
    pub async fn items_for(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let rows = sqlx::query(
            "SELECT id, sale_id, product_id, sku_snapshot, nombre_snapshot,
                    unit_price_centavos, quantity, line_total_centavos
             FROM sale_items
             WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(map_sale_item)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)
    }

    /// All sales for a shift, oldest first.
    pub async fn list_by_shift(&self, shift_id: &str) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query(
            "SELECT id, shift_id, empleado_id, metodo_pago, card_kind, total_centavos,
                    cliente, notas, created_at
             FROM sales
             WHERE shift_id = ?1
             ORDER BY created_at",
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(map_sale)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)
    }

    /// Sales in a timestamp range, newest first.
    pub async fn list_by_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query(
            "SELECT id, shift_id, empleado_id, metodo_pago, card_kind, total_centavos,
                    cliente, notas, created_at
             FROM sales
             WHERE created_at >= ?1 AND created_at <= ?2
             ORDER BY created_at DESC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(map_sale)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)
    }

    /// Method-tagged amounts for a shift, ready for the reconciliation.
    ///
    /// Raw tags (including the old two-part `tarjeta` + card_kind form)
    /// are resolved here; unknown tags fold into the cash bucket.
    pub async fn tenders_by_shift(&self, shift_id: &str) -> DbResult<Vec<TenderLine>> {
        let rows = sqlx::query(
            "SELECT metodo_pago, card_kind, total_centavos FROM sales WHERE shift_id = ?1",
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let tag: String = row.try_get("metodo_pago")?;
                let card_kind: Option<String> = row.try_get("card_kind")?;
                let amount: Money = row.try_get("total_centavos")?;
                Ok(TenderLine::from_raw(
                    Some(&tag),
                    card_kind.as_deref(),
                    amount,
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(DbError::from)
    }
}

/// Maps a sales row to the domain type, resolving the stored tag.
fn map_sale(row: &SqliteRow) -> Result<Sale, sqlx::Error> {
    let raw_tag: String = row.try_get("metodo_pago")?;
    let card_kind: Option<String> = row.try_get("card_kind")?;

    Ok(Sale {
        id: row.try_get("id")?,
        shift_id: row.try_get("shift_id")?,
        empleado_id: row.try_get("empleado_id")?,
        metodo_pago: PaymentMethod::resolve(Some(&raw_tag), card_kind.as_deref()),
        total: row.try_get::<Money, _>("total_centavos")?,
        cliente: row.try_get("cliente")?,
        notas: row.try_get("notas")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn map_sale_item(row: &SqliteRow) -> Result<SaleItem, sqlx::Error> {
    Ok(SaleItem {
        id: row.try_get("id")?,
        sale_id: row.try_get("sale_id")?,
        product_id: row.try_get("product_id")?,
        sku_snapshot: row.try_get("sku_snapshot")?,
        nombre_snapshot: row.try_get("nombre_snapshot")?,
        unit_price: row.try_get::<Money, _>("unit_price_centavos")?,
        quantity: row.try_get("quantity")?,
        line_total: row.try_get::<Money, _>("line_total_centavos")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
