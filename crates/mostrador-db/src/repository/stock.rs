//! # Stock Movement Repository
//!
//! Manual inventory movements (entrada / salida / ajuste).
//!
//! Sale deductions write their own `venta` movements inside the sale
//! transaction; this repository covers everything a person does to stock
//! outside a sale: deliveries, spoilage, recount corrections.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::{MovementKind, StockMovement};

/// Repository for stock movement operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Applies a signed stock change and records the movement, in one
    /// transaction. Returns the movement with the resulting stock level.
    ///
    /// `quantity` is the signed delta: positive for entradas, negative for
    /// salidas, either sign for ajustes. Sign conventions are the caller's
    /// job (the services layer derives them from the movement kind).
    pub async fn apply(
        &self,
        product_id: &str,
        kind: MovementKind,
        quantity: i64,
        motivo: Option<String>,
    ) -> DbResult<StockMovement> {
        debug!(product_id = %product_id, ?kind, quantity, "Applying stock movement");

        let mut tx = self.pool.begin().await?;

        let stock: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            kind,
            quantity,
            stock_resultante: stock + quantity,
            motivo,
            created_at: Utc::now(),
        };

        sqlx::query("UPDATE products SET stock = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(movement.stock_resultante)
            .bind(movement.created_at)
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, kind, quantity, stock_resultante, motivo, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(movement.stock_resultante)
        .bind(&movement.motivo)
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(movement)
    }

    /// Most recent movements across all products.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<StockMovement>> {
        let rows = sqlx::query(
            "SELECT id, product_id, kind, quantity, stock_resultante, motivo, created_at
             FROM stock_movements
             ORDER BY created_at DESC
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(map_movement)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)
    }

    /// Most recent movements for one product.
    pub async fn for_product(&self, product_id: &str, limit: u32) -> DbResult<Vec<StockMovement>> {
        let rows = sqlx::query(
            "SELECT id, product_id, kind, quantity, stock_resultante, motivo, created_at
             FROM stock_movements
             WHERE product_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(map_movement)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)
    }
}

fn map_movement(row: &SqliteRow) -> Result<StockMovement, sqlx::Error> {
    Ok(StockMovement {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        kind: row.try_get::<MovementKind, _>("kind")?,
        quantity: row.try_get("quantity")?,
        stock_resultante: row.try_get("stock_resultante")?,
        motivo: row.try_get("motivo")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use mostrador_core::Money;

    async fn db_with_product() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .create(NewProduct {
                sku: "CHORIZO-KG".to_string(),
                nombre: "Chorizo parrillero".to_string(),
                categoria: "cerdo".to_string(),
                unidad: "kg".to_string(),
                precio: Money::from_pesos(5200),
                costo: None,
                stock: 10,
            })
            .await
            .unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_apply_updates_stock_and_records_movement() {
        let (db, product_id) = db_with_product().await;
        let repo = db.stock();

        let entrada = repo
            .apply(
                &product_id,
                MovementKind::Entrada,
                15,
                Some("Reparto frigorífico".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(entrada.stock_resultante, 25);

        let merma = repo
            .apply(&product_id, MovementKind::Salida, -2, Some("merma".to_string()))
            .await
            .unwrap();
        assert_eq!(merma.stock_resultante, 23);

        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.stock, 23);

        let history = repo.for_product(&product_id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_apply_to_missing_product() {
        let (db, _) = db_with_product().await;
        let err = db
            .stock()
            .apply("ghost", MovementKind::Ajuste, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
