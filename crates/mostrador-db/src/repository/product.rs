//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD operations with soft delete (`activo` flag)
//! - Search by name or SKU (LIKE; the catalog is a few hundred rows)
//!
//! Stock is only read here. Stock *changes* go through
//! [`StockRepository`](crate::repository::stock::StockRepository) or the
//! sale transaction so every change leaves a movement row.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::{Money, Product};

/// Input for creating a catalog product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub nombre: String,
    pub categoria: String,
    pub unidad: String,
    pub precio: Money,
    pub costo: Option<Money>,
    pub stock: i64,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product and returns it.
    pub async fn create(&self, new: NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: new.sku,
            nombre: new.nombre,
            categoria: new.categoria,
            unidad: new.unidad,
            precio: new.precio,
            costo: new.costo,
            stock: new.stock,
            activo: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, nombre, categoria, unidad,
                precio_centavos, costo_centavos, stock, activo,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.nombre)
        .bind(&product.categoria)
        .bind(&product.unidad)
        .bind(product.precio)
        .bind(product.costo)
        .bind(product.stock)
        .bind(product.activo)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, sku, nombre, categoria, unidad, precio_centavos, costo_centavos,
                    stock, activo, created_at, updated_at
             FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_product(&r)).transpose().map_err(DbError::from)
    }

    /// Gets a product by its SKU (business identifier).
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, sku, nombre, categoria, unidad, precio_centavos, costo_centavos,
                    stock, activo, created_at, updated_at
             FROM products WHERE sku = ?1",
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_product(&r)).transpose().map_err(DbError::from)
    }

    /// Searches active products by name or SKU.
    ///
    /// Empty query returns active products sorted by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list_active(limit).await;
        }

        let pattern = format!("%{query}%");
        let rows = sqlx::query(
            "SELECT id, sku, nombre, categoria, unidad, precio_centavos, costo_centavos,
                    stock, activo, created_at, updated_at
             FROM products
             WHERE activo = 1 AND (nombre LIKE ?1 OR sku LIKE ?1)
             ORDER BY nombre
             LIMIT ?2",
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(map_product)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT id, sku, nombre, categoria, unidad, precio_centavos, costo_centavos,
                    stock, activo, created_at, updated_at
             FROM products
             WHERE activo = 1
             ORDER BY nombre
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(map_product)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)
    }

    /// Updates the editable fields of a product (not stock, not id/sku).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            "UPDATE products SET
                nombre = ?1, categoria = ?2, unidad = ?3,
                precio_centavos = ?4, costo_centavos = ?5, updated_at = ?6
             WHERE id = ?7",
        )
        .bind(&product.nombre)
        .bind(&product.categoria)
        .bind(&product.unidad)
        .bind(product.precio)
        .bind(product.costo)
        .bind(Utc::now())
        .bind(&product.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }
        Ok(())
    }

    /// Activates or deactivates a product (soft delete).
    pub async fn set_active(&self, id: &str, activo: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET activo = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(activo)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }
}

/// Maps a products row to the domain type.
pub(crate) fn map_product(row: &SqliteRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: row.try_get("id")?,
        sku: row.try_get("sku")?,
        nombre: row.try_get("nombre")?,
        categoria: row.try_get("categoria")?,
        unidad: row.try_get("unidad")?,
        precio: row.try_get::<Money, _>("precio_centavos")?,
        costo: row.try_get::<Option<Money>, _>("costo_centavos")?,
        stock: row.try_get("stock")?,
        activo: row.try_get("activo")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
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

    fn vacio() -> NewProduct {
        NewProduct {
            sku: "VACIO-KG".to_string(),
            nombre: "Vacío".to_string(),
            categoria: "vacuno".to_string(),
            unidad: "kg".to_string(),
            precio: Money::from_centavos(899900),
            costo: Some(Money::from_centavos(610000)),
            stock: 25,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let db = db().await;
        let repo = db.products();

        let created = repo.create(vacio()).await.unwrap();
        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(fetched.sku, "VACIO-KG");
        assert_eq!(fetched.precio, Money::from_centavos(899900));
        assert_eq!(fetched.stock, 25);
        assert!(fetched.activo);

        let by_sku = repo.get_by_sku("VACIO-KG").await.unwrap().unwrap();
        assert_eq!(by_sku.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_rejected() {
        let db = db().await;
        let repo = db.products();

        repo.create(vacio()).await.unwrap();
        let err = repo.create(vacio()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_search_by_name_and_sku() {
        let db = db().await;
        let repo = db.products();
        repo.create(vacio()).await.unwrap();
        repo.create(NewProduct {
            sku: "CHORIZO-KG".to_string(),
            nombre: "Chorizo parrillero".to_string(),
            ..vacio()
        })
        .await
        .unwrap();

        let by_name = repo.search("chori", 10).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].sku, "CHORIZO-KG");

        let by_sku = repo.search("VACIO", 10).await.unwrap();
        assert_eq!(by_sku.len(), 1);

        let all = repo.search("", 10).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_search() {
        let db = db().await;
        let repo = db.products();
        let product = repo.create(vacio()).await.unwrap();

        repo.set_active(&product.id, false).await.unwrap();

        assert!(repo.search("", 10).await.unwrap().is_empty());
        // Still fetchable by id for history views
        assert!(!repo.get_by_id(&product.id).await.unwrap().unwrap().activo);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = db().await;
        let repo = db.products();
        let mut ghost = repo.create(vacio()).await.unwrap();
        ghost.id = "no-such-id".to_string();

        assert!(matches!(
            repo.update(&ghost).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
