//! # Catalog & Staff Services
//!
//! Upkeep operations for products and the staff directory: validate the
//! operator's input, then delegate to the repositories. Stock changes
//! always go through a movement so the history stays complete.

use tracing::info;

use mostrador_core::permissions::{Module, RoleTable};
use mostrador_core::validation::{
    validate_email, validate_name, validate_non_negative_amount, validate_quantity, validate_sku,
};
use mostrador_core::{Employee, MovementKind, Product, StockMovement, ValidationError};
use mostrador_db::repository::employee::NewEmployee;
use mostrador_db::repository::product::NewProduct;
use mostrador_db::Database;

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Product Catalog
// =============================================================================

/// Catalog upkeep: create/update products and move stock.
#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        CatalogService { db }
    }

    /// Creates a catalog product after validating the input.
    pub async fn create_product(&self, input: NewProduct) -> ServiceResult<Product> {
        validate_sku(&input.sku)?;
        validate_name("nombre", &input.nombre)?;
        validate_non_negative_amount("precio", input.precio)?;
        if let Some(costo) = input.costo {
            validate_non_negative_amount("costo", costo)?;
        }

        let product = self.db.products().create(input).await?;
        info!(id = %product.id, sku = %product.sku, "Producto creado");
        Ok(product)
    }

    /// Updates a product's editable fields.
    pub async fn update_product(&self, product: &Product) -> ServiceResult<()> {
        validate_name("nombre", &product.nombre)?;
        validate_non_negative_amount("precio", product.precio)?;

        self.db.products().update(product).await?;
        Ok(())
    }

    /// Receives stock from a delivery (entrada).
    pub async fn receive_stock(
        &self,
        product_id: &str,
        quantity: i64,
        motivo: Option<String>,
    ) -> ServiceResult<StockMovement> {
        validate_quantity(quantity)?;
        let movement = self
            .db
            .stock()
            .apply(product_id, MovementKind::Entrada, quantity, motivo)
            .await?;
        Ok(movement)
    }

    /// Removes stock (salida: spoilage, transfer out).
    pub async fn withdraw_stock(
        &self,
        product_id: &str,
        quantity: i64,
        motivo: Option<String>,
    ) -> ServiceResult<StockMovement> {
        validate_quantity(quantity)?;
        let movement = self
            .db
            .stock()
            .apply(product_id, MovementKind::Salida, -quantity, motivo)
            .await?;
        Ok(movement)
    }

    /// Corrects stock after a recount (ajuste; signed delta).
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        delta: i64,
        motivo: Option<String>,
    ) -> ServiceResult<StockMovement> {
        if delta == 0 {
            return Err(ValidationError::Required {
                field: "ajuste".to_string(),
            }
            .into());
        }
        let movement = self
            .db
            .stock()
            .apply(product_id, MovementKind::Ajuste, delta, motivo)
            .await?;
        Ok(movement)
    }
}

// =============================================================================
// Staff Directory
// =============================================================================

/// Staff directory upkeep. Role names are validated against the table the
/// permission evaluator runs with, so a typo'd role can't silently create
/// a zero-access employee.
#[derive(Debug, Clone)]
pub struct StaffService {
    db: Database,
    roles: RoleTable,
}

impl StaffService {
    pub fn new(db: Database, roles: RoleTable) -> Self {
        StaffService { db, roles }
    }

    /// Hires an employee.
    pub async fn hire(
        &self,
        nombre: &str,
        email: &str,
        rol: &str,
        module_grants: Vec<Module>,
    ) -> ServiceResult<Employee> {
        validate_name("nombre", nombre)?;
        validate_email(email)?;
        self.require_known_role(rol)?;

        let employee = self
            .db
            .employees()
            .create(NewEmployee {
                nombre: nombre.trim().to_string(),
                email: email.trim().to_lowercase(),
                rol: rol.to_string(),
                module_grants,
            })
            .await?;

        info!(id = %employee.id, email = %employee.email, rol = %employee.rol, "Empleado creado");
        Ok(employee)
    }

    /// Changes an employee's role.
    pub async fn change_role(&self, empleado_id: &str, rol: &str) -> ServiceResult<Employee> {
        self.require_known_role(rol)?;

        let mut employee = self.require_employee(empleado_id).await?;
        employee.rol = rol.to_string();
        self.db.employees().update(&employee).await?;
        Ok(employee)
    }

    /// Replaces the legacy explicit grant list.
    pub async fn set_grants(
        &self,
        empleado_id: &str,
        module_grants: Vec<Module>,
    ) -> ServiceResult<Employee> {
        let mut employee = self.require_employee(empleado_id).await?;
        employee.module_grants = module_grants;
        self.db.employees().update(&employee).await?;
        Ok(employee)
    }

    /// Deactivates an employee (history stays; every check denies).
    pub async fn deactivate(&self, empleado_id: &str) -> ServiceResult<()> {
        self.db.employees().set_active(empleado_id, false).await?;
        info!(id = %empleado_id, "Empleado desactivado");
        Ok(())
    }

    /// Reactivates an employee.
    pub async fn reactivate(&self, empleado_id: &str) -> ServiceResult<()> {
        self.db.employees().set_active(empleado_id, true).await?;
        Ok(())
    }

    fn require_known_role(&self, rol: &str) -> ServiceResult<()> {
        if !self.roles.has_role(rol) {
            return Err(ValidationError::NotAllowed {
                field: "rol".to_string(),
                allowed: self.roles.role_names(),
            }
            .into());
        }
        Ok(())
    }

    async fn require_employee(&self, empleado_id: &str) -> ServiceResult<Employee> {
        self.db
            .employees()
            .get_by_id(empleado_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Empleado", empleado_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mostrador_core::Money;
    use mostrador_db::DbConfig;

    async fn services() -> (CatalogService, StaffService, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (
            CatalogService::new(db.clone()),
            StaffService::new(db.clone(), RoleTable::builtin()),
            db,
        )
    }

    fn vacio() -> NewProduct {
        NewProduct {
            sku: "VACIO-KG".to_string(),
            nombre: "Vacío".to_string(),
            categoria: "vacuno".to_string(),
            unidad: "kg".to_string(),
            precio: Money::from_pesos(8999),
            costo: None,
            stock: 10,
        }
    }

    #[tokio::test]
    async fn test_create_product_validates_input() {
        let (catalog, _, _) = services().await;

        let err = catalog
            .create_product(NewProduct {
                sku: "con espacio".to_string(),
                ..vacio()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = catalog
            .create_product(NewProduct {
                precio: Money::from_centavos(-1),
                ..vacio()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert!(catalog.create_product(vacio()).await.is_ok());
    }

    #[tokio::test]
    async fn test_stock_flows_leave_movements() {
        let (catalog, _, db) = services().await;
        let product = catalog.create_product(vacio()).await.unwrap();

        catalog
            .receive_stock(&product.id, 20, Some("Reparto".to_string()))
            .await
            .unwrap();
        catalog
            .withdraw_stock(&product.id, 3, Some("merma".to_string()))
            .await
            .unwrap();
        let adjusted = catalog
            .adjust_stock(&product.id, -2, Some("recuento".to_string()))
            .await
            .unwrap();

        assert_eq!(adjusted.stock_resultante, 25); // 10 + 20 - 3 - 2

        let history = db.stock().for_product(&product.id, 10).await.unwrap();
        assert_eq!(history.len(), 3);

        // Zero adjustment is meaningless
        assert!(catalog.adjust_stock(&product.id, 0, None).await.is_err());
        // Negative withdrawals are caught before they touch stock
        assert!(catalog.withdraw_stock(&product.id, -5, None).await.is_err());
    }

    #[tokio::test]
    async fn test_hire_validates_role_against_table() {
        let (_, staff, _) = services().await;

        let err = staff
            .hire("Ana", "ana@mostrador.test", "Gerente General", vec![])
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(ValidationError::NotAllowed { allowed, .. }) => {
                assert!(allowed.contains(&"Administrador".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let hired = staff
            .hire("Ana Paredes", "Ana@Mostrador.Test", "Vendedor", vec![])
            .await
            .unwrap();
        // Emails normalize to lowercase
        assert_eq!(hired.email, "ana@mostrador.test");
    }

    #[tokio::test]
    async fn test_role_and_grant_updates() {
        let (_, staff, db) = services().await;
        let hired = staff
            .hire("Ana Paredes", "ana@mostrador.test", "Vendedor", vec![])
            .await
            .unwrap();

        staff.change_role(&hired.id, "Encargado").await.unwrap();
        staff
            .set_grants(&hired.id, vec![Module::Reportes])
            .await
            .unwrap();
        staff.deactivate(&hired.id).await.unwrap();

        let stored = db.employees().get_by_id(&hired.id).await.unwrap().unwrap();
        assert_eq!(stored.rol, "Encargado");
        assert_eq!(stored.module_grants, vec![Module::Reportes]);
        assert!(!stored.activo);
    }
}
