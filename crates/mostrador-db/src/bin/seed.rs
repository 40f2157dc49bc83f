//! # Seed Data Generator
//!
//! Populates a database with a demo butcher-shop catalog and staff
//! directory for development.
//!
//! ## Usage
//! ```bash
//! # Default path (./mostrador.db)
//! cargo run -p mostrador-db --bin seed
//!
//! # Specify database path
//! cargo run -p mostrador-db --bin seed -- --db ./data/mostrador.db
//! ```

use std::env;

use mostrador_core::permissions::Module;
use mostrador_core::Money;
use mostrador_db::repository::employee::NewEmployee;
use mostrador_db::repository::product::NewProduct;
use mostrador_db::{Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Demo catalog: (sku, nombre, categoria, unidad, precio_centavos, stock)
const PRODUCTS: &[(&str, &str, &str, &str, i64, i64)] = &[
    ("VACIO-KG", "Vacío", "vacuno", "kg", 899_900, 30),
    ("ASADO-KG", "Asado de tira", "vacuno", "kg", 789_900, 45),
    ("MATAMBRE-KG", "Matambre", "vacuno", "kg", 849_900, 18),
    ("NALGA-KG", "Nalga", "vacuno", "kg", 929_900, 22),
    ("PICADA-KG", "Carne picada especial", "vacuno", "kg", 599_900, 40),
    ("BONDIOLA-KG", "Bondiola", "cerdo", "kg", 649_900, 25),
    ("PECHITO-KG", "Pechito de cerdo", "cerdo", "kg", 579_900, 28),
    ("CHORIZO-KG", "Chorizo parrillero", "cerdo", "kg", 519_900, 50),
    ("MORCILLA-KG", "Morcilla", "cerdo", "kg", 419_900, 35),
    ("POLLO-KG", "Pollo entero", "pollo", "kg", 319_900, 60),
    ("SUPREMA-KG", "Suprema de pollo", "pollo", "kg", 489_900, 32),
    ("JAMON-100G", "Jamón cocido x100g", "fiambres", "unidad", 149_900, 80),
    ("QUESO-100G", "Queso de máquina x100g", "fiambres", "unidad", 119_900, 75),
    ("PROVOLETA-UN", "Provoleta", "fiambres", "unidad", 289_900, 24),
    ("CARBON-5KG", "Carbón x5kg", "parrilla", "unidad", 459_900, 40),
];

/// Demo staff: (nombre, email, rol)
const STAFF: &[(&str, &str, &str)] = &[
    ("Raúl Pereyra", "raul@mostrador.test", "Administrador"),
    ("Claudia Monzón", "claudia@mostrador.test", "Encargado"),
    ("Marta Díaz", "marta@mostrador.test", "Cajero"),
    ("Diego Sosa", "diego@mostrador.test", "Vendedor"),
    ("Oscar Ledesma", "oscar@mostrador.test", "Carnicero"),
    ("Lucas Benítez", "lucas@mostrador.test", "Ayudante"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db_path = parse_db_path();
    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let products = db.products();
    let mut inserted = 0usize;
    for (sku, nombre, categoria, unidad, precio, stock) in PRODUCTS {
        if products.get_by_sku(sku).await?.is_some() {
            continue; // idempotent re-runs
        }
        products
            .create(NewProduct {
                sku: (*sku).to_string(),
                nombre: (*nombre).to_string(),
                categoria: (*categoria).to_string(),
                unidad: (*unidad).to_string(),
                precio: Money::from_centavos(*precio),
                costo: Some(Money::from_centavos(precio * 70 / 100)),
                stock: *stock,
            })
            .await?;
        inserted += 1;
    }
    info!(inserted, total = PRODUCTS.len(), "Catalog seeded");

    let employees = db.employees();
    let mut hired = 0usize;
    for (nombre, email, rol) in STAFF {
        if employees.get_by_email(email).await?.is_some() {
            continue;
        }
        // The cashier keeps a legacy reportes grant from the pre-role era.
        let module_grants = if *rol == "Cajero" {
            vec![Module::Reportes]
        } else {
            vec![]
        };
        employees
            .create(NewEmployee {
                nombre: (*nombre).to_string(),
                email: (*email).to_string(),
                rol: (*rol).to_string(),
                module_grants,
            })
            .await?;
        hired += 1;
    }
    info!(hired, total = STAFF.len(), "Staff seeded");

    db.close().await;
    Ok(())
}

fn parse_db_path() -> String {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| "./mostrador.db".to_string())
}
