//! # mostrador-services: Session & Orchestration Layer for Mostrador
//!
//! The layer the UI talks to. It composes the pure engines from
//! [`mostrador_core`] with the repositories from [`mostrador_db`] and owns
//! everything that is neither pure math nor SQL:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     mostrador-services                                  │
//! │                                                                         │
//! │   ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐             │
//! │   │  config   │ │  session  │ │   guard   │ │   audit   │             │
//! │   │ env vars  │ │ who's in  │ │ audited   │ │ best-     │             │
//! │   │ + checks  │ │ right now │ │ decisions │ │ effort    │             │
//! │   └───────────┘ └───────────┘ └───────────┘ └───────────┘             │
//! │                                                                         │
//! │   ┌─────────────────────────┐ ┌─────────────────────────┐             │
//! │   │          caja           │ │         catalog         │             │
//! │   │ shifts, sales, expenses │ │ products, stock, staff  │             │
//! │   │ + the cash count flow   │ │ upkeep                  │             │
//! │   └─────────────────────────┘ └─────────────────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wiring It Up
//!
//! ```rust,ignore
//! use mostrador_core::permissions::PermissionEvaluator;
//! use mostrador_db::{Database, DbConfig};
//! use mostrador_services::audit::{AuditTrail, SqliteAuditSink};
//! use mostrador_services::caja::{CajaService, CashCountService};
//! use mostrador_services::config::AppConfig;
//! use mostrador_services::guard::PermissionGuard;
//! use mostrador_services::session::SessionState;
//!
//! let config = AppConfig::load()?;
//! let db = Database::new(DbConfig::new(&config.database_path)).await?;
//!
//! let guard = PermissionGuard::new(
//!     PermissionEvaluator::with_builtin_roles(config.access_mode()),
//!     AuditTrail::new(SqliteAuditSink::new(db.audit()), config.audit_enabled),
//! );
//! let session = SessionState::new();
//! let caja = CajaService::new(db.clone());
//! let arqueo = CashCountService::new(db.clone());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod caja;
pub mod catalog;
pub mod config;
pub mod error;
pub mod guard;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use audit::{AuditEvent, AuditSink, AuditTrail, MemorySink, SqliteAuditSink};
pub use caja::{sanitize_amount, CajaService, CashCountService, SaleLine};
pub use catalog::{CatalogService, StaffService};
pub use config::{AppConfig, ConfigError};
pub use error::{ServiceError, ServiceResult};
pub use guard::PermissionGuard;
pub use session::{AuthSession, SessionState};
