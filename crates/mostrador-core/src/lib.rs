//! # mostrador-core: Pure Business Logic for Mostrador
//!
//! This crate is the **heart** of Mostrador, the back office for a small
//! butcher shop. It contains all business logic as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Mostrador Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     Web Frontend                                │   │
//! │  │    Catálogo ──► Ventas ──► Caja ──► Arqueo ──► Reportes        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  mostrador-services                             │   │
//! │  │    session, permission guard, cash count flow, catalog          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mostrador-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  arqueo   │  │permissions│  │   │
//! │  │   │  Product  │  │   Money   │  │  tallies  │  │ RoleTable │  │   │
//! │  │   │   Sale    │  │ centavos  │  │  session  │  │ evaluator │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  mostrador-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Shift, Expense, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`arqueo`] - Cash reconciliation engine
//! - [`permissions`] - Role-based permission evaluator
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in centavos (i64) to avoid float drift
//! 4. **Deny By Default**: Missing users, unknown roles and unknown tags never error;
//!    they evaluate to the safe outcome (deny / cash bucket)
//!
//! ## Example Usage
//!
//! ```rust
//! use mostrador_core::arqueo::{compute_expected, TenderLine};
//! use mostrador_core::money::Money;
//! use mostrador_core::types::PaymentMethod;
//!
//! let sales = [TenderLine::new(PaymentMethod::Efectivo, Money::from_pesos(1000))];
//! let expected = compute_expected(&sales, &[], Money::from_pesos(500));
//!
//! assert_eq!(expected[&PaymentMethod::Efectivo], Money::from_pesos(1500));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod arqueo;
pub mod error;
pub mod money;
pub mod permissions;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mostrador_core::Money` instead of
// `use mostrador_core::money::Money`

pub use arqueo::{
    compute_differences, compute_expected, ArqueoBreakdown, ArqueoSession, ArqueoStatus,
    CashCountRecord, LedgerEntry, LedgerKind, MethodDifference, MethodTally, TenderLine,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use permissions::{
    AccessCheck, AccessMode, AuthenticatedUser, DenialReason, Module, Permission,
    PermissionEvaluator, RoleTable,
};
pub use types::*;
