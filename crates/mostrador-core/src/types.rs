//! # Domain Types
//!
//! Core domain types used throughout Mostrador.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Expense      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  shift_id (FK)  │   │  shift_id (FK)  │       │
//! │  │  precio         │   │  metodo_pago    │   │  metodo_pago    │       │
//! │  │  stock          │   │  total          │   │  amount         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Shift       │   │  StockMovement  │   │   Employee      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  fecha/periodo  │   │  entrada/salida │   │  rol + grants   │       │
//! │  │  opening_amount │   │  stock_result.  │   │  activo         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  PaymentMethod: the five tenders every sale/expense settles through    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (sku, email, fecha+periodo)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::permissions::Module;

// =============================================================================
// Payment Method
// =============================================================================

/// The five recognized tenders a sale or expense can settle through.
///
/// ## Wire Tags
/// Serialized with the historical camelCase tags the frontend and the
/// stored rows use: `efectivo`, `tarjetaDebito`, `tarjetaCredito`,
/// `transferencia`, `mercadopago`.
///
/// ## Fallback Policy
/// Rows written by older clients may carry tags outside this set (or no tag
/// at all). Those are NOT errors: [`PaymentMethod::resolve`] folds them into
/// the cash bucket, so a drawer count never loses a sale to a typo'd tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    /// Cash in the drawer. Also the fallback bucket for unknown tags.
    Efectivo,
    /// Debit card.
    TarjetaDebito,
    /// Credit card.
    TarjetaCredito,
    /// Bank transfer.
    Transferencia,
    /// MercadoPago mobile wallet.
    Mercadopago,
}

impl PaymentMethod {
    /// All recognized methods, in drawer-sheet order.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Efectivo,
        PaymentMethod::TarjetaDebito,
        PaymentMethod::TarjetaCredito,
        PaymentMethod::Transferencia,
        PaymentMethod::Mercadopago,
    ];

    /// Resolves a raw stored tag (plus the optional card kind qualifier)
    /// into a recognized method.
    ///
    /// ## Tag Resolution
    /// - `tarjeta` is an old two-part tag: the card kind decides between
    ///   credit and debit, defaulting to debit when the kind is missing.
    /// - Current tags (`efectivo`, `tarjetaDebito`, ...) map directly.
    /// - Anything else - unknown tags, empty strings, missing values -
    ///   folds into `Efectivo`. Explicit fallback policy, not an error.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::types::PaymentMethod;
    ///
    /// assert_eq!(
    ///     PaymentMethod::resolve(Some("tarjeta"), Some("credito")),
    ///     PaymentMethod::TarjetaCredito
    /// );
    /// assert_eq!(
    ///     PaymentMethod::resolve(Some("cheque"), None),
    ///     PaymentMethod::Efectivo
    /// );
    /// assert_eq!(PaymentMethod::resolve(None, None), PaymentMethod::Efectivo);
    /// ```
    pub fn resolve(tag: Option<&str>, card_kind: Option<&str>) -> PaymentMethod {
        match tag.map(str::trim) {
            Some("efectivo") => PaymentMethod::Efectivo,
            Some("tarjeta") => match card_kind.map(str::trim) {
                Some("credito") | Some("crédito") => PaymentMethod::TarjetaCredito,
                // No card kind (or an unknown one) counts as debit
                _ => PaymentMethod::TarjetaDebito,
            },
            Some("tarjetaDebito") => PaymentMethod::TarjetaDebito,
            Some("tarjetaCredito") => PaymentMethod::TarjetaCredito,
            Some("transferencia") => PaymentMethod::Transferencia,
            Some("mercadopago") => PaymentMethod::Mercadopago,
            _ => PaymentMethod::Efectivo,
        }
    }

    /// The canonical wire/storage tag.
    pub const fn tag(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "efectivo",
            PaymentMethod::TarjetaDebito => "tarjetaDebito",
            PaymentMethod::TarjetaCredito => "tarjetaCredito",
            PaymentMethod::Transferencia => "transferencia",
            PaymentMethod::Mercadopago => "mercadopago",
        }
    }

    /// Operator-facing label for messages and sheets.
    pub const fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "Efectivo",
            PaymentMethod::TarjetaDebito => "Tarjeta Débito",
            PaymentMethod::TarjetaCredito => "Tarjeta Crédito",
            PaymentMethod::Transferencia => "Transferencia",
            PaymentMethod::Mercadopago => "MercadoPago",
        }
    }
}

// =============================================================================
// Shift ("turno")
// =============================================================================

/// Which half-day a shift covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum ShiftPeriod {
    #[serde(rename = "mañana")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "mañana"))]
    Manana,
    #[serde(rename = "tarde")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "tarde"))]
    Tarde,
}

impl ShiftPeriod {
    pub const fn label(&self) -> &'static str {
        match self {
            ShiftPeriod::Manana => "Mañana",
            ShiftPeriod::Tarde => "Tarde",
        }
    }
}

/// Shift lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    /// Sales and expenses accrue against the open drawer.
    Abierta,
    /// Closed; only the cash count record speaks for it now.
    Cerrada,
}

/// A bounded work period during which sales and expenses accrue against
/// one cash drawer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shift {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Employee responsible for the drawer.
    pub empleado_id: String,

    /// Employee display name, frozen at open time.
    pub empleado_nombre: Option<String>,

    /// Calendar date the shift belongs to.
    #[ts(as = "String")]
    pub fecha: NaiveDate,

    /// Morning or afternoon.
    pub periodo: ShiftPeriod,

    /// Cash placed in the drawer at shift start. Expected to be present
    /// at count time - the reconciliation adds it to the cash bucket.
    pub opening_amount: Money,

    /// Current lifecycle status.
    pub status: ShiftStatus,

    /// Running sales total (all methods).
    pub total_ventas: Money,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Shift {
    /// Whether operations (sales, expenses, counts) may still be recorded.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Abierta
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product (cuts, offal, cold cuts, pantry items).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown at the counter and on tickets.
    pub nombre: String,

    /// Category (vacuno, cerdo, pollo, fiambres, ...).
    pub categoria: String,

    /// Unit of sale: "kg" for by-weight cuts, "unidad" for pieces.
    pub unidad: String,

    /// Price per unit of sale.
    pub precio: Money,

    /// Cost per unit (for margin reports).
    pub costo: Option<Money>,

    /// Current stock level, in units of sale.
    pub stock: i64,

    /// Whether the product is active (soft delete).
    pub activo: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if the product can cover a sale of `quantity` units.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.activo && self.stock >= quantity
    }
}

// =============================================================================
// Sale ("venta")
// =============================================================================

/// A completed counter sale.
///
/// The payment method is resolved from the raw tag at creation time;
/// historical rows are re-resolved on load so the fallback policy applies
/// to data written before the tag set stabilized.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Shift this sale accrues against.
    pub shift_id: String,

    /// Employee who rang it up.
    pub empleado_id: String,

    /// Tender the sale settled through.
    pub metodo_pago: PaymentMethod,

    /// Total charged.
    pub total: Money,

    /// Optional customer reference (name, "cta. cte. García", ...).
    pub cliente: Option<String>,

    /// Free-form note.
    pub notas: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One line of a sale.
///
/// ## Snapshot Pattern
/// Product details (sku, name, unit price) are copied onto the line.
/// This preserves the sale history even if the product changes later.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,

    /// SKU at time of sale (frozen).
    pub sku_snapshot: String,

    /// Product name at time of sale (frozen).
    pub nombre_snapshot: String,

    /// Price per unit at time of sale (frozen).
    pub unit_price: Money,

    /// Quantity in the product's unit of sale.
    pub quantity: i64,

    /// unit_price × quantity.
    pub line_total: Money,
}

impl SaleItem {
    /// Recomputes the line total from its frozen parts.
    #[inline]
    pub fn computed_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Expense ("gasto" / "compra")
// =============================================================================

/// What kind of outflow an expense row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseKind {
    /// Generic operating expense (ice, bags, repairs...).
    Gasto,
    /// Merchandise purchase (restock from a supplier).
    Compra,
}

/// An expense or purchase paid out during a shift.
///
/// Expenses are method-tagged: a cash expense reduces the expected cash in
/// the drawer, a transfer expense reduces the expected transfer total.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Expense {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Shift the expense was paid out of.
    pub shift_id: String,

    /// Employee who recorded it.
    pub empleado_id: String,

    pub kind: ExpenseKind,

    /// Tender the expense was settled through.
    pub metodo_pago: PaymentMethod,

    /// Amount paid (always positive).
    pub amount: Money,

    /// What the money went to.
    pub description: String,

    /// Supplier, for purchases.
    pub proveedor: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Stock Movement ("movimiento")
// =============================================================================

/// Why stock changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock received (delivery, restock).
    Entrada,
    /// Stock removed (spoilage, transfer out).
    Salida,
    /// Manual correction after a recount.
    Ajuste,
    /// Automatic deduction from a sale line.
    Venta,
}

/// One inventory movement row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub kind: MovementKind,

    /// Signed change applied to the product's stock.
    pub quantity: i64,

    /// Stock level after applying this movement.
    pub stock_resultante: i64,

    /// Operator note ("merma", "recuento semanal", ...).
    pub motivo: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Employee ("empleado")
// =============================================================================

/// A staff directory row.
///
/// `rol` is the role name looked up in the role→permission table;
/// `module_grants` is the legacy per-user override list that widens module
/// access when the evaluator runs in legacy mode.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Employee {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub nombre: String,

    /// Login email - business identifier, unique.
    pub email: String,

    /// Role name: Administrador, Encargado, Cajero, Vendedor, Carnicero,
    /// Ayudante. Unknown names simply grant nothing.
    pub rol: String,

    /// Legacy explicit module grants (union'd with the role table when the
    /// evaluator runs in legacy mode; ignored in strict mode).
    pub module_grants: Vec<Module>,

    /// Inactive employees keep their history but every access check denies.
    pub activo: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
