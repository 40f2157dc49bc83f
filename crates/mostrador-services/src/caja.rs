//! # Caja Services
//!
//! Drawer operations (shifts, sales, expenses) and the cash count flow.
//!
//! ## Cash Count Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CashCountService                                                       │
//! │                                                                         │
//! │  start(shift)                                                           │
//! │    ├── shift must exist and be open                                    │
//! │    ├── no saved count may exist for it ("Ya se realizó un arqueo")     │
//! │    └── expected_for_shift() seeds the session                          │
//! │                                                                         │
//! │  record_count(session, method, raw input)                               │
//! │    └── sanitize_amount(): lenient parse, anything invalid → $0.00      │
//! │        (forgiving input path: no error, the gate catches zeros)        │
//! │                                                                         │
//! │  refresh(session)                                                       │
//! │    └── re-derive expected from the rows; counted survives the merge    │
//! │                                                                         │
//! │  save(session)                                                          │
//! │    ├── session.save() runs the message-list gate                       │
//! │    └── record persisted once; UNIQUE(shift_id) backstops the rule      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All business math lives in `mostrador_core::arqueo`; this module only
//! fetches rows, sanitizes operator input and persists the result.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use mostrador_core::arqueo::{compute_expected, ArqueoSession, CashCountRecord};
use mostrador_core::permissions::AuthenticatedUser;
use mostrador_core::validation::{
    validate_description, validate_non_negative_amount, validate_positive_amount,
    validate_quantity,
};
use mostrador_core::{
    CoreError, Expense, ExpenseKind, Money, PaymentMethod, Sale, SaleItem, Shift, ShiftPeriod,
    ValidationError,
};
use mostrador_db::repository::expense::NewExpense;
use mostrador_db::repository::shift::NewShift;
use mostrador_db::Database;

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Input Sanitization
// =============================================================================

/// Sanitizes a raw counted-amount string from the drawer sheet.
///
/// The count inputs are deliberately forgiving: invalid or non-numeric
/// text coerces to zero instead of raising an error, and negatives (which
/// the inputs can't produce anyway) clamp to zero. This is the explicit
/// boundary step that keeps the core engine total and side-effect free.
pub fn sanitize_amount(raw: &str) -> Money {
    match Money::parse(raw) {
        Some(amount) if !amount.is_negative() => amount,
        _ => Money::zero(),
    }
}

// =============================================================================
// Caja Service
// =============================================================================

/// One line of a sale as entered at the counter.
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Shift, sale and expense operations against the open drawer.
#[derive(Debug, Clone)]
pub struct CajaService {
    db: Database,
}

impl CajaService {
    pub fn new(db: Database) -> Self {
        CajaService { db }
    }

    /// Opens a shift for the given user.
    ///
    /// One open shift per employee: a second open is rejected with the
    /// existing shift's id so the UI can offer to resume it.
    pub async fn open_shift(
        &self,
        user: &AuthenticatedUser,
        fecha: NaiveDate,
        periodo: ShiftPeriod,
        opening_amount: Money,
    ) -> ServiceResult<Shift> {
        validate_non_negative_amount("monto inicial", opening_amount)?;

        if let Some(active) = self.db.shifts().active_for_employee(&user.id).await? {
            return Err(ServiceError::ShiftAlreadyOpen {
                shift_id: active.id,
            });
        }

        let shift = self
            .db
            .shifts()
            .open(NewShift {
                empleado_id: user.id.clone(),
                empleado_nombre: Some(user.nombre.clone()),
                fecha,
                periodo,
                opening_amount,
            })
            .await?;

        info!(shift_id = %shift.id, empleado = %user.email, "Turno abierto");
        Ok(shift)
    }

    /// Closes an open shift.
    pub async fn close_shift(&self, shift_id: &str) -> ServiceResult<Shift> {
        let shift = self.require_shift(shift_id).await?;
        if !shift.is_open() {
            return Err(CoreError::InvalidShiftState {
                shift_id: shift_id.to_string(),
                estado: "cerrada".to_string(),
            }
            .into());
        }

        self.db.shifts().close(shift_id).await?;
        let closed = self.require_shift(shift_id).await?;

        info!(shift_id = %shift_id, total = %closed.total_ventas, "Turno cerrado");
        Ok(closed)
    }

    /// Rings up a sale against an open shift.
    ///
    /// Validates quantities and stock coverage, freezes product snapshots
    /// onto the lines and hands the whole thing to the sale transaction.
    pub async fn record_sale(
        &self,
        shift_id: &str,
        empleado_id: &str,
        metodo_pago: PaymentMethod,
        lines: &[SaleLine],
        cliente: Option<String>,
        notas: Option<String>,
    ) -> ServiceResult<Sale> {
        let shift = self.require_shift(shift_id).await?;
        if !shift.is_open() {
            return Err(CoreError::InvalidShiftState {
                shift_id: shift_id.to_string(),
                estado: "cerrada".to_string(),
            }
            .into());
        }

        if lines.is_empty() {
            return Err(ValidationError::Required {
                field: "productos".to_string(),
            }
            .into());
        }

        let sale_id = Uuid::new_v4().to_string();
        let mut items = Vec::with_capacity(lines.len());
        let mut total = Money::zero();

        for line in lines {
            validate_quantity(line.quantity)?;

            let product = self
                .db
                .products()
                .get_by_id(&line.product_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Producto", &line.product_id))?;

            if !product.can_sell(line.quantity) {
                return Err(CoreError::InsufficientStock {
                    sku: product.sku,
                    available: product.stock,
                    requested: line.quantity,
                }
                .into());
            }

            let line_total = product.precio.multiply_quantity(line.quantity);
            total += line_total;
            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: product.id.clone(),
                sku_snapshot: product.sku.clone(),
                nombre_snapshot: product.nombre.clone(),
                unit_price: product.precio,
                quantity: line.quantity,
                line_total,
            });
        }

        let sale = Sale {
            id: sale_id,
            shift_id: shift_id.to_string(),
            empleado_id: empleado_id.to_string(),
            metodo_pago,
            total,
            cliente,
            notas,
            created_at: Utc::now(),
        };

        self.db.sales().create(&sale, &items).await?;

        info!(
            sale_id = %sale.id,
            total = %sale.total,
            metodo = sale.metodo_pago.tag(),
            lines = items.len(),
            "Venta registrada"
        );
        Ok(sale)
    }

    /// Records an expense or purchase against an open shift.
    pub async fn record_expense(
        &self,
        shift_id: &str,
        empleado_id: &str,
        kind: ExpenseKind,
        metodo_pago: PaymentMethod,
        amount: Money,
        description: &str,
        proveedor: Option<String>,
    ) -> ServiceResult<Expense> {
        let shift = self.require_shift(shift_id).await?;
        if !shift.is_open() {
            return Err(CoreError::InvalidShiftState {
                shift_id: shift_id.to_string(),
                estado: "cerrada".to_string(),
            }
            .into());
        }

        validate_positive_amount("monto", amount)?;
        let description = validate_description(description)?;

        let expense = self
            .db
            .expenses()
            .record(NewExpense {
                shift_id: shift_id.to_string(),
                empleado_id: empleado_id.to_string(),
                kind,
                metodo_pago,
                amount,
                description,
                proveedor,
            })
            .await?;

        info!(expense_id = %expense.id, amount = %expense.amount, "Gasto registrado");
        Ok(expense)
    }

    async fn require_shift(&self, shift_id: &str) -> ServiceResult<Shift> {
        self.db
            .shifts()
            .get_by_id(shift_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Turno", shift_id))
    }
}

// =============================================================================
// Cash Count Service
// =============================================================================

/// The arqueo flow over the database.
#[derive(Debug, Clone)]
pub struct CashCountService {
    db: Database,
}

impl CashCountService {
    pub fn new(db: Database) -> Self {
        CashCountService { db }
    }

    /// Expected amount per tender for a shift, derived from its rows.
    ///
    /// Recomputed from source data on every call - never cached - so a
    /// late sale changes the next refresh instead of leaking a stale
    /// expectation into the count.
    pub async fn expected_for_shift(
        &self,
        shift_id: &str,
    ) -> ServiceResult<BTreeMap<PaymentMethod, Money>> {
        let shift = self
            .db
            .shifts()
            .get_by_id(shift_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Turno", shift_id))?;

        let sales = self.db.sales().tenders_by_shift(shift_id).await?;
        let expenses = self.db.expenses().tenders_by_shift(shift_id).await?;

        debug!(
            shift_id = %shift_id,
            sales = sales.len(),
            expenses = expenses.len(),
            opening = %shift.opening_amount,
            "Computing expected amounts"
        );

        Ok(compute_expected(&sales, &expenses, shift.opening_amount))
    }

    /// Opens a reconciliation session for an open shift without a saved
    /// count.
    pub async fn start(
        &self,
        shift_id: &str,
        empleado_id: &str,
    ) -> ServiceResult<ArqueoSession> {
        let shift = self
            .db
            .shifts()
            .get_by_id(shift_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Turno", shift_id))?;

        if !shift.is_open() {
            return Err(CoreError::InvalidShiftState {
                shift_id: shift_id.to_string(),
                estado: "cerrada".to_string(),
            }
            .into());
        }

        if self.db.cash_counts().exists_for_shift(shift_id).await? {
            return Err(CoreError::ArqueoAlreadyExists {
                shift_id: shift_id.to_string(),
            }
            .into());
        }

        let expected = self.expected_for_shift(shift_id).await?;
        info!(shift_id = %shift_id, empleado = %empleado_id, "Arqueo iniciado");
        Ok(ArqueoSession::start(shift_id, empleado_id, expected))
    }

    /// Re-derives expected amounts and merges them into the session,
    /// preserving everything already counted.
    pub async fn refresh(&self, session: &mut ArqueoSession) -> ServiceResult<()> {
        let expected = self.expected_for_shift(session.shift_id()).await?;
        session.refresh_expected(&expected)?;
        Ok(())
    }

    /// Records a counted amount from raw operator input.
    ///
    /// Returns the sanitized amount actually stored.
    pub fn record_count(
        &self,
        session: &mut ArqueoSession,
        method: PaymentMethod,
        raw: &str,
    ) -> ServiceResult<Money> {
        let amount = sanitize_amount(raw);
        session.record_count(method, amount)?;
        Ok(amount)
    }

    /// Runs the pre-save gate and persists the record.
    ///
    /// Terminal: once this succeeds the session rejects every further
    /// mutation, and the shift can never get a second count.
    pub async fn save(&self, session: &mut ArqueoSession) -> ServiceResult<CashCountRecord> {
        // Re-check before mutating the session so a duplicate (e.g. two
        // tabs on the same shift) fails while the session is still usable.
        if self
            .db
            .cash_counts()
            .exists_for_shift(session.shift_id())
            .await?
        {
            return Err(CoreError::ArqueoAlreadyExists {
                shift_id: session.shift_id().to_string(),
            }
            .into());
        }

        let record = session.save()?;
        self.db.cash_counts().insert(&record).await?;

        info!(
            record_id = %record.id,
            shift_id = %record.shift_id,
            difference = %record.final_difference,
            "Arqueo guardado"
        );
        Ok(record)
    }

    /// The saved count for a shift, if any.
    pub async fn count_for_shift(&self, shift_id: &str) -> ServiceResult<Option<CashCountRecord>> {
        Ok(self.db.cash_counts().get_by_shift(shift_id).await?)
    }

    /// Saved counts in a timestamp range, newest first.
    pub async fn history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<Vec<CashCountRecord>> {
        Ok(self.db.cash_counts().list_by_range(from, to).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
