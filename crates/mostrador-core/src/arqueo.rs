//! # Arqueo Module
//!
//! The cash reconciliation engine: given what a shift sold and spent per
//! tender, what should be in the drawer - and what is actually there?
//!
//! ## Reconciliation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      End-of-Shift Reconciliation                        │
//! │                                                                         │
//! │  sales rows ──┐                                                         │
//! │  expense rows ├──► compute_expected() ──► expected per method           │
//! │  opening float┘         │                     (cash bucket gets the     │
//! │                         │                      opening float added)     │
//! │                         ▼                                               │
//! │               ArqueoSession (InProgress)                                │
//! │                 │  record_count(method, $)   ← operator counts drawer  │
//! │                 │  add_entry(ingreso/egreso) ← ad hoc adjustments      │
//! │                 │  refresh_expected(...)     ← source rows changed;    │
//! │                 │                              counted is preserved    │
//! │                 ▼                                                       │
//! │               compute_differences() ──► per-method + final difference  │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │               validate() ──► [] ──► save() ──► CashCountRecord         │
//! │                 │                                (Saved, terminal)     │
//! │                 └──► ["Debe contar Efectivo - ..."] ──► back to count  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - `expected` is always recomputed from source rows; only `counted`
//!   survives a refresh (merge by method key).
//! - Differences use exact equality on integer centavos - no tolerance.
//! - `Saved` is terminal: a saved session rejects every mutation, and
//!   corrections require a brand new record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::PaymentMethod;

// =============================================================================
// Tender Lines
// =============================================================================

/// One method-tagged amount feeding the expected computation - a sale or an
/// expense already resolved to a recognized method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenderLine {
    pub method: PaymentMethod,
    pub amount: Money,
}

impl TenderLine {
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        TenderLine { method, amount }
    }

    /// Builds a line from a raw stored tag, applying the fallback policy
    /// (unknown/missing tags fold into efectivo).
    pub fn from_raw(tag: Option<&str>, card_kind: Option<&str>, amount: Money) -> Self {
        TenderLine {
            method: PaymentMethod::resolve(tag, card_kind),
            amount,
        }
    }
}

// =============================================================================
// Expected Amounts
// =============================================================================

/// Computes the expected amount per tender for a shift.
///
/// For each of the five recognized methods:
/// `expected = Σ sales − Σ same-method expenses`, and the cash bucket
/// additionally gets the opening float added.
///
/// Pure function of its inputs; callers re-run it whenever the underlying
/// rows change and merge the result into the live session with
/// [`ArqueoSession::refresh_expected`], which preserves counted amounts.
///
/// The returned map always carries all five methods (zero where nothing
/// moved), so drawer sheets render every tender row.
///
/// ## Example
/// ```rust
/// use mostrador_core::arqueo::{compute_expected, TenderLine};
/// use mostrador_core::money::Money;
/// use mostrador_core::types::PaymentMethod;
///
/// let sales = [TenderLine::new(PaymentMethod::Efectivo, Money::from_pesos(1000))];
/// let expected = compute_expected(&sales, &[], Money::from_pesos(500));
/// assert_eq!(expected[&PaymentMethod::Efectivo], Money::from_pesos(1500));
/// ```
pub fn compute_expected(
    sales: &[TenderLine],
    expenses: &[TenderLine],
    opening_float: Money,
) -> BTreeMap<PaymentMethod, Money> {
    let mut expected: BTreeMap<PaymentMethod, Money> = PaymentMethod::ALL
        .iter()
        .map(|method| (*method, Money::zero()))
        .collect();

    for sale in sales {
        *expected.entry(sale.method).or_default() += sale.amount;
    }

    for expense in expenses {
        *expected.entry(expense.method).or_default() -= expense.amount;
    }

    // The opening float sits in the drawer, so it is expected in cash
    // and in cash only.
    *expected.entry(PaymentMethod::Efectivo).or_default() += opening_float;

    expected
}

// =============================================================================
// Tallies and Ledger Entries
// =============================================================================

/// Expected vs. counted for one tender.
///
/// `expected` is derived and overwritten on every refresh; `counted` is
/// operator-entered and lives only inside the active session until saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MethodTally {
    pub expected: Money,
    pub counted: Money,
}

/// Direction of an ad hoc ledger adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    /// Money that entered the drawer outside a sale.
    Ingreso,
    /// Money that left the drawer outside a recorded expense.
    Egreso,
}

/// An ad hoc adjustment not tied to a sale - a found bill, a small payout.
///
/// Created only while a session is in progress, removable before save,
/// immutable after save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntry {
    pub id: String,
    pub kind: LedgerKind,
    pub amount: Money,
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Differences
// =============================================================================

/// Per-method reconciliation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MethodDifference {
    pub expected: Money,
    pub counted: Money,
    /// counted − expected.
    pub difference: Money,
    /// Exact inequality - a one-centavo miss counts.
    pub has_difference: bool,
}

/// Aggregate reconciliation result across all tenders plus ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ArqueoBreakdown {
    pub per_method: BTreeMap<PaymentMethod, MethodDifference>,
    pub total_expected: Money,
    pub total_counted: Money,
    pub total_additional_incomes: Money,
    pub total_additional_expenses: Money,
    /// total_expected + ingresos − egresos.
    pub final_expected: Money,
    /// total_counted + ingresos − egresos.
    pub final_total: Money,
    /// final_total − final_expected.
    pub final_difference: Money,
    pub has_difference: bool,
}

/// Computes per-method and aggregate differences.
///
/// Purely derived from its inputs - calling it twice on the same tallies
/// yields identical output. The ledger adjustments shift expected and
/// counted totals by the same amount, so `final_difference` always equals
/// `total_counted − total_expected`; both forms are carried because the
/// drawer sheet prints all of them.
pub fn compute_differences(
    tallies: &BTreeMap<PaymentMethod, MethodTally>,
    incomes: &[LedgerEntry],
    expenses: &[LedgerEntry],
) -> ArqueoBreakdown {
    let per_method: BTreeMap<PaymentMethod, MethodDifference> = tallies
        .iter()
        .map(|(method, tally)| {
            let difference = tally.counted - tally.expected;
            (
                *method,
                MethodDifference {
                    expected: tally.expected,
                    counted: tally.counted,
                    difference,
                    has_difference: !difference.is_zero(),
                },
            )
        })
        .collect();

    let total_expected: Money = tallies.values().map(|t| t.expected).sum();
    let total_counted: Money = tallies.values().map(|t| t.counted).sum();

    let total_additional_incomes: Money = incomes.iter().map(|e| e.amount).sum();
    let total_additional_expenses: Money = expenses.iter().map(|e| e.amount).sum();

    let final_expected = total_expected + total_additional_incomes - total_additional_expenses;
    let final_total = total_counted + total_additional_incomes - total_additional_expenses;
    let final_difference = final_total - final_expected;

    ArqueoBreakdown {
        per_method,
        total_expected,
        total_counted,
        total_additional_incomes,
        total_additional_expenses,
        final_expected,
        final_total,
        final_difference,
        has_difference: !final_difference.is_zero(),
    }
}

// =============================================================================
// Session State Machine
// =============================================================================

/// Reconciliation lifecycle for a shift.
///
/// `NotStarted → InProgress → Saved`. No transition back from `Saved`;
/// an `InProgress` session is abandoned only by the ambient session ending
/// (there is deliberately no cancel operation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ArqueoStatus {
    NotStarted,
    InProgress,
    Saved,
}

/// A live reconciliation session for one shift.
///
/// Fields are private: `counted` values, ledger entries and the status flag
/// only change through methods that enforce the lifecycle rules above.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ArqueoSession {
    shift_id: String,
    empleado_id: String,
    status: ArqueoStatus,
    tallies: BTreeMap<PaymentMethod, MethodTally>,
    additional_incomes: Vec<LedgerEntry>,
    additional_expenses: Vec<LedgerEntry>,
    observaciones: Option<String>,
}

impl ArqueoSession {
    /// Opens a session with freshly computed expected amounts and zero
    /// counted values.
    pub fn start(
        shift_id: impl Into<String>,
        empleado_id: impl Into<String>,
        expected: BTreeMap<PaymentMethod, Money>,
    ) -> Self {
        let tallies = expected
            .into_iter()
            .map(|(method, amount)| {
                (
                    method,
                    MethodTally {
                        expected: amount,
                        counted: Money::zero(),
                    },
                )
            })
            .collect();

        ArqueoSession {
            shift_id: shift_id.into(),
            empleado_id: empleado_id.into(),
            status: ArqueoStatus::InProgress,
            tallies,
            additional_incomes: Vec::new(),
            additional_expenses: Vec::new(),
            observaciones: None,
        }
    }

    pub fn shift_id(&self) -> &str {
        &self.shift_id
    }

    pub fn empleado_id(&self) -> &str {
        &self.empleado_id
    }

    pub fn status(&self) -> ArqueoStatus {
        self.status
    }

    pub fn tallies(&self) -> &BTreeMap<PaymentMethod, MethodTally> {
        &self.tallies
    }

    pub fn additional_incomes(&self) -> &[LedgerEntry] {
        &self.additional_incomes
    }

    pub fn additional_expenses(&self) -> &[LedgerEntry] {
        &self.additional_expenses
    }

    fn ensure_in_progress(&self) -> CoreResult<()> {
        match self.status {
            ArqueoStatus::Saved => Err(CoreError::ArqueoAlreadySaved {
                shift_id: self.shift_id.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Merges freshly recomputed expected amounts into the session.
    ///
    /// Merge is by method key and overwrites only `expected`: amounts the
    /// operator already counted are preserved across recomputation.
    pub fn refresh_expected(
        &mut self,
        expected: &BTreeMap<PaymentMethod, Money>,
    ) -> CoreResult<()> {
        self.ensure_in_progress()?;

        for (method, amount) in expected {
            self.tallies.entry(*method).or_default().expected = *amount;
        }
        Ok(())
    }

    /// Records the counted amount for one tender, in memory only.
    ///
    /// Raw operator input is sanitized before this call (invalid text
    /// coerces to zero at the boundary); here the amount is stored as
    /// given - `validate` flags negatives before save.
    pub fn record_count(&mut self, method: PaymentMethod, amount: Money) -> CoreResult<()> {
        self.ensure_in_progress()?;
        self.tallies.entry(method).or_default().counted = amount;
        Ok(())
    }

    /// Appends an ad hoc ledger adjustment.
    ///
    /// ## Preconditions
    /// - `amount > 0`
    /// - `description` non-empty after trimming
    ///
    /// Violations return a [`ValidationError`] and perform no state change.
    pub fn add_entry(
        &mut self,
        kind: LedgerKind,
        amount: Money,
        description: &str,
    ) -> CoreResult<LedgerEntry> {
        self.ensure_in_progress()?;

        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::Required {
                field: "descripción".to_string(),
            }
            .into());
        }
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "monto".to_string(),
            }
            .into());
        }

        let entry = LedgerEntry {
            id: Uuid::new_v4().to_string(),
            kind,
            amount,
            description: description.to_string(),
            created_at: Utc::now(),
        };

        let list = match kind {
            LedgerKind::Ingreso => &mut self.additional_incomes,
            LedgerKind::Egreso => &mut self.additional_expenses,
        };
        list.push(entry.clone());
        Ok(entry)
    }

    /// Removes a ledger entry by id. Returns whether anything was removed.
    pub fn remove_entry(&mut self, id: &str) -> CoreResult<bool> {
        self.ensure_in_progress()?;

        let before = self.additional_incomes.len() + self.additional_expenses.len();
        self.additional_incomes.retain(|e| e.id != id);
        self.additional_expenses.retain(|e| e.id != id);
        let after = self.additional_incomes.len() + self.additional_expenses.len();
        Ok(after < before)
    }

    /// Sets the free-form observations carried onto the saved record.
    pub fn set_observaciones(&mut self, observaciones: Option<String>) -> CoreResult<()> {
        self.ensure_in_progress()?;
        self.observaciones = observaciones;
        Ok(())
    }

    /// Current differences for the sheet being filled in.
    pub fn differences(&self) -> ArqueoBreakdown {
        compute_differences(
            &self.tallies,
            &self.additional_incomes,
            &self.additional_expenses,
        )
    }

    /// Pre-save gate. Returns the full list of operator-facing problems;
    /// empty means the session may be saved.
    ///
    /// ## Rules
    /// - At least one method must have a counted amount.
    /// - No counted amount may be negative.
    /// - Every method with `expected > 0` must have a nonzero count: the
    ///   operator confirms every active tender even when the honest answer
    ///   is "the drawer really has nothing" - a forcing function, not
    ///   arithmetic.
    /// - Every ledger entry needs a description and a positive amount.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let has_any_count = self.tallies.values().any(|t| t.counted.is_positive());
        if !has_any_count {
            errors.push("Debe ingresar al menos un monto contado para continuar".to_string());
        }

        for (method, tally) in &self.tallies {
            if tally.counted.is_negative() {
                errors.push(format!(
                    "El monto contado de {} no puede ser negativo",
                    method.label()
                ));
            }

            if tally.expected.is_positive() && tally.counted.is_zero() {
                errors.push(format!(
                    "Debe contar {} - Esperado: {}",
                    method.label(),
                    tally.expected
                ));
            }
        }

        for (index, entry) in self.additional_incomes.iter().enumerate() {
            validate_entry(&mut errors, "ingreso", index, entry);
        }
        for (index, entry) in self.additional_expenses.iter().enumerate() {
            validate_entry(&mut errors, "egreso", index, entry);
        }

        errors
    }

    /// Closes the session: runs the validation gate and produces the
    /// persisted record. Terminal - afterwards every mutation (and a second
    /// save) is rejected.
    pub fn save(&mut self) -> CoreResult<CashCountRecord> {
        self.ensure_in_progress()?;

        let errors = self.validate();
        if !errors.is_empty() {
            return Err(CoreError::ArqueoNotValid { errors });
        }

        let breakdown = self.differences();
        self.status = ArqueoStatus::Saved;

        Ok(CashCountRecord {
            id: Uuid::new_v4().to_string(),
            shift_id: self.shift_id.clone(),
            empleado_id: self.empleado_id.clone(),
            tallies: breakdown.per_method.clone(),
            additional_incomes: self.additional_incomes.clone(),
            additional_expenses: self.additional_expenses.clone(),
            total_expected: breakdown.total_expected,
            total_counted: breakdown.total_counted,
            final_expected: breakdown.final_expected,
            final_total: breakdown.final_total,
            final_difference: breakdown.final_difference,
            observaciones: self.observaciones.clone(),
            created_at: Utc::now(),
        })
    }
}

fn validate_entry(errors: &mut Vec<String>, kind: &str, index: usize, entry: &LedgerEntry) {
    if entry.description.trim().is_empty() {
        errors.push(format!("El {} #{} debe tener una descripción", kind, index + 1));
    }
    if !entry.amount.is_positive() {
        errors.push(format!("El {} #{} debe tener un monto válido", kind, index + 1));
    }
}

// =============================================================================
// Persisted Record
// =============================================================================

/// The persisted reconciliation result for a shift close.
///
/// Created exactly once per shift close and never mutated afterwards -
/// corrections require a new record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashCountRecord {
    pub id: String,
    pub shift_id: String,
    pub empleado_id: String,
    pub tallies: BTreeMap<PaymentMethod, MethodDifference>,
    pub additional_incomes: Vec<LedgerEntry>,
    pub additional_expenses: Vec<LedgerEntry>,
    pub total_expected: Money,
    pub total_counted: Money,
    pub final_expected: Money,
    pub final_total: Money,
    pub final_difference: Money,
    pub observaciones: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(method: PaymentMethod, pesos: i64) -> TenderLine {
        TenderLine::new(method, Money::from_pesos(pesos))
    }

    #[test]
    fn test_expected_cash_sale_plus_opening_float() {
        let sales = [line(PaymentMethod::Efectivo, 1000)];
        let expected = compute_expected(&sales, &[], Money::from_pesos(500));

        assert_eq!(expected[&PaymentMethod::Efectivo], Money::from_pesos(1500));
    }

    #[test]
    fn test_opening_float_touches_only_cash() {
        let expected = compute_expected(&[], &[], Money::from_pesos(500));

        assert_eq!(expected[&PaymentMethod::Efectivo], Money::from_pesos(500));
        for method in PaymentMethod::ALL {
            if method != PaymentMethod::Efectivo {
                assert!(expected[&method].is_zero(), "{method:?} should be zero");
            }
        }
    }

    #[test]
    fn test_expected_subtracts_same_method_expenses() {
        let sales = [
            line(PaymentMethod::Efectivo, 1000),
            line(PaymentMethod::Transferencia, 800),
        ];
        let expenses = [
            line(PaymentMethod::Efectivo, 300),
            line(PaymentMethod::Transferencia, 100),
        ];
        let expected = compute_expected(&sales, &expenses, Money::zero());

        assert_eq!(expected[&PaymentMethod::Efectivo], Money::from_pesos(700));
        assert_eq!(
            expected[&PaymentMethod::Transferencia],
            Money::from_pesos(700)
        );
    }

    #[test]
    fn test_expected_sum_matches_sales_minus_expenses() {
        // Partition property: excluding the opening float, Σ expected over
        // all methods equals Σ sales − Σ expenses for the whole shift.
        let sales = [
            line(PaymentMethod::Efectivo, 1500),
            line(PaymentMethod::TarjetaDebito, 720),
            line(PaymentMethod::TarjetaCredito, 430),
            line(PaymentMethod::Mercadopago, 260),
        ];
        let expenses = [
            line(PaymentMethod::Efectivo, 340),
            line(PaymentMethod::Transferencia, 80),
        ];

        let expected = compute_expected(&sales, &expenses, Money::zero());
        let total: Money = expected.values().copied().sum();

        let sales_total: Money = sales.iter().map(|l| l.amount).sum();
        let expense_total: Money = expenses.iter().map(|l| l.amount).sum();
        assert_eq!(total, sales_total - expense_total);
    }

    #[test]
    fn test_unknown_tags_fold_into_cash() {
        let sales = [
            TenderLine::from_raw(Some("cheque"), None, Money::from_pesos(100)),
            TenderLine::from_raw(None, None, Money::from_pesos(50)),
        ];
        let expenses = [TenderLine::from_raw(
            Some("vale"),
            None,
            Money::from_pesos(30),
        )];
        let expected = compute_expected(&sales, &expenses, Money::zero());

        assert_eq!(expected[&PaymentMethod::Efectivo], Money::from_pesos(120));
    }

    #[test]
    fn test_expected_map_always_has_all_methods() {
        let expected = compute_expected(&[], &[], Money::zero());
        assert_eq!(expected.len(), PaymentMethod::ALL.len());
    }

    fn session_with_sales(sales: &[TenderLine], opening: Money) -> ArqueoSession {
        ArqueoSession::start("t-1", "e-1", compute_expected(sales, &[], opening))
    }

    #[test]
    fn test_exact_count_has_no_difference() {
        let mut session = session_with_sales(
            &[line(PaymentMethod::TarjetaCredito, 200)],
            Money::zero(),
        );
        session
            .record_count(PaymentMethod::TarjetaCredito, Money::from_pesos(200))
            .unwrap();

        let breakdown = session.differences();
        let credito = &breakdown.per_method[&PaymentMethod::TarjetaCredito];
        assert!(credito.difference.is_zero());
        assert!(!credito.has_difference);
    }

    #[test]
    fn test_differences_are_signed() {
        let mut session =
            session_with_sales(&[line(PaymentMethod::Efectivo, 1000)], Money::zero());
        session
            .record_count(PaymentMethod::Efectivo, Money::from_pesos(950))
            .unwrap();

        let breakdown = session.differences();
        let efectivo = &breakdown.per_method[&PaymentMethod::Efectivo];
        assert_eq!(efectivo.difference, Money::from_pesos(-50));
        assert!(efectivo.has_difference);
        assert_eq!(breakdown.final_difference, Money::from_pesos(-50));
    }

    #[test]
    fn test_compute_differences_is_idempotent() {
        let mut session = session_with_sales(
            &[
                line(PaymentMethod::Efectivo, 500),
                line(PaymentMethod::Mercadopago, 120),
            ],
            Money::from_pesos(200),
        );
        session
            .record_count(PaymentMethod::Efectivo, Money::from_pesos(700))
            .unwrap();
        session
            .add_entry(LedgerKind::Ingreso, Money::from_pesos(25), "billete hallado")
            .unwrap();

        let first = session.differences();
        let second = session.differences();
        assert_eq!(first, second);
    }

    #[test]
    fn test_ledger_entries_shift_both_final_totals() {
        let mut session =
            session_with_sales(&[line(PaymentMethod::Efectivo, 100)], Money::zero());
        session
            .record_count(PaymentMethod::Efectivo, Money::from_pesos(100))
            .unwrap();
        session
            .add_entry(LedgerKind::Ingreso, Money::from_pesos(40), "propina caja")
            .unwrap();
        session
            .add_entry(LedgerKind::Egreso, Money::from_pesos(15), "hielo")
            .unwrap();

        let b = session.differences();
        assert_eq!(b.total_additional_incomes, Money::from_pesos(40));
        assert_eq!(b.total_additional_expenses, Money::from_pesos(15));
        assert_eq!(b.final_expected, Money::from_pesos(125));
        assert_eq!(b.final_total, Money::from_pesos(125));
        assert!(b.final_difference.is_zero());
        assert!(!b.has_difference);
    }

    #[test]
    fn test_refresh_preserves_counted() {
        let mut session =
            session_with_sales(&[line(PaymentMethod::Efectivo, 300)], Money::zero());
        session
            .record_count(PaymentMethod::Efectivo, Money::from_pesos(280))
            .unwrap();

        // A late sale landed; expected grows but the count stays.
        let refreshed = compute_expected(
            &[line(PaymentMethod::Efectivo, 450)],
            &[],
            Money::zero(),
        );
        session.refresh_expected(&refreshed).unwrap();

        let tally = session.tallies()[&PaymentMethod::Efectivo];
        assert_eq!(tally.expected, Money::from_pesos(450));
        assert_eq!(tally.counted, Money::from_pesos(280));
    }

    #[test]
    fn test_validate_requires_some_count() {
        let session = session_with_sales(&[], Money::zero());
        let errors = session.validate();
        assert!(errors
            .iter()
            .any(|e| e.contains("al menos un monto contado")));
    }

    #[test]
    fn test_validate_rejects_negative_count() {
        let mut session = session_with_sales(&[], Money::zero());
        session
            .record_count(PaymentMethod::Efectivo, Money::from_pesos(-10))
            .unwrap();

        let errors = session.validate();
        assert!(errors
            .iter()
            .any(|e| e.contains("Efectivo no puede ser negativo")));
    }

    #[test]
    fn test_validate_forces_count_of_active_tenders() {
        let mut session = session_with_sales(
            &[
                line(PaymentMethod::Efectivo, 100),
                line(PaymentMethod::Transferencia, 200),
            ],
            Money::zero(),
        );
        session
            .record_count(PaymentMethod::Efectivo, Money::from_pesos(100))
            .unwrap();

        let errors = session.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Debe contar Transferencia"));

        session
            .record_count(PaymentMethod::Transferencia, Money::from_pesos(200))
            .unwrap();
        assert!(session.validate().is_empty());
    }

    #[test]
    fn test_add_entry_rejects_bad_input_without_state_change() {
        let mut session = session_with_sales(&[], Money::zero());

        let err = session
            .add_entry(LedgerKind::Ingreso, Money::from_pesos(10), "   ")
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { .. })
        ));

        let err = session
            .add_entry(LedgerKind::Egreso, Money::from_pesos(-5), "x")
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::MustBePositive { .. })
        ));

        assert!(session.additional_incomes().is_empty());
        assert!(session.additional_expenses().is_empty());
    }

    #[test]
    fn test_remove_entry_before_save() {
        let mut session = session_with_sales(&[], Money::zero());
        let id = session
            .add_entry(LedgerKind::Egreso, Money::from_pesos(20), "flete")
            .unwrap()
            .id
            .clone();

        assert!(session.remove_entry(&id).unwrap());
        assert!(!session.remove_entry(&id).unwrap());
        assert!(session.additional_expenses().is_empty());
    }

    #[test]
    fn test_save_gate_blocks_invalid_session() {
        let mut session = session_with_sales(&[line(PaymentMethod::Efectivo, 100)], Money::zero());

        let err = session.save().unwrap_err();
        match err {
            CoreError::ArqueoNotValid { errors } => assert!(!errors.is_empty()),
            other => panic!("unexpected error: {other:?}"),
        }
        // Still in progress - the operator goes back to counting.
        assert_eq!(session.status(), ArqueoStatus::InProgress);
    }

    #[test]
    fn test_save_is_terminal() {
        let mut session =
            session_with_sales(&[line(PaymentMethod::Efectivo, 100)], Money::zero());
        session
            .record_count(PaymentMethod::Efectivo, Money::from_pesos(100))
            .unwrap();

        let record = session.save().unwrap();
        assert_eq!(session.status(), ArqueoStatus::Saved);
        assert_eq!(record.shift_id, "t-1");
        assert_eq!(record.total_counted, Money::from_pesos(100));
        assert!(record.final_difference.is_zero());

        // Every further mutation is rejected.
        assert!(matches!(
            session.record_count(PaymentMethod::Efectivo, Money::zero()),
            Err(CoreError::ArqueoAlreadySaved { .. })
        ));
        assert!(matches!(
            session.add_entry(LedgerKind::Ingreso, Money::from_pesos(1), "x"),
            Err(CoreError::ArqueoAlreadySaved { .. })
        ));
        assert!(matches!(
            session.save(),
            Err(CoreError::ArqueoAlreadySaved { .. })
        ));
    }

    #[test]
    fn test_negative_ledger_amount_blocks_save() {
        let mut session =
            session_with_sales(&[line(PaymentMethod::Efectivo, 100)], Money::zero());
        session
            .record_count(PaymentMethod::Efectivo, Money::from_pesos(100))
            .unwrap();

        // Entries with bad amounts can't get in through add_entry; a
        // negative amount smuggled into the list is still caught by the
        // pre-save gate.
        session.additional_incomes.push(LedgerEntry {
            id: "x".into(),
            kind: LedgerKind::Ingreso,
            amount: Money::from_pesos(-5),
            description: "x".into(),
            created_at: Utc::now(),
        });

        let errors = session.validate();
        assert!(errors.iter().any(|e| e.contains("monto válido")));
        assert!(session.save().is_err());
    }
}
