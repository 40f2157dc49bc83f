//! # Error Types
//!
//! Domain-specific error types for mostrador-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mostrador-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mostrador-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  mostrador-services errors (separate crate)                            │
//! │  └── ServiceError     - What callers of the service layer see          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → caller             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (method, shift id, etc.)
//! 3. Errors are enum variants, never String
//!
//! Note that two families of operator-facing problems are deliberately NOT
//! errors: permission denials (structured [`AccessCheck`] results) and the
//! pre-save reconciliation gate (a `Vec<String>` of messages). Both are
//! ordinary return values the UI renders, not failures to propagate.
//!
//! [`AccessCheck`]: crate::permissions::AccessCheck

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A reconciliation session was mutated after being saved.
    ///
    /// ## When This Occurs
    /// - `record_count` / `add_entry` / `remove_entry` on a saved session
    /// - A second `save` on the same session
    ///
    /// The arqueo lifecycle is `InProgress → Saved` with no way back;
    /// corrections require a brand new cash count record.
    #[error("El arqueo del turno {shift_id} ya fue guardado")]
    ArqueoAlreadySaved { shift_id: String },

    /// A second cash count was attempted for a shift that already has one.
    #[error("Ya se realizó un arqueo para el turno {shift_id}")]
    ArqueoAlreadyExists { shift_id: String },

    /// The reconciliation gate rejected the session.
    ///
    /// Carries the full operator-facing message list so callers can surface
    /// every problem at once instead of one per attempt.
    #[error("El arqueo no pasó la validación ({} errores)", errors.len())]
    ArqueoNotValid { errors: Vec<String> },

    /// Insufficient stock to complete a sale line.
    #[error("Stock insuficiente para {sku}: disponible {available}, solicitado {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// A shift is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Recording a sale or expense against a closed shift
    /// - Starting a cash count on a closed shift
    /// - Closing an already closed shift
    #[error("El turno {shift_id} está {estado}, no admite la operación")]
    InvalidShiftState { shift_id: String, estado: String },

    /// Validation error (wraps ValidationError).
    #[error("Error de validación: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} es obligatorio")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} debe tener como máximo {max} caracteres")]
    TooLong { field: String, max: usize },

    /// Value must be strictly positive.
    #[error("{field} debe ser mayor a cero")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} no puede ser negativo")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. invalid UUID, malformed amount).
    #[error("{field} tiene un formato inválido: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} debe ser uno de: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g. duplicate SKU or email).
    #[error("{field} '{value}' ya existe")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "VACIO-KG".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Stock insuficiente para VACIO-KG: disponible 3, solicitado 5"
        );

        let err = CoreError::ArqueoAlreadyExists {
            shift_id: "t-01".to_string(),
        };
        assert_eq!(err.to_string(), "Ya se realizó un arqueo para el turno t-01");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "descripción".to_string(),
        };
        assert_eq!(err.to_string(), "descripción es obligatorio");

        let err = ValidationError::MustBePositive {
            field: "monto".to_string(),
        };
        assert_eq!(err.to_string(), "monto debe ser mayor a cero");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "descripción".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
