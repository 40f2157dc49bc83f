//! # Service Error Type
//!
//! Unified error type for the service layer - what UI callers see.
//!
//! Two things are deliberately NOT here, because they are results rather
//! than errors: permission denials (the guard returns a structured
//! [`AccessCheck`](mostrador_core::permissions::AccessCheck)) and the
//! reconciliation pre-save gate (a message list inside
//! [`CoreError::ArqueoNotValid`]). Transport failures carry no retry
//! machinery - the operator sees a message and tries again.

use thiserror::Error;

use crate::config::ConfigError;
use mostrador_core::{CoreError, ValidationError};
use mostrador_db::DbError;

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule violation from the core engines.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Input validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Database operation failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Configuration problem at startup.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Referenced entity doesn't exist.
    #[error("{entity} no encontrado: {id}")]
    NotFound { entity: String, id: String },

    /// The employee already has an open shift.
    #[error("El empleado ya tiene un turno abierto ({shift_id})")]
    ShiftAlreadyOpen { shift_id: String },
}

impl ServiceError {
    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ServiceError::not_found("Turno", "t-9");
        assert_eq!(err.to_string(), "Turno no encontrado: t-9");

        let err = ServiceError::ShiftAlreadyOpen {
            shift_id: "t-1".to_string(),
        };
        assert!(err.to_string().contains("turno abierto"));
    }

    #[test]
    fn test_wraps_core_errors_transparently() {
        let core = CoreError::ArqueoAlreadyExists {
            shift_id: "t-1".to_string(),
        };
        let service: ServiceError = core.into();
        assert_eq!(
            service.to_string(),
            "Ya se realizó un arqueo para el turno t-1"
        );
    }
}
