//! # Validation Module
//!
//! Input validation utilities shared by the service layer.
//!
//! ## Validation Strategy
//! Validation runs in layers: the frontend gives immediate feedback, the
//! service layer calls THIS MODULE before touching a repository, and the
//! database schema (NOT NULL, UNIQUE, CHECK) is the last line. The
//! reconciliation gate is different on purpose - it accumulates a message
//! list (`ArqueoSession::validate`) instead of failing on the first
//! problem, because the operator needs to see everything at once.

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use mostrador_core::validation::validate_sku;
///
/// assert!(validate_sku("VACIO-KG").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("con espacio").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "solo letras, números, guiones y guiones bajos".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (product, employee, supplier).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a free-form description (expenses, ledger entries).
///
/// Returns the trimmed description.
pub fn validate_description(description: &str) -> ValidationResult<String> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "descripción".to_string(),
        });
    }

    if description.len() > 500 {
        return Err(ValidationError::TooLong {
            field: "descripción".to_string(),
            max: 500,
        });
    }

    Ok(description.to_string())
}

/// Validates a login email. Deliberately shallow: non-empty, one `@`,
/// something on both sides. The mail provider is the real validator.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "formato de email inválido".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale/movement quantity (must be strictly positive).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "cantidad".to_string(),
        });
    }
    Ok(())
}

/// Validates an amount that must be strictly positive (expenses, ledger
/// entries, sale totals).
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an amount that may be zero but not negative (prices, opening
/// floats, counted amounts).
pub fn validate_non_negative_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "debe ser un UUID válido".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("VACIO-KG").is_ok());
        assert!(validate_sku("CHORIZO_500").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("con espacio").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("nombre", "Vacío").is_ok());
        assert!(validate_name("nombre", "").is_err());
        assert!(validate_name("nombre", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_description_trims() {
        assert_eq!(validate_description("  hielo  ").unwrap(), "hielo");
        assert!(validate_description("   ").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("cajero@mostrador.test").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("sin-arroba").is_err());
        assert!(validate_email("@dominio.com").is_err());
        assert!(validate_email("alguien@sinpunto").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_positive_amount("monto", Money::from_centavos(1)).is_ok());
        assert!(validate_positive_amount("monto", Money::zero()).is_err());
        assert!(validate_positive_amount("monto", Money::from_centavos(-1)).is_err());

        assert!(validate_non_negative_amount("precio", Money::zero()).is_ok());
        assert!(validate_non_negative_amount("precio", Money::from_centavos(-1)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("no-es-uuid").is_err());
    }
}
