//! # Application Configuration
//!
//! Configuration is loaded from environment variables with fallback to
//! safe defaults. There is no process-global config: `AppConfig::load()`
//! returns a value the caller threads to whoever needs it.

use serde::{Deserialize, Serialize};
use std::env;

use mostrador_core::permissions::AccessMode;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database file.
    pub database_path: String,

    /// Display name shown on tickets and screens.
    pub app_name: String,

    /// Verbose diagnostics (development).
    pub debug: bool,

    /// Strict role evaluation: when false, legacy per-user module grants
    /// widen access (union semantics).
    pub strict_roles: bool,

    /// Whether permission checks are written to the audit trail.
    pub audit_enabled: bool,

    /// Idle session lifetime in seconds.
    pub session_timeout_secs: i64,

    /// Page size for listing screens.
    pub items_per_page: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// ## Variables
    /// - `MOSTRADOR_DB_PATH` (default `./mostrador.db`)
    /// - `MOSTRADOR_APP_NAME` (default `Mostrador`)
    /// - `MOSTRADOR_DEBUG` (default `false`)
    /// - `MOSTRADOR_STRICT_ROLES` (default `true`)
    /// - `MOSTRADOR_AUDIT_ENABLED` (default `true`)
    /// - `MOSTRADOR_SESSION_TIMEOUT_SECS` (default `3600`)
    /// - `MOSTRADOR_ITEMS_PER_PAGE` (default `50`)
    pub fn load() -> Result<Self, ConfigError> {
        let config = AppConfig {
            database_path: env::var("MOSTRADOR_DB_PATH")
                .unwrap_or_else(|_| "./mostrador.db".to_string()),

            app_name: env::var("MOSTRADOR_APP_NAME").unwrap_or_else(|_| "Mostrador".to_string()),

            debug: parse_bool("MOSTRADOR_DEBUG", false)?,

            strict_roles: parse_bool("MOSTRADOR_STRICT_ROLES", true)?,

            audit_enabled: parse_bool("MOSTRADOR_AUDIT_ENABLED", true)?,

            session_timeout_secs: env::var("MOSTRADOR_SESSION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("MOSTRADOR_SESSION_TIMEOUT_SECS".to_string())
                })?,

            items_per_page: env::var("MOSTRADOR_ITEMS_PER_PAGE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MOSTRADOR_ITEMS_PER_PAGE".to_string()))?,
        };

        Ok(config)
    }

    /// The evaluation mode the permission guard should run in.
    pub fn access_mode(&self) -> AccessMode {
        if self.strict_roles {
            AccessMode::Strict
        } else {
            AccessMode::Legacy
        }
    }

    /// Sanity checks worth showing all at once on a settings screen.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.database_path.trim().is_empty() {
            errors.push("La ruta de la base de datos es requerida".to_string());
        }
        if self.app_name.trim().is_empty() {
            errors.push("El nombre de la aplicación es requerido".to_string());
        }
        if self.session_timeout_secs <= 0 {
            errors.push("El timeout de sesión debe ser mayor a 0".to_string());
        }
        if self.items_per_page == 0 {
            errors.push("Items por página debe ser mayor a 0".to_string());
        }

        errors
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: "./mostrador.db".to_string(),
            app_name: "Mostrador".to_string(),
            debug: false,
            strict_roles: true,
            audit_enabled: true,
            session_timeout_secs: 3600,
            items_per_page: 50,
        }
    }
}

fn parse_bool(var: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue(var.to_string())),
        },
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
