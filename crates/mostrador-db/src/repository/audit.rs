//! # Audit Log Repository
//!
//! Append-only access trail.
//!
//! Writes here are *best-effort from the caller's point of view*: the
//! services layer swallows failures so a broken audit table can never
//! block an access decision. This repository itself reports errors
//! normally - deciding to ignore them is the caller's policy.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Input for one audit row.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    /// What was attempted ("check_module_access", "save_arqueo", ...).
    pub action: String,
    /// Module context (lowercase module name or "system").
    pub module: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    /// Id of the guard session that produced the entry.
    pub session_id: String,
    pub success: bool,
    /// Stable reason code on denial ("PERMISOS_INSUFICIENTES", ...).
    pub reason_code: Option<String>,
    /// Free-form context (role name, redirect target, ...).
    pub detail: Option<String>,
}

/// A stored audit row.
#[derive(Debug, Clone)]
pub struct AuditLogEntry {
    pub id: String,
    pub action: String,
    pub module: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub session_id: String,
    pub success: bool,
    pub reason_code: Option<String>,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Repository for audit log operations.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    /// Creates a new AuditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Appends one entry.
    pub async fn append(&self, entry: NewAuditEntry) -> DbResult<AuditLogEntry> {
        let stored = AuditLogEntry {
            id: Uuid::new_v4().to_string(),
            action: entry.action,
            module: entry.module,
            user_id: entry.user_id,
            user_email: entry.user_email,
            session_id: entry.session_id,
            success: entry.success,
            reason_code: entry.reason_code,
            detail: entry.detail,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                id, action, module, user_id, user_email, session_id,
                success, reason_code, detail, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.action)
        .bind(&stored.module)
        .bind(&stored.user_id)
        .bind(&stored.user_email)
        .bind(&stored.session_id)
        .bind(stored.success)
        .bind(&stored.reason_code)
        .bind(&stored.detail)
        .bind(stored.created_at)
        .execute(&self.pool)
        .await?;

        Ok(stored)
    }

    /// Most recent entries, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query(
            "SELECT id, action, module, user_id, user_email, session_id,
                    success, reason_code, detail, created_at
             FROM audit_logs
             ORDER BY created_at DESC
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(map_entry)
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::from)
    }
}

fn map_entry(row: &SqliteRow) -> Result<AuditLogEntry, sqlx::Error> {
    Ok(AuditLogEntry {
        id: row.try_get("id")?,
        action: row.try_get("action")?,
        module: row.try_get("module")?,
        user_id: row.try_get("user_id")?,
        user_email: row.try_get("user_email")?,
        session_id: row.try_get("session_id")?,
        success: row.try_get("success")?,
        reason_code: row.try_get("reason_code")?,
        detail: row.try_get("detail")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_append_and_recent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.audit();

        repo.append(NewAuditEntry {
            action: "check_module_access".to_string(),
            module: "caja".to_string(),
            user_id: Some("e-1".to_string()),
            user_email: Some("marta@mostrador.test".to_string()),
            session_id: "s-1".to_string(),
            success: false,
            reason_code: Some("PERMISOS_INSUFICIENTES".to_string()),
            detail: Some("rol=Ayudante".to_string()),
        })
        .await
        .unwrap();

        let entries = repo.recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].module, "caja");
        assert!(!entries[0].success);
        assert_eq!(
            entries[0].reason_code.as_deref(),
            Some("PERMISOS_INSUFICIENTES")
        );
    }
}
