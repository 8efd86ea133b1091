//! PostgreSQL implementation of CallStore
//!
//! Each call is one JSONB document plus a version column. Partial updates
//! merge the patch into the document with `||` and only match the row while
//! the version is unchanged.

use crate::domain::calling::{Call, CallPatch, CallStore, NewCall};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::CallId;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, error};

pub struct PgCallStore {
    pool: PgPool,
}

impl PgCallStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_error(context: &str, e: sqlx::Error) -> DomainError {
    error!("{}: {}", context, e);
    DomainError::Storage(format!("Database error: {}", e))
}

fn row_to_call(row: &PgRow) -> Result<Call> {
    let doc: serde_json::Value = row.get("doc");
    let version: i64 = row.get("version");

    let mut call: Call = serde_json::from_value(doc)
        .map_err(|e| DomainError::Internal(format!("Corrupt call document: {}", e)))?;
    call.set_version(version as u64);
    Ok(call)
}

#[async_trait]
impl CallStore for PgCallStore {
    async fn create_one(&self, new_call: NewCall) -> Result<Call> {
        let call = Call::new(CallId::new(), new_call.group, new_call.admin);
        let doc = serde_json::to_value(&call)
            .map_err(|e| DomainError::Internal(format!("Failed to encode call: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO calls (id, version, doc, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(call.id().as_uuid())
        .bind(call.version() as i64)
        .bind(doc)
        .bind(call.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to create call", e))?;

        debug!("Created call record {}", call.id());
        Ok(call)
    }

    async fn read_one(&self, id: &CallId) -> Result<Option<Call>> {
        let row = sqlx::query("SELECT doc, version FROM calls WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to read call", e))?;

        row.as_ref().map(row_to_call).transpose()
    }

    async fn partial_update_one(
        &self,
        id: &CallId,
        expected_version: u64,
        patch: CallPatch,
    ) -> Result<Call> {
        let fields = serde_json::to_value(&patch)
            .map_err(|e| DomainError::Internal(format!("Failed to encode patch: {}", e)))?;

        let row = sqlx::query(
            r#"
            UPDATE calls
            SET doc = doc || $3, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING doc, version
            "#,
        )
        .bind(id.as_uuid())
        .bind(expected_version as i64)
        .bind(fields)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update call", e))?;

        if let Some(row) = row {
            let call = row_to_call(&row)?;
            debug!("Updated call record {} to version {}", id, call.version());
            return Ok(call);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM calls WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to check call", e))?;

        if exists {
            Err(DomainError::Conflict(format!(
                "Call {} changed since version {}",
                id, expected_version
            )))
        } else {
            Err(DomainError::NotFound(format!("Call {} does not exist", id)))
        }
    }
}
