//! PostgreSQL record store.
//!
//! Attachment metadata lives in one `jsonb` column (`data`) per record
//! table. Reads and writes are field-narrow: `read_field` pulls a single
//! key, writes go through `jsonb_set` so concurrent edits to *other* keys
//! of the same record are never clobbered.
//!
//! `write_field_checked` guards the update with the previously read value,
//! giving the orchestrator compare-and-swap semantics over its
//! read-modify-write cycle.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use propdoc_core::{Error, RecordKind, RecordStore, Result, WriteOutcome};

/// Record store backed by PostgreSQL `jsonb` columns.
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn record_exists(&self, kind: RecordKind, record_id: &str) -> Result<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", kind.table());
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(record_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn read_field(&self, kind: RecordKind, record_id: &str, field: &str) -> Result<Value> {
        let sql = format!("SELECT data -> $2 FROM {} WHERE id = $1", kind.table());
        let row: Option<Option<Value>> = sqlx::query_scalar(&sql)
            .bind(record_id)
            .bind(field)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(value) => Ok(value.unwrap_or(Value::Null)),
            None => Err(Error::RecordNotFound {
                kind,
                id: record_id.to_string(),
            }),
        }
    }

    async fn write_field(
        &self,
        kind: RecordKind,
        record_id: &str,
        field: &str,
        value: &Value,
    ) -> Result<()> {
        let sql = format!(
            r#"UPDATE {}
               SET data = jsonb_set(COALESCE(data, '{{}}'::jsonb), ARRAY[$2], $3, true),
                   updated_at = NOW()
               WHERE id = $1"#,
            kind.table()
        );
        let result = sqlx::query(&sql)
            .bind(record_id)
            .bind(field)
            .bind(value)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::RecordNotFound {
                kind,
                id: record_id.to_string(),
            });
        }
        Ok(())
    }

    async fn write_field_checked(
        &self,
        kind: RecordKind,
        record_id: &str,
        field: &str,
        expected: &Value,
        value: &Value,
    ) -> Result<WriteOutcome> {
        // A never-written field reads back as SQL NULL; compare it as JSON
        // null so the guard still matches.
        let sql = format!(
            r#"UPDATE {}
               SET data = jsonb_set(COALESCE(data, '{{}}'::jsonb), ARRAY[$2], $3, true),
                   updated_at = NOW()
               WHERE id = $1
                 AND COALESCE(data -> $2, 'null'::jsonb) = $4"#,
            kind.table()
        );
        let result = sqlx::query(&sql)
            .bind(record_id)
            .bind(field)
            .bind(value)
            .bind(expected)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(WriteOutcome::Applied);
        }

        if self.record_exists(kind, record_id).await? {
            debug!(
                subsystem = "store",
                component = "records",
                op = "write_field_checked",
                record_id = %record_id,
                field = %field,
                "guarded write lost to a concurrent edit"
            );
            Ok(WriteOutcome::Conflict)
        } else {
            Err(Error::RecordNotFound {
                kind,
                id: record_id.to_string(),
            })
        }
    }
}
