//! Collaborator traits for the attachment engine.
//!
//! These define the two external stores the orchestrator talks to,
//! enabling pluggable backends and testability. The engine never touches
//! storage or the database directly.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::error::Result;
use crate::models::RecordKind;
use crate::registry::Container;

/// Object store holding attachment bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Persist bytes under `container/path`, overwriting any existing
    /// object at that path.
    async fn put(
        &self,
        container: Container,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<()>;

    /// Issue an access URL for a stored object. `ttl` of `None` means a
    /// plain public URL; `Some` requests a time-limited signed URL.
    async fn issue_access_url(
        &self,
        container: Container,
        path: &str,
        ttl: Option<Duration>,
    ) -> Result<String>;

    /// Remove objects. Callers treat failures as best-effort cleanup
    /// problems, never as operation failures.
    async fn remove(&self, container: Container, paths: &[String]) -> Result<()>;
}

/// Outcome of a guarded metadata write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// The field's current value no longer matches what the caller read.
    Conflict,
}

/// Relational store holding record metadata.
///
/// Reads and writes are deliberately narrow: one field of one record per
/// call. The engine never persists a partially mutated record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read one metadata field. Returns `Value::Null` when the field was
    /// never written; `Error::RecordNotFound` when the record is missing.
    async fn read_field(&self, kind: RecordKind, record_id: &str, field: &str) -> Result<Value>;

    /// Write one metadata field unconditionally.
    async fn write_field(
        &self,
        kind: RecordKind,
        record_id: &str,
        field: &str,
        value: &Value,
    ) -> Result<()>;

    /// Write one metadata field only if it still holds `expected`,
    /// enabling compare-and-swap over the read-modify-write cycle.
    async fn write_field_checked(
        &self,
        kind: RecordKind,
        record_id: &str,
        field: &str,
        expected: &Value,
        value: &Value,
    ) -> Result<WriteOutcome>;
}
