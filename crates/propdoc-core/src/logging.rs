//! Structured logging field name constants for propdoc.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Operation failed and was surfaced to the caller |
//! | WARN  | Recoverable issue (cleanup skipped/failed), operation succeeded |
//! | INFO  | Operation completions |
//! | DEBUG | Decision points, intermediate values |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "engine", "store"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "attachments", "cleanup", "records", "object_store"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "upload", "delete", "remove_objects"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Record identifier being operated on.
pub const RECORD_ID: &str = "record_id";

/// Logical attachment field name.
pub const FIELD: &str = "field";

/// Storage container name.
pub const CONTAINER: &str = "container";

/// Storage object path within a container.
pub const OBJECT_PATH: &str = "object_path";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
