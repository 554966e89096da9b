//! Shared default values for the attachment engine.

/// TTL for signed access URLs on restricted containers (seconds).
///
/// Issued URLs are stored in record metadata and shown in the UI, so they
/// are long-lived by design; re-uploading a field issues a fresh URL.
pub const SIGNED_URL_TTL_SECS: u64 = 60 * 60 * 24 * 365;

/// Maximum attempts for the compare-and-swap metadata write before the
/// operation is reported as a metadata failure.
pub const CAS_MAX_ATTEMPTS: u32 = 3;

/// Maximum accepted upload size in bytes (50 MB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Content type used when detection fails and the caller claimed nothing.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
