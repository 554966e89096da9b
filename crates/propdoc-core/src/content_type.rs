//! Content type detection for uploaded documents.
//!
//! Magic byte detection is authoritative; extension mapping covers the
//! text formats that genuinely lack magic bytes; the uploader's claimed
//! type is trusted last. The stored content type ends up on the object
//! store response headers, so a wrong value breaks in-browser preview of
//! certificates and contracts.

use crate::defaults::FALLBACK_CONTENT_TYPE;

/// Detect the content type to store with an uploaded object.
pub fn detect_content_type(filename: &str, data: &[u8], claimed: Option<&str>) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if let Some(ext) = filename.rsplit('.').next() {
        if let Some(mime) = mime_from_extension(ext) {
            return mime.to_string();
        }
    }

    claimed
        .filter(|c| !c.is_empty())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}

/// Map text-only extensions to MIME types. Binary formats are intentionally
/// excluded: they have magic bytes, and if `infer` did not recognize them
/// the content does not match the extension.
fn mime_from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "txt" | "log" => Some("text/plain"),
        "csv" => Some("text/csv"),
        "html" | "htm" => Some("text/html"),
        "xml" => Some("application/xml"),
        "json" => Some("application/json"),
        "md" => Some("text/markdown"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
