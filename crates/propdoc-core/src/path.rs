//! Storage path construction and recovery.
//!
//! Write paths are built from the owning record and the field spec:
//! `{recordId}/{folder}/{sanitizedField}_{timestampMillis}.{ext}`. The
//! timestamp component exists purely to avoid collisions on rapid
//! re-upload of the same field.
//!
//! For cleanup the engine only holds the access URL it previously issued,
//! so the reverse direction recovers `{container}/{path}` from public and
//! signed URL forms. Recovery must never fail hard: an unparseable URL
//! means "skip cleanup, log, continue"; metadata correctness takes
//! priority over storage hygiene.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// A container/path pair recovered from an access URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredLocation {
    pub container: String,
    pub path: String,
}

/// Reduce a field name to a filesystem-safe token: lowercase, with
/// anything outside `[a-z0-9_-]` replaced by `_`.
pub fn sanitize_field_token(field_name: &str) -> String {
    field_name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Extract the lowercased extension of an uploaded filename, without the
/// dot. Returns `None` when there is no usable extension.
fn file_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Build the object path for a new upload.
pub fn build_object_path(
    record_id: &str,
    folder: &str,
    field_name: &str,
    filename: &str,
    now: DateTime<Utc>,
) -> String {
    let token = sanitize_field_token(field_name);
    let stamp = now.timestamp_millis();
    match file_extension(filename) {
        Some(ext) => format!("{}/{}/{}_{}.{}", record_id, folder, token, stamp, ext),
        None => format!("{}/{}/{}_{}", record_id, folder, token, stamp),
    }
}

/// Markers that precede `{container}/{path}` in issued URLs.
const URL_MARKERS: &[&str] = &["/object/public/", "/object/sign/", "/object/authenticated/"];

/// Regex fallback for legacy or slightly malformed URLs.
static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|/)object/(?:public|sign|authenticated)/([^/?#]+)/([^?#]+)")
        .expect("location regex is valid")
});

/// Recover the stored location from a previously issued access URL.
///
/// Tries a structured match on the known URL forms first, then the regex
/// fallback. Returns `None` for anything unrecognizable; never panics.
pub fn location_from_access_url(url: &str) -> Option<StoredLocation> {
    for marker in URL_MARKERS {
        if let Some(idx) = url.find(marker) {
            let tail = &url[idx + marker.len()..];
            let tail = tail.split(['?', '#']).next().unwrap_or(tail);
            if let Some((container, path)) = tail.split_once('/') {
                if !container.is_empty() && !path.is_empty() {
                    return Some(StoredLocation {
                        container: container.to_string(),
                        path: path.to_string(),
                    });
                }
            }
        }
    }

    let caps = LOCATION_RE.captures(url)?;
    debug!(
        subsystem = "engine",
        component = "path",
        op = "recover_location",
        "access URL matched only by fallback regex"
    );
    Some(StoredLocation {
        container: caps[1].to_string(),
        path: caps[2].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_sanitize_field_token() {
        assert_eq!(sanitize_field_token("doc_energy_cert"), "doc_energy_cert");
        assert_eq!(sanitize_field_token("Doc Energy (2024)"), "doc_energy__2024_");
        assert_eq!(sanitize_field_token("café/doc"), "caf__doc");
    }

    #[test]
    fn test_build_object_path_with_extension() {
        let path = build_object_path("P-001", "legal", "doc_energy_cert", "Cert FINAL.PDF", ts());
        let stamp = ts().timestamp_millis();
        assert_eq!(path, format!("P-001/legal/doc_energy_cert_{}.pdf", stamp));
    }

    #[test]
    fn test_build_object_path_without_extension() {
        let path = build_object_path("P-001", "legal", "doc_energy_cert", "scan", ts());
        assert!(path.ends_with(&format!("doc_energy_cert_{}", ts().timestamp_millis())));
        assert!(!path.ends_with('.'));
    }

    #[test]
    fn test_build_object_path_ignores_dotfile_and_junk_extensions() {
        assert!(!build_object_path("P-1", "legal", "f", ".gitignore", ts()).contains('.'));
        assert!(!build_object_path("P-1", "legal", "f", "weird.p df", ts()).contains('.'));
    }

    #[test]
    fn test_recover_location_from_public_url() {
        let url = "https://acme.supabase.co/storage/v1/object/public/property-media/P-001/marketing/cover_photo_17.jpg";
        let loc = location_from_access_url(url).unwrap();
        assert_eq!(loc.container, "property-media");
        assert_eq!(loc.path, "P-001/marketing/cover_photo_17.jpg");
    }

    #[test]
    fn test_recover_location_from_signed_url_strips_token() {
        let url = "https://acme.supabase.co/storage/v1/object/sign/property-docs/P-001/legal/doc_energy_cert_17.pdf?token=eyJhbGciOi.abc";
        let loc = location_from_access_url(url).unwrap();
        assert_eq!(loc.container, "property-docs");
        assert_eq!(loc.path, "P-001/legal/doc_energy_cert_17.pdf");
    }

    #[test]
    fn test_recover_location_survives_doubled_prefix() {
        // Seen in legacy rows: URL stored with a duplicated prefix.
        let url = "https://cdn/https://acme.supabase.co/storage/v1/object/public/property-media/P-2/a.jpg";
        let loc = location_from_access_url(url).unwrap();
        assert_eq!(loc.container, "property-media");
        assert_eq!(loc.path, "P-2/a.jpg");
    }

    #[test]
    fn test_recover_location_regex_fallback_on_hostless_value() {
        // Legacy rows sometimes stored the raw storage path, no host.
        let loc = location_from_access_url("object/public/property-media/P-2/a.jpg").unwrap();
        assert_eq!(loc.container, "property-media");
        assert_eq!(loc.path, "P-2/a.jpg");
    }

    #[test]
    fn test_recover_location_not_recoverable() {
        assert_eq!(location_from_access_url("not a url"), None);
        assert_eq!(location_from_access_url("https://example.com/files/a.pdf"), None);
        assert_eq!(
            location_from_access_url("https://x/storage/v1/object/public/only-container"),
            None
        );
        assert_eq!(location_from_access_url(""), None);
    }
}
