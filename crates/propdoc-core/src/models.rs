//! Data model for attachment metadata values and engine requests.
//!
//! The metadata persisted on a record comes in four structurally different
//! shapes: a nullable URL string, a flat URL array, a titled document array,
//! and the nested per-room photo galleries. The JSON wire forms here must
//! stay byte-compatible with what the web frontend reads back out of the
//! record, which is why the room/tagged structs serialize in camelCase and
//! round-trip unknown sibling keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which table an attachment-owning record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Property,
    Lead,
    Tenant,
}

impl RecordKind {
    /// Database table holding records of this kind.
    pub fn table(&self) -> &'static str {
        match self {
            RecordKind::Property => "properties",
            RecordKind::Lead => "leads",
            RecordKind::Tenant => "tenants",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RecordKind::Property => "property",
            RecordKind::Lead => "lead",
            RecordKind::Tenant => "tenant",
        };
        f.write_str(s)
    }
}

/// One entry of a user-titled document array (e.g. `custom_legal_documents`).
///
/// Identity for replace/delete purposes is the `url`; titles are free text
/// and may collide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedDocument {
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// One room inside a nested room gallery (bedroom, kitchen, ...).
///
/// Rooms carry more than photos (name, surface area, equipment flags,
/// whatever the frontend stores); everything we don't model is captured in
/// `extra` so a photo mutation never drops sibling data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomRecord {
    pub marketing_photos: Vec<String>,
    pub incident_photos: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request to upload (or replace) a document in an attachment field.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub record_kind: RecordKind,
    pub record_id: String,
    /// Logical field name, resolved through the field registry.
    pub field_name: String,
    /// Original filename as supplied by the uploader; only the extension
    /// survives into the storage path.
    pub filename: String,
    /// Content type claimed by the uploader; detection from magic bytes
    /// wins when it disagrees.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
    /// Access URL of the value being replaced, if this is a replace.
    pub previous_url: Option<String>,
    /// Required for indexed-room gallery fields.
    pub room_index: Option<usize>,
    /// Required for tagged-array fields.
    pub title: Option<String>,
}

/// Successful upload result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    /// Access URL now referenced by the record metadata.
    pub access_url: String,
    /// Object path within the container, mostly useful for logs and tests.
    pub object_path: String,
}

/// Request to delete a document from an attachment field.
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub record_kind: RecordKind,
    pub record_id: String,
    pub field_name: String,
    /// Access URL of the value to remove; also the only means of locating
    /// the stored bytes for cleanup.
    pub access_url: String,
    /// Required for indexed-room gallery fields.
    pub room_index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_kind_tables() {
        assert_eq!(RecordKind::Property.table(), "properties");
        assert_eq!(RecordKind::Lead.table(), "leads");
        assert_eq!(RecordKind::Tenant.table(), "tenants");
    }

    #[test]
    fn test_record_kind_display() {
        assert_eq!(RecordKind::Property.to_string(), "property");
        assert_eq!(RecordKind::Lead.to_string(), "lead");
    }

    #[test]
    fn test_tagged_document_serializes_camel_case() {
        let doc = TaggedDocument {
            title: "Deed".to_string(),
            url: "https://x/object/public/c/p.pdf".to_string(),
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(&doc).unwrap();
        assert!(v.get("createdAt").is_some());
        assert!(v.get("created_at").is_none());
    }

    #[test]
    fn test_room_record_round_trips_unknown_fields() {
        let input = json!({
            "name": "Master bedroom",
            "surfaceM2": 18.5,
            "marketingPhotos": ["https://x/a.jpg"],
            "incidentPhotos": [],
        });
        let room: RoomRecord = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(room.marketing_photos.len(), 1);
        assert_eq!(room.extra.get("name"), Some(&json!("Master bedroom")));

        let back = serde_json::to_value(&room).unwrap();
        assert_eq!(back.get("surfaceM2"), Some(&json!(18.5)));
        assert_eq!(back.get("marketingPhotos"), Some(&json!(["https://x/a.jpg"])));
    }

    #[test]
    fn test_room_record_defaults_missing_photo_arrays() {
        let room: RoomRecord = serde_json::from_value(json!({"name": "Kitchen"})).unwrap();
        assert!(room.marketing_photos.is_empty());
        assert!(room.incident_photos.is_empty());
    }
}
