//! # propdoc-core
//!
//! Core types and pure logic for the propdoc document attachment engine.
//!
//! This crate provides:
//! - The static registry of ~70 attachment field slots
//! - Storage path construction and access-URL recovery
//! - The pure metadata mutation engine for all field value shapes
//! - Collaborator traits for the object and record stores
//!
//! No I/O happens in this crate; everything here is deterministic and
//! unit-testable.

pub mod content_type;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod mutation;
pub mod path;
pub mod registry;
pub mod traits;

// Re-export commonly used types at crate root
pub use content_type::detect_content_type;
pub use error::{Error, Result};
pub use models::{
    DeleteRequest, RecordKind, RoomRecord, TaggedDocument, UploadOutcome, UploadRequest,
};
pub use mutation::{apply, NewEntry, Operation};
pub use path::{build_object_path, location_from_access_url, sanitize_field_token, StoredLocation};
pub use registry::{
    resolve, Container, FieldSpec, FieldTarget, PhotoCategory, ResolvedField, RoomAddress,
    ValueShape, FIELD_SPECS, INDEXED_ROOMS, SINGLETON_ROOMS,
};
pub use traits::{ObjectStore, RecordStore, WriteOutcome};
