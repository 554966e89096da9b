//! Pure metadata mutation engine.
//!
//! Given the current JSON value of a record's attachment field, a resolved
//! field spec, and an operation, computes the new field value. No I/O
//! happens here; the orchestrator owns reading the old value and persisting
//! the new one, which is what keeps a metadata update single-write and
//! all-or-nothing.
//!
//! Replace semantics across all array shapes: match on exact URL equality,
//! preserve the matched element's position, and fall back to appending when
//! nothing matches. The caller-supplied "old value" may already have been
//! invalidated by a concurrent edit, and losing the new upload is worse
//! than appending it.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{RoomRecord, TaggedDocument};
use crate::registry::{FieldTarget, PhotoCategory, ResolvedField, RoomAddress};

/// The value being written by an append/replace operation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub url: String,
    /// Only meaningful (and required) for tagged-array fields.
    pub title: Option<String>,
}

impl NewEntry {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }

    pub fn titled(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: Some(title.into()),
        }
    }
}

/// Operation applied to an attachment field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Add a new value (scalar fields: replace unconditionally).
    Append(NewEntry),
    /// Replace the element currently holding `old_url`, appending on miss.
    Replace { old_url: String, entry: NewEntry },
    /// Remove the element holding `url` (scalar fields: set null).
    Remove { url: String },
    /// Reset the field to its empty form.
    Clear,
}

/// Compute the new field value from the old one.
///
/// `current` is the raw JSON stored on the record (`Null` when the field
/// was never written). `room_index` is required for indexed-room gallery
/// fields and ignored everywhere else.
pub fn apply(
    current: Value,
    field: &ResolvedField,
    op: &Operation,
    room_index: Option<usize>,
    now: DateTime<Utc>,
) -> Result<Value> {
    match &field.target {
        FieldTarget::Scalar => Ok(apply_scalar(op)),
        FieldTarget::FlatArray => apply_flat_array(current, field, op),
        FieldTarget::TaggedArray => apply_tagged_array(current, field, op, now),
        FieldTarget::RoomPhotos { room, category } => {
            apply_room_photos(current, field, op, *room, *category, room_index)
        }
    }
}

fn apply_scalar(op: &Operation) -> Value {
    match op {
        Operation::Append(entry) | Operation::Replace { entry, .. } => {
            Value::String(entry.url.clone())
        }
        Operation::Remove { .. } | Operation::Clear => Value::Null,
    }
}

/// Shared append/replace/remove semantics for plain URL lists, used by flat
/// array fields and the per-room photo arrays.
fn apply_url_list(list: &mut Vec<String>, op: &Operation) {
    match op {
        Operation::Append(entry) => list.push(entry.url.clone()),
        Operation::Replace { old_url, entry } => {
            match list.iter().position(|u| u == old_url) {
                Some(pos) => list[pos] = entry.url.clone(),
                None => list.push(entry.url.clone()),
            }
        }
        Operation::Remove { url } => list.retain(|u| u != url),
        Operation::Clear => list.clear(),
    }
}

fn decode<T: serde::de::DeserializeOwned + Default>(
    current: Value,
    field: &ResolvedField,
) -> Result<T> {
    if current.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(current).map_err(|e| {
        Error::Serialization(format!(
            "stored value for field {} has unexpected shape: {}",
            field.field_name, e
        ))
    })
}

fn apply_flat_array(current: Value, field: &ResolvedField, op: &Operation) -> Result<Value> {
    let mut list: Vec<String> = decode(current, field)?;
    apply_url_list(&mut list, op);
    Ok(serde_json::to_value(list)?)
}

fn apply_tagged_array(
    current: Value,
    field: &ResolvedField,
    op: &Operation,
    now: DateTime<Utc>,
) -> Result<Value> {
    let mut docs: Vec<TaggedDocument> = decode(current, field)?;

    match op {
        Operation::Append(entry) => {
            docs.push(tagged_doc(entry, field, now)?);
        }
        Operation::Replace { old_url, entry } => {
            let replacement = tagged_doc(entry, field, now)?;
            let mut matched = false;
            for doc in docs.iter_mut().filter(|d| &d.url == old_url) {
                *doc = replacement.clone();
                matched = true;
            }
            if !matched {
                docs.push(replacement);
            }
        }
        Operation::Remove { url } => docs.retain(|d| &d.url != url),
        Operation::Clear => docs.clear(),
    }

    Ok(serde_json::to_value(docs)?)
}

fn tagged_doc(entry: &NewEntry, field: &ResolvedField, now: DateTime<Utc>) -> Result<TaggedDocument> {
    let title = entry.title.clone().ok_or_else(|| {
        Error::Validation(format!("a title is required for field {}", field.field_name))
    })?;
    Ok(TaggedDocument {
        title,
        url: entry.url.clone(),
        created_at: now,
    })
}

fn category_list<'a>(room: &'a mut RoomRecord, category: PhotoCategory) -> &'a mut Vec<String> {
    match category {
        PhotoCategory::Marketing => &mut room.marketing_photos,
        PhotoCategory::Incident => &mut room.incident_photos,
    }
}

fn apply_room_photos(
    current: Value,
    field: &ResolvedField,
    op: &Operation,
    room: RoomAddress,
    category: PhotoCategory,
    room_index: Option<usize>,
) -> Result<Value> {
    // Removing from a structure that was never created is already done.
    if current.is_null() && matches!(op, Operation::Remove { .. } | Operation::Clear) {
        return Ok(Value::Null);
    }

    match room {
        RoomAddress::Indexed(_) => {
            let index = room_index.ok_or_else(|| {
                Error::Validation(format!(
                    "a room index is required for field {}",
                    field.field_name
                ))
            })?;
            let mut rooms: Vec<RoomRecord> = decode(current, field)?;
            // Grow, never shrink: writes past the end pad with default rooms.
            while rooms.len() <= index {
                rooms.push(RoomRecord::default());
            }
            apply_url_list(category_list(&mut rooms[index], category), op);
            Ok(serde_json::to_value(rooms)?)
        }
        RoomAddress::Singleton(_) => {
            let mut record: RoomRecord = decode(current, field)?;
            apply_url_list(category_list(&mut record, category), op);
            Ok(serde_json::to_value(record)?)
        }
    }
}
