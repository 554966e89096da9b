//! Attachment orchestrator.
//!
//! One call, one metadata field update. The choreography per flow:
//!
//! Upload/replace: resolve the field, persist bytes, issue the access URL,
//! then compute and persist the new metadata value. If anything fails
//! after the bytes landed, the just-uploaded object is queued for removal
//! before the error surfaces; unreferenced bytes are acceptable, a
//! metadata pointer to bytes that don't exist is not. Only after the
//! metadata write succeeds is the replaced object (if any) queued for
//! removal.
//!
//! Delete: metadata first, then best-effort removal of the bytes. Once the
//! metadata no longer references the object the operation has succeeded;
//! cleanup failures are logged and swallowed.
//!
//! Metadata writes are guarded: the field is re-read and the mutation
//! re-applied when a concurrent edit wins the race, up to a bounded number
//! of attempts.

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use propdoc_core::defaults::{CAS_MAX_ATTEMPTS, MAX_UPLOAD_BYTES, SIGNED_URL_TTL_SECS};
use propdoc_core::{
    build_object_path, detect_content_type, location_from_access_url, mutation, registry,
    Container, DeleteRequest, Error, FieldTarget, NewEntry, ObjectStore, Operation, RecordKind,
    RecordStore, ResolvedField, Result, RoomAddress, UploadOutcome, UploadRequest, WriteOutcome,
};

use crate::cleanup::CleanupQueue;

/// The attachment orchestrator.
pub struct AttachmentService {
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    cleanup: CleanupQueue,
    signed_url_ttl: Duration,
}

impl AttachmentService {
    /// Signed URL TTL comes from `PROPDOC_SIGNED_URL_TTL_SECS` when set,
    /// otherwise the built-in default.
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        cleanup: CleanupQueue,
    ) -> Self {
        let ttl_secs = std::env::var("PROPDOC_SIGNED_URL_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(SIGNED_URL_TTL_SECS);
        Self {
            objects,
            records,
            cleanup,
            signed_url_ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Override the signed URL TTL for restricted containers.
    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl;
        self
    }

    /// Upload a document into an attachment field, replacing the previous
    /// value when `previous_url` is supplied.
    pub async fn upload(&self, req: UploadRequest) -> Result<UploadOutcome> {
        let start = Instant::now();
        let field = registry::resolve(&req.field_name)?;
        validate_upload(&req, &field)?;

        let object_path = build_object_path(
            &req.record_id,
            &field.folder,
            &req.field_name,
            &req.filename,
            Utc::now(),
        );
        let content_type = detect_content_type(&req.filename, &req.data, req.content_type.as_deref());

        self.objects
            .put(field.container, &object_path, &req.data, &content_type)
            .await?;

        // Everything from here on has bytes to compensate for on failure.
        let access_url = match self.issue_url(&field, &object_path).await {
            Ok(url) => url,
            Err(e) => return Err(self.compensate(&field, &object_path, e)),
        };

        let entry = NewEntry {
            url: access_url.clone(),
            title: req.title.clone(),
        };
        let op = match &req.previous_url {
            Some(old_url) => Operation::Replace {
                old_url: old_url.clone(),
                entry,
            },
            None => Operation::Append(entry),
        };

        if let Err(e) = self
            .write_metadata(&req.record_id, req.record_kind, &field, &op, req.room_index)
            .await
        {
            return Err(self.compensate(&field, &object_path, e));
        }

        // Replace case: the old object is orphaned now. Its removal must
        // not affect the outcome; the caller's upload has already won.
        if let Some(old_url) = &req.previous_url {
            self.queue_removal_for_url(old_url, Some(&object_path));
        }

        info!(
            subsystem = "engine",
            component = "attachments",
            op = "upload",
            record_id = %req.record_id,
            field = %req.field_name,
            container = field.container.name(),
            object_path = %object_path,
            replaced = req.previous_url.is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Attachment uploaded"
        );

        Ok(UploadOutcome {
            access_url,
            object_path,
        })
    }

    /// Delete a document from an attachment field.
    pub async fn delete(&self, req: DeleteRequest) -> Result<()> {
        let start = Instant::now();
        let field = registry::resolve(&req.field_name)?;
        validate_delete(&req, &field)?;

        let op = match field.target {
            FieldTarget::Scalar => Operation::Clear,
            _ => Operation::Remove {
                url: req.access_url.clone(),
            },
        };

        self.write_metadata(&req.record_id, req.record_kind, &field, &op, req.room_index)
            .await?;

        // Metadata is correct; removing the bytes is hygiene.
        self.queue_removal_for_url(&req.access_url, None);

        info!(
            subsystem = "engine",
            component = "attachments",
            op = "delete",
            record_id = %req.record_id,
            field = %req.field_name,
            duration_ms = start.elapsed().as_millis() as u64,
            "Attachment deleted"
        );

        Ok(())
    }

    async fn issue_url(&self, field: &ResolvedField, object_path: &str) -> Result<String> {
        let ttl = if field.container.is_public() {
            None
        } else {
            Some(self.signed_url_ttl)
        };
        self.objects
            .issue_access_url(field.container, object_path, ttl)
            .await
    }

    /// Read-mutate-write with a guarded write, retrying with the mutation
    /// re-applied when a concurrent edit changes the field underneath us.
    async fn write_metadata(
        &self,
        record_id: &str,
        record_kind: RecordKind,
        field: &ResolvedField,
        op: &Operation,
        room_index: Option<usize>,
    ) -> Result<()> {
        let record_field = field.record_field();

        for attempt in 1..=CAS_MAX_ATTEMPTS {
            let current = self
                .records
                .read_field(record_kind, record_id, record_field)
                .await?;
            let next = mutation::apply(current.clone(), field, op, room_index, Utc::now())?;

            if next == current {
                debug!(
                    subsystem = "engine",
                    component = "attachments",
                    op = "write_metadata",
                    record_id = %record_id,
                    field = %field.field_name,
                    "field value unchanged, skipping write"
                );
                return Ok(());
            }

            match self
                .records
                .write_field_checked(record_kind, record_id, record_field, &current, &next)
                .await?
            {
                WriteOutcome::Applied => return Ok(()),
                WriteOutcome::Conflict => debug!(
                    subsystem = "engine",
                    component = "attachments",
                    op = "write_metadata",
                    record_id = %record_id,
                    field = %field.field_name,
                    attempt,
                    "concurrent edit detected, re-applying mutation"
                ),
            }
        }

        Err(Error::MetadataWrite(format!(
            "field {} of {} {} kept changing concurrently after {} attempts",
            record_field, record_kind, record_id, CAS_MAX_ATTEMPTS
        )))
    }

    /// Queue the just-uploaded object for removal and pass the original
    /// error through.
    fn compensate(&self, field: &ResolvedField, object_path: &str, cause: Error) -> Error {
        warn!(
            subsystem = "engine",
            component = "attachments",
            op = "compensate",
            container = field.container.name(),
            object_path = %object_path,
            error = %cause,
            "metadata update failed after upload, removing just-uploaded object"
        );
        self.cleanup
            .enqueue(field.container, object_path.to_string());
        cause
    }

    /// Recover a storage location from a previously issued access URL and
    /// queue it for removal. Unrecoverable or foreign URLs are skipped with
    /// a warning; metadata correctness takes priority over storage hygiene.
    fn queue_removal_for_url(&self, access_url: &str, keep_path: Option<&str>) {
        let location = match location_from_access_url(access_url) {
            Some(location) => location,
            None => {
                warn!(
                    subsystem = "engine",
                    component = "attachments",
                    op = "queue_removal",
                    "could not recover storage path from access URL, skipping cleanup"
                );
                return;
            }
        };

        if keep_path == Some(location.path.as_str()) {
            return;
        }

        match Container::from_name(&location.container) {
            Some(container) => self.cleanup.enqueue(container, location.path),
            None => warn!(
                subsystem = "engine",
                component = "attachments",
                op = "queue_removal",
                container = %location.container,
                "access URL points at an unmanaged container, skipping cleanup"
            ),
        }
    }
}

fn validate_upload(req: &UploadRequest, field: &ResolvedField) -> Result<()> {
    if req.record_id.trim().is_empty() {
        return Err(Error::Validation("a record id is required".to_string()));
    }
    if req.data.is_empty() {
        return Err(Error::Validation("file data is required".to_string()));
    }
    if req.data.len() > MAX_UPLOAD_BYTES {
        return Err(Error::Validation(format!(
            "file exceeds the maximum size of {} bytes",
            MAX_UPLOAD_BYTES
        )));
    }
    match &field.target {
        FieldTarget::TaggedArray if req.title.as_deref().map_or(true, str::is_empty) => {
            Err(Error::Validation(format!(
                "a title is required for field {}",
                field.field_name
            )))
        }
        FieldTarget::RoomPhotos {
            room: RoomAddress::Indexed(_),
            ..
        } if req.room_index.is_none() => Err(Error::Validation(format!(
            "a room index is required for field {}",
            field.field_name
        ))),
        _ => Ok(()),
    }
}

fn validate_delete(req: &DeleteRequest, field: &ResolvedField) -> Result<()> {
    if req.record_id.trim().is_empty() {
        return Err(Error::Validation("a record id is required".to_string()));
    }
    if req.access_url.trim().is_empty() {
        return Err(Error::Validation("an access URL is required".to_string()));
    }
    if let FieldTarget::RoomPhotos {
        room: RoomAddress::Indexed(_),
        ..
    } = &field.target
    {
        if req.room_index.is_none() {
            return Err(Error::Validation(format!(
                "a room index is required for field {}",
                field.field_name
            )));
        }
    }
    Ok(())
}
