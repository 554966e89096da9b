//! Local filesystem object store for development and self-hosted setups.
//!
//! Objects land under `{base_path}/{container}/{path}` with atomic
//! temp-file-plus-rename writes. Issued URLs use the same
//! `/object/public/{container}/{path}` shape as the hosted backend so
//! access-URL path recovery works identically; a local static file server
//! is expected to serve the base directory under that prefix.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use propdoc_core::{Container, ObjectStore, Result};

/// Filesystem-backed object store.
pub struct LocalObjectStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    /// `public_base_url` is the URL prefix the base directory is served
    /// under, e.g. `http://localhost:8090/storage/v1`.
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into();
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn full_path(&self, container: Container, path: &str) -> PathBuf {
        self.base_path.join(container.name()).join(path)
    }

    /// Validate that the backing directory supports a full write/read/delete
    /// round trip. Catches permission and mount issues at startup.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(
        &self,
        container: Container,
        path: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<()> {
        let full_path = self.full_path(container, path);
        debug!(
            subsystem = "store",
            component = "object_store",
            op = "put",
            container = container.name(),
            object_path = %path,
            size = data.len(),
            "Writing object to disk"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "object_fs: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await?;
        Ok(())
    }

    async fn issue_access_url(
        &self,
        container: Container,
        path: &str,
        _ttl: Option<Duration>,
    ) -> Result<String> {
        // No signing locally; restricted containers are only as restricted
        // as the file server in front of them.
        Ok(format!(
            "{}/object/public/{}/{}",
            self.public_base_url,
            container.name(),
            path
        ))
    }

    async fn remove(&self, container: Container, paths: &[String]) -> Result<()> {
        for path in paths {
            let full_path = self.full_path(container, path);
            if fs::try_exists(&full_path).await? {
                fs::remove_file(&full_path).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> LocalObjectStore {
        LocalObjectStore::new(dir.path(), "http://localhost:8090/storage/v1")
    }

    #[tokio::test]
    async fn test_validate_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        store(&dir).validate().await.unwrap();
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let path = "P-1/legal/doc_energy_cert_17.pdf";

        store
            .put(Container::Restricted, path, b"v1", "application/pdf")
            .await
            .unwrap();
        store
            .put(Container::Restricted, path, b"v2", "application/pdf")
            .await
            .unwrap();

        let on_disk = std::fs::read(dir.path().join("property-docs").join(path)).unwrap();
        assert_eq!(on_disk, b"v2");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let path = "P-1/marketing/cover_photo_17.jpg".to_string();

        store
            .put(Container::Public, &path, b"img", "image/jpeg")
            .await
            .unwrap();
        store.remove(Container::Public, &[path.clone()]).await.unwrap();
        // Second remove of a gone object must not fail.
        store.remove(Container::Public, &[path]).await.unwrap();
    }

    #[tokio::test]
    async fn test_issued_url_recovers_to_stored_location() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let url = store
            .issue_access_url(Container::Public, "P-1/marketing/a.jpg", None)
            .await
            .unwrap();
        let loc = propdoc_core::location_from_access_url(&url).unwrap();
        assert_eq!(loc.container, "property-media");
        assert_eq!(loc.path, "P-1/marketing/a.jpg");
    }
}
