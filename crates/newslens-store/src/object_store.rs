//! Local-directory object storage for uploaded files

use crate::{unix_now, StoreError};
use async_trait::async_trait;
use newslens_domain::{CollaboratorError, ObjectStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Key prefix for every stored upload
pub const UPLOAD_PREFIX: &str = "uploads/";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const METADATA_SUFFIX: &str = ".meta.json";

/// Metadata written next to each stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Name the file was uploaded with
    pub original_filename: String,
    /// MIME type of the upload
    pub content_type: String,
    /// Size in bytes
    pub size: u64,
    /// Storage time (Unix seconds)
    pub stored_at: u64,
}

/// `ObjectStore` backed by a directory on the local filesystem
///
/// Objects live at `<root>/<key>`, where the key is
/// `uploads/<uuid v7><lowercased extension>`, with an
/// `ObjectMetadata` JSON sidecar at `<root>/<key>.meta.json`.
#[derive(Debug, Clone)]
pub struct FilesystemObjectStore {
    root: PathBuf,
}

impl FilesystemObjectStore {
    /// Store objects under `root`; directories are created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read back a stored object
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::read(path).await?)
    }

    /// Read back a stored object's metadata
    pub async fn metadata(&self, key: &str) -> Result<ObjectMetadata, StoreError> {
        let path = self.path_for(&format!("{}{}", key, METADATA_SUFFIX))?;
        let json = tokio::fs::read(path).await?;
        serde_json::from_slice(&json).map_err(|e| StoreError::InvalidData(e.to_string()))
    }

    async fn write(
        &self,
        bytes: &[u8],
        original_filename: &str,
        content_type: &str,
    ) -> Result<String, StoreError> {
        let key = object_key(original_filename);
        self.write_at(&key, bytes, original_filename, content_type).await?;
        Ok(key)
    }

    /// Write the object and its sidecar; the object is removed if the
    /// sidecar cannot be written
    async fn write_at(
        &self,
        key: &str,
        bytes: &[u8],
        original_filename: &str,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        let metadata = ObjectMetadata {
            original_filename: original_filename.to_string(),
            content_type: if content_type.trim().is_empty() {
                FALLBACK_CONTENT_TYPE.to_string()
            } else {
                content_type.to_string()
            },
            size: bytes.len() as u64,
            stored_at: unix_now(),
        };

        if let Err(e) = self.write_metadata(key, &metadata).await {
            if let Err(remove_error) = tokio::fs::remove_file(&path).await {
                warn!(
                    "Failed to remove {} after metadata write failed: {}",
                    path.display(),
                    remove_error
                );
            }
            return Err(e);
        }

        Ok(())
    }

    async fn write_metadata(
        &self,
        key: &str,
        metadata: &ObjectMetadata,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(metadata)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        tokio::fs::write(self.path_for(&format!("{}{}", key, METADATA_SUFFIX))?, json).await?;
        Ok(())
    }

    /// Resolve a key to a path inside the root, rejecting keys that escape it
    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let escapes = relative.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_))
        });
        if key.is_empty() || escapes {
            return Err(StoreError::InvalidData(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(
        &self,
        bytes: &[u8],
        original_filename: &str,
        content_type: &str,
    ) -> Result<String, CollaboratorError> {
        debug!(
            "Storing '{}' ({} bytes) under {}",
            original_filename,
            bytes.len(),
            self.root.display()
        );

        let key = self
            .write(bytes, original_filename, content_type)
            .await
            .map_err(|e| CollaboratorError::Storage(e.to_string()))?;

        info!("Stored '{}' as {}", original_filename, key);
        Ok(key)
    }
}

/// `uploads/<uuid v7><lowercased extension>`
fn object_key(original_filename: &str) -> String {
    let extension = Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default();

    format!("{}{}{}", UPLOAD_PREFIX, Uuid::now_v7(), extension)
}
