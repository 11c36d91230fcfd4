//! Object storage for uploaded files.
//!
//! Objects live at `<root>/<bucket>/objects/<key>`, with their content type
//! kept next to them under `<root>/<bucket>/meta/<key>`.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::domain::error::DomainError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A validated object key: `/`-separated, no empty, `.` or `..` segments and
/// no segment starting with a dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let valid = !raw.is_empty()
            && raw.len() <= 512
            && raw.split('/').all(|segment| {
                !segment.is_empty()
                    && !segment.starts_with('.')
                    && !segment.contains('\\')
                    && !segment.chars().any(char::is_control)
            });

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(DomainError::BadRequest(format!("invalid object key: {raw}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn to_relative_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl StoredObject {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type: content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `object`. With `upsert == false` an existing key is a conflict.
    async fn put(
        &self,
        bucket: &str,
        key: &ObjectKey,
        object: StoredObject,
        upsert: bool,
    ) -> Result<(), DomainError>;

    async fn get(&self, bucket: &str, key: &ObjectKey)
    -> Result<Option<StoredObject>, DomainError>;
}

#[derive(Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &ObjectKey) -> PathBuf {
        self.root
            .join(bucket)
            .join("objects")
            .join(key.to_relative_path())
    }

    fn meta_path(&self, bucket: &str, key: &ObjectKey) -> PathBuf {
        self.root
            .join(bucket)
            .join("meta")
            .join(key.to_relative_path())
    }
}

fn io_error(context: &'static str) -> impl Fn(std::io::Error) -> DomainError {
    move |e| {
        error!("{}: {}", context, e);
        DomainError::Internal(format!("storage error: {}", e))
    }
}

async fn ensure_parent(path: &Path) -> Result<(), DomainError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(io_error("failed to create storage directory"))?;
    }
    Ok(())
}

async fn write_object(
    file: &mut fs::File,
    meta: &Path,
    object: &StoredObject,
) -> Result<(), DomainError> {
    file.write_all(&object.bytes)
        .await
        .map_err(io_error("failed to write object"))?;
    file.flush()
        .await
        .map_err(io_error("failed to flush object"))?;
    fs::write(meta, object.content_type.as_bytes())
        .await
        .map_err(io_error("failed to write object metadata"))
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &ObjectKey,
        object: StoredObject,
        upsert: bool,
    ) -> Result<(), DomainError> {
        let path = self.object_path(bucket, key);
        let meta = self.meta_path(bucket, key);
        ensure_parent(&path).await?;
        ensure_parent(&meta).await?;

        let mut options = fs::OpenOptions::new();
        options.write(true);
        if upsert {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                DomainError::Conflict(format!("object already exists: {key}"))
            } else {
                io_error("failed to open object")(e)
            }
        })?;

        if let Err(err) = write_object(&mut file, &meta, &object).await {
            drop(file);
            // never leave a partial object under the key
            if let Err(e) = fs::remove_file(&path).await {
                warn!(key = %key, "failed to remove partial object: {}", e);
            }
            return Err(err);
        }

        info!(bucket, key = %key, size = object.bytes.len(), "object stored");
        Ok(())
    }

    async fn get(
        &self,
        bucket: &str,
        key: &ObjectKey,
    ) -> Result<Option<StoredObject>, DomainError> {
        let bytes = match fs::read(self.object_path(bucket, key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("failed to read object")(e)),
        };
        let content_type = fs::read_to_string(self.meta_path(bucket, key)).await.ok();

        Ok(Some(StoredObject::new(bytes, content_type)))
    }
}
