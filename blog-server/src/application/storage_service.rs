use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use crate::domain::error::DomainError;
use crate::infrastructure::storage::{ObjectKey, ObjectStore, StoredObject};

#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn ObjectStore>,
    buckets: Arc<HashSet<String>>,
}

impl StorageService {
    pub fn new(store: Arc<dyn ObjectStore>, buckets: impl IntoIterator<Item = String>) -> Self {
        Self {
            store,
            buckets: Arc::new(buckets.into_iter().collect()),
        }
    }

    fn check_bucket(&self, bucket: &str) -> Result<(), DomainError> {
        if self.buckets.contains(bucket) {
            Ok(())
        } else {
            Err(DomainError::NotFound(format!("bucket {bucket}")))
        }
    }

    /// Stores the object and returns its key.
    #[instrument(skip(self, object), fields(size = object.bytes.len()))]
    pub async fn upload(
        &self,
        bucket: &str,
        key: &str,
        object: StoredObject,
        upsert: bool,
    ) -> Result<ObjectKey, DomainError> {
        self.check_bucket(bucket)?;
        let key = ObjectKey::parse(key)?;
        if object.bytes.is_empty() {
            return Err(DomainError::BadRequest("empty upload".into()));
        }
        self.store.put(bucket, &key, object, upsert).await?;
        Ok(key)
    }

    pub async fn download(&self, bucket: &str, key: &str) -> Result<StoredObject, DomainError> {
        self.check_bucket(bucket)?;
        let key = ObjectKey::parse(key)?;
        self.store
            .get(bucket, &key)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("object {bucket}/{key}")))
    }
}
