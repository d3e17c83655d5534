/// Storage service and upload validation
///
/// Wraps the backend object store for the `task-attachments` bucket: key
/// construction, upload/remove, and signed-URL generation. Image files are
/// validated here (MIME type and the 1 MB size cap) before any byte
/// reaches storage.
///
/// # Object keys
///
/// `{user_id}/{task_id}-{epoch_millis}-{base36}.{ext}`: per-user
/// namespacing, collision-resistant without a central sequence.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use folio_backend::client::BackendClient;
use folio_backend::error::BackendError;
use folio_backend::storage::DEFAULT_SIGNED_URL_TTL;

use crate::entity::EntityId;
use crate::error::ServiceError;

/// Bucket holding task attachments
pub const TASK_ATTACHMENTS_BUCKET: &str = "task-attachments";

/// Maximum accepted image size (1 MB)
pub const MAX_IMAGE_BYTES: usize = 1_048_576;

/// Length of the random base-36 key suffix
const KEY_SUFFIX_LEN: usize = 8;

/// A file handed to the domain layer for upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original file name (used for the extension)
    pub file_name: String,

    /// MIME type as reported by the uploader
    pub content_type: String,

    /// File contents
    pub data: Bytes,
}

impl UploadFile {
    /// Creates an upload from its parts
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        UploadFile {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Validates the file as an attachable image
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the file when the MIME type is not
    /// an image type or the contents exceed [`MAX_IMAGE_BYTES`].
    pub fn validate_image(&self) -> Result<(), ServiceError> {
        if !self.content_type.starts_with("image/") {
            return Err(ServiceError::Validation(format!(
                "File '{}' is not an image ({})",
                self.file_name, self.content_type
            )));
        }
        if self.data.len() > MAX_IMAGE_BYTES {
            return Err(ServiceError::Validation(format!(
                "File '{}' exceeds the 1 MB size limit",
                self.file_name
            )));
        }
        Ok(())
    }

    /// File extension, defaulting to `bin`
    pub fn extension(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
            _ => "bin",
        }
    }
}

/// Builds the object key for an upload
pub fn object_path(user_id: &EntityId, task_id: &EntityId, file: &UploadFile) -> String {
    format!(
        "{}/{}-{}-{}.{}",
        user_id,
        task_id,
        Utc::now().timestamp_millis(),
        random_base36(KEY_SUFFIX_LEN),
        file.extension()
    )
}

fn random_base36(len: usize) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Object-store contract used by the task service
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores an object
    async fn upload(&self, path: &str, content_type: &str, data: Bytes) -> Result<(), ServiceError>;

    /// Removes an object
    async fn remove(&self, path: &str) -> Result<(), ServiceError>;

    /// Creates a time-limited read URL for an object
    async fn signed_url(&self, path: &str, expires_in: u32) -> Result<String, ServiceError>;
}

/// Backend-backed storage service for the attachments bucket
pub struct StorageService {
    client: Arc<BackendClient>,
    bucket: String,
}

impl StorageService {
    /// Creates the service against the attachments bucket
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self::with_bucket(client, TASK_ATTACHMENTS_BUCKET)
    }

    /// Creates the service against a specific bucket
    pub fn with_bucket(client: Arc<BackendClient>, bucket: impl Into<String>) -> Self {
        StorageService {
            client,
            bucket: bucket.into(),
        }
    }

    /// Default signed-URL expiry in seconds
    pub fn default_ttl() -> u32 {
        DEFAULT_SIGNED_URL_TTL
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn upload(&self, path: &str, content_type: &str, data: Bytes) -> Result<(), ServiceError> {
        self.client
            .storage()
            .upload(&self.bucket, path, content_type, data)
            .await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), ServiceError> {
        self.client.storage().remove(&self.bucket, path).await?;
        Ok(())
    }

    async fn signed_url(&self, path: &str, expires_in: u32) -> Result<String, ServiceError> {
        let url = self
            .client
            .storage()
            .create_signed_url(&self.bucket, path, expires_in)
            .await?;
        Ok(url)
    }
}

/// In-memory object store for tests and demos
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (String, Bytes)>>,
    failing_signatures: Mutex<HashSet<String>>,
}

impl MemoryObjectStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes future `signed_url` calls fail for one path
    pub fn fail_signing_for(&self, path: impl Into<String>) {
        self.failing_signatures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into());
    }

    /// Whether an object is stored under the path
    pub fn contains(&self, path: &str) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, path: &str, content_type: &str, data: Bytes) -> Result<(), ServiceError> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), (content_type.to_string(), data));
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), ServiceError> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
        Ok(())
    }

    async fn signed_url(&self, path: &str, expires_in: u32) -> Result<String, ServiceError> {
        let failing = self
            .failing_signatures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path);
        if failing {
            return Err(ServiceError::Backend(BackendError::api(
                500,
                "signing unavailable",
            )));
        }
        Ok(format!("memory://{}?expires={}", path, expires_in))
    }
}
