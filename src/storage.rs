use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("S3 SDK error: {0}")]
    SdkError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// S3 configuration for media storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub bucket_name: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: Option<String>, // For MinIO/S3-compatible services
}

impl S3Config {
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.bucket_name.trim().is_empty() {
            return Err(StorageError::Config(
                "Bucket name cannot be empty".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(StorageError::Config("Region cannot be empty".to_string()));
        }
        if self.access_key_id.trim().is_empty() {
            return Err(StorageError::Config(
                "Access key ID cannot be empty".to_string(),
            ));
        }
        if self.secret_access_key.trim().is_empty() {
            return Err(StorageError::Config(
                "Secret access key cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which folder an upload lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Thumbnail,
    Video,
}

impl UploadKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "thumbnail" => Some(UploadKind::Thumbnail),
            "video" => Some(UploadKind::Video),
            _ => None,
        }
    }

    pub fn folder(&self) -> &'static str {
        match self {
            UploadKind::Thumbnail => "thumbnails",
            UploadKind::Video => "videos",
        }
    }
}

/// Result of an upload, as returned to the admin console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMedia {
    pub url: String,
    pub file_id: String,
    pub name: String,
}

/// Trait for media storage backends (allows mocking for tests)
#[async_trait::async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `data` under `key` and return its public URL
    async fn upload(&self, key: &str, data: &[u8], content_type: &str)
        -> Result<String, StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// S3 (or S3-compatible) media storage
pub struct S3MediaStorage {
    client: Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3MediaStorage {
    pub async fn new(config: S3Config) -> Result<Self, StorageError> {
        config.validate()?;

        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None, // session_token
            None, // expiration
            "lectern-s3-config",
        );

        let public_base_url = match &config.endpoint_url {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket_name),
            None => format!(
                "https://{}.s3.{}.amazonaws.com",
                config.bucket_name, config.region
            ),
        };

        let mut aws_config_builder = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials);

        // Set custom endpoint if provided (for S3-compatible services)
        if let Some(endpoint) = config.endpoint_url {
            aws_config_builder = aws_config_builder.endpoint_url(endpoint);
        }

        let aws_config = aws_config_builder.load().await;
        let client = Client::new(&aws_config);

        Ok(S3MediaStorage {
            client,
            bucket_name: config.bucket_name,
            public_base_url,
        })
    }
}

#[async_trait::async_trait]
impl MediaStorage for S3MediaStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        info!("Uploading {} ({} bytes) to S3", key, data.len());

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(data.to_vec().into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::SdkError(format!("Put object failed: {}", e)))?;

        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::SdkError(format!("Delete object failed: {}", e)))?;
        Ok(())
    }
}

/// Uploads kept on the local filesystem and served by the API under `public_base_url`
pub struct LocalMediaStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStorage {
    pub async fn new(
        root: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        info!("Local media storage at {}", root.display());
        Ok(LocalMediaStorage {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !safe || key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        info!("Stored {} ({} bytes) at {}", key, data.len(), path.display());
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Names, places and stores uploaded media
#[derive(Clone)]
pub struct MediaStorageManager {
    storage: Arc<dyn MediaStorage>,
}

impl std::fmt::Debug for MediaStorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStorageManager")
            .field("storage", &"<dyn MediaStorage>")
            .finish()
    }
}

impl MediaStorageManager {
    /// Create a manager backed by S3
    pub async fn new_s3(config: S3Config) -> Result<Self, StorageError> {
        let storage = S3MediaStorage::new(config).await?;
        Ok(Self::from_storage(Arc::new(storage)))
    }

    /// Create a manager from any storage implementation
    pub fn from_storage(storage: Arc<dyn MediaStorage>) -> Self {
        MediaStorageManager { storage }
    }

    /// Store an uploaded file under `thumbnails/` or `videos/`
    pub async fn upload(
        &self,
        kind: UploadKind,
        file_name: &str,
        data: &[u8],
    ) -> Result<StoredMedia, StorageError> {
        let name = sanitize_file_name(file_name);
        let key = format!("{}/{}_{}", kind.folder(), Uuid::new_v4(), name);
        let url = self
            .storage
            .upload(&key, data, content_type_for(&name))
            .await?;

        Ok(StoredMedia {
            url,
            file_id: key,
            name,
        })
    }

    pub async fn delete(&self, file_id: &str) -> Result<(), StorageError> {
        self.storage.delete(file_id).await
    }
}

/// Keep only characters that are safe in both URLs and file names
fn sanitize_file_name(file_name: &str) -> String {
    // Browsers may send the name percent-encoded
    let decoded = urlencoding::decode(file_name)
        .map(|name| name.into_owned())
        .unwrap_or_else(|_| file_name.to_string());
    let base = decoded
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(&decoded)
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
