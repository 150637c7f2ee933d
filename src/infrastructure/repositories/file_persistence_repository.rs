use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tokio::time;

use crate::application::ports::outbound::PersistencePort;
use crate::common::config::TimeoutConfig;
use crate::common::errors::DomainError;

/// File name of the shared config record
const CONFIG_FILE_NAME: &str = "locale_config.json";

/// Extension of cache blob files
const BLOB_EXTENSION: &str = "cache.gz";

/// File system implementation of the persistence port
///
/// One compressed blob per bucket plus one config record shared by all
/// buckets, all inside a single directory.
pub struct FilePersistenceRepository {
    base_dir: PathBuf,
    timeouts: TimeoutConfig,
    /// Serializes writes so a temp file is never shared between two writers
    write_mutex: Mutex<()>,
}

impl FilePersistenceRepository {
    pub fn new(base_dir: PathBuf) -> Self {
        Self::with_timeouts(base_dir, TimeoutConfig::default())
    }

    pub fn with_timeouts(base_dir: PathBuf, timeouts: TimeoutConfig) -> Self {
        Self {
            base_dir,
            timeouts,
            write_mutex: Mutex::new(()),
        }
    }

    /// Path of the cache blob of a bucket
    pub fn blob_path(&self, bucket_id: &str) -> PathBuf {
        let safe_id: String = bucket_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{}.{}", safe_id, BLOB_EXTENSION))
    }

    /// Path of the shared config record
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    async fn read_optional(&self, path: &Path, entity_type: &'static str) -> Result<Option<Vec<u8>>, DomainError> {
        let read_result = time::timeout(self.timeouts.lock_timeout(), fs::read(path))
            .await
            .map_err(|_| DomainError::timeout(entity_type, format!("Timeout reading {}", path.display())))?;

        match read_result {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Nothing persisted at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(DomainError::internal_error(
                entity_type,
                format!("Failed to read {}: {}", path.display(), e),
            )
            .with_source(e)),
        }
    }

    /// Writes through a temporary file and an atomic rename
    async fn write_atomic(&self, path: &Path, bytes: &[u8], entity_type: &'static str) -> Result<(), DomainError> {
        let _lock = time::timeout(self.timeouts.lock_timeout(), self.write_mutex.lock())
            .await
            .map_err(|_| DomainError::timeout(entity_type, "Timeout acquiring persistence write lock"))?;

        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir).await.map_err(|e| {
                DomainError::internal_error(
                    entity_type,
                    format!("Failed to create directory {}: {}", self.base_dir.display(), e),
                )
                .with_source(e)
            })?;
        }

        let temp_path = path.with_extension("tmp");
        time::timeout(self.timeouts.lock_timeout(), fs::write(&temp_path, bytes))
            .await
            .map_err(|_| DomainError::timeout(entity_type, format!("Timeout writing {}", temp_path.display())))?
            .map_err(|e| {
                DomainError::internal_error(
                    entity_type,
                    format!("Failed to write temporary file {}: {}", temp_path.display(), e),
                )
                .with_source(e)
            })?;

        fs::rename(&temp_path, path).await.map_err(|e| {
            DomainError::internal_error(
                entity_type,
                format!("Failed to rename {} to {}: {}", temp_path.display(), path.display(), e),
            )
            .with_source(e)
        })?;

        tracing::debug!("Persisted {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

#[async_trait]
impl PersistencePort for FilePersistenceRepository {
    async fn read_blob(&self, bucket_id: &str) -> Result<Option<Vec<u8>>, DomainError> {
        let path = self.blob_path(bucket_id);
        self.read_optional(&path, "CacheBlob")
            .await
            .map_err(|e| e.with_id(bucket_id))
    }

    async fn write_blob(&self, bucket_id: &str, blob: &[u8]) -> Result<(), DomainError> {
        let path = self.blob_path(bucket_id);
        self.write_atomic(&path, blob, "CacheBlob")
            .await
            .map_err(|e| e.with_id(bucket_id))
    }

    async fn read_config(&self) -> Result<Option<Vec<u8>>, DomainError> {
        let path = self.config_path();
        self.read_optional(&path, "ConfigRecord").await
    }

    async fn write_config(&self, record: &[u8]) -> Result<(), DomainError> {
        let path = self.config_path();
        self.write_atomic(&path, record, "ConfigRecord").await
    }
}
