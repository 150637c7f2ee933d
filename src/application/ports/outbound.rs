use std::time::Duration;

use async_trait::async_trait;

use crate::application::dtos::i18n_dto::{HealthStatus, TranslationRequestDto, TranslationResponseDto};
use crate::common::errors::DomainError;
use crate::domain::services::i18n_service::LocalizationResult;

/// Remote location of a translation endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub base_url: String,
    pub path: String,
}

impl ServerEndpoint {
    pub fn new<S: Into<String>>(base_url: S, path: S) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
        }
    }

    /// Joins base URL and path with exactly one slash
    pub fn url(&self) -> String {
        Self::join(&self.base_url, &self.path)
    }

    pub fn join(base_url: &str, path: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }
}

/// Secondary port for persisting cache blobs and the shared config record
#[async_trait]
pub trait PersistencePort: Send + Sync + 'static {
    /// Reads the cache blob of a bucket, `None` when it was never written
    async fn read_blob(&self, bucket_id: &str) -> Result<Option<Vec<u8>>, DomainError>;

    /// Replaces the cache blob of a bucket
    async fn write_blob(&self, bucket_id: &str, blob: &[u8]) -> Result<(), DomainError>;

    /// Reads the raw config record, `None` when it was never written
    async fn read_config(&self) -> Result<Option<Vec<u8>>, DomainError>;

    /// Replaces the raw config record
    async fn write_config(&self, record: &[u8]) -> Result<(), DomainError>;
}

/// Secondary port for talking to the remote translation service
#[async_trait]
pub trait TransportPort: Send + Sync + 'static {
    /// Posts a translation request and parses the response envelope
    async fn fetch_translations(
        &self,
        endpoint: &ServerEndpoint,
        api_key: Option<&str>,
        request: &TranslationRequestDto,
        deadline: Duration,
    ) -> LocalizationResult<TranslationResponseDto>;

    /// Probes the service for reachability
    async fn health_check(&self, endpoint: &ServerEndpoint, deadline: Duration) -> LocalizationResult<HealthStatus>;
}
