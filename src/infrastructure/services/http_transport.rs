use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::application::dtos::i18n_dto::{HealthStatus, TranslationRequestDto, TranslationResponseDto};
use crate::application::ports::outbound::{ServerEndpoint, TransportPort};
use crate::domain::services::i18n_service::{LocalizationError, LocalizationResult};

/// Header carrying the optional API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Health check path, relative to the base URL
pub const HEALTH_CHECK_PATH: &str = "health";

/// reqwest backed implementation of the transport port
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds a transport with the given connect timeout
    pub fn new(connect_timeout: Duration) -> LocalizationResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| LocalizationError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }

    /// Wraps an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn map_send_error(err: reqwest::Error) -> LocalizationError {
        if err.is_timeout() {
            LocalizationError::Timeout(err.to_string())
        } else {
            LocalizationError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl TransportPort for HttpTransport {
    async fn fetch_translations(
        &self,
        endpoint: &ServerEndpoint,
        api_key: Option<&str>,
        request: &TranslationRequestDto,
        deadline: Duration,
    ) -> LocalizationResult<TranslationResponseDto> {
        let url = endpoint.url();
        debug!("Requesting {} keys in {} locales from {}", request.keys.len(), request.locales.len(), url);

        let mut builder = self.client.post(&url).json(request).timeout(deadline);
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let response = builder.send().await.map_err(Self::map_send_error)?;
        let status = response.status();
        if !status.is_success() {
            warn!("Translation request to {} failed with status {}", url, status);
            return Err(LocalizationError::Transport(format!("HTTP request failed with status {}", status)));
        }

        response
            .json::<TranslationResponseDto>()
            .await
            .map_err(|e| LocalizationError::Transport(format!("Invalid translation response: {}", e)))
    }

    async fn health_check(&self, endpoint: &ServerEndpoint, deadline: Duration) -> LocalizationResult<HealthStatus> {
        let url = ServerEndpoint::join(&endpoint.base_url, HEALTH_CHECK_PATH);

        let response = self
            .client
            .get(&url)
            .timeout(deadline)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let ok = response.status().is_success();
        let payload = response.text().await.ok().filter(|body| !body.is_empty());
        Ok(HealthStatus { ok, payload })
    }
}
