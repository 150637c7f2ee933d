use async_trait::async_trait;
use thiserror::Error;

/// Error types for localization operations
#[derive(Debug, Error)]
pub enum LocalizationError {
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    #[error("Error decoding persisted data: {0}")]
    Decode(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Error writing config record: {0}")]
    ConfigWrite(String),

    #[error("Error writing cache blob: {0}")]
    CacheWrite(String),
}

/// Result type for localization operations
pub type LocalizationResult<T> = Result<T, LocalizationError>;

/// Notifications a bucket raises to its subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketEvent {
    /// A refresh pass finished; subscribers should re-read the cache
    Refreshed { bucket_id: String },
    /// The refresh watchdog gave up waiting for the remote service
    ConnectionFailed { bucket_id: String },
    /// The active locale changed
    LocaleChanged { bucket_id: String, locale: String },
}

impl BucketEvent {
    pub fn bucket_id(&self) -> &str {
        match self {
            BucketEvent::Refreshed { bucket_id }
            | BucketEvent::ConnectionFailed { bucket_id }
            | BucketEvent::LocaleChanged { bucket_id, .. } => bucket_id,
        }
    }
}

/// Interface for localization lookups (primary port)
#[async_trait]
pub trait LocalizationService: Send + Sync + 'static {
    /// Get a translation for a key in the active locale, never waiting on the network
    fn translate(&self, key: &str) -> Option<String>;

    /// Switch the active locale, returns false for unknown locales
    async fn set_locale(&self, locale: &str, persist: bool) -> bool;

    /// Currently active locale
    fn active_locale(&self) -> String;

    /// Configured locales
    fn available_locales(&self) -> Vec<String>;

    /// Check if a locale is configured
    fn is_supported(&self, locale: &str) -> bool {
        self.available_locales().iter().any(|l| l == locale)
    }
}
