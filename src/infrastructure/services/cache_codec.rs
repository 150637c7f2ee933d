use std::sync::Arc;

use crate::domain::services::i18n_service::{LocalizationError, LocalizationResult};
use crate::infrastructure::services::compression_service::{CompressionLevel, CompressionService};
use crate::infrastructure::services::translation_cache::TranslationCache;

/// Whole-blob codec for persisted caches: JSON document, then compressed
pub struct CacheBlobCodec {
    compression: Arc<dyn CompressionService>,
    level: CompressionLevel,
}

impl CacheBlobCodec {
    pub fn new(compression: Arc<dyn CompressionService>) -> Self {
        Self {
            compression,
            level: CompressionLevel::Best,
        }
    }

    /// Serializes and compresses the full cache
    pub async fn encode(&self, cache: &TranslationCache) -> LocalizationResult<Vec<u8>> {
        let json = cache.to_json_bytes()?;
        self.compression
            .compress_data(&json, self.level)
            .await
            .map_err(|e| LocalizationError::CacheWrite(format!("Failed to compress cache: {}", e)))
    }

    /// Replaces the cache content with the decoded blob
    ///
    /// Any failure leaves the cache empty.
    pub async fn decode_into(&self, cache: &TranslationCache, blob: &[u8]) -> LocalizationResult<usize> {
        let json = match self.compression.decompress_data(blob).await {
            Ok(json) => json,
            Err(e) => {
                cache.clear();
                return Err(LocalizationError::Decode(format!("Failed to decompress cache: {}", e)));
            }
        };
        cache.replace_from_json(&json)
    }
}
