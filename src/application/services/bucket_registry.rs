use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use tracing::info;

use crate::application::ports::outbound::{PersistencePort, TransportPort};
use crate::application::services::config_store::ConfigStore;
use crate::application::services::locale_channel::LocaleChannel;
use crate::application::services::localization_bucket::{BucketDependencies, LocalizationBucket};
use crate::common::config::BucketSettings;
use crate::domain::services::i18n_service::LocalizationResult;
use crate::infrastructure::services::cache_codec::CacheBlobCodec;
use crate::infrastructure::services::compression_service::CompressionService;

/// Owns the buckets of a process and the collaborators they share
pub struct BucketRegistry {
    deps: BucketDependencies,
    buckets: DashMap<String, Arc<LocalizationBucket>>,
}

impl BucketRegistry {
    pub fn new(
        persistence: Arc<dyn PersistencePort>,
        transport: Arc<dyn TransportPort>,
        compression: Arc<dyn CompressionService>,
    ) -> Self {
        let config_store = Arc::new(ConfigStore::new(persistence.clone()));
        Self {
            deps: BucketDependencies {
                persistence,
                transport,
                codec: Arc::new(CacheBlobCodec::new(compression)),
                config_store,
                locale_channel: LocaleChannel::new(),
            },
            buckets: DashMap::new(),
        }
    }

    /// Returns the running bucket with this id, creating and starting it if needed
    pub async fn open_bucket(&self, settings: BucketSettings) -> LocalizationResult<Arc<LocalizationBucket>> {
        if let Some(existing) = self.bucket(&settings.id) {
            return Ok(existing);
        }

        let bucket = LocalizationBucket::new(&settings, self.deps.clone())?;
        bucket.start().await;

        // Another caller may have opened the same id meanwhile; keep the first one
        let winner = self
            .buckets
            .entry(settings.id.clone())
            .or_insert_with(|| bucket.clone())
            .value()
            .clone();
        if !Arc::ptr_eq(&winner, &bucket) {
            bucket.shutdown().await;
        }
        Ok(winner)
    }

    pub fn bucket(&self, id: &str) -> Option<Arc<LocalizationBucket>> {
        self.buckets.get(id).map(|entry| entry.value().clone())
    }

    pub fn bucket_ids(&self) -> Vec<String> {
        self.buckets.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn locale_channel(&self) -> &LocaleChannel {
        &self.deps.locale_channel
    }

    /// Shuts one bucket down and forgets it
    pub async fn close_bucket(&self, id: &str) -> bool {
        match self.buckets.remove(id) {
            Some((_, bucket)) => {
                bucket.shutdown().await;
                true
            }
            None => false,
        }
    }

    /// Shuts every bucket down
    pub async fn shutdown_all(&self) {
        let buckets: Vec<Arc<LocalizationBucket>> =
            self.buckets.iter().map(|entry| entry.value().clone()).collect();
        self.buckets.clear();

        join_all(buckets.iter().map(|bucket| bucket.shutdown())).await;
        info!("Shut down {} localization buckets", buckets.len());
    }
}
