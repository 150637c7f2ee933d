use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::ports::outbound::PersistencePort;
use crate::domain::entities::translation::{BucketConfig, LocaleList, LOCALE_INDEX_KEY};
use crate::domain::services::i18n_service::{LocalizationError, LocalizationResult};

/// Flat config record: string keys to 64-bit integers
pub type ConfigRecord = BTreeMap<String, i64>;

/// Shared config record, loaded lazily and written back on every mutation
///
/// Every bucket of a process goes through the same store so writes to the
/// shared record are serialized.
pub struct ConfigStore {
    persistence: Arc<dyn PersistencePort>,
    record: Mutex<Option<ConfigRecord>>,
}

impl ConfigStore {
    pub fn new(persistence: Arc<dyn PersistencePort>) -> Self {
        Self {
            persistence,
            record: Mutex::new(None),
        }
    }

    /// Reads the persisted record, falling back to an empty one
    async fn read_record(&self) -> ConfigRecord {
        let raw = match self.persistence.read_config().await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("No config record found, starting with defaults");
                return ConfigRecord::new();
            }
            Err(e) => {
                warn!("Failed to read config record, starting with defaults: {}", e);
                return ConfigRecord::new();
            }
        };

        match serde_json::from_slice::<ConfigRecord>(&raw) {
            Ok(record) => {
                debug!("Loaded config record with {} entries", record.len());
                record
            }
            Err(e) => {
                let err = LocalizationError::Decode(format!("Config record is corrupt: {}", e));
                warn!("{}, starting with defaults", err);
                ConfigRecord::new()
            }
        }
    }

    async fn write_record(&self, record: &ConfigRecord) -> LocalizationResult<()> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| LocalizationError::ConfigWrite(format!("Failed to serialize config record: {}", e)))?;
        self.persistence
            .write_config(&json)
            .await
            .map_err(|e| LocalizationError::ConfigWrite(e.to_string()))
    }

    /// Applies `update` to the record and persists it while holding the lock
    async fn mutate<F>(&self, update: F) -> LocalizationResult<()>
    where
        F: FnOnce(&mut ConfigRecord),
    {
        let mut guard = self.record.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_record().await);
        }
        let record = guard.get_or_insert_with(ConfigRecord::new);
        update(record);
        self.write_record(record).await
    }

    /// Loads the view of one bucket, re-saving the record when values were missing
    pub async fn load_bucket(&self, bucket_id: &str, locales: &LocaleList) -> BucketConfig {
        let mut guard = self.record.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_record().await);
        }
        let record = guard.get_or_insert_with(ConfigRecord::new);

        if BucketConfig::repair_record(record, bucket_id) {
            if let Err(e) = self.write_record(record).await {
                warn!("Failed to save repaired config for bucket {}: {}", bucket_id, e);
            }
        }
        BucketConfig::from_record(record, bucket_id, locales)
    }

    /// Stores the globally active locale index
    pub async fn set_locale_index(&self, index: usize) -> LocalizationResult<()> {
        self.mutate(|record| {
            record.insert(LOCALE_INDEX_KEY.to_string(), index as i64);
        })
        .await
    }

    /// Stores the fetch timestamp of a bucket
    pub async fn set_last_fetch(&self, bucket_id: &str, unix_seconds: i64) -> LocalizationResult<()> {
        self.mutate(|record| {
            record.insert(BucketConfig::last_fetch_key(bucket_id), unix_seconds);
        })
        .await
    }

    /// Writes the in-memory record back unchanged
    pub async fn flush(&self) -> LocalizationResult<()> {
        self.mutate(|_| {}).await
    }
}
