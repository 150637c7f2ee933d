use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::application::dtos::i18n_dto::HealthStatus;
use crate::application::ports::outbound::{PersistencePort, ServerEndpoint, TransportPort};
use crate::application::services::config_store::ConfigStore;
use crate::application::services::locale_channel::{LocaleChange, LocaleChannel};
use crate::application::services::refresh_coordinator::{RefreshCoordinator, RefreshDependencies, RefreshOutcome};
use crate::common::config::{BucketSettings, FallbackMode};
use crate::domain::entities::translation::LocaleList;
use crate::domain::services::i18n_service::{
    BucketEvent, LocalizationError, LocalizationResult, LocalizationService,
};
use crate::infrastructure::services::cache_codec::CacheBlobCodec;
use crate::infrastructure::services::translation_cache::TranslationCache;

/// Number of bucket events buffered per subscriber
const EVENT_CAPACITY: usize = 64;

/// Shared collaborators injected into every bucket
#[derive(Clone)]
pub struct BucketDependencies {
    pub persistence: Arc<dyn PersistencePort>,
    pub transport: Arc<dyn TransportPort>,
    pub codec: Arc<CacheBlobCodec>,
    pub config_store: Arc<ConfigStore>,
    pub locale_channel: LocaleChannel,
}

/// Facade over one bucket: cache, refresh coordinator and active locale
///
/// Lookups are always answered from memory. A due refresh is started in the
/// background and subscribers are told when to read again.
pub struct LocalizationBucket {
    id: String,
    locales: LocaleList,
    fallback: FallbackMode,
    flush_cache_on_shutdown: bool,
    active_index: AtomicUsize,
    cache: Arc<TranslationCache>,
    coordinator: Arc<RefreshCoordinator>,
    config_store: Arc<ConfigStore>,
    locale_channel: LocaleChannel,
    events: broadcast::Sender<BucketEvent>,
    locale_listener: Mutex<Option<JoinHandle<()>>>,
}

impl LocalizationBucket {
    /// Builds a bucket, it does nothing until `start` is called
    pub fn new(settings: &BucketSettings, deps: BucketDependencies) -> LocalizationResult<Arc<Self>> {
        if settings.locales.is_empty() {
            return Err(LocalizationError::InvalidLocale(format!(
                "bucket {} has no locales configured",
                settings.id
            )));
        }

        let cache = Arc::new(TranslationCache::new());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let coordinator = Arc::new(RefreshCoordinator::new(
            settings,
            RefreshDependencies {
                cache: cache.clone(),
                codec: deps.codec,
                persistence: deps.persistence,
                transport: deps.transport,
                config_store: deps.config_store.clone(),
                events: events.clone(),
            },
        ));

        Ok(Arc::new(Self {
            id: settings.id.clone(),
            locales: LocaleList::new(settings.locales.clone()),
            fallback: settings.fallback,
            flush_cache_on_shutdown: settings.flush_cache_on_shutdown,
            active_index: AtomicUsize::new(0),
            cache,
            coordinator,
            config_store: deps.config_store,
            locale_channel: deps.locale_channel,
            events,
            locale_listener: Mutex::new(None),
        }))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Loads persisted state, joins the locale channel and kicks off the first refresh
    #[instrument(skip(self), fields(bucket = %self.id))]
    pub async fn start(self: &Arc<Self>) {
        let config = self.config_store.load_bucket(&self.id, &self.locales).await;
        self.active_index.store(config.active_locale_index, Ordering::Release);
        self.coordinator.set_last_fetch_unix_seconds(config.last_fetch_unix_seconds);

        let loaded = self.coordinator.load_cache().await;
        info!(
            "Bucket {} started with {} cached keys, locale {}",
            self.id,
            loaded,
            self.active_locale()
        );
        if !config.has_fetched() {
            info!("Bucket {} has never been fetched", self.id);
        }

        self.listen_for_locale_changes();
        self.trigger_refresh(false);
    }

    /// Leaves the locale channel and flushes state
    #[instrument(skip(self), fields(bucket = %self.id))]
    pub async fn shutdown(&self) {
        let listener = self.lock_listener().take();
        if let Some(listener) = listener {
            listener.abort();
        }

        if self.flush_cache_on_shutdown {
            if let Err(e) = self.coordinator.persist_cache().await {
                error!("Failed to flush cache of bucket {}: {}", self.id, e);
            }
        }
        if let Err(e) = self.config_store.flush().await {
            error!("Failed to flush config for bucket {}: {}", self.id, e);
        }
        info!("Bucket {} shut down", self.id);
    }

    fn lock_listener(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.locale_listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn listen_for_locale_changes(self: &Arc<Self>) {
        let mut receiver = self.locale_channel.subscribe();
        let bucket: Weak<Self> = Arc::downgrade(self);

        let listener = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(change) => {
                        let Some(bucket) = bucket.upgrade() else {
                            break;
                        };
                        if change.origin_bucket != bucket.id {
                            bucket.apply_remote_locale(&change.locale);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Locale listener skipped {} changes", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self.lock_listener().replace(listener) {
            previous.abort();
        }
    }

    /// Follows a locale switch made by another bucket, if this bucket serves it
    fn apply_remote_locale(&self, locale: &str) {
        let Some(index) = self.locales.index_of(locale) else {
            debug!("Bucket {} ignores locale {}", self.id, locale);
            return;
        };
        if self.active_index.swap(index, Ordering::AcqRel) != index {
            self.emit(BucketEvent::LocaleChanged {
                bucket_id: self.id.clone(),
                locale: locale.to_string(),
            });
        }
    }

    fn emit(&self, event: BucketEvent) {
        let _ = self.events.send(event);
    }

    /// Starts a background refresh; returns false when none was started
    fn trigger_refresh(&self, force: bool) -> bool {
        if self.coordinator.suppress_reason_at(chrono::Utc::now().timestamp(), force).is_some() {
            return false;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let coordinator = self.coordinator.clone();
                handle.spawn(async move {
                    coordinator.refresh(force).await;
                });
                true
            }
            Err(_) => {
                debug!("No async runtime, refresh of bucket {} skipped", self.id);
                false
            }
        }
    }

    /// Looks up `key` in a specific locale without touching the active one
    pub fn translate_in(&self, key: &str, locale: &str) -> Option<String> {
        self.trigger_refresh(false);
        self.cache.get(key, locale).or_else(|| self.fallback.resolve(key))
    }

    /// Switches the active locale
    ///
    /// Returns false and leaves the locale unchanged when `locale` is not configured.
    #[instrument(skip(self), fields(bucket = %self.id))]
    pub async fn set_locale(&self, locale: &str, persist: bool) -> bool {
        let Some(index) = self.locales.index_of(locale) else {
            warn!("Locale {} is not configured for bucket {}", locale, self.id);
            return false;
        };

        self.active_index.store(index, Ordering::Release);
        self.emit(BucketEvent::LocaleChanged {
            bucket_id: self.id.clone(),
            locale: locale.to_string(),
        });
        self.locale_channel.publish(LocaleChange {
            origin_bucket: self.id.clone(),
            locale: locale.to_string(),
        });

        if persist {
            if let Err(e) = self.config_store.set_locale_index(index).await {
                error!("Failed to persist locale of bucket {}: {}", self.id, e);
            }
        }
        true
    }

    /// Targets another server and refreshes right away
    ///
    /// Returns false when the endpoint is unchanged.
    pub fn change_server(&self, base_url: &str, path: &str) -> bool {
        if !self.coordinator.set_endpoint(ServerEndpoint::new(base_url, path)) {
            return false;
        }
        self.trigger_refresh(true);
        true
    }

    /// Runs a refresh pass now and waits for it
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.coordinator.refresh(false).await
    }

    /// Probes the current server for reachability
    pub async fn check_connection(&self) -> HealthStatus {
        match self.coordinator.health_check().await {
            Ok(status) => status,
            Err(e) => {
                debug!("Health check of bucket {} failed: {}", self.id, e);
                HealthStatus { ok: false, payload: None }
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BucketEvent> {
        self.events.subscribe()
    }

    pub fn locales(&self) -> &[String] {
        self.locales.as_slice()
    }

    pub fn server(&self) -> ServerEndpoint {
        self.coordinator.endpoint()
    }

    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_in_flight()
    }

    /// Whether a lookup right now would start a refresh
    pub fn is_refresh_due(&self) -> bool {
        self.coordinator.should_refresh()
    }

    pub fn last_fetch_unix_seconds(&self) -> i64 {
        self.coordinator.last_fetch_unix_seconds()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl LocalizationService for LocalizationBucket {
    fn translate(&self, key: &str) -> Option<String> {
        self.translate_in(key, &self.active_locale())
    }

    async fn set_locale(&self, locale: &str, persist: bool) -> bool {
        LocalizationBucket::set_locale(self, locale, persist).await
    }

    fn active_locale(&self) -> String {
        let index = self.active_index.load(Ordering::Acquire);
        self.locales
            .get(index)
            .or_else(|| self.locales.get(0))
            .unwrap_or_default()
            .to_string()
    }

    fn available_locales(&self) -> Vec<String> {
        self.locales.as_slice().to_vec()
    }
}
