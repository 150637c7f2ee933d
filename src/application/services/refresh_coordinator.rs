use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::application::dtos::i18n_dto::{HealthStatus, TranslationRequestDto};
use crate::application::ports::outbound::{PersistencePort, ServerEndpoint, TransportPort};
use crate::application::services::config_store::ConfigStore;
use crate::common::config::{BucketSettings, RefreshConfig, TimeoutConfig};
use crate::domain::services::i18n_service::{BucketEvent, LocalizationError, LocalizationResult};
use crate::infrastructure::services::cache_codec::CacheBlobCodec;
use crate::infrastructure::services::translation_cache::TranslationCache;

/// Why a refresh was not issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// Another refresh of the bucket is still running
    InFlight,
    /// The cache is populated and the last attempt is too recent
    NotDue,
}

/// Result of one refresh pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Suppressed(SuppressReason),
    /// Number of entries merged into the cache
    Applied(usize),
    /// The server answered but there was nothing to merge
    NoChanges,
    /// Transport failure or non-success answer, cache untouched
    Failed,
    /// The watchdog gave up; a late answer may still be merged
    TimedOut,
}

/// Collaborators a coordinator works with
#[derive(Clone)]
pub struct RefreshDependencies {
    pub cache: Arc<TranslationCache>,
    pub codec: Arc<CacheBlobCodec>,
    pub persistence: Arc<dyn PersistencePort>,
    pub transport: Arc<dyn TransportPort>,
    pub config_store: Arc<ConfigStore>,
    pub events: broadcast::Sender<BucketEvent>,
}

/// Identity and scope sent with every request
#[derive(Debug, Clone)]
struct RequestScope {
    user_id: String,
    read_access_password: Option<String>,
    api_key: Option<String>,
    keys: Vec<String>,
    locales: Vec<String>,
}

/// Returns the coordinator to idle when a pass ends, including when its future is dropped
///
/// A request task still running at that point is marked abandoned so a late
/// merge announces itself.
struct InFlightGuard<'a> {
    in_flight: &'a AtomicBool,
    abandoned: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.abandoned.store(true, Ordering::Release);
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Decides when a bucket talks to the remote service and merges the answers
///
/// At most one refresh per bucket is in flight. The fetch timestamp is
/// recorded and persisted before the request is sent, so failed or hanging
/// attempts still count against the minimum interval.
pub struct RefreshCoordinator {
    bucket_id: String,
    scope: RequestScope,
    refresh: RefreshConfig,
    timeouts: TimeoutConfig,
    endpoint: RwLock<ServerEndpoint>,
    in_flight: AtomicBool,
    last_fetch: AtomicI64,
    deps: RefreshDependencies,
}

impl RefreshCoordinator {
    pub fn new(settings: &BucketSettings, deps: RefreshDependencies) -> Self {
        Self {
            bucket_id: settings.id.clone(),
            scope: RequestScope {
                user_id: settings.user_id.clone(),
                read_access_password: settings.read_access_password.clone(),
                api_key: settings.api_key.clone().filter(|k| !k.is_empty()),
                keys: settings.keys.clone(),
                locales: settings.locales.clone(),
            },
            refresh: settings.refresh.clone(),
            timeouts: settings.timeouts.clone(),
            endpoint: RwLock::new(ServerEndpoint::new(settings.base_url.clone(), settings.path.clone())),
            in_flight: AtomicBool::new(false),
            last_fetch: AtomicI64::new(0),
            deps,
        }
    }

    pub fn bucket_id(&self) -> &str {
        &self.bucket_id
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn last_fetch_unix_seconds(&self) -> i64 {
        self.last_fetch.load(Ordering::Acquire)
    }

    /// Restores the fetch timestamp loaded from the config record
    pub fn set_last_fetch_unix_seconds(&self, unix_seconds: i64) {
        self.last_fetch.store(unix_seconds, Ordering::Release);
    }

    pub fn endpoint(&self) -> ServerEndpoint {
        self.endpoint
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Points the coordinator at another server, returns false if nothing changed
    pub fn set_endpoint(&self, endpoint: ServerEndpoint) -> bool {
        let mut current = self
            .endpoint
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current == endpoint {
            return false;
        }
        info!("Bucket {} now targets {}", self.bucket_id, endpoint.url());
        *current = endpoint;
        true
    }

    /// Admission check for a refresh at `now_unix`
    pub fn suppress_reason_at(&self, now_unix: i64, force: bool) -> Option<SuppressReason> {
        if self.is_in_flight() {
            return Some(SuppressReason::InFlight);
        }
        if force || self.deps.cache.is_empty() {
            return None;
        }
        let elapsed = now_unix.saturating_sub(self.last_fetch_unix_seconds());
        if elapsed > self.refresh.min_seconds_between_requests as i64 {
            None
        } else {
            Some(SuppressReason::NotDue)
        }
    }

    pub fn should_refresh_at(&self, now_unix: i64) -> bool {
        self.suppress_reason_at(now_unix, false).is_none()
    }

    pub fn should_refresh(&self) -> bool {
        self.should_refresh_at(Utc::now().timestamp())
    }

    fn emit(&self, event: BucketEvent) {
        // No subscribers is fine
        let _ = self.deps.events.send(event);
    }

    fn build_request(&self, previous_fetch: i64) -> TranslationRequestDto {
        TranslationRequestDto {
            user_id: self.scope.user_id.clone(),
            read_access_password: self.scope.read_access_password.clone(),
            last_fetch_utc: (previous_fetch > 0).then_some(previous_fetch),
            keys: self.scope.keys.clone(),
            locales: self.scope.locales.clone(),
        }
    }

    /// Runs one refresh pass unless it is suppressed
    ///
    /// With `force` the minimum interval is ignored, the in-flight guard is not.
    #[instrument(skip(self), fields(bucket = %self.bucket_id))]
    pub async fn refresh(self: &Arc<Self>, force: bool) -> RefreshOutcome {
        let now = Utc::now().timestamp();
        if let Some(reason) = self.suppress_reason_at(now, force) {
            debug!("Refresh suppressed: {:?}", reason);
            return RefreshOutcome::Suppressed(reason);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Refresh suppressed: another refresh won the race");
            return RefreshOutcome::Suppressed(SuppressReason::InFlight);
        }

        let abandoned = Arc::new(AtomicBool::new(false));
        let guard = InFlightGuard {
            in_flight: &self.in_flight,
            abandoned: &abandoned,
        };

        let started = Instant::now();
        let previous_fetch = self.last_fetch.swap(now, Ordering::AcqRel);
        if let Err(e) = self.deps.config_store.set_last_fetch(&self.bucket_id, now).await {
            warn!("Failed to persist fetch timestamp: {}", e);
        }

        let request = self.build_request(previous_fetch);
        let endpoint = self.endpoint();

        let coordinator = Arc::clone(self);
        let task_abandoned = abandoned.clone();
        let mut task = tokio::spawn(async move { coordinator.execute(endpoint, request, task_abandoned).await });

        let outcome = self.watch(&mut task, started, &abandoned).await;

        drop(guard);
        self.emit(BucketEvent::Refreshed {
            bucket_id: self.bucket_id.clone(),
        });
        outcome
    }

    /// Polls the request task until it finishes or the deadline passes
    async fn watch(
        &self,
        task: &mut JoinHandle<RefreshOutcome>,
        started: Instant,
        abandoned: &AtomicBool,
    ) -> RefreshOutcome {
        let deadline = self.timeouts.refresh_deadline();
        let poll = self.timeouts.watchdog_interval();

        loop {
            if task.is_finished() {
                return match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("Refresh task of bucket {} failed: {}", self.bucket_id, e);
                        RefreshOutcome::Failed
                    }
                };
            }
            if started.elapsed() > deadline {
                abandoned.store(true, Ordering::Release);
                warn!(
                    "No answer from {} within {:?}, giving up on this refresh",
                    self.endpoint().url(),
                    deadline
                );
                self.emit(BucketEvent::ConnectionFailed {
                    bucket_id: self.bucket_id.clone(),
                });
                return RefreshOutcome::TimedOut;
            }
            time::sleep(poll).await;
        }
    }

    /// Sends the request and merges the answer, possibly after the watchdog gave up
    async fn execute(
        self: Arc<Self>,
        endpoint: ServerEndpoint,
        request: TranslationRequestDto,
        abandoned: Arc<AtomicBool>,
    ) -> RefreshOutcome {
        let response = self
            .deps
            .transport
            .fetch_translations(
                &endpoint,
                self.scope.api_key.as_deref(),
                &request,
                self.timeouts.network_timeout(),
            )
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                debug!("Refresh of bucket {} failed: {}", self.bucket_id, e);
                return RefreshOutcome::Failed;
            }
        };

        if let Some(errors) = response.errors.as_ref().filter(|errors| !errors.is_empty()) {
            for err in errors {
                warn!("Server error {} for bucket {}: {}", err.code, self.bucket_id, err.message);
            }
        }

        let applied = self.deps.cache.merge_entries(response.into_entries());
        if applied == 0 {
            debug!("Nothing new for bucket {}", self.bucket_id);
            return RefreshOutcome::NoChanges;
        }

        info!("Merged {} translations into bucket {}", applied, self.bucket_id);
        if let Err(e) = self.persist_cache().await {
            error!("Failed to persist cache of bucket {}: {}", self.bucket_id, e);
        }

        if abandoned.load(Ordering::Acquire) {
            info!("Late answer for bucket {} merged after the deadline", self.bucket_id);
            self.emit(BucketEvent::Refreshed {
                bucket_id: self.bucket_id.clone(),
            });
        }
        RefreshOutcome::Applied(applied)
    }

    /// Loads the persisted cache blob, a missing or corrupt blob leaves the cache empty
    pub async fn load_cache(&self) -> usize {
        let blob = match self.deps.persistence.read_blob(&self.bucket_id).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                info!("No cache persisted for bucket {}", self.bucket_id);
                return 0;
            }
            Err(e) => {
                warn!("Failed to read cache of bucket {}: {}", self.bucket_id, e);
                return 0;
            }
        };

        match self.deps.codec.decode_into(&self.deps.cache, &blob).await {
            Ok(loaded) => {
                info!("Loaded {} cached keys for bucket {}", loaded, self.bucket_id);
                loaded
            }
            Err(e) => {
                warn!("Discarding cache of bucket {}: {}", self.bucket_id, e);
                0
            }
        }
    }

    /// Writes the whole cache as one blob
    pub async fn persist_cache(&self) -> LocalizationResult<()> {
        let blob = self.deps.codec.encode(&self.deps.cache).await?;
        self.deps
            .persistence
            .write_blob(&self.bucket_id, &blob)
            .await
            .map_err(|e| LocalizationError::CacheWrite(e.to_string()))
    }

    /// Probes the current server, not used on the refresh path
    pub async fn health_check(&self) -> LocalizationResult<HealthStatus> {
        let endpoint = self.endpoint();
        self.deps
            .transport
            .health_check(&endpoint, self.timeouts.network_timeout())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use mockall::mock;

    use crate::application::dtos::i18n_dto::{TranslationItemDto, TranslationResponseDto};
    use crate::common::errors::DomainError;
    use crate::infrastructure::services::compression_service::GzipCompressionService;

    /// In-memory persistence
    #[derive(Default)]
    struct MemoryPersistence {
        blobs: Mutex<HashMap<String, Vec<u8>>>,
        config: Mutex<Option<Vec<u8>>>,
    }

    #[async_trait]
    impl PersistencePort for MemoryPersistence {
        async fn read_blob(&self, bucket_id: &str) -> Result<Option<Vec<u8>>, DomainError> {
            Ok(self.blobs.lock().unwrap().get(bucket_id).cloned())
        }

        async fn write_blob(&self, bucket_id: &str, blob: &[u8]) -> Result<(), DomainError> {
            self.blobs.lock().unwrap().insert(bucket_id.to_string(), blob.to_vec());
            Ok(())
        }

        async fn read_config(&self) -> Result<Option<Vec<u8>>, DomainError> {
            Ok(self.config.lock().unwrap().clone())
        }

        async fn write_config(&self, record: &[u8]) -> Result<(), DomainError> {
            *self.config.lock().unwrap() = Some(record.to_vec());
            Ok(())
        }
    }

    /// Transport answering with a fixed response after a delay
    struct ScriptedTransport {
        delay: Duration,
        response: Option<TranslationResponseDto>,
        calls: AtomicUsize,
        requests: Mutex<Vec<TranslationRequestDto>>,
    }

    impl ScriptedTransport {
        fn answering(delay: Duration, response: TranslationResponseDto) -> Self {
            Self {
                delay,
                response: Some(response),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                delay: Duration::ZERO,
                response: None,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TransportPort for ScriptedTransport {
        async fn fetch_translations(
            &self,
            _endpoint: &ServerEndpoint,
            _api_key: Option<&str>,
            request: &TranslationRequestDto,
            _deadline: Duration,
        ) -> LocalizationResult<TranslationResponseDto> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            time::sleep(self.delay).await;
            self.response
                .clone()
                .ok_or_else(|| LocalizationError::Transport("connection refused".to_string()))
        }

        async fn health_check(&self, _endpoint: &ServerEndpoint, _deadline: Duration) -> LocalizationResult<HealthStatus> {
            Ok(HealthStatus { ok: true, payload: None })
        }
    }

    mock! {
        BrokenPersistence {}

        #[async_trait]
        impl PersistencePort for BrokenPersistence {
            async fn read_blob(&self, bucket_id: &str) -> Result<Option<Vec<u8>>, DomainError>;
            async fn write_blob(&self, bucket_id: &str, blob: &[u8]) -> Result<(), DomainError>;
            async fn read_config(&self) -> Result<Option<Vec<u8>>, DomainError>;
            async fn write_config(&self, record: &[u8]) -> Result<(), DomainError>;
        }
    }

    fn greeting_response() -> TranslationResponseDto {
        let mut translations = HashMap::new();
        translations.insert("en_US".to_string(), "Hello".to_string());
        translations.insert("de_DE".to_string(), "Hallo".to_string());
        TranslationResponseDto {
            response_type: Some("translations".to_string()),
            count: 1,
            items: Some(vec![TranslationItemDto {
                key: "greeting".to_string(),
                translations,
            }]),
            errors: None,
        }
    }

    fn settings() -> BucketSettings {
        let mut settings = BucketSettings::new("ui", "http://localhost", "api/translations")
            .with_user("user-1")
            .with_keys(["greeting"])
            .with_locales(["en_US", "de_DE"]);
        settings.refresh.min_seconds_between_requests = 100;
        settings.timeouts.max_refresh_response_ms = 200;
        settings.timeouts.watchdog_poll_ms = 10;
        settings
    }

    struct Harness {
        coordinator: Arc<RefreshCoordinator>,
        cache: Arc<TranslationCache>,
        persistence: Arc<dyn PersistencePort>,
        events: broadcast::Receiver<BucketEvent>,
    }

    fn harness_with(transport: Arc<dyn TransportPort>, persistence: Arc<dyn PersistencePort>) -> Harness {
        let cache = Arc::new(TranslationCache::new());
        let (events, receiver) = broadcast::channel(16);
        let deps = RefreshDependencies {
            cache: cache.clone(),
            codec: Arc::new(CacheBlobCodec::new(Arc::new(GzipCompressionService::new()))),
            persistence: persistence.clone(),
            transport,
            config_store: Arc::new(ConfigStore::new(persistence.clone())),
            events,
        };
        Harness {
            coordinator: Arc::new(RefreshCoordinator::new(&settings(), deps)),
            cache,
            persistence,
            events: receiver,
        }
    }

    fn harness(transport: Arc<dyn TransportPort>) -> Harness {
        harness_with(transport, Arc::new(MemoryPersistence::default()))
    }

    fn seed(cache: &TranslationCache) {
        let mut values = HashMap::new();
        values.insert("en_US".to_string(), "Hi".to_string());
        cache.merge("greeting", values);
    }

    #[test]
    fn test_staleness_gate() {
        let h = harness(Arc::new(ScriptedTransport::failing()));
        seed(&h.cache);
        let now = 1_700_000_000;

        h.coordinator.set_last_fetch_unix_seconds(now - 50);
        assert!(!h.coordinator.should_refresh_at(now));
        assert_eq!(
            h.coordinator.suppress_reason_at(now, false),
            Some(SuppressReason::NotDue)
        );
        assert_eq!(h.coordinator.suppress_reason_at(now, true), None);

        h.coordinator.set_last_fetch_unix_seconds(now - 150);
        assert!(h.coordinator.should_refresh_at(now));
    }

    #[test]
    fn test_cold_cache_is_always_due() {
        let h = harness(Arc::new(ScriptedTransport::failing()));
        let now = 1_700_000_000;

        h.coordinator.set_last_fetch_unix_seconds(now - 1);

        assert!(h.coordinator.should_refresh_at(now));
    }

    #[tokio::test]
    async fn test_successful_refresh_merges_and_persists() {
        let transport = Arc::new(ScriptedTransport::answering(Duration::ZERO, greeting_response()));
        let mut h = harness(transport.clone());

        let outcome = h.coordinator.refresh(false).await;

        assert_eq!(outcome, RefreshOutcome::Applied(1));
        assert_eq!(h.cache.get("greeting", "de_DE").as_deref(), Some("Hallo"));
        assert!(!h.coordinator.is_in_flight());
        assert!(h.coordinator.last_fetch_unix_seconds() > 0);
        assert!(h.persistence.read_blob("ui").await.unwrap().is_some());
        assert_eq!(
            h.events.recv().await.unwrap(),
            BucketEvent::Refreshed {
                bucket_id: "ui".to_string()
            }
        );

        let request = transport.requests.lock().unwrap()[0].clone();
        assert_eq!(request.user_id, "user-1");
        assert_eq!(request.last_fetch_utc, None);
        assert_eq!(request.keys, vec!["greeting".to_string()]);
        assert_eq!(request.locales, vec!["en_US".to_string(), "de_DE".to_string()]);
    }

    #[tokio::test]
    async fn test_previous_fetch_is_sent_for_deltas() {
        let transport = Arc::new(ScriptedTransport::answering(Duration::ZERO, greeting_response()));
        let h = harness(transport.clone());
        h.coordinator.set_last_fetch_unix_seconds(1_000);

        h.coordinator.refresh(true).await;

        let request = transport.requests.lock().unwrap()[0].clone();
        assert_eq!(request.last_fetch_utc, Some(1_000));
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_cache_and_counts_attempt() {
        let mut h = harness(Arc::new(ScriptedTransport::failing()));

        let outcome = h.coordinator.refresh(false).await;

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert!(h.cache.is_empty());
        assert!(h.coordinator.last_fetch_unix_seconds() > 0);
        assert!(!h.coordinator.is_in_flight());
        assert!(matches!(h.events.recv().await.unwrap(), BucketEvent::Refreshed { .. }));
        assert!(h.events.try_recv().is_err());

        let config = h.persistence.read_config().await.unwrap().unwrap();
        let record: HashMap<String, i64> = serde_json::from_slice(&config).unwrap();
        assert_eq!(record["last_fetch_utc_ui"], h.coordinator.last_fetch_unix_seconds());
    }

    #[tokio::test]
    async fn test_error_envelope_is_a_no_op() {
        let response = TranslationResponseDto {
            response_type: Some("error".to_string()),
            count: 0,
            items: None,
            errors: Some(vec![crate::application::dtos::i18n_dto::TranslationErrorDto {
                code: 401,
                message: "unauthorized".to_string(),
            }]),
        };
        let h = harness(Arc::new(ScriptedTransport::answering(Duration::ZERO, response)));

        assert_eq!(h.coordinator.refresh(false).await, RefreshOutcome::NoChanges);
        assert!(h.cache.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_issue_one_request() {
        let transport = Arc::new(ScriptedTransport::answering(
            Duration::from_millis(100),
            greeting_response(),
        ));
        let h = harness(transport.clone());

        let attempts: Vec<_> = (0..10)
            .map(|_| {
                let coordinator = h.coordinator.clone();
                tokio::spawn(async move { coordinator.refresh(false).await })
            })
            .collect();
        let outcomes = futures::future::join_all(attempts).await;

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        let applied = outcomes
            .into_iter()
            .map(|o| o.unwrap())
            .filter(|o| *o == RefreshOutcome::Applied(1))
            .count();
        assert_eq!(applied, 1);
    }

    #[tokio::test]
    async fn test_deadline_fires_once_and_late_answer_is_merged() {
        let transport = Arc::new(ScriptedTransport::answering(
            Duration::from_millis(600),
            greeting_response(),
        ));
        let mut h = harness(transport.clone());

        let outcome = h.coordinator.refresh(false).await;

        assert_eq!(outcome, RefreshOutcome::TimedOut);
        assert!(!h.coordinator.is_in_flight());
        assert!(h.cache.is_empty());
        assert_eq!(
            h.events.recv().await.unwrap(),
            BucketEvent::ConnectionFailed {
                bucket_id: "ui".to_string()
            }
        );
        assert!(matches!(h.events.recv().await.unwrap(), BucketEvent::Refreshed { .. }));

        // the detached request completes on its own
        let late = time::timeout(Duration::from_secs(2), h.events.recv()).await.unwrap().unwrap();
        assert!(matches!(late, BucketEvent::Refreshed { .. }));
        assert_eq!(h.cache.get("greeting", "en_US").as_deref(), Some("Hello"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_refresh_returns_to_idle() {
        let transport = Arc::new(ScriptedTransport::answering(
            Duration::from_millis(100),
            greeting_response(),
        ));
        let mut h = harness(transport.clone());

        let cancelled = time::timeout(Duration::from_millis(30), h.coordinator.refresh(false)).await;
        assert!(cancelled.is_err());
        assert!(!h.coordinator.is_in_flight());

        // the detached request still lands and announces itself
        let late = time::timeout(Duration::from_secs(2), h.events.recv()).await.unwrap().unwrap();
        assert!(matches!(late, BucketEvent::Refreshed { .. }));
        assert_eq!(h.cache.get("greeting", "en_US").as_deref(), Some("Hello"));

        assert_eq!(h.coordinator.refresh(true).await, RefreshOutcome::Applied(1));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_break_refresh() {
        let mut persistence = MockBrokenPersistence::new();
        persistence.expect_read_config().returning(|| Ok(None));
        persistence
            .expect_write_config()
            .returning(|_| Err(DomainError::internal_error("ConfigRecord", "disk full")));
        persistence
            .expect_write_blob()
            .times(1)
            .returning(|_, _| Err(DomainError::internal_error("CacheBlob", "disk full")));

        let transport = Arc::new(ScriptedTransport::answering(Duration::ZERO, greeting_response()));
        let h = harness_with(transport, Arc::new(persistence));

        let outcome = h.coordinator.refresh(false).await;

        assert_eq!(outcome, RefreshOutcome::Applied(1));
        assert_eq!(h.cache.get("greeting", "en_US").as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_change_endpoint() {
        let h = harness(Arc::new(ScriptedTransport::failing()));

        assert!(!h.coordinator.set_endpoint(ServerEndpoint::new("http://localhost", "api/translations")));
        assert!(h.coordinator.set_endpoint(ServerEndpoint::new("http://other", "v2")));
        assert_eq!(h.coordinator.endpoint().url(), "http://other/v2");
    }
}
