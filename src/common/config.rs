use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Timeout configuration for refresh and I/O operations
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Maximum time a refresh may take before the watchdog gives up on it (ms)
    pub max_refresh_response_ms: u64,
    /// Watchdog polling interval (ms)
    pub watchdog_poll_ms: u64,
    /// Deadline handed to the transport for a single request (ms)
    pub network_operation_ms: u64,
    /// Deadline for persistence reads and writes (ms)
    pub lock_acquisition_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            max_refresh_response_ms: 4096,
            watchdog_poll_ms: 256,
            network_operation_ms: 15000, // 15 seconds
            lock_acquisition_ms: 5000,   // 5 seconds
        }
    }
}

impl TimeoutConfig {
    /// Duration after which a pending refresh is reported as failed
    pub fn refresh_deadline(&self) -> Duration {
        Duration::from_millis(self.max_refresh_response_ms)
    }

    /// Watchdog polling interval
    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_millis(self.watchdog_poll_ms.max(1))
    }

    /// Transport request deadline
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_operation_ms)
    }

    /// Persistence I/O deadline
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_acquisition_ms)
    }
}

/// Rate limiting for remote refreshes
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Minimum number of seconds between two refresh attempts
    pub min_seconds_between_requests: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            min_seconds_between_requests: 86_400, // 1 day
        }
    }
}

/// What `translate` returns when the cache has no value for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackMode {
    /// The key itself
    #[default]
    Key,
    /// An empty string
    Empty,
    /// No value at all
    Absent,
}

impl FromStr for FallbackMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "key" => Ok(FallbackMode::Key),
            "empty" => Ok(FallbackMode::Empty),
            "absent" | "none" => Ok(FallbackMode::Absent),
            other => Err(format!("unknown fallback mode: {}", other)),
        }
    }
}

impl FallbackMode {
    /// Resolves the fallback value for a missing key
    pub fn resolve(&self, key: &str) -> Option<String> {
        match self {
            FallbackMode::Key => Some(key.to_string()),
            FallbackMode::Empty => Some(String::new()),
            FallbackMode::Absent => None,
        }
    }
}

/// Resolved settings of a single localization bucket
#[derive(Debug, Clone)]
pub struct BucketSettings {
    /// Bucket identifier, also names the cache blob
    pub id: String,
    /// Base URL of the translation service
    pub base_url: String,
    /// Path of the translation endpoint below the base URL
    pub path: String,
    /// Identity sent with every request
    pub user_id: String,
    /// Optional read access credential
    pub read_access_password: Option<String>,
    /// Optional API key sent as a header
    pub api_key: Option<String>,
    /// Keys this bucket is interested in
    pub keys: Vec<String>,
    /// Configured locales, the first one is the default
    pub locales: Vec<String>,
    pub fallback: FallbackMode,
    /// Whether the cache blob is written again on shutdown
    pub flush_cache_on_shutdown: bool,
    pub refresh: RefreshConfig,
    pub timeouts: TimeoutConfig,
}

impl BucketSettings {
    pub fn new<S: Into<String>>(id: S, base_url: S, path: S) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            path: path.into(),
            user_id: String::new(),
            read_access_password: None,
            api_key: None,
            keys: Vec::new(),
            locales: Vec::new(),
            fallback: FallbackMode::default(),
            flush_cache_on_shutdown: true,
            refresh: RefreshConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }

    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_user<S: Into<String>>(mut self, user_id: S) -> Self {
        self.user_id = user_id.into();
        self
    }
}

/// Global application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding cache blobs and the shared config record
    pub storage_path: PathBuf,
    /// Bucket served by the binary
    pub bucket: BucketSettings,
}

impl AppConfig {
    /// Resolves configuration from `OXILOCALE_*` environment variables
    pub fn from_env() -> Self {
        let storage_path = env::var("OXILOCALE_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./storage/locales"));

        let mut bucket = BucketSettings::new(
            env_or("OXILOCALE_BUCKET_ID", "default"),
            env_or("OXILOCALE_BASE_URL", "http://localhost:8080"),
            env_or("OXILOCALE_PATH", "api/translations"),
        )
        .with_user(env_or("OXILOCALE_USER_ID", "anonymous"))
        .with_keys(env_list("OXILOCALE_KEYS"))
        .with_locales(env_list("OXILOCALE_LOCALES"));

        if bucket.locales.is_empty() {
            bucket.locales.push("en_US".to_string());
        }
        bucket.read_access_password = env::var("OXILOCALE_READ_PASSWORD").ok().filter(|v| !v.is_empty());
        bucket.api_key = env::var("OXILOCALE_API_KEY").ok().filter(|v| !v.is_empty());

        if let Ok(raw) = env::var("OXILOCALE_FALLBACK") {
            match raw.parse::<FallbackMode>() {
                Ok(mode) => bucket.fallback = mode,
                Err(e) => tracing::warn!("Ignoring OXILOCALE_FALLBACK: {}", e),
            }
        }
        if let Some(secs) = env_parse::<u64>("OXILOCALE_MIN_SECONDS_BETWEEN_REQUESTS") {
            bucket.refresh.min_seconds_between_requests = secs;
        }
        if let Some(ms) = env_parse::<u64>("OXILOCALE_MAX_RESPONSE_MS") {
            bucket.timeouts.max_refresh_response_ms = ms;
        }

        Self { storage_path, bucket }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_list(name: &str) -> Vec<String> {
    env::var(name)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
