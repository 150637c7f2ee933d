pub mod config_store;
pub mod locale_channel;
pub mod refresh_coordinator;
pub mod localization_bucket;
pub mod bucket_registry;

// Re-export for easy access
pub use bucket_registry::BucketRegistry;
pub use localization_bucket::{BucketDependencies, LocalizationBucket};
pub use refresh_coordinator::{RefreshCoordinator, RefreshOutcome, SuppressReason};
