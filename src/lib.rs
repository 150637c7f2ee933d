// Main modules of the crate
pub mod common;
pub mod domain;
pub mod application;
pub mod infrastructure;

// Common public re-exports
pub use application::services::bucket_registry::BucketRegistry;
pub use application::services::localization_bucket::LocalizationBucket;
pub use common::config::{AppConfig, BucketSettings, FallbackMode};
pub use domain::services::i18n_service::{BucketEvent, LocalizationError, LocalizationService};
pub use infrastructure::services::compression_service::GzipCompressionService;
