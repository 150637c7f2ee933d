use std::error::Error;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oxilocale::common::config::AppConfig;
use oxilocale::common::di::AppServiceFactory;
use oxilocale::domain::services::i18n_service::{BucketEvent, LocalizationService};

/// OxiLocale - client side localization cache
///
/// Fetches translated strings for the configured locales from a remote
/// translation service, persists them locally and serves lookups from
/// memory. The binary opens the bucket described by the `OXILOCALE_*`
/// environment, prints every configured key once the first refresh pass
/// completes, then flushes state and exits.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    if !config.storage_path.exists() {
        std::fs::create_dir_all(&config.storage_path)?;
    }

    let factory = AppServiceFactory::new(config.clone());
    let registry = factory.create_registry(factory.create_core_services()?);

    let bucket = registry.open_bucket(config.bucket.clone()).await?;
    let mut events = bucket.subscribe();

    let health = bucket.check_connection().await;
    tracing::info!("Translation service reachable: {}", health.ok);

    // The initial refresh may already be done or suppressed
    if bucket.is_refreshing() || bucket.is_refresh_due() {
        let wait = config.bucket.timeouts.refresh_deadline() * 2;
        let _ = tokio::time::timeout(wait, async {
            while let Ok(event) = events.recv().await {
                if let BucketEvent::ConnectionFailed { .. } = event {
                    tracing::warn!("Translation service did not answer in time");
                }
                if let BucketEvent::Refreshed { .. } = event {
                    break;
                }
            }
        })
        .await;
    }

    for key in &config.bucket.keys {
        let value = bucket.translate(key).unwrap_or_default();
        println!("{} [{}] = {}", key, bucket.active_locale(), value);
    }

    registry.shutdown_all().await;
    Ok(())
}
