use std::sync::Arc;

use crate::application::ports::outbound::{PersistencePort, TransportPort};
use crate::application::services::bucket_registry::BucketRegistry;
use crate::common::config::AppConfig;
use crate::domain::services::i18n_service::LocalizationResult;
use crate::infrastructure::repositories::file_persistence_repository::FilePersistenceRepository;
use crate::infrastructure::services::compression_service::{CompressionService, GzipCompressionService};
use crate::infrastructure::services::http_transport::HttpTransport;

/// Infrastructure adapters every registry needs
pub struct CoreServices {
    pub persistence: Arc<dyn PersistencePort>,
    pub transport: Arc<dyn TransportPort>,
    pub compression: Arc<dyn CompressionService>,
}

/// Factory wiring adapters into a bucket registry
pub struct AppServiceFactory {
    config: AppConfig,
}

impl AppServiceFactory {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Builds the file system, HTTP and compression adapters
    pub fn create_core_services(&self) -> LocalizationResult<CoreServices> {
        let persistence = Arc::new(FilePersistenceRepository::with_timeouts(
            self.config.storage_path.clone(),
            self.config.bucket.timeouts.clone(),
        ));
        let transport = Arc::new(HttpTransport::new(self.config.bucket.timeouts.network_timeout())?);

        Ok(CoreServices {
            persistence,
            transport,
            compression: Arc::new(GzipCompressionService::new()),
        })
    }

    /// Builds an empty registry on top of the given adapters
    pub fn create_registry(&self, core: CoreServices) -> BucketRegistry {
        BucketRegistry::new(core.persistence, core.transport, core.compression)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
