use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CatalogService, FsAssetStore, MemoryRateLimitStore, RateLimitStore, RateLimiter,
    ReadingService, SeaOrmAuthService, SeaOrmCatalogService, SeaOrmReadingService,
    SeaOrmUserService, UploadService, UserService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub auth_service: Arc<dyn AuthService>,

    pub catalog_service: Arc<dyn CatalogService>,

    pub reading_service: Arc<dyn ReadingService>,

    pub user_service: Arc<dyn UserService>,

    pub upload_service: Arc<UploadService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_rate_limit_store(config, Arc::new(MemoryRateLimitStore::new())).await
    }

    /// Builds the state with a caller-provided backend for throttling windows.
    pub async fn with_rate_limit_store(
        config: Config,
        rate_limits: Arc<dyn RateLimitStore>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
            config.security.clone(),
        )
        .await?;

        let register_limiter =
            RateLimiter::new(rate_limits.clone(), config.rate_limit.register, "register");
        let upload_limiter = RateLimiter::new(rate_limits, config.rate_limit.uploads, "uploads");

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            register_limiter,
            config.security.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let catalog_service = Arc::new(SeaOrmCatalogService::new(store.clone()))
            as Arc<dyn CatalogService + Send + Sync + 'static>;

        let reading_service = Arc::new(SeaOrmReadingService::new(store.clone()))
            as Arc<dyn ReadingService + Send + Sync + 'static>;

        let user_service = Arc::new(SeaOrmUserService::new(store))
            as Arc<dyn UserService + Send + Sync + 'static>;

        let upload_service = Arc::new(UploadService::new(
            upload_limiter,
            Arc::new(FsAssetStore::new(&config.uploads.root_path)),
            config.uploads.clone(),
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            auth_service,
            catalog_service,
            reading_service,
            user_service,
            upload_service,
        })
    }
}
