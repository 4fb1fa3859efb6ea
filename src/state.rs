use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

use crate::config::Config;
use crate::db::Store;
use crate::domain::events::CatalogEvent;
use crate::services::{CatalogService, ChannelChecker, SeaOrmCatalogService, SourceService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub event_bus: broadcast::Sender<CatalogEvent>,

    pub catalog: Arc<dyn CatalogService>,

    pub sources: Arc<SourceService>,

    pub checker: Arc<ChannelChecker>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size.max(1));
        Self::with_event_bus(config, event_bus).await
    }

    pub async fn with_event_bus(
        config: Config,
        event_bus: broadcast::Sender<CatalogEvent>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
            Duration::from_millis(config.general.db_busy_timeout_ms),
        )
        .await?;

        Self::from_store(config, store, event_bus)
    }

    /// Wires the services around an already opened store.
    pub fn from_store(
        config: Config,
        store: Store,
        event_bus: broadcast::Sender<CatalogEvent>,
    ) -> anyhow::Result<Self> {
        let catalog = Arc::new(SeaOrmCatalogService::new(
            store.clone(),
            config.catalog.clone(),
            event_bus.clone(),
        )) as Arc<dyn CatalogService>;

        let sources = Arc::new(SourceService::new(catalog.clone(), &config.sources)?);
        let checker = Arc::new(ChannelChecker::new(catalog.clone(), &config.checker)?);

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            event_bus,
            catalog,
            sources,
            checker,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
