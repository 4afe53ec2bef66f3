pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use services::store::{ChartStore, DatasetStore, InMemoryChartStore, InMemoryDatasetStore};

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub datasets: Arc<dyn DatasetStore>,
    pub charts: Arc<dyn ChartStore>,
}

impl AppState {
    pub fn new(
        config: config::Config,
        datasets: Arc<dyn DatasetStore>,
        charts: Arc<dyn ChartStore>,
    ) -> Self {
        Self { config, datasets, charts }
    }

    /// State backed by the in-memory stores.
    pub fn in_memory(config: config::Config) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryDatasetStore::default()),
            Arc::new(InMemoryChartStore::default()),
        )
    }
}
