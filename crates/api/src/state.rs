use std::sync::Arc;

use aduan_core::clock::Clock;

use crate::config::ServerConfig;
use crate::engine::lifecycle::LifecycleEngine;
use crate::engine::reports::ReportAggregator;
use crate::storage::PhotoStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: aduan_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Source of every business timestamp.
    pub clock: Arc<dyn Clock>,
    /// Where complaint photos are written.
    pub photos: Arc<PhotoStore>,
}

impl AppState {
    pub fn lifecycle(&self) -> LifecycleEngine {
        LifecycleEngine::new(self.pool.clone(), Arc::clone(&self.clock))
    }

    pub fn reports(&self) -> ReportAggregator {
        ReportAggregator::new(self.pool.clone(), Arc::clone(&self.clock))
    }
}
