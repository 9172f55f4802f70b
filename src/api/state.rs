//! Application state shared across HTTP handlers

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::directory::{AuditSink, DeviceDirectory};
use crate::health::{HealthSweeper, Prober, SystemProber};
use crate::metrics::{MetricsAggregator, MetricsRegistry};
use crate::operations::OperationExecutor;
use crate::routeros::{ConnectionManager, RouterOsConnector};

/// Shared application state
pub struct AppState<C = RouterOsConnector, P = SystemProber> {
    pub config: Config,
    pub directory: Arc<dyn DeviceDirectory>,
    pub audit: Arc<dyn AuditSink>,
    pub executor: OperationExecutor<C>,
    pub sweeper: HealthSweeper<P, C>,
    pub aggregator: MetricsAggregator<C>,
    /// Registry of the latest finished collection cycle
    pub metrics: RwLock<MetricsRegistry>,
}

impl<C: crate::routeros::Connector, P: Prober> AppState<C, P> {
    /// Wires the core components around one shared connection manager
    pub fn new(
        config: Config,
        directory: Arc<dyn DeviceDirectory>,
        audit: Arc<dyn AuditSink>,
        connector: C,
        prober: P,
    ) -> Self {
        let manager = Arc::new(ConnectionManager::new(connector));
        let executor = OperationExecutor::new(
            manager.clone(),
            config.connect.to_policy(),
            Duration::from_millis(config.script_settle_millis),
        );
        let sweeper = HealthSweeper::new(
            prober,
            manager.clone(),
            config.resources.to_policy(),
            config.sweep_concurrency,
        );
        let aggregator = MetricsAggregator::new(manager, config.metrics.to_policy());

        Self {
            config,
            directory,
            audit,
            executor,
            sweeper,
            aggregator,
            metrics: RwLock::new(MetricsRegistry::new()),
        }
    }
}
