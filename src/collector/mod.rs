// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metrics collection orchestration
//!
//! Runs the aggregator on a fixed interval. Each cycle builds a fresh
//! registry from its samples and swaps it in for `/metrics`.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::AppState;
use crate::health::Prober;
use crate::metrics::MetricsRegistry;
use crate::routeros::Connector;

/// Starts the background metrics collection loop
///
/// The collection interval is configurable via `Config::collection_interval_secs`.
/// The loop stops once `true` is sent on `shutdown_rx`.
pub fn start_collection_loop<C, P>(
    mut shutdown_rx: watch::Receiver<bool>,
    state: Arc<AppState<C, P>>,
) -> JoinHandle<()>
where
    C: Connector + 'static,
    P: Prober + 'static,
{
    let interval = state.config.collection_interval_secs.max(1);
    tracing::info!("Starting background collection loop every {}s", interval);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval));
        loop {
            tokio::select! {
                _ = ticker.tick() => {},
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Stopping collection loop");
                        break;
                    }
                }
            }
            run_collection_cycle(&state).await;
        }
    })
}

/// Collects every device once and publishes the resulting registry
pub async fn run_collection_cycle<C: Connector, P: Prober>(state: &AppState<C, P>) {
    let cycle_start = Instant::now();
    let devices = state.directory.list_devices();
    tracing::trace!("Collection cycle started for {} device(s)", devices.len());

    let samples = state.aggregator.collect(&devices).await;
    let unreachable = samples.iter().filter(|s| !s.reachable).count();

    let registry = MetricsRegistry::from_samples(&samples);
    let elapsed = cycle_start.elapsed();
    registry.record_collection_cycle_duration(elapsed.as_secs_f64());
    *state.metrics.write().await = registry;

    tracing::debug!(
        "Collection cycle finished in {:.3}s: {} device(s), {} unreachable",
        elapsed.as_secs_f64(),
        samples.len(),
        unreachable
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::directory::{StaticDirectory, TracingAuditSink};
    use crate::testing::{FakeConnector, FakeProber, device};

    fn state(connector: FakeConnector) -> Arc<AppState<FakeConnector, FakeProber>> {
        let mut config = Config::default();
        config.collection_interval_secs = 5;
        config.metrics.max_retries = 0;
        Arc::new(AppState::new(
            config,
            Arc::new(StaticDirectory::new(vec![
                device(1, "10.0.0.1"),
                device(2, "10.0.0.2"),
            ])),
            Arc::new(TracingAuditSink),
            connector,
            FakeProber::default(),
        ))
    }

    #[tokio::test]
    async fn test_cycle_replaces_registry() {
        let connector = FakeConnector::default().unreachable("10.0.0.2");
        let state = state(connector);

        run_collection_cycle(&state).await;

        let text = state.metrics.read().await.encode_metrics().unwrap();
        assert!(text.contains("routeros_devices_scraped 2"));
        assert!(text.contains("routeros_devices_unreachable 1"));
        assert!(text.contains(r#"routeros_cpu_load_percent{device_id="1""#));
        assert!(!text.contains(r#"routeros_cpu_load_percent{device_id="2""#));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_collects_until_shutdown() {
        let connector = FakeConnector::default();
        let state = state(connector.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = start_collection_loop(shutdown_rx, state.clone());
        // first tick fires immediately, the second after the interval
        tokio::time::sleep(Duration::from_secs(6)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(connector.attempts(), 4);
        let attempts_at_stop = connector.attempts();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(connector.attempts(), attempts_at_stop);
    }
}
