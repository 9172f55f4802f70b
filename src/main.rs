use std::net::SocketAddr;
use std::sync::Arc;

use routeros_fleet::{
    AppState, Config, Result, RouterOsConnector, StaticDirectory, SystemProber, TracingAuditSink,
    create_router, start_collection_loop,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Загружаем .env файл
    dotenvy::dotenv().ok();

    // Инициализация логирования
    setup_tracing();

    let config = Config::from_env();

    // Логируем информацию о конфигурации
    tracing::info!(
        "Loaded configuration for {} device(s)",
        config.devices.len()
    );
    for device in &config.devices {
        tracing::info!(
            "  - Device {} '{}' at {}",
            device.id,
            device.name,
            device.api_endpoint()
        );
    }

    let addr: SocketAddr = config.server_addr.parse().map_err(|e| {
        tracing::error!("Invalid server address: {}", e);
        e
    })?;

    // Создаём состояние приложения
    let directory = Arc::new(StaticDirectory::new(config.devices.clone()));
    let state = Arc::new(AppState::new(
        config,
        directory,
        Arc::new(TracingAuditSink),
        RouterOsConnector,
        SystemProber,
    ));

    // Канал завершения (graceful shutdown)
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Ожидание Ctrl+C
    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    // Запускаем периодический сбор метрик в фоне
    let collector = start_collection_loop(shutdown_rx.clone(), state.clone());

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind address: {}", e);
        e
    })?;

    tracing::info!("RouterOS fleet service starting on {}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET  /health                 - Health check");
    tracing::info!("  - GET  /metrics                - OpenMetrics exposition");
    tracing::info!("  - GET  /targets                - Prometheus HTTP SD targets");
    tracing::info!("  - GET  /status                 - Fleet sweep");
    tracing::info!("  - GET  /devices/{{id}}/test      - Connectivity report");
    tracing::info!("  - GET  /devices/{{id}}/resources - System resources");
    tracing::info!("  - POST /devices/{{id}}/execute   - Apply template");
    tracing::info!("  - POST /devices/{{id}}/scripts   - Run script");

    // Запуск сервера с graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.clone().changed().await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            e
        })?;

    let _ = collector.await;
    Ok(())
}

fn setup_tracing() {
    // Если RUST_LOG не установлена, используем "info" по умолчанию
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
