//! Sewa marketplace HTTP server.

use sewa_core::SystemClock;
use sewa_server::api::build_router;
use sewa_server::config::Config;
use sewa_server::jpj::{JpjService, SmsJpjGateway};
use sewa_server::notify::LogNotifier;
use sewa_server::payment_gateway::MockPaymentGateway;
use sewa_server::reaper::Reaper;
use sewa_server::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional; real deployments set the environment directly.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sewa_server=info,sewa_postgres=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting sewa server");

    let config = Config::from_env();
    info!(
        database_url = %config.database.url,
        sweep_interval_secs = config.reaper.sweep_interval.as_secs(),
        pending_timeout_mins = config.reaper.pending_timeout.num_minutes(),
        "configuration loaded"
    );

    // Metrics exporter first, so startup itself is observable.
    let metrics_addr: SocketAddr =
        format!("{}:{}", config.metrics.host, config.metrics.port).parse()?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()?;
    sewa_server::metrics::register();
    info!(address = %metrics_addr, "metrics exporter listening");

    // Database.
    let pool = sewa_postgres::connect(&config.database).await?;
    sewa_postgres::run_migrations(&pool).await?;
    info!("database connected");

    // Shared dependencies behind their seams.
    let clock = Arc::new(SystemClock);
    let notifier = Arc::new(LogNotifier);
    let gateway = Arc::new(MockPaymentGateway);
    let jpj = Arc::new(JpjService::new(
        Arc::new(SmsJpjGateway::new(&config.jpj)?),
        config.jpj.cache_ttl,
        clock.clone(),
    ));

    let state = AppState::new(
        &config,
        pool,
        clock.clone(),
        gateway,
        notifier.clone(),
        jpj,
    );

    // Expired-booking reaper.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper = Reaper::new(
        state.stores.bookings.clone(),
        clock,
        notifier,
        config.reaper.clone(),
    );
    let reaper_handle = reaper.spawn(shutdown_rx);
    info!("reaper started");

    // HTTP server.
    let app = build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the reaper and let an in-flight sweep finish.
    let _ = shutdown_tx.send(true);
    let _ = reaper_handle.await;

    info!("server stopped");
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => tracing::error!(%error, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
