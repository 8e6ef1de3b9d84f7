//! Delivery process entry point.

use std::sync::Arc;

use application::{LoggingNotificationProducer, RandomGeoResolver};
use service::config::Config;
use service::error::Result;
use service::telemetry;
use sqlx::postgres::PgPoolOptions;
use store::PostgresUnitOfWork;
use tokio::signal;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (.env is optional)
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    // 2. Initialize tracing and the Prometheus recorder
    telemetry::init_tracing(&config);
    let metrics_handle = telemetry::install_metrics_recorder()?;

    // 3. Connect to PostgreSQL and apply migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    tracing::info!("connected to database");

    let uow = PostgresUnitOfWork::new(pool);
    if config.run_migrations {
        uow.run_migrations().await?;
        tracing::info!("migrations applied");
    }

    // 4. Wire use-cases and start the periodic jobs
    let components = service::wire(
        Arc::new(uow),
        Arc::new(RandomGeoResolver::new()),
        Arc::new(LoggingNotificationProducer::default()),
    );
    let scheduler = service::start_jobs(&config, &components);

    // 5. Serve health and metrics until shutdown
    let app = service::create_app(metrics_handle);
    let addr = config.addr();
    tracing::info!(%addr, log_format = %config.log_format, "starting delivery service");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    tracing::info!("delivery service shut down gracefully");

    Ok(())
}
