use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::{info, warn};

use cafeteria_rs::{
    create_app, init_observability,
    models::RepositoryError,
    observability::{BusinessTracingMiddleware, DatabaseTracingMiddleware, Metrics},
    repositories::{
        PgCafeteriaRepository, PgOrderProductRepository, PgProductRepository, PgUserRepository,
    },
    services::{CafeteriaService, ProductService, UserService},
    shutdown_observability, ApiState, Config,
};

const POOL_METRICS_INTERVAL: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment()?;

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        &config.observability.otlp_endpoint,
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );

    let metrics = Arc::new(Metrics::new()?);

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.database_url)
        .await
        .context("Failed to connect to database")?;
    info!(
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(RepositoryError::from)?;
        info!("Database migrations applied");
    }

    spawn_pool_metrics(pool.clone(), metrics.clone());

    let db_tracer = Arc::new(DatabaseTracingMiddleware::new(metrics.clone()));
    let service_tracer = Arc::new(BusinessTracingMiddleware::new(metrics.clone()));

    let product_repository = Arc::new(PgProductRepository::new(pool.clone(), db_tracer.clone()));
    let cafeteria_repository =
        Arc::new(PgCafeteriaRepository::new(pool.clone(), db_tracer.clone()));
    let order_product_repository =
        Arc::new(PgOrderProductRepository::new(pool.clone(), db_tracer.clone()));
    let user_repository = Arc::new(PgUserRepository::new(pool.clone(), db_tracer));

    let api_state = ApiState {
        product_service: Arc::new(ProductService::new(
            product_repository,
            cafeteria_repository.clone(),
            order_product_repository,
            service_tracer.clone(),
        )),
        cafeteria_service: Arc::new(CafeteriaService::new(
            cafeteria_repository,
            service_tracer.clone(),
        )),
        user_service: Arc::new(UserService::new(user_repository, service_tracer)),
    };

    let app = create_app(metrics, api_state, config.server.request_timeout());

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .context("Invalid server host")?,
        config.server.port,
    );
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    shutdown_observability().await;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Publish pool occupancy on a fixed interval
fn spawn_pool_metrics(pool: PgPool, metrics: Arc<Metrics>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POOL_METRICS_INTERVAL);
        loop {
            interval.tick().await;
            if pool.is_closed() {
                break;
            }
            metrics.set_pool_connections(pool.size(), pool.num_idle());
        }
    });
}
