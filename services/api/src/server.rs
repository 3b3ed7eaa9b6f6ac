use crate::cli::ServeArgs;
use crate::infra::{shutdown_signal, AppState};
use crate::routes::with_platform_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use venue_market::config::AppConfig;
use venue_market::error::AppError;
use venue_market::store::postgres::{self, PgPool};
use venue_market::store::PgStore;
use venue_market::telemetry;
use venue_market::workflows::accounts::{seed_dev_users, AccountService};
use venue_market::workflows::host_applications::HostApplicationService;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let pool = open_pool(&config).await?;
    if args.migrate {
        postgres::migrate(&pool).await?;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(PgStore::new(pool.clone()));
    let host_applications = Arc::new(HostApplicationService::new(Arc::clone(&store)));
    let accounts = Arc::new(AccountService::new(store));

    let app = with_platform_routes(host_applications, accounts)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "venue market api ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(readiness_flag))
        .await?;

    pool.close().await;
    info!("database pool closed");
    Ok(())
}

pub(crate) async fn run_migrations() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let pool = open_pool(&config).await?;
    let outcome = postgres::migrate(&pool).await;
    pool.close().await;
    outcome?;
    Ok(())
}

pub(crate) async fn run_seed() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let store = PgStore::new(open_pool(&config).await?);
    let outcome = seed_dev_users(&store, config.environment).await;
    store.pool().close().await;

    for user in outcome? {
        println!("seeded {} ({})", user.email, user.role);
    }
    Ok(())
}

async fn open_pool(config: &AppConfig) -> Result<PgPool, AppError> {
    config.database.require_url()?;
    Ok(postgres::connect(&config.database).await?)
}
