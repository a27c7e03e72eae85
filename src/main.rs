use commerce_api::{
    AppState, PostgresRepository, TimedRepository,
    config::{AppConfig, Env, StoreBackend},
    create_router,
    models::{Coupon, Order, Role},
    repository::run_migrations,
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point: configuration, logging, the chosen store, and
/// the HTTP server. Any startup failure is logged and exits with status 1.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            // Logging is not up yet; this is the one place we print directly.
            eprintln!("FATAL: invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise fall back to sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "commerce_api=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON output for log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Store Initialization
    let (app_state, pool) = match build_state(config.clone()).await {
        Ok(built) => built,
        Err(err) => {
            tracing::error!(error = %err, "FATAL: store initialization failed");
            std::process::exit(1);
        }
    };

    // 5. Router and Server Startup
    let app = create_router(app_state);

    let listener = match TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, addr = %config.bind_addr, "FATAL: cannot bind listener");
            std::process::exit(1);
        }
    };

    tracing::info!("Listening on {}", config.bind_addr);
    tracing::info!(
        "API Documentation (Swagger UI) available at: http://{}/swagger-ui",
        config.bind_addr
    );

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "server terminated with an error");
    }

    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("database pool closed");
    }
}

/// build_state
///
/// Creates one repository per resource for the configured backend, each wrapped
/// in the per-call time budget. Returns the pool so it can be closed on shutdown.
async fn build_state(config: AppConfig) -> Result<(AppState, Option<PgPool>), sqlx::Error> {
    let budget = config.store_timeout;

    match (config.store_backend, config.db_url.clone()) {
        (StoreBackend::Postgres, Some(db_url)) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(&db_url)
                .await?;
            run_migrations(&pool).await?;
            tracing::info!("connected to Postgres, migrations applied");

            let state = AppState::new(
                TimedRepository::wrap(Arc::new(PostgresRepository::<Coupon>::new(pool.clone())), budget),
                TimedRepository::wrap(Arc::new(PostgresRepository::<Order>::new(pool.clone())), budget),
                TimedRepository::wrap(Arc::new(PostgresRepository::<Role>::new(pool.clone())), budget),
                config,
            );
            Ok((state, Some(pool)))
        }
        (StoreBackend::Postgres, None) => Err(sqlx::Error::Configuration(
            "DATABASE_URL must be set for the postgres backend".into(),
        )),
        (StoreBackend::Memory, _) => {
            tracing::warn!("using the in-memory store; data is lost on restart");
            Ok((AppState::in_memory(config), None))
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM so in-flight requests can finish.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
