use carnaval_platform_access::AccessPolicy;
use carnaval_server::{
    app::router,
    auth::{AppState, GoTrueClient, PgProfileRepository},
    config::ServerConfig,
    vendor::PgApplicationRepository,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let provider =
        GoTrueClient::new(config.provider).expect("failed to create identity provider client");
    tracing::info!(provider_url = provider.config().url(), "Identity provider configured");

    let admin_emails = config.access.admin_emails();
    tracing::info!(
        admin_emails = admin_emails.len(),
        "Loaded administrator allow-list"
    );

    let app_state = Arc::new(AppState::new(
        Arc::new(provider),
        Arc::new(PgProfileRepository::new(db_pool.clone())),
        Arc::new(PgApplicationRepository::new(db_pool)),
        AccessPolicy::new(admin_emails),
        config.session,
    ));
    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_address);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
