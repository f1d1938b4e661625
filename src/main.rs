use {
    axum::extract::DefaultBodyLimit,
    sqlx::postgres::PgPoolOptions,
    std::{sync::Arc, time::Duration},
    till_sync::{
        AppState,
        adapters::gateway_http::HttpGatewayClient,
        config::AppConfig,
        infra::{log_notifier::LogNotifier, postgres::store::PgSettlementStore},
        services::settlement::SettlementContext,
    },
    tokio::signal,
    tower_http::timeout::TimeoutLayer,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env().expect("invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let gateway = HttpGatewayClient::new(&config.gateway_base_url, &config.gateway_secret_key)
        .expect("failed to build gateway client");

    let state = AppState {
        ctx: SettlementContext {
            store: Arc::new(PgSettlementStore::new(pool)),
            gateway: Arc::new(gateway),
            notifier: Arc::new(LogNotifier),
            config: config.settlement,
        },
        webhook: config.webhook,
    };

    // Webhook bodies are small; anything larger is not from the gateway.
    let app = till_sync::router(state)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind");
    tracing::info!("listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
