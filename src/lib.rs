pub mod adapters;
pub mod config;
pub mod domain;
pub mod infra;
pub mod services;

use {
    crate::{config::WebhookConfig, services::settlement::SettlementContext},
    axum::{
        Router,
        routing::{get, post},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub ctx: SettlementContext,
    pub webhook: WebhookConfig,
}

/// Route wiring, shared by `main` and the HTTP-level tests.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route(
            "/api/payments/webhook",
            post(adapters::webhook::webhook_handler).get(adapters::webhook::redirect_handler),
        )
        .route("/api/payments/verify", get(adapters::verify::verify_handler))
        .route(
            "/api/payments/initiate",
            post(adapters::sessions::initiate_handler),
        )
        .with_state(state)
}
