use axum::{routing::get, Router};

use crate::handlers::webhook_handlers;
use crate::state::AppState;

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route(
        "/webhook",
        get(webhook_handlers::webhook_status).post(webhook_handlers::clickpesa_webhook),
    )
}
