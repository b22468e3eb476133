// handlers/webhook_handlers.rs
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{json, Value};
use tracing::error;

use crate::models::webhook::WebhookAck;
use crate::state::AppState;

// POST /webhook
pub async fn clickpesa_webhook(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> impl IntoResponse {
    // Always 200 so ClickPesa does not retry.
    let ack = match payload {
        Ok(Json(body)) => state.webhooks.handle(body).await,
        Err(rejection) => {
            error!("Webhook processing error: {}", rejection.body_text());
            WebhookAck::rejected("Webhook processing failed", Some(rejection.body_text()))
        }
    };

    (StatusCode::OK, Json(ack))
}

// GET /webhook
pub async fn webhook_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "active",
        "endpoint": "/webhook",
        "callbackUrl": state.config.callback_url(),
        "message": "ClickPesa webhook endpoint is active",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
