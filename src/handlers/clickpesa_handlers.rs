// handlers/clickpesa_handlers.rs
use axum::extract::{rejection::JsonRejection, Json, State};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::errors::{AppError, Result};
use crate::models::payment::{InitiatePaymentBody, PaymentRequest};
use crate::state::AppState;

// POST /token
pub async fn generate_token(State(state): State<AppState>) -> Result<Json<Value>> {
    let token = state.tokens.get_token().await.map_err(|e| {
        error!("Token generation error: {}", e);
        e
    })?;

    Ok(Json(json!({ "token": token })))
}

// POST /payment/initiate
pub async fn initiate_payment(
    State(state): State<AppState>,
    payload: std::result::Result<Json<InitiatePaymentBody>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = payload.map_err(|e| AppError::invalid_data(e.body_text()))?;

    info!(
        "Payment request received: {:?} / {} / {}",
        body.amount, body.phone_number, body.order_reference
    );

    let request = PaymentRequest::try_from(body)?;
    let response = state.payments.initiate(&request).await?;

    Ok(Json(response))
}
