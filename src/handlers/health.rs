use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::errors::Result;
use crate::state::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

// GET /diagnostics
pub async fn diagnostics(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    let missing = config.missing_variables();

    let mut body = json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": {
            "hasClickPesaClientId": config.clickpesa_client_id.is_some(),
            "hasClickPesaApiKey": config.clickpesa_api_key.is_some(),
            "hasDatabaseUrl": config.database_url.is_some(),
            "store": state.store.backend(),
        },
        "status": "healthy",
    });

    if !missing.is_empty() {
        body["status"] = json!("missing_config");
        body["missingVariables"] = json!(missing);
    }

    Json(body)
}

// GET /diagnostics/store
pub async fn store_check(State(state): State<AppState>) -> Result<Json<Value>> {
    state.store.ping().await?;

    Ok(Json(json!({
        "status": "connected",
        "store": state.store.backend(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
