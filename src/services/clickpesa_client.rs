// services/clickpesa_client.rs
use std::time::Duration;

use reqwest::{header, Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::payment::UssdPushPayload;

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: Option<String>,
    pub success: Option<bool>,
}

/// HTTP access to the ClickPesa third-party API.
#[derive(Debug, Clone)]
pub struct ClickPesaClient {
    client: Client,
    token_url: String,
    ussd_push_url: String,
}

impl ClickPesaClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.clickpesa_timeout_secs))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        let (token_url, ussd_push_url) = config.get_clickpesa_urls();

        Ok(ClickPesaClient {
            client,
            token_url,
            ussd_push_url,
        })
    }

    pub async fn generate_token(&self, client_id: &str, api_key: &str) -> Result<String> {
        info!("Requesting new ClickPesa token");

        let response = self
            .client
            .post(&self.token_url)
            .header("client-id", client_id)
            .header("api-key", api_key)
            .send()
            .await?;

        let response = ensure_success(response, "Token generation failed").await?;

        let body: TokenResponse = response.json().await.map_err(|e| {
            AppError::upstream(format!("Malformed token response: {}", e))
        })?;

        match body.token.filter(|token| !token.is_empty()) {
            Some(token) => Ok(token),
            None => {
                error!("Token response without token (success: {:?})", body.success);
                Err(AppError::upstream("Malformed token response: missing token"))
            }
        }
    }

    pub async fn initiate_ussd_push(&self, token: &str, payload: &UssdPushPayload) -> Result<Value> {
        let response = self
            .client
            .post(&self.ussd_push_url)
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await?;

        let response = ensure_success(response, "Payment initiation failed").await?;

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::upstream(format!("Malformed payment response: {}", e)))
    }
}

/// Turns a non-2xx response into an upstream error carrying ClickPesa's body.
async fn ensure_success(response: Response, fallback: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<Value>(&text).ok();
    let message = body
        .as_ref()
        .and_then(|b| b.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string());

    error!("ClickPesa returned {}: {}", status, text);

    Err(AppError::upstream_response(
        message,
        status.as_u16(),
        body.or_else(|| (!text.is_empty()).then(|| Value::String(text))),
    ))
}
