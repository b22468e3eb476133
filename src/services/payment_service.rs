// services/payment_service.rs
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::database::store::PaymentStore;
use crate::errors::{AppError, Result};
use crate::models::payment::{PaymentLog, PaymentRequest};
use crate::services::clickpesa_client::ClickPesaClient;
use crate::services::token_service::TokenProvider;

#[derive(Clone)]
pub struct PaymentInitiator {
    tokens: TokenProvider,
    client: ClickPesaClient,
    store: Arc<dyn PaymentStore>,
}

impl PaymentInitiator {
    pub fn new(tokens: TokenProvider, client: ClickPesaClient, store: Arc<dyn PaymentStore>) -> Self {
        PaymentInitiator {
            tokens,
            client,
            store,
        }
    }

    /// Sends a USSD push for an already validated request and relays
    /// ClickPesa's JSON body unchanged. Duplicate order references are not
    /// detected here; each call reaches the upstream.
    pub async fn initiate(&self, request: &PaymentRequest) -> Result<Value> {
        info!(
            "USSD push for {} - TZS {} ({})",
            request.phone_number, request.amount, request.order_reference
        );

        let token = self.tokens.get_token().await.map_err(|e| match e {
            AppError::UpstreamError { .. } => e,
            other => AppError::upstream(format!("Failed to get token: {}", other)),
        })?;

        let payload = request.to_ussd_push_payload();
        let response = self.client.initiate_ussd_push(&token, &payload).await.map_err(|e| {
            error!("USSD push failed for {}: {}", request.order_reference, e);
            e
        })?;

        info!("USSD push initiated: {}", request.order_reference);

        if let Err(e) = self
            .store
            .record_payment(PaymentLog::initiated(request, &response))
            .await
        {
            warn!("Could not record payment {}: {}", request.order_reference, e);
        }

        Ok(response)
    }
}
