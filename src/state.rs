use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::store::PaymentStore;
use crate::errors::Result;
use crate::services::clickpesa_client::ClickPesaClient;
use crate::services::outbox::PersistOutbox;
use crate::services::payment_service::PaymentInitiator;
use crate::services::token_service::{TokenCache, TokenProvider};
use crate::services::webhook_service::WebhookIngestor;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn PaymentStore>,
    pub tokens: TokenProvider,
    pub payments: PaymentInitiator,
    pub webhooks: WebhookIngestor,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn PaymentStore>) -> Result<Self> {
        let config = Arc::new(config);
        let client = ClickPesaClient::new(&config)?;

        let tokens = TokenProvider::new(config.clone(), client.clone(), Arc::new(TokenCache::new()));
        let payments = PaymentInitiator::new(tokens.clone(), client, store.clone());
        let webhooks = WebhookIngestor::new(
            store.clone(),
            PersistOutbox::new(config.outbox_max_attempts, config.outbox_capacity),
        );

        Ok(AppState {
            config,
            store,
            tokens,
            payments,
            webhooks,
        })
    }
}
