// services/token_service.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::services::clickpesa_client::ClickPesaClient;

#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(value: String, ttl: Duration) -> Self {
        Credential {
            value,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Holds at most one credential. Owned by whoever builds the provider, so
/// tests and separate service instances never share it by accident.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: RwLock<Option<Credential>>,
    refresh: Mutex<()>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Credential> {
        self.slot.read().await.clone()
    }

    async fn usable(&self, now: DateTime<Utc>) -> Option<String> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|credential| credential.is_usable_at(now))
            .map(|credential| credential.value.clone())
    }

    pub async fn store(&self, credential: Credential) {
        *self.slot.write().await = Some(credential);
    }

    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}

#[derive(Debug, Clone)]
pub struct TokenProvider {
    config: Arc<AppConfig>,
    client: ClickPesaClient,
    cache: Arc<TokenCache>,
    ttl: Duration,
}

impl TokenProvider {
    pub fn new(config: Arc<AppConfig>, client: ClickPesaClient, cache: Arc<TokenCache>) -> Self {
        let ttl = Duration::minutes(config.token_ttl_minutes);
        TokenProvider {
            config,
            client,
            cache,
            ttl,
        }
    }

    pub fn cache(&self) -> &Arc<TokenCache> {
        &self.cache
    }

    /// Returns a usable bearer token, fetching one only on a cache miss.
    ///
    /// Misses are single-flight: the refresh lock is held across the fetch
    /// and the cache is checked again once it is acquired, so callers racing
    /// on an expired credential share one upstream request. A failed fetch is
    /// not retried.
    pub async fn get_token(&self) -> Result<String> {
        let (client_id, api_key) = self.config.clickpesa_credentials()?;

        if let Some(token) = self.cache.usable(Utc::now()).await {
            debug!("Using cached ClickPesa token");
            return Ok(token);
        }

        let _refresh = self.cache.refresh.lock().await;

        if let Some(token) = self.cache.usable(Utc::now()).await {
            debug!("Token refreshed by a concurrent request");
            return Ok(token);
        }

        let token = self.client.generate_token(client_id, api_key).await?;
        let credential = Credential::new(token.clone(), self.ttl);

        info!("ClickPesa token obtained, valid until {}", credential.expires_at.to_rfc3339());
        self.cache.store(credential).await;

        Ok(token)
    }
}
