pub mod clickpesa_client;
pub mod outbox;
pub mod payment_service;
pub mod token_service;
pub mod webhook_service;
