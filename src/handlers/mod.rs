pub mod clickpesa_handlers;
pub mod health;
pub mod webhook_handlers;
