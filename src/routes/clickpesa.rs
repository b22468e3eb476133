use axum::{routing::post, Router};

use crate::handlers::clickpesa_handlers;
use crate::state::AppState;

pub fn clickpesa_routes() -> Router<AppState> {
    Router::new()
        .route("/token", post(clickpesa_handlers::generate_token))
        .route("/payment/initiate", post(clickpesa_handlers::initiate_payment))
}
