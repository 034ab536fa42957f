use axum::routing::get;
use axum::Router;

use crate::handlers::webhook;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(webhook::verify_webhook).post(webhook::receive_webhook),
    )
}
