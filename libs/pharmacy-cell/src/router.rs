// libs/pharmacy-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use shared_store::AppState;

use crate::handlers;

pub fn order_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handlers::create_order).get(handlers::list_orders))
        .route(
            "/{order_id}",
            get(handlers::get_order).put(handlers::update_order_metadata),
        )
        .route("/{order_id}/items", put(handlers::update_order_items))
        .with_state(state)
}

pub fn medication_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/",
            post(handlers::create_medication).get(handlers::list_medications),
        )
        .route("/{medication_id}", get(handlers::get_medication))
        .route("/{medication_id}/batches", post(handlers::add_batch))
        .with_state(state)
}
