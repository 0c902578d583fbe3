use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use pharmacy_cell::{medication_routes, order_routes};
use scheduling_cell::{appointment_routes, schedule_routes};
use shared_store::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic Ops API is running!" }))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/schedule", schedule_routes(state.clone()))
        .nest("/pharmacy-orders", order_routes(state.clone()))
        .nest("/medications", medication_routes(state.clone()))
}
