// libs/schedule-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/{doctor_id}", post(handlers::create_schedule))
        .route("/{doctor_id}", get(handlers::list_upcoming_schedules))
        .route("/{doctor_id}/{date}", get(handlers::get_schedule_day))
        .route("/{doctor_id}/{date}", delete(handlers::delete_schedule_day))
        .with_state(state)
}
