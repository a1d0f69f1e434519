use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/visits", post(handlers::visits::book_visit))
        .route("/api/visits", get(handlers::visits::list_visits))
        .route("/api/visits/:slot_id", delete(handlers::visits::cancel_visit))
}
