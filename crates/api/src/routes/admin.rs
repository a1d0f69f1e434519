use axum::{routing::post, Router};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/visits/reschedule",
            post(handlers::admin::reschedule_visit),
        )
        .route("/api/slots/:id/toggle", post(handlers::admin::toggle_slot))
        .route("/api/days/toggle", post(handlers::admin::toggle_day))
}
