//! Price list handler. Public read over the service catalog, cheapest
//! first, the way the clinic displays it.

use axum::{extract::State, Json};
use std::sync::Arc;
use visita_core::models::service::ServiceResponse;

use crate::{middleware::error_handling::AppError, ApiState};

/// # Endpoint
///
/// ```text
/// GET /api/services
/// ```
#[axum::debug_handler]
pub async fn list_services(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    let services = visita_db::repositories::service::list_services(&state.db_pool).await?;

    let response = services
        .into_iter()
        .map(|service| ServiceResponse {
            id: service.id,
            name: service.name,
            price: service.price,
        })
        .collect();

    Ok(Json(response))
}
