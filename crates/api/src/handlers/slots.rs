//! # Slot Calendar Handlers
//!
//! Public read path over the slot store. The calendar view is available
//! without authentication, so it returns occupancy summaries only; a
//! blocked slot and a booked one look the same from here and no patient
//! identity ever leaves this endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use visita_core::{clinic, errors::ClinicError, models::slot::SlotSummary};

use crate::{middleware::error_handling::AppError, ApiState};

/// Query parameters for the calendar listing: an inclusive range of
/// clinic-local calendar days.
#[derive(Debug, Deserialize)]
pub struct ListSlotsQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Lists every slot whose start falls inside the requested days, ordered
/// chronologically.
///
/// # Endpoint
///
/// ```text
/// GET /api/slots?start=2026-08-10&end=2026-08-14
/// ```
#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListSlotsQuery>,
) -> Result<Json<Vec<SlotSummary>>, AppError> {
    if query.end < query.start {
        return Err(AppError(ClinicError::Validation(
            "end date must not precede start date".to_string(),
        )));
    }

    let offset = state.config.clinic_utc_offset;
    let (range_start, _) = clinic::day_bounds(query.start, offset);
    let (_, range_end) = clinic::day_bounds(query.end, offset);

    let slots = visita_db::repositories::slot::find_by_range(&state.db_pool, range_start, range_end)
        .await?;

    let summaries = slots
        .into_iter()
        .map(|slot| SlotSummary {
            id: slot.id,
            start_time: slot.start_time,
            occupied: slot.occupied,
        })
        .collect();

    Ok(Json(summaries))
}
