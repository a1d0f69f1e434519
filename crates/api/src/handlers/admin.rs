//! # Staff Handlers
//!
//! The employee surface: moving a booking to a new term and opening or
//! closing slots for booking. Every operation here is gated on the staff
//! role; the occupancy mutations themselves run inside the slot store's
//! transactional primitives.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use visita_core::{
    clinic,
    errors::ClinicError,
    models::slot::{
        RescheduleRequest, RescheduleResponse, ToggleDayRequest, ToggleDayResponse,
        ToggleSlotResponse,
    },
};
use visita_db::repositories::slot::{DayToggleOutcome, RescheduleOutcome};

use crate::{
    middleware::{auth, error_handling::AppError},
    ApiState,
};

/// Moves a booking from one slot to another atomically.
///
/// Both slots change inside a single store transaction: the old slot is
/// vacated and the new one takes over the full booking snapshot, or
/// neither happens. A patient racing the staff member to the new slot
/// wins cleanly; the reschedule then reports a conflict and the old
/// booking stays put.
///
/// # Endpoint
///
/// ```text
/// POST /api/visits/reschedule
/// ```
#[axum::debug_handler]
pub async fn reschedule_visit(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(payload): Json<RescheduleRequest>,
) -> Result<Json<RescheduleResponse>, AppError> {
    let principal = auth::authenticate(&headers, &state.config.jwt_secret)?;
    auth::require_staff(&principal)?;

    if payload.old_slot_id == payload.new_slot_id {
        return Err(AppError(ClinicError::Validation(
            "The new slot must differ from the old one".to_string(),
        )));
    }

    let outcome = visita_db::repositories::slot::reschedule(
        &state.db_pool,
        payload.old_slot_id,
        payload.new_slot_id,
    )
    .await?;

    match outcome {
        RescheduleOutcome::Moved { old, new } => {
            tracing::info!("Booking moved from slot {} to slot {}", old.id, new.id);
            Ok(Json(RescheduleResponse {
                old_slot_id: old.id,
                new_slot_id: new.id,
                moved_at: Utc::now(),
            }))
        }
        RescheduleOutcome::OldMissing => Err(AppError(ClinicError::NotFound(format!(
            "Slot with ID {} not found",
            payload.old_slot_id
        )))),
        RescheduleOutcome::NewMissing => Err(AppError(ClinicError::NotFound(format!(
            "Slot with ID {} not found",
            payload.new_slot_id
        )))),
        RescheduleOutcome::OldNotBooked => Err(AppError(ClinicError::Conflict(
            "No active booking on the source slot".to_string(),
        ))),
        RescheduleOutcome::NewTaken => Err(AppError(ClinicError::Conflict(
            "The new term is already taken".to_string(),
        ))),
    }
}

/// Flips a single slot between free and blocked.
///
/// A slot holding an active patient booking cannot be blocked; the visit
/// has to be cancelled first.
///
/// # Endpoint
///
/// ```text
/// POST /api/slots/:id/toggle
/// ```
#[axum::debug_handler]
pub async fn toggle_slot(
    State(state): State<Arc<ApiState>>,
    Path(slot_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ToggleSlotResponse>, AppError> {
    let principal = auth::authenticate(&headers, &state.config.jwt_secret)?;
    auth::require_staff(&principal)?;

    let slot = visita_db::repositories::slot::find_by_id(&state.db_pool, slot_id)
        .await?
        .ok_or_else(|| ClinicError::NotFound(format!("Slot with ID {} not found", slot_id)))?;

    if slot.occupied && slot.patient_id.is_some() {
        return Err(AppError(ClinicError::Policy(
            "Cannot block a slot with an active patient booking; cancel the visit first"
                .to_string(),
        )));
    }

    // The flip only lands if the slot still matches the occupancy read
    // above; two staff double-toggling resolve to exactly one flip.
    let toggled =
        visita_db::repositories::slot::toggle_unheld(&state.db_pool, slot_id, slot.occupied)
            .await?;

    match toggled {
        Some(slot) => Ok(Json(ToggleSlotResponse {
            slot_id: slot.id,
            occupied: slot.occupied,
        })),
        None => Err(AppError(ClinicError::Conflict(
            "Slot state changed underneath you; re-check and try again".to_string(),
        ))),
    }
}

/// Blocks or unblocks a whole clinic-local calendar day.
///
/// Refused while any slot of the day holds an active patient booking.
/// The direction comes from the first slot of the day: free means the
/// day gets blocked, blocked means it gets reopened.
///
/// # Endpoint
///
/// ```text
/// POST /api/days/toggle
/// ```
#[axum::debug_handler]
pub async fn toggle_day(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(payload): Json<ToggleDayRequest>,
) -> Result<Json<ToggleDayResponse>, AppError> {
    let principal = auth::authenticate(&headers, &state.config.jwt_secret)?;
    auth::require_staff(&principal)?;

    let (start, end) = clinic::day_bounds(payload.date, state.config.clinic_utc_offset);

    let outcome = visita_db::repositories::slot::toggle_day(&state.db_pool, start, end).await?;

    match outcome {
        DayToggleOutcome::Toggled { blocked, affected } => {
            tracing::info!(
                "Day {} {} ({} slots)",
                payload.date,
                if blocked { "blocked" } else { "unblocked" },
                affected
            );
            Ok(Json(ToggleDayResponse {
                date: payload.date,
                blocked,
                slots_affected: affected,
            }))
        }
        DayToggleOutcome::NoSlots => Err(AppError(ClinicError::NotFound(format!(
            "No slots on {}",
            payload.date
        )))),
        DayToggleOutcome::ActivePatients => Err(AppError(ClinicError::Policy(
            "Patients are booked on this day; cancel their visits individually first".to_string(),
        ))),
    }
}
