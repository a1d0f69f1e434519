//! # Visit Handlers
//!
//! Booking, cancellation and visit listing. The occupancy change itself
//! always happens inside one conditional update in the slot store; these
//! handlers resolve the collaborator lookups (service catalog, patient
//! profile), enforce the caller-facing policies (ownership, the 72-hour
//! notice window, role gates) and translate store outcomes into the
//! error taxonomy.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use visita_core::{
    clinic,
    errors::ClinicError,
    models::slot::{
        BookVisitRequest, BookVisitResponse, CancelVisitResponse, Slot, SlotStatus, MAX_NOTE_LEN,
    },
};

use crate::{
    middleware::{auth, error_handling::AppError},
    ApiState,
};

/// Books a free slot for the authenticated patient.
///
/// The patient name and service name are snapshotted onto the slot at
/// this moment, so the visit record survives later profile or price-list
/// edits. A slot that is blocked or already booked answers with the same
/// conflict; the two cases are indistinguishable to the booking caller.
///
/// # Endpoint
///
/// ```text
/// POST /api/visits
/// ```
#[axum::debug_handler]
pub async fn book_visit(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(payload): Json<BookVisitRequest>,
) -> Result<Json<BookVisitResponse>, AppError> {
    let principal = auth::authenticate(&headers, &state.config.jwt_secret)?;
    if principal.is_staff() {
        return Err(AppError(ClinicError::Authorization(
            "Only patients can book a visit".to_string(),
        )));
    }

    if let Some(note) = &payload.note {
        if note.chars().count() > MAX_NOTE_LEN {
            return Err(AppError(ClinicError::Validation(format!(
                "Note exceeds the {} character limit",
                MAX_NOTE_LEN
            ))));
        }
    }

    // Resolve the snapshot sources before touching the slot
    let service =
        visita_db::repositories::service::get_service_by_id(&state.db_pool, payload.service_id)
            .await?
            .ok_or_else(|| {
                ClinicError::NotFound(format!("Service with ID {} not found", payload.service_id))
            })?;

    let patient = visita_db::repositories::patient::get_patient_by_id(&state.db_pool, principal.id)
        .await?
        .ok_or_else(|| {
            ClinicError::NotFound(format!("Patient profile {} not found", principal.id))
        })?;

    let booked = visita_db::repositories::slot::book_slot(
        &state.db_pool,
        payload.slot_id,
        principal.id,
        &patient.first_name,
        &patient.last_name,
        &service.name,
        payload.note.as_deref(),
    )
    .await?;

    match booked {
        Some(slot) => {
            tracing::info!("Patient {} booked slot {}", principal.id, slot.id);
            Ok(Json(BookVisitResponse { slot: slot.into() }))
        }
        // The conditional update did not land: either the slot does not
        // exist, or someone else holds it. Re-read to tell the two apart.
        None => {
            let current =
                visita_db::repositories::slot::find_by_id(&state.db_pool, payload.slot_id).await?;
            match current {
                Some(_) => Err(AppError(ClinicError::Conflict(
                    "This term is already taken".to_string(),
                ))),
                None => Err(AppError(ClinicError::NotFound(format!(
                    "Slot with ID {} not found",
                    payload.slot_id
                )))),
            }
        }
    }
}

/// Cancels a booked visit, reverting the slot to free.
///
/// Patients may only cancel their own visits and only with at least 72
/// hours of notice; staff may cancel any visit at any time.
///
/// # Endpoint
///
/// ```text
/// DELETE /api/visits/:slot_id
/// ```
#[axum::debug_handler]
pub async fn cancel_visit(
    State(state): State<Arc<ApiState>>,
    Path(slot_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<CancelVisitResponse>, AppError> {
    let principal = auth::authenticate(&headers, &state.config.jwt_secret)?;

    let slot: Slot = visita_db::repositories::slot::find_by_id(&state.db_pool, slot_id)
        .await?
        .ok_or_else(|| ClinicError::NotFound(format!("Slot with ID {} not found", slot_id)))?
        .into();

    if slot.status() != SlotStatus::Booked {
        return Err(AppError(ClinicError::Conflict(
            "No active booking on this slot".to_string(),
        )));
    }

    let expected_holder = if principal.is_staff() {
        // Administrative override: any holder, no notice requirement
        None
    } else {
        if slot.patient_id != Some(principal.id) {
            return Err(AppError(ClinicError::Authorization(
                "You can only cancel your own visit".to_string(),
            )));
        }
        if !clinic::patient_may_cancel(slot.start_time, Utc::now()) {
            return Err(AppError(ClinicError::Policy(format!(
                "Too late to cancel: visits require {} hours of notice",
                clinic::CANCEL_NOTICE_HOURS
            ))));
        }
        Some(principal.id)
    };

    // The store re-verifies occupancy and holder inside the update; a
    // booking that changed since the read above loses here, not silently.
    let cleared =
        visita_db::repositories::slot::clear_booking(&state.db_pool, slot_id, expected_holder)
            .await?;

    match cleared {
        Some(slot) => {
            tracing::info!("Booking cleared on slot {}", slot.id);
            Ok(Json(CancelVisitResponse {
                slot_id: slot.id,
                cancelled_at: Utc::now(),
            }))
        }
        None => Err(AppError(ClinicError::Conflict(
            "The booking changed underneath you; re-check and try again".to_string(),
        ))),
    }
}

/// Query parameters for the visit listing.
#[derive(Debug, Deserialize)]
pub struct ListVisitsQuery {
    /// `mine` (default) or `all`; `all` requires a staff role.
    pub scope: Option<String>,
}

/// Lists visits with full slot detail.
///
/// # Endpoint
///
/// ```text
/// GET /api/visits?scope=mine
/// GET /api/visits?scope=all   (staff only)
/// ```
#[axum::debug_handler]
pub async fn list_visits(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ListVisitsQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<Slot>>, AppError> {
    let principal = auth::authenticate(&headers, &state.config.jwt_secret)?;

    let slots = match query.scope.as_deref().unwrap_or("mine") {
        "mine" => {
            visita_db::repositories::slot::visits_by_patient(&state.db_pool, principal.id).await?
        }
        "all" => {
            auth::require_staff(&principal)?;
            visita_db::repositories::slot::booked_slots(&state.db_pool).await?
        }
        other => {
            return Err(AppError(ClinicError::Validation(format!(
                "Unknown scope '{}': expected 'mine' or 'all'",
                other
            ))));
        }
    };

    Ok(Json(slots.into_iter().map(Slot::from).collect()))
}
