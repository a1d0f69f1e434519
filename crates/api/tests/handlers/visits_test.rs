use chrono::Utc;
use mockall::predicate;
use pretty_assertions::assert_eq;
use uuid::Uuid;
use visita_core::{
    clinic,
    errors::ClinicError,
    models::{
        principal::{Principal, Role},
        slot::{Slot, SlotStatus, MAX_NOTE_LEN},
    },
};

use crate::test_utils::{self, TestContext};

fn patient_principal() -> Principal {
    Principal {
        id: Uuid::new_v4(),
        role: Role::Patient,
    }
}

fn staff_principal() -> Principal {
    Principal {
        id: Uuid::new_v4(),
        role: Role::Staff,
    }
}

// Wrapper mirroring the booking handler's decision logic, with the real
// repository calls replaced by mocks.
async fn book_visit_wrapper(
    ctx: &mut TestContext,
    slot_id: Uuid,
    principal: Principal,
    service_id: Uuid,
    note: Option<String>,
) -> Result<Slot, ClinicError> {
    if principal.is_staff() {
        return Err(ClinicError::Authorization(
            "Only patients can book a visit".to_string(),
        ));
    }

    if let Some(note) = &note {
        if note.chars().count() > MAX_NOTE_LEN {
            return Err(ClinicError::Validation(format!(
                "Note exceeds the {} character limit",
                MAX_NOTE_LEN
            )));
        }
    }

    let service = ctx
        .service_repo
        .get_service_by_id(service_id)
        .await?
        .ok_or_else(|| ClinicError::NotFound(format!("Service with ID {} not found", service_id)))?;

    let patient = ctx
        .patient_repo
        .get_patient_by_id(principal.id)
        .await?
        .ok_or_else(|| ClinicError::NotFound(format!("Patient profile {} not found", principal.id)))?;

    let booked = ctx
        .slot_repo
        .book_slot(
            slot_id,
            principal.id,
            patient.first_name.clone(),
            patient.last_name.clone(),
            service.name.clone(),
            note,
        )
        .await?;

    match booked {
        Some(slot) => Ok(slot.into()),
        None => match ctx.slot_repo.find_by_id(slot_id).await? {
            Some(_) => Err(ClinicError::Conflict("This term is already taken".to_string())),
            None => Err(ClinicError::NotFound(format!(
                "Slot with ID {} not found",
                slot_id
            ))),
        },
    }
}

// Wrapper mirroring the cancellation handler's decision logic.
async fn cancel_visit_wrapper(
    ctx: &mut TestContext,
    slot_id: Uuid,
    principal: Principal,
) -> Result<Uuid, ClinicError> {
    let slot: Slot = ctx
        .slot_repo
        .find_by_id(slot_id)
        .await?
        .ok_or_else(|| ClinicError::NotFound(format!("Slot with ID {} not found", slot_id)))?
        .into();

    if slot.status() != SlotStatus::Booked {
        return Err(ClinicError::Conflict(
            "No active booking on this slot".to_string(),
        ));
    }

    let expected_holder = if principal.is_staff() {
        None
    } else {
        if slot.patient_id != Some(principal.id) {
            return Err(ClinicError::Authorization(
                "You can only cancel your own visit".to_string(),
            ));
        }
        if !clinic::patient_may_cancel(slot.start_time, Utc::now()) {
            return Err(ClinicError::Policy(
                "Too late to cancel: visits require 72 hours of notice".to_string(),
            ));
        }
        Some(principal.id)
    };

    match ctx.slot_repo.clear_booking(slot_id, expected_holder).await? {
        Some(cleared) => Ok(cleared.id),
        None => Err(ClinicError::Conflict(
            "The booking changed underneath you; re-check and try again".to_string(),
        )),
    }
}

#[tokio::test]
async fn test_book_free_slot_succeeds() {
    let mut ctx = TestContext::new();
    let principal = patient_principal();
    let service_id = Uuid::new_v4();
    let slot = test_utils::free_slot(test_utils::far_future());
    let slot_id = slot.id;

    ctx.service_repo
        .expect_get_service_by_id()
        .with(predicate::eq(service_id))
        .returning(move |id| Ok(Some(test_utils::test_service(id))));
    ctx.patient_repo
        .expect_get_patient_by_id()
        .with(predicate::eq(principal.id))
        .returning(|id| Ok(Some(test_utils::test_patient(id))));
    ctx.slot_repo.expect_book_slot().returning(
        move |_, patient_id, first, last, service, note| {
            let mut booked = slot.clone();
            booked.occupied = true;
            booked.patient_id = Some(patient_id);
            booked.patient_first = Some(first);
            booked.patient_last = Some(last);
            booked.service_name = Some(service);
            booked.note = note;
            Ok(Some(booked))
        },
    );

    let result = book_visit_wrapper(&mut ctx, slot_id, principal, service_id, None)
        .await
        .expect("booking should succeed");

    assert_eq!(result.status(), SlotStatus::Booked);
    assert_eq!(result.patient_id, Some(principal.id));
    assert_eq!(result.patient_first.as_deref(), Some("Jan"));
    assert_eq!(result.service_name.as_deref(), Some("Initial consultation"));
}

#[tokio::test]
async fn test_book_occupied_slot_conflicts() {
    let mut ctx = TestContext::new();
    let principal = patient_principal();
    let service_id = Uuid::new_v4();
    let slot = test_utils::blocked_slot(test_utils::far_future());
    let slot_id = slot.id;

    ctx.service_repo
        .expect_get_service_by_id()
        .returning(move |id| Ok(Some(test_utils::test_service(id))));
    ctx.patient_repo
        .expect_get_patient_by_id()
        .returning(|id| Ok(Some(test_utils::test_patient(id))));
    // The conditional update refuses an occupied slot
    ctx.slot_repo
        .expect_book_slot()
        .returning(|_, _, _, _, _, _| Ok(None));
    ctx.slot_repo
        .expect_find_by_id()
        .with(predicate::eq(slot_id))
        .returning(move |_| Ok(Some(slot.clone())));

    let result = book_visit_wrapper(&mut ctx, slot_id, principal, service_id, None).await;

    assert!(matches!(result, Err(ClinicError::Conflict(_))));
}

#[tokio::test]
async fn test_book_missing_slot_is_not_found() {
    let mut ctx = TestContext::new();
    let principal = patient_principal();
    let service_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4();

    ctx.service_repo
        .expect_get_service_by_id()
        .returning(move |id| Ok(Some(test_utils::test_service(id))));
    ctx.patient_repo
        .expect_get_patient_by_id()
        .returning(|id| Ok(Some(test_utils::test_patient(id))));
    ctx.slot_repo
        .expect_book_slot()
        .returning(|_, _, _, _, _, _| Ok(None));
    ctx.slot_repo.expect_find_by_id().returning(|_| Ok(None));

    let result = book_visit_wrapper(&mut ctx, slot_id, principal, service_id, None).await;

    assert!(matches!(result, Err(ClinicError::NotFound(_))));
}

#[tokio::test]
async fn test_book_unknown_service_is_not_found() {
    let mut ctx = TestContext::new();
    let principal = patient_principal();

    ctx.service_repo
        .expect_get_service_by_id()
        .returning(|_| Ok(None));

    let result =
        book_visit_wrapper(&mut ctx, Uuid::new_v4(), principal, Uuid::new_v4(), None).await;

    assert!(matches!(result, Err(ClinicError::NotFound(_))));
}

#[tokio::test]
async fn test_book_requires_patient_role() {
    let mut ctx = TestContext::new();

    // No expectations set: the role gate must fire before any repository call
    let result =
        book_visit_wrapper(&mut ctx, Uuid::new_v4(), staff_principal(), Uuid::new_v4(), None)
            .await;

    assert!(matches!(result, Err(ClinicError::Authorization(_))));
}

#[tokio::test]
async fn test_book_rejects_oversized_note() {
    let mut ctx = TestContext::new();
    let note = "x".repeat(MAX_NOTE_LEN + 1);

    let result = book_visit_wrapper(
        &mut ctx,
        Uuid::new_v4(),
        patient_principal(),
        Uuid::new_v4(),
        Some(note),
    )
    .await;

    assert!(matches!(result, Err(ClinicError::Validation(_))));
}

#[tokio::test]
async fn test_cancel_outside_window_succeeds() {
    let mut ctx = TestContext::new();
    let principal = patient_principal();
    let slot = test_utils::booked_slot(test_utils::far_future(), principal.id);
    let slot_id = slot.id;

    let find_slot = slot.clone();
    ctx.slot_repo
        .expect_find_by_id()
        .returning(move |_| Ok(Some(find_slot.clone())));
    ctx.slot_repo
        .expect_clear_booking()
        .withf(move |id, holder| *id == slot_id && *holder == Some(slot.patient_id.unwrap()))
        .returning(|id, _| {
            let mut cleared = test_utils::free_slot(test_utils::far_future());
            cleared.id = id;
            Ok(Some(cleared))
        });

    let cancelled = cancel_visit_wrapper(&mut ctx, slot_id, principal)
        .await
        .expect("cancellation should succeed");

    assert_eq!(cancelled, slot_id);
}

#[tokio::test]
async fn test_cancel_inside_window_is_policy_violation() {
    let mut ctx = TestContext::new();
    let principal = patient_principal();
    let slot = test_utils::booked_slot(test_utils::near_future(), principal.id);
    let slot_id = slot.id;

    // clear_booking must not be reached; only the read is expected
    ctx.slot_repo
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));

    let result = cancel_visit_wrapper(&mut ctx, slot_id, principal).await;

    assert!(matches!(result, Err(ClinicError::Policy(_))));
}

#[tokio::test]
async fn test_cancel_requires_ownership() {
    let mut ctx = TestContext::new();
    let principal = patient_principal();
    let other_patient = Uuid::new_v4();
    let slot = test_utils::booked_slot(test_utils::far_future(), other_patient);

    let slot_id = slot.id;
    ctx.slot_repo
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));

    let result = cancel_visit_wrapper(&mut ctx, slot_id, principal).await;

    assert!(matches!(result, Err(ClinicError::Authorization(_))));
}

#[tokio::test]
async fn test_staff_cancel_ignores_window_and_ownership() {
    let mut ctx = TestContext::new();
    let holder = Uuid::new_v4();
    // Inside the 72-hour window, held by someone else entirely
    let slot = test_utils::booked_slot(test_utils::near_future(), holder);
    let slot_id = slot.id;

    ctx.slot_repo
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));
    ctx.slot_repo
        .expect_clear_booking()
        .withf(move |id, holder| *id == slot_id && holder.is_none())
        .returning(|id, _| {
            let mut cleared = test_utils::free_slot(test_utils::near_future());
            cleared.id = id;
            Ok(Some(cleared))
        });

    let cancelled = cancel_visit_wrapper(&mut ctx, slot_id, staff_principal())
        .await
        .expect("staff cancellation should succeed");

    assert_eq!(cancelled, slot_id);
}

#[tokio::test]
async fn test_cancel_free_slot_conflicts() {
    let mut ctx = TestContext::new();
    let slot = test_utils::free_slot(test_utils::far_future());
    let slot_id = slot.id;

    ctx.slot_repo
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));

    let result = cancel_visit_wrapper(&mut ctx, slot_id, patient_principal()).await;

    assert!(matches!(result, Err(ClinicError::Conflict(_))));
}

#[tokio::test]
async fn test_cancel_lost_race_is_conflict() {
    let mut ctx = TestContext::new();
    let principal = patient_principal();
    let slot = test_utils::booked_slot(test_utils::far_future(), principal.id);
    let slot_id = slot.id;

    ctx.slot_repo
        .expect_find_by_id()
        .returning(move |_| Ok(Some(slot.clone())));
    // The store-side re-verification fails: holder changed between the
    // read and the conditional update
    ctx.slot_repo
        .expect_clear_booking()
        .returning(|_, _| Ok(None));

    let result = cancel_visit_wrapper(&mut ctx, slot_id, principal).await;

    assert!(matches!(result, Err(ClinicError::Conflict(_))));
}
