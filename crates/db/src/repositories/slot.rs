//! Slot store.
//!
//! All occupancy changes go through the conditional UPDATEs in this
//! module: the WHERE clause re-verifies the expected prior state, so a
//! read-decide-write race loses cleanly instead of clobbering a
//! concurrent booking. `None` from a mutation means the slot was no
//! longer in the expected state when the write landed.

use crate::models::DbSlot;
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

const SLOT_COLUMNS: &str =
    "id, start_time, occupied, patient_id, patient_first, patient_last, service_name, note, created_at";

/// Outcome of the two-slot reschedule transaction.
#[derive(Debug, Clone)]
pub enum RescheduleOutcome {
    Moved { old: DbSlot, new: DbSlot },
    OldMissing,
    OldNotBooked,
    NewMissing,
    NewTaken,
}

/// Outcome of a whole-day availability toggle.
#[derive(Debug, Clone, Copy)]
pub enum DayToggleOutcome {
    NoSlots,
    ActivePatients,
    Toggled { blocked: bool, affected: u64 },
}

pub async fn create_slot(pool: &Pool<Postgres>, start_time: DateTime<Utc>) -> Result<DbSlot> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let slot = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        INSERT INTO slots (id, start_time, occupied, created_at)
        VALUES ($1, $2, FALSE, $3)
        RETURNING {SLOT_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(start_time)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(slot)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM slots
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

pub async fn find_by_range(
    pool: &Pool<Postgres>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<DbSlot>> {
    let slots = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM slots
        WHERE start_time >= $1 AND start_time <= $2
        ORDER BY start_time ASC
        "#,
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

/// Book a free slot for a patient, attaching the booking snapshot.
///
/// Returns `None` when the slot is missing or no longer free; under
/// concurrent callers exactly one booking wins the row.
pub async fn book_slot(
    pool: &Pool<Postgres>,
    id: Uuid,
    patient_id: Uuid,
    patient_first: &str,
    patient_last: &str,
    service_name: &str,
    note: Option<&str>,
) -> Result<Option<DbSlot>> {
    tracing::debug!("Booking slot {} for patient {}", id, patient_id);

    let slot = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        UPDATE slots
        SET occupied = TRUE,
            patient_id = $2,
            patient_first = $3,
            patient_last = $4,
            service_name = $5,
            note = $6
        WHERE id = $1 AND occupied = FALSE
        RETURNING {SLOT_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(patient_id)
    .bind(patient_first)
    .bind(patient_last)
    .bind(service_name)
    .bind(note)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

/// Revert a booked slot to free, clearing the booking snapshot.
///
/// When `expected_holder` is set the update only lands if that patient
/// still holds the slot; `None` (the staff path) clears any holder.
/// Returns `None` when the slot is not currently booked as expected.
pub async fn clear_booking(
    pool: &Pool<Postgres>,
    id: Uuid,
    expected_holder: Option<Uuid>,
) -> Result<Option<DbSlot>> {
    tracing::debug!("Clearing booking on slot {}", id);

    let slot = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        UPDATE slots
        SET occupied = FALSE,
            patient_id = NULL,
            patient_first = NULL,
            patient_last = NULL,
            service_name = NULL,
            note = NULL
        WHERE id = $1
          AND occupied = TRUE
          AND patient_id IS NOT NULL
          AND ($2::uuid IS NULL OR patient_id = $2)
        RETURNING {SLOT_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(expected_holder)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

/// Flip a slot between free and blocked.
///
/// `expected_occupied` is the occupancy the caller observed; the update
/// only lands if the slot still has that occupancy and no holder, so two
/// staff racing a double-toggle cannot silently flip back and forth.
pub async fn toggle_unheld(
    pool: &Pool<Postgres>,
    id: Uuid,
    expected_occupied: bool,
) -> Result<Option<DbSlot>> {
    let slot = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        UPDATE slots
        SET occupied = NOT occupied
        WHERE id = $1 AND occupied = $2 AND patient_id IS NULL
        RETURNING {SLOT_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(expected_occupied)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

/// Move a booking from one slot to another in a single transaction.
///
/// Both rows are locked `FOR UPDATE` in ascending id order so two
/// reschedules over overlapping slot pairs cannot deadlock. Either both
/// mutations commit or neither does; a new slot raced away by a direct
/// booking surfaces as `NewTaken` with the old booking untouched.
pub async fn reschedule(
    pool: &Pool<Postgres>,
    old_id: Uuid,
    new_id: Uuid,
) -> Result<RescheduleOutcome> {
    tracing::debug!("Rescheduling booking from slot {} to slot {}", old_id, new_id);

    let mut tx = pool.begin().await?;

    let (first, second) = if old_id < new_id {
        (old_id, new_id)
    } else {
        (new_id, old_id)
    };

    let lock_query = format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM slots
        WHERE id = $1
        FOR UPDATE
        "#,
    );

    let first_row = sqlx::query_as::<_, DbSlot>(&lock_query)
        .bind(first)
        .fetch_optional(&mut *tx)
        .await?;
    let second_row = sqlx::query_as::<_, DbSlot>(&lock_query)
        .bind(second)
        .fetch_optional(&mut *tx)
        .await?;

    let (old_row, new_row) = if old_id < new_id {
        (first_row, second_row)
    } else {
        (second_row, first_row)
    };

    let Some(old) = old_row else {
        return Ok(RescheduleOutcome::OldMissing);
    };
    let Some(new) = new_row else {
        return Ok(RescheduleOutcome::NewMissing);
    };

    if !old.occupied || old.patient_id.is_none() {
        return Ok(RescheduleOutcome::OldNotBooked);
    }
    if new.occupied {
        return Ok(RescheduleOutcome::NewTaken);
    }

    let moved = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        UPDATE slots
        SET occupied = TRUE,
            patient_id = $2,
            patient_first = $3,
            patient_last = $4,
            service_name = $5,
            note = $6
        WHERE id = $1
        RETURNING {SLOT_COLUMNS}
        "#,
    ))
    .bind(new.id)
    .bind(old.patient_id)
    .bind(old.patient_first.as_deref())
    .bind(old.patient_last.as_deref())
    .bind(old.service_name.as_deref())
    .bind(old.note.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    let vacated = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        UPDATE slots
        SET occupied = FALSE,
            patient_id = NULL,
            patient_first = NULL,
            patient_last = NULL,
            service_name = NULL,
            note = NULL
        WHERE id = $1
        RETURNING {SLOT_COLUMNS}
        "#,
    ))
    .bind(old.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(RescheduleOutcome::Moved {
        old: vacated,
        new: moved,
    })
}

/// Toggle every unheld slot of a day between free and blocked.
///
/// The direction comes from the chronologically first slot of the day.
/// The bulk update is best-effort rather than one atomic transaction,
/// but its `patient_id IS NULL` clause re-checks the active-patient
/// guard per row at write time, so a booking that races in is never
/// overwritten.
pub async fn toggle_day(
    pool: &Pool<Postgres>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<DayToggleOutcome> {
    let first = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM slots
        WHERE start_time >= $1 AND start_time <= $2
        ORDER BY start_time ASC
        LIMIT 1
        "#,
    ))
    .bind(start)
    .bind(end)
    .fetch_optional(pool)
    .await?;

    let Some(first) = first else {
        return Ok(DayToggleOutcome::NoSlots);
    };

    let has_active_patients = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM slots
            WHERE start_time >= $1 AND start_time <= $2
              AND occupied = TRUE AND patient_id IS NOT NULL
        )
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    if has_active_patients {
        return Ok(DayToggleOutcome::ActivePatients);
    }

    let blocked = !first.occupied;

    let result = sqlx::query(
        r#"
        UPDATE slots
        SET occupied = $3
        WHERE start_time >= $1 AND start_time <= $2
          AND patient_id IS NULL
        "#,
    )
    .bind(start)
    .bind(end)
    .bind(blocked)
    .execute(pool)
    .await?;

    Ok(DayToggleOutcome::Toggled {
        blocked,
        affected: result.rows_affected(),
    })
}

pub async fn visits_by_patient(pool: &Pool<Postgres>, patient_id: Uuid) -> Result<Vec<DbSlot>> {
    let slots = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM slots
        WHERE patient_id = $1 AND occupied = TRUE
        ORDER BY start_time ASC
        "#,
    ))
    .bind(patient_id)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

pub async fn booked_slots(pool: &Pool<Postgres>) -> Result<Vec<DbSlot>> {
    let slots = sqlx::query_as::<_, DbSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM slots
        WHERE occupied = TRUE AND patient_id IS NOT NULL
        ORDER BY start_time ASC
        "#,
    ))
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

pub async fn latest_start(pool: &Pool<Postgres>) -> Result<Option<DateTime<Utc>>> {
    let latest = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        r#"
        SELECT MAX(start_time) FROM slots
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(latest)
}

/// Bulk-insert free slots at the given starts, skipping instants that
/// already carry a slot.
pub async fn insert_free_slots(pool: &Pool<Postgres>, starts: &[DateTime<Utc>]) -> Result<u64> {
    if starts.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"
        INSERT INTO slots (start_time)
        SELECT * FROM UNNEST($1::timestamptz[])
        ON CONFLICT (start_time) DO NOTHING
        "#,
    )
    .bind(starts)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Delete unoccupied, holderless slots older than `cutoff`. Slots still
/// carrying a booking or an administrative block are retained.
pub async fn prune_unbooked_before(pool: &Pool<Postgres>, cutoff: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM slots
        WHERE start_time < $1
          AND occupied = FALSE
          AND patient_id IS NULL
        "#,
    )
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
