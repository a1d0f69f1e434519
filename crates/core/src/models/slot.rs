use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on the free-text note a patient may attach to a booking.
pub const MAX_NOTE_LEN: usize = 500;

/// Occupancy state of a slot.
///
/// A slot is always in exactly one of these states:
/// - `Free`: open for booking, no holder
/// - `Blocked`: administratively withheld, no holder
/// - `Booked`: held by a patient, snapshot fields populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Free,
    Blocked,
    Booked,
}

/// A single bookable unit of clinic time.
///
/// `start_time` is immutable once the slot exists; rescheduling moves the
/// booking between slots, never the slot itself. The `patient_first`,
/// `patient_last` and `service_name` fields are snapshots taken at booking
/// time so a visit record stays accurate even if the profile or the price
/// list changes later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub occupied: bool,
    pub patient_id: Option<Uuid>,
    pub patient_first: Option<String>,
    pub patient_last: Option<String>,
    pub service_name: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Slot {
    pub fn status(&self) -> SlotStatus {
        match (self.occupied, self.patient_id.is_some()) {
            (false, _) => SlotStatus::Free,
            (true, false) => SlotStatus::Blocked,
            (true, true) => SlotStatus::Booked,
        }
    }
}

/// Public calendar view of a slot. Holder identity and snapshot fields are
/// withheld so unauthenticated browsing never sees who booked what.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSummary {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub occupied: bool,
}

impl From<&Slot> for SlotSummary {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id,
            start_time: slot.start_time,
            occupied: slot.occupied,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookVisitRequest {
    pub slot_id: Uuid,
    pub service_id: Uuid,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookVisitResponse {
    pub slot: Slot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelVisitResponse {
    pub slot_id: Uuid,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub old_slot_id: Uuid,
    pub new_slot_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleResponse {
    pub old_slot_id: Uuid,
    pub new_slot_id: Uuid,
    pub moved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleSlotResponse {
    pub slot_id: Uuid,
    /// Occupancy after the flip: true means the slot is now blocked.
    pub occupied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleDayRequest {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleDayResponse {
    pub date: NaiveDate,
    /// Direction the day was toggled: true means the day is now blocked.
    pub blocked: bool,
    pub slots_affected: u64,
}
