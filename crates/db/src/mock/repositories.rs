use chrono::{DateTime, Utc};
use mockall::mock;
use uuid::Uuid;

use crate::models::{DbPatient, DbService, DbSlot};
use crate::repositories::slot::{DayToggleOutcome, RescheduleOutcome};

// Mock repositories for testing
mock! {
    pub SlotRepo {
        pub async fn find_by_id(&self, id: Uuid) -> eyre::Result<Option<DbSlot>>;

        pub async fn find_by_range(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> eyre::Result<Vec<DbSlot>>;

        pub async fn book_slot(
            &self,
            id: Uuid,
            patient_id: Uuid,
            patient_first: String,
            patient_last: String,
            service_name: String,
            note: Option<String>,
        ) -> eyre::Result<Option<DbSlot>>;

        pub async fn clear_booking(
            &self,
            id: Uuid,
            expected_holder: Option<Uuid>,
        ) -> eyre::Result<Option<DbSlot>>;

        pub async fn toggle_unheld(
            &self,
            id: Uuid,
            expected_occupied: bool,
        ) -> eyre::Result<Option<DbSlot>>;

        pub async fn reschedule(
            &self,
            old_id: Uuid,
            new_id: Uuid,
        ) -> eyre::Result<RescheduleOutcome>;

        pub async fn toggle_day(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> eyre::Result<DayToggleOutcome>;

        pub async fn visits_by_patient(
            &self,
            patient_id: Uuid,
        ) -> eyre::Result<Vec<DbSlot>>;

        pub async fn booked_slots(&self) -> eyre::Result<Vec<DbSlot>>;
    }
}

mock! {
    pub ServiceRepo {
        pub async fn get_service_by_id(&self, id: Uuid) -> eyre::Result<Option<DbService>>;

        pub async fn list_services(&self) -> eyre::Result<Vec<DbService>>;
    }
}

mock! {
    pub PatientRepo {
        pub async fn get_patient_by_id(&self, id: Uuid) -> eyre::Result<Option<DbPatient>>;
    }
}
