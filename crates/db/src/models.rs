use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use visita_core::models::principal::Patient;
use visita_core::models::service::Service;
use visita_core::models::slot::Slot;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSlot {
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

impl From<DbSlot> for Slot {
    fn from(row: DbSlot) -> Self {
        Self {
            id: row.id,
            start_time: row.start_time,
            occupied: row.occupied,
            patient_id: row.patient_id,
            patient_first: row.patient_first,
            patient_last: row.patient_last,
            service_name: row.service_name,
            note: row.note,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbService {
    pub id: Uuid,
    pub name: String,
    pub price: i32,
    pub created_at: DateTime<Utc>,
}

impl From<DbService> for Service {
    fn from(row: DbService) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbPatient {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DbPatient> for Patient {
    fn from(row: DbPatient) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}
