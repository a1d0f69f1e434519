use crate::models::DbPatient;
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn get_patient_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbPatient>> {
    let patient = sqlx::query_as::<_, DbPatient>(
        r#"
        SELECT id, first_name, last_name, email, phone, created_at
        FROM patients
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(patient)
}

pub async fn create_patient(
    pool: &Pool<Postgres>,
    first_name: &str,
    last_name: &str,
    email: &str,
    phone: Option<&str>,
) -> Result<DbPatient> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let patient = sqlx::query_as::<_, DbPatient>(
        r#"
        INSERT INTO patients (id, first_name, last_name, email, phone, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, first_name, last_name, email, phone, created_at
        "#,
    )
    .bind(id)
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(phone)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(patient)
}
