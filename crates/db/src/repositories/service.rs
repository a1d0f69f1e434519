use crate::models::DbService;
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn get_service_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbService>> {
    let service = sqlx::query_as::<_, DbService>(
        r#"
        SELECT id, name, price, created_at
        FROM services
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(service)
}

pub async fn list_services(pool: &Pool<Postgres>) -> Result<Vec<DbService>> {
    let services = sqlx::query_as::<_, DbService>(
        r#"
        SELECT id, name, price, created_at
        FROM services
        ORDER BY price ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(services)
}

/// Insert catalog entries, skipping names that already exist. Used by the
/// migration binary to seed the price list.
pub async fn seed_services(pool: &Pool<Postgres>, entries: &[(&str, i32)]) -> Result<u64> {
    let mut inserted = 0;

    for (name, price) in entries {
        let result = sqlx::query(
            r#"
            INSERT INTO services (id, name, price, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(price)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        inserted += result.rows_affected();
    }

    Ok(inserted)
}
