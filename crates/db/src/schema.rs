use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create patients table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS patients (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            first_name VARCHAR(255) NOT NULL,
            last_name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL UNIQUE,
            phone VARCHAR(32) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create services table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS services (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(255) NOT NULL UNIQUE,
            price INTEGER NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT positive_price CHECK (price >= 0)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create slots table. A slot is Free (occupied=false), Blocked
    // (occupied=true, patient_id null) or Booked (occupied=true,
    // patient_id set); the snapshot columns are only set while booked.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS slots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            start_time TIMESTAMP WITH TIME ZONE NOT NULL UNIQUE,
            occupied BOOLEAN NOT NULL DEFAULT FALSE,
            patient_id UUID NULL REFERENCES patients(id),
            patient_first VARCHAR(255) NULL,
            patient_last VARCHAR(255) NULL,
            service_name VARCHAR(255) NULL,
            note VARCHAR(500) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT holder_implies_occupied CHECK (patient_id IS NULL OR occupied)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_slots_start_time ON slots(start_time);",
        "CREATE INDEX IF NOT EXISTS idx_slots_patient_id ON slots(patient_id);",
        "CREATE INDEX IF NOT EXISTS idx_services_price ON services(price);",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
