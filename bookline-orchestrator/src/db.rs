use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create call_jobs table. Attempts and the notification outcome live in
    // JSONB columns so each state transition is a single-row atomic upsert.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS call_jobs (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL,
            restaurant_name VARCHAR(255) NOT NULL,
            reservation_time TEXT NOT NULL,
            party_size INTEGER NOT NULL,
            special_request TEXT NOT NULL DEFAULT '',
            notification_target VARCHAR(64) NOT NULL,
            target_number VARCHAR(32) NOT NULL,
            caller_number VARCHAR(32) NOT NULL,
            status VARCHAR(50) NOT NULL,
            voice_script TEXT NOT NULL,
            attempts JSONB NOT NULL DEFAULT '[]',
            retry_used INTEGER NOT NULL DEFAULT 0,
            max_retries INTEGER NOT NULL DEFAULT 1,
            decision_digit VARCHAR(8) NOT NULL DEFAULT '',
            reservation_decision VARCHAR(50) NOT NULL,
            confirmed_reservation_id UUID,
            confirmed_plan_id UUID,
            notification_outcome JSONB,
            last_error TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create notification group tables
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notify_groups (
            id UUID PRIMARY KEY,
            owner_id UUID NOT NULL,
            name VARCHAR(255) NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS group_members (
            id SERIAL PRIMARY KEY,
            group_id UUID NOT NULL REFERENCES notify_groups(id) ON DELETE CASCADE,
            user_id UUID,
            phone VARCHAR(32)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_phones (
            user_id UUID PRIMARY KEY,
            phone VARCHAR(32) NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create confirmation artifact tables
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reservations (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL,
            external_key VARCHAR(64) NOT NULL,
            restaurant_name VARCHAR(255) NOT NULL,
            starts_at TIMESTAMPTZ NOT NULL,
            ends_at TIMESTAMPTZ NOT NULL,
            party_size INTEGER NOT NULL,
            special_requests JSONB NOT NULL DEFAULT '[]',
            source VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plans (
            id UUID PRIMARY KEY,
            user_id UUID NOT NULL,
            job_id UUID NOT NULL,
            title VARCHAR(255) NOT NULL,
            events JSONB NOT NULL DEFAULT '[]',
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Best-effort bulk snapshots of aggregate job state
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_snapshots (
            id SERIAL PRIMARY KEY,
            taken_at TIMESTAMPTZ NOT NULL,
            payload JSONB NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better query performance
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_call_jobs_status ON call_jobs(status)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_call_jobs_user_id ON call_jobs(user_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_call_jobs_created_at ON call_jobs(created_at DESC)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_group_members_group_id ON group_members(group_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reservations_external_key ON reservations(external_key)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
