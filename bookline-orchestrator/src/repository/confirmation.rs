//! Confirmation artifact repository
//!
//! Reservation and plan writes upsert on their job-derived primary keys, so
//! a re-delivered decision callback rewrites the same rows instead of
//! inserting duplicates.

use bookline_core::domain::reservation::{Plan, Reservation};
use sqlx::PgPool;

use crate::store::StoreError;

/// Insert or replace a reservation keyed by its job-derived id
pub async fn upsert_reservation(pool: &PgPool, reservation: &Reservation) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO reservations (
            id, user_id, external_key, restaurant_name, starts_at, ends_at,
            party_size, special_requests, source, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO UPDATE SET
            restaurant_name = EXCLUDED.restaurant_name,
            starts_at = EXCLUDED.starts_at,
            ends_at = EXCLUDED.ends_at,
            party_size = EXCLUDED.party_size,
            special_requests = EXCLUDED.special_requests
        "#,
    )
    .bind(reservation.id)
    .bind(reservation.user_id)
    .bind(&reservation.external_key)
    .bind(&reservation.restaurant_name)
    .bind(reservation.starts_at)
    .bind(reservation.ends_at)
    .bind(reservation.party_size as i32)
    .bind(serde_json::to_value(&reservation.special_requests)?)
    .bind(&reservation.source)
    .bind(reservation.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert or replace a plan keyed by its job-derived id
pub async fn upsert_plan(pool: &PgPool, plan: &Plan) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO plans (id, user_id, job_id, title, events, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE SET
            title = EXCLUDED.title,
            events = EXCLUDED.events
        "#,
    )
    .bind(plan.id)
    .bind(plan.user_id)
    .bind(plan.job_id)
    .bind(&plan.title)
    .bind(serde_json::to_value(&plan.events)?)
    .bind(plan.created_at)
    .execute(pool)
    .await?;

    Ok(())
}
