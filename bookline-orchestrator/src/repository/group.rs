//! Notification group repository
//!
//! Read-side lookups for audience resolution: groups with their members and
//! the current phone number of linked user accounts.

use bookline_core::domain::group::{GroupMember, NotifyGroup};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::StoreError;

/// Find a group and its members by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<NotifyGroup>, StoreError> {
    let group = sqlx::query_as::<_, GroupRow>(
        r#"
        SELECT id, owner_id, name
        FROM notify_groups
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(group) = group else {
        return Ok(None);
    };

    let members = sqlx::query_as::<_, MemberRow>(
        r#"
        SELECT user_id, phone
        FROM group_members
        WHERE group_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(NotifyGroup {
        id: group.id,
        owner_id: group.owner_id,
        name: group.name,
        members: members
            .into_iter()
            .map(|m| GroupMember {
                user_id: m.user_id,
                phone: m.phone,
            })
            .collect(),
    }))
}

/// Current phone number for a user account
pub async fn user_phone(pool: &PgPool, user_id: Uuid) -> Result<Option<String>, StoreError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT phone FROM user_phones WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|(phone,)| phone))
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    user_id: Option<Uuid>,
    phone: Option<String>,
}
