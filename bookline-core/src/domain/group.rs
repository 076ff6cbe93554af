//! Notification group domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named audience the job owner can fan confirmations out to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyGroup {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub members: Vec<GroupMember>,
}

/// One group member
///
/// A member may be a linked user account, a raw phone number, or both.
/// At fan-out time the linked account's current phone wins over the stored
/// raw phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub user_id: Option<Uuid>,
    pub phone: Option<String>,
}
