//! Confirmation notification fan-out
//!
//! Resolves the job's notification target to a concrete recipient list at
//! send time (never cached) and delivers one message per recipient. A
//! failure for one recipient never stops delivery to the others; everything
//! is aggregated into a `NotificationOutcome` recorded on the job.

use std::collections::HashSet;

use bookline_core::domain::group::GroupMember;
use bookline_core::domain::job::{CallJob, NotificationTarget};
use bookline_core::domain::notification::{NotificationOutcome, NotificationState};

use crate::context::AppState;

/// Sends the confirmation message to the job's resolved audience.
///
/// Never fails; delivery problems surface only through the returned outcome.
pub async fn fan_out(state: &AppState, job: &CallJob) -> NotificationOutcome {
    if !state.config.notifications_enabled {
        tracing::info!("Notifications disabled; skipping fan-out for job {}", job.id);
        return NotificationOutcome::skipped(
            NotificationState::Paused,
            "notifications are disabled",
        );
    }

    let (recipients, mut errors) = resolve_recipients(state, job).await;

    if recipients.is_empty() {
        tracing::warn!("No reachable recipients for job {}: {:?}", job.id, errors);
        return NotificationOutcome::from_sends(0, 0, 0, errors);
    }

    let message = confirmation_message(job);
    let from = state.config.caller_number.clone().unwrap_or_default();

    let mut sent = 0u32;
    let mut failed = 0u32;
    for to in &recipients {
        match state.transport.send(to, &from, &message).await {
            Ok(reference) => {
                sent += 1;
                tracing::debug!("Confirmation sent to {} ({})", to, reference);
            }
            Err(e) => {
                failed += 1;
                tracing::warn!("Confirmation send to {} failed: {}", to, e);
                errors.push(format!("send to {to} failed: {e}"));
            }
        }
    }

    NotificationOutcome::from_sends(sent, failed, recipients.len() as u32, errors)
}

/// Resolves the audience for one fan-out execution.
///
/// Precedence: configured demo override, then the creator-only sentinel,
/// then group members (deduplicated, owner phone as a last resort).
async fn resolve_recipients(state: &AppState, job: &CallJob) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();

    if let Some(override_to) = &state.config.demo_notify_override {
        return (vec![override_to.clone()], errors);
    }

    match job.notification_target {
        NotificationTarget::CreatorOnly => match owner_phone(state, job).await {
            Some(phone) => (vec![phone], errors),
            None => {
                errors.push("job owner has no valid phone number on file".to_string());
                (Vec::new(), errors)
            }
        },
        NotificationTarget::Group(group_id) => {
            let group = match state.directory.group_by_id(group_id).await {
                Ok(group) => group,
                Err(e) => {
                    errors.push(format!("failed to load notification group: {e}"));
                    return (Vec::new(), errors);
                }
            };
            let Some(group) = group else {
                errors.push(format!("notification group {group_id} no longer exists"));
                return (Vec::new(), errors);
            };

            let mut seen = HashSet::new();
            let mut recipients = Vec::new();
            for member in &group.members {
                if let Some(phone) = member_phone(state, member).await {
                    if is_valid_phone(&phone) && seen.insert(phone.clone()) {
                        recipients.push(phone);
                    }
                }
            }

            if recipients.is_empty() {
                // Last resort: the owner's own number.
                match owner_phone(state, job).await {
                    Some(phone) => recipients.push(phone),
                    None => errors.push(format!(
                        "no reachable recipients in group \"{}\" and the owner has no valid phone number",
                        group.name
                    )),
                }
            }

            (recipients, errors)
        }
    }
}

/// A member's phone: the linked account's current number wins over the
/// stored raw phone.
async fn member_phone(state: &AppState, member: &GroupMember) -> Option<String> {
    if let Some(user_id) = member.user_id {
        if let Ok(Some(phone)) = state.directory.user_phone(user_id).await {
            if is_valid_phone(&phone) {
                return Some(phone);
            }
        }
    }
    member.phone.clone()
}

async fn owner_phone(state: &AppState, job: &CallJob) -> Option<String> {
    match state.directory.user_phone(job.user_id).await {
        Ok(Some(phone)) if is_valid_phone(&phone) => Some(phone),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Failed to look up owner phone for job {}: {}", job.id, e);
            None
        }
    }
}

/// E.164-shaped check: leading '+', then 8 to 15 digits.
fn is_valid_phone(phone: &str) -> bool {
    let Some(rest) = phone.trim().strip_prefix('+') else {
        return false;
    };
    (8..=15).contains(&rest.len()) && rest.chars().all(|c| c.is_ascii_digit())
}

fn confirmation_message(job: &CallJob) -> String {
    format!(
        "Reservation confirmed at {} for a party of {} on {}. Booked by automated call.",
        job.restaurant_name, job.party_size, job.reservation_time
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{TestHarness, group_with_members, sample_job};
    use uuid::Uuid;

    const OWNER_PHONE: &str = "+15551230000";

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("+15551230000"));
        assert!(is_valid_phone(" +442071838750 "));
        assert!(!is_valid_phone("15551230000"));
        assert!(!is_valid_phone("+555-123"));
        assert!(!is_valid_phone("+123"));
        assert!(!is_valid_phone(""));
    }

    #[tokio::test]
    async fn test_disabled_notifications_pause_fan_out() {
        let mut h = TestHarness::new();
        h.config_mut().notifications_enabled = false;
        let h = h.build();

        let job = sample_job(NotificationTarget::CreatorOnly);
        let outcome = fan_out(&h.state, &job).await;

        assert_eq!(outcome.state, NotificationState::Paused);
        assert_eq!(outcome.recipients, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(h.transport.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_creator_only_sends_to_owner() {
        let h = TestHarness::new().build();
        let job = sample_job(NotificationTarget::CreatorOnly);
        h.store.set_user_phone(job.user_id, OWNER_PHONE).await;

        let outcome = fan_out(&h.state, &job).await;

        assert_eq!(outcome.state, NotificationState::Sent);
        assert_eq!((outcome.sent, outcome.failed, outcome.recipients), (1, 0, 1));
        assert!(outcome.errors.is_empty());

        let sent = h.transport.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, OWNER_PHONE);
        assert!(sent[0].1.contains("Reservation confirmed"));
    }

    #[tokio::test]
    async fn test_creator_only_without_valid_phone_reports_error() {
        let h = TestHarness::new().build();
        let job = sample_job(NotificationTarget::CreatorOnly);
        h.store.set_user_phone(job.user_id, "not-a-number").await;

        let outcome = fan_out(&h.state, &job).await;

        assert_eq!((outcome.sent, outcome.failed, outcome.recipients), (0, 0, 0));
        assert_eq!(outcome.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_demo_override_wins_over_targeting() {
        let mut h = TestHarness::new();
        h.config_mut().demo_notify_override = Some("+15550009999".to_string());
        let h = h.build();

        let group_id = Uuid::new_v4();
        let job = sample_job(NotificationTarget::Group(group_id));

        let outcome = fan_out(&h.state, &job).await;

        assert_eq!((outcome.sent, outcome.recipients), (1, 1));
        let sent = h.transport.sent().await;
        assert_eq!(sent[0].0, "+15550009999");
    }

    #[tokio::test]
    async fn test_group_members_deduplicated_and_validated() {
        let h = TestHarness::new().build();
        let job = sample_job(NotificationTarget::Group(Uuid::new_v4()));

        let linked_user = Uuid::new_v4();
        h.store.set_user_phone(linked_user, "+15550001111").await;

        let group = group_with_members(
            match job.notification_target {
                NotificationTarget::Group(id) => id,
                _ => unreachable!(),
            },
            job.user_id,
            vec![
                // Linked account: current phone wins over the stale raw one.
                GroupMember {
                    user_id: Some(linked_user),
                    phone: Some("+15559998888".to_string()),
                },
                // Duplicate of the linked account's current phone.
                GroupMember {
                    user_id: None,
                    phone: Some("+15550001111".to_string()),
                },
                // Invalid raw phone is skipped.
                GroupMember {
                    user_id: None,
                    phone: Some("call me maybe".to_string()),
                },
                GroupMember {
                    user_id: None,
                    phone: Some("+15550002222".to_string()),
                },
            ],
        );
        h.store.insert_group(group).await;

        let outcome = fan_out(&h.state, &job).await;

        assert_eq!((outcome.sent, outcome.failed, outcome.recipients), (2, 0, 2));
        let numbers: Vec<String> = h.transport.sent().await.into_iter().map(|(to, _)| to).collect();
        assert_eq!(numbers, vec!["+15550001111", "+15550002222"]);
    }

    #[tokio::test]
    async fn test_empty_group_falls_back_to_owner() {
        let h = TestHarness::new().build();
        let group_id = Uuid::new_v4();
        let job = sample_job(NotificationTarget::Group(group_id));
        h.store.set_user_phone(job.user_id, OWNER_PHONE).await;
        h.store
            .insert_group(group_with_members(group_id, job.user_id, vec![]))
            .await;

        let outcome = fan_out(&h.state, &job).await;

        assert_eq!((outcome.sent, outcome.recipients), (1, 1));
        assert_eq!(h.transport.sent().await[0].0, OWNER_PHONE);
    }

    #[tokio::test]
    async fn test_unreachable_group_and_owner_reports_zero_recipients() {
        let h = TestHarness::new().build();
        let group_id = Uuid::new_v4();
        let job = sample_job(NotificationTarget::Group(group_id));
        // Owner has no phone on file at all.
        h.store.insert_group(group_with_members(
            group_id,
            job.user_id,
            vec![GroupMember {
                user_id: None,
                phone: Some("invalid".to_string()),
            }],
        ))
        .await;

        let outcome = fan_out(&h.state, &job).await;

        assert_eq!((outcome.sent, outcome.failed, outcome.recipients), (0, 0, 0));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.state, NotificationState::Sent);
    }

    #[tokio::test]
    async fn test_missing_group_reports_error() {
        let h = TestHarness::new().build();
        let job = sample_job(NotificationTarget::Group(Uuid::new_v4()));

        let outcome = fan_out(&h.state, &job).await;

        assert_eq!(outcome.recipients, 0);
        assert!(outcome.errors[0].contains("no longer exists"));
    }

    #[tokio::test]
    async fn test_one_failed_send_does_not_stop_the_rest() {
        let h = TestHarness::new().build();
        let group_id = Uuid::new_v4();
        let job = sample_job(NotificationTarget::Group(group_id));
        h.store.insert_group(group_with_members(
            group_id,
            job.user_id,
            vec![
                GroupMember {
                    user_id: None,
                    phone: Some("+15550001111".to_string()),
                },
                GroupMember {
                    user_id: None,
                    phone: Some("+15550002222".to_string()),
                },
            ],
        ))
        .await;
        h.transport.fail_number("+15550001111").await;

        let outcome = fan_out(&h.state, &job).await;

        assert_eq!(outcome.state, NotificationState::Partial);
        assert_eq!((outcome.sent, outcome.failed, outcome.recipients), (1, 1, 2));
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("+15550001111"));
    }
}
