//! Confirmation artifact writer
//!
//! On a confirmed decision, synthesizes the reservation record and the
//! display plan derived from it. Artifact ids are derived from the job id,
//! so a re-delivered decision callback rewrites the same rows.

use bookline_core::domain::job::CallJob;
use bookline_core::domain::reservation::{
    Plan, PlanEvent, Reservation, plan_id_for_job, reservation_id_for_job,
};
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::context::AppState;
use crate::store::StoreError;

/// Length of the reserved table window.
const RESERVATION_WINDOW_MINUTES: i64 = 90;

/// Writes the reservation and plan for a confirmed job.
///
/// Returns the artifact ids for the state machine to record on the job.
pub async fn write_confirmation(
    state: &AppState,
    job: &CallJob,
) -> Result<(Uuid, Uuid), StoreError> {
    let reservation_id = reservation_id_for_job(job.id);
    let plan_id = plan_id_for_job(job.id);

    let now = Utc::now();
    let starts_at = parse_reservation_start(&job.reservation_time, now);
    let ends_at = starts_at + chrono::Duration::minutes(RESERVATION_WINDOW_MINUTES);

    let special_requests = if job.special_request.trim().is_empty() {
        Vec::new()
    } else {
        vec![job.special_request.clone()]
    };

    let reservation = Reservation {
        id: reservation_id,
        user_id: job.user_id,
        external_key: job.id.to_string(),
        restaurant_name: job.restaurant_name.clone(),
        starts_at,
        ends_at,
        party_size: job.party_size,
        special_requests,
        source: "Confirmed by phone call".to_string(),
        created_at: now,
    };

    let plan = Plan {
        id: plan_id,
        user_id: job.user_id,
        job_id: job.id,
        title: format!("Reservation at {}", job.restaurant_name),
        events: vec![PlanEvent {
            title: format!("Table for {} at {}", job.party_size, job.restaurant_name),
            starts_at,
            ends_at,
            reservation_id,
        }],
        created_at: now,
    };

    state.confirmations.write_reservation(&reservation).await?;
    state.confirmations.write_plan(&plan).await?;

    tracing::info!(
        "Confirmation artifacts written for job {}: reservation {}, plan {}",
        job.id,
        reservation_id,
        plan_id
    );

    Ok((reservation_id, plan_id))
}

/// Best-effort parse of the free-text reservation time.
///
/// Strategies in order: RFC 3339, then `%Y-%m-%d %H:%M`, then a loose
/// `H[:MM][am|pm]` token scan applied to the current date, else now.
/// Wall-clock values are interpreted as UTC.
pub fn parse_reservation_start(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.with_timezone(&Utc);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M") {
        return naive.and_utc();
    }

    if let Some(time) = scan_loose_time(trimmed) {
        return now.date_naive().and_time(time).and_utc();
    }

    now
}

/// Finds the first token (or adjacent token pair) that reads as a clock time.
fn scan_loose_time(raw: &str) -> Option<NaiveTime> {
    const FORMATS: [&str; 5] = ["%I:%M %p", "%I:%M%p", "%I %p", "%I%p", "%H:%M"];

    let lowered = raw.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();

    let mut candidates: Vec<String> = vec![lowered.trim().to_string()];
    candidates.extend(tokens.windows(2).map(|pair| pair.join(" ")));
    candidates.extend(tokens.iter().map(|t| {
        t.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != ':')
            .to_string()
    }));

    for candidate in &candidates {
        for format in FORMATS {
            if let Ok(time) = NaiveTime::parse_from_str(candidate, format) {
                return Some(time);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{TestHarness, sample_job};
    use bookline_core::domain::job::NotificationTarget;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_rfc3339() {
        let parsed = parse_reservation_start("2025-06-20T19:30:00Z", fixed_now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 20, 19, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_date_time() {
        let parsed = parse_reservation_start("2025-06-20 19:30", fixed_now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 20, 19, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_loose_time_applies_current_date() {
        let now = fixed_now();

        let parsed = parse_reservation_start("7:30pm", now);
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 14, 19, 30, 0).unwrap());

        let parsed = parse_reservation_start("Friday at 7pm", now);
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 14, 19, 0, 0).unwrap());

        let parsed = parse_reservation_start("around 18:45, please", now);
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 6, 14, 18, 45, 0).unwrap());
    }

    #[test]
    fn test_unparseable_time_falls_back_to_now() {
        let now = fixed_now();
        assert_eq!(parse_reservation_start("whenever works", now), now);
        assert_eq!(parse_reservation_start("", now), now);
    }

    #[tokio::test]
    async fn test_write_confirmation_creates_both_artifacts() {
        let h = TestHarness::new().build();
        let mut job = sample_job(NotificationTarget::CreatorOnly);
        job.special_request = "quiet corner".to_string();

        let (reservation_id, plan_id) = write_confirmation(&h.state, &job).await.unwrap();

        let reservations = h.store.reservations().await;
        assert_eq!(reservations.len(), 1);
        let reservation = &reservations[0];
        assert_eq!(reservation.id, reservation_id);
        assert_eq!(reservation.external_key, job.id.to_string());
        assert_eq!(reservation.special_requests, vec!["quiet corner".to_string()]);
        assert_eq!(
            reservation.ends_at - reservation.starts_at,
            chrono::Duration::minutes(90)
        );

        let plans = h.store.plans().await;
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, plan_id);
        assert_eq!(plans[0].job_id, job.id);
        assert_eq!(plans[0].events.len(), 1);
        assert_eq!(plans[0].events[0].reservation_id, reservation_id);
    }

    #[tokio::test]
    async fn test_write_confirmation_is_idempotent_per_job() {
        let h = TestHarness::new().build();
        let job = sample_job(NotificationTarget::CreatorOnly);

        let first = write_confirmation(&h.state, &job).await.unwrap();
        let second = write_confirmation(&h.state, &job).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(h.store.reservations().await.len(), 1);
        assert_eq!(h.store.plans().await.len(), 1);
    }
}
