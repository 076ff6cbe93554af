//! Voice script generation
//!
//! Wraps the configured script generator with a bounded retry and a
//! deterministic template fallback. Script generation can never fail a job;
//! the worst case is a templated prompt.

use tokio::time::Duration;

use crate::clients::{ScriptContext, ScriptGenerator};

/// Total generation attempts before falling back to the template.
const GENERATION_ATTEMPTS: u32 = 3;

/// Fixed pause between generation attempts.
const RETRY_BACKOFF: Duration = Duration::from_millis(400);

/// Produces the spoken prompt for a job.
///
/// Tries the generator a fixed number of times with a short backoff, then
/// renders the deterministic template from the same fields.
pub async fn build_voice_script(generator: &dyn ScriptGenerator, ctx: &ScriptContext) -> String {
    for attempt in 1..=GENERATION_ATTEMPTS {
        match generator.generate(ctx).await {
            Ok(script) => return script,
            Err(e) => {
                tracing::warn!("Script generation attempt {} failed: {:#}", attempt, e);
                if attempt < GENERATION_ATTEMPTS {
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
            }
        }
    }

    tracing::warn!("Script generation exhausted retries; using templated script");
    fallback_script(ctx)
}

/// Deterministic script template built from the job fields.
pub fn fallback_script(ctx: &ScriptContext) -> String {
    let special = if ctx.special_request.is_empty() {
        String::new()
    } else {
        format!(" We also have a special request: {}.", ctx.special_request)
    };

    format!(
        "Hello! This is an automated reservation call for {restaurant}. \
         We would like to book a table for {party} at {time}.{special} \
         If you can accommodate this reservation, please press 1. \
         If not, please press 2. Thank you!",
        restaurant = ctx.restaurant_name,
        party = ctx.party_size,
        time = ctx.reservation_time,
        special = special,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{CannedScriptGenerator, FailingScriptGenerator, FlakyScriptGenerator};

    fn ctx() -> ScriptContext {
        ScriptContext {
            restaurant_name: "Chez Panisse".to_string(),
            reservation_time: "Friday at 7pm".to_string(),
            party_size: 4,
            special_request: "window table".to_string(),
        }
    }

    #[test]
    fn test_fallback_script_mentions_all_fields() {
        let script = fallback_script(&ctx());
        assert!(script.contains("Chez Panisse"));
        assert!(script.contains("Friday at 7pm"));
        assert!(script.contains('4'));
        assert!(script.contains("window table"));
        assert!(script.contains("press 1"));
        assert!(script.contains("press 2"));
    }

    #[test]
    fn test_fallback_script_omits_empty_special_request() {
        let mut ctx = ctx();
        ctx.special_request = String::new();
        let script = fallback_script(&ctx);
        assert!(!script.contains("special request"));
    }

    #[tokio::test]
    async fn test_generator_success_passes_through() {
        let generator = CannedScriptGenerator::new("Good evening, table for four?");
        let script = build_voice_script(&generator, &ctx()).await;
        assert_eq!(script, "Good evening, table for four?");
    }

    #[tokio::test]
    async fn test_generator_failure_falls_back_to_template() {
        let generator = FailingScriptGenerator;
        let script = build_voice_script(&generator, &ctx()).await;
        assert!(script.contains("automated reservation call"));
        assert!(script.contains("Chez Panisse"));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let generator = FlakyScriptGenerator::new(2, "Recovered script");
        let script = build_voice_script(&generator, &ctx()).await;
        assert_eq!(script, "Recovered script");
        assert_eq!(generator.calls(), 3);
    }
}
