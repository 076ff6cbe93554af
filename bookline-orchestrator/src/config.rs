//! Orchestrator configuration
//!
//! Defines all configurable parameters for the orchestrator including the
//! gateway credentials, phone endpoints, retry ceiling, call timeouts, and
//! notification toggles.

use std::time::Duration;

/// Orchestrator configuration
///
/// Gateway credentials and the public callback base URL are optional at
/// startup: jobs can be created and read without them, but call placement
/// reports which keys are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP API binds to
    pub bind_addr: String,

    /// Postgres connection string; in-memory stores are used when absent
    pub database_url: Option<String>,

    /// Voice/SMS gateway base URL (e.g., "https://voice.example.com")
    pub gateway_base_url: Option<String>,

    /// Gateway account sid
    pub gateway_account_sid: Option<String>,

    /// Gateway auth token
    pub gateway_auth_token: Option<String>,

    /// Caller id used for outbound calls and confirmation messages
    pub caller_number: Option<String>,

    /// The single destination number jobs are allowed to call.
    /// A safety rail for the demo deployment; creation rejects any other
    /// destination.
    pub allowed_target_number: String,

    /// Public base URL of this service, used to build webhook callback URLs
    pub public_base_url: Option<String>,

    /// How long the gateway rings before giving up
    pub ring_timeout: Duration,

    /// Hard ceiling on total call duration
    pub max_call_duration: Duration,

    /// Maximum number of re-placed attempts per job
    pub max_retries: u32,

    /// Global switch for the confirmation fan-out
    pub notifications_enabled: bool,

    /// When set, this number receives every confirmation message instead of
    /// the resolved audience (controlled demos)
    pub demo_notify_override: Option<String>,

    /// OpenAI-compatible chat-completions endpoint for voice script
    /// generation; the deterministic template is used when absent
    pub script_api_url: Option<String>,

    /// API key for the script endpoint
    pub script_api_key: Option<String>,

    /// Model name for the script endpoint
    pub script_model: String,

    /// How often to write the best-effort bulk job snapshot
    pub snapshot_interval: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - BIND_ADDR (optional, default: 0.0.0.0:8080)
    /// - DATABASE_URL (optional; in-memory stores when unset)
    /// - GATEWAY_BASE_URL / GATEWAY_ACCOUNT_SID / GATEWAY_AUTH_TOKEN (required for call placement)
    /// - CALLER_NUMBER (required for call placement)
    /// - ALLOWED_TARGET_NUMBER (required)
    /// - PUBLIC_BASE_URL (required for call placement)
    /// - RING_TIMEOUT_SECONDS (optional, default: 25)
    /// - MAX_CALL_SECONDS (optional, default: 120)
    /// - MAX_CALL_RETRIES (optional, default: 1)
    /// - NOTIFICATIONS_ENABLED (optional, default: true)
    /// - DEMO_NOTIFY_OVERRIDE (optional)
    /// - SCRIPT_API_URL / SCRIPT_API_KEY / SCRIPT_MODEL (optional)
    /// - SNAPSHOT_INTERVAL_SECONDS (optional, default: 30)
    pub fn from_env() -> anyhow::Result<Self> {
        let allowed_target_number = std::env::var("ALLOWED_TARGET_NUMBER")
            .map_err(|_| anyhow::anyhow!("ALLOWED_TARGET_NUMBER environment variable not set"))?;

        let ring_timeout = env_seconds("RING_TIMEOUT_SECONDS", 25);
        let max_call_duration = env_seconds("MAX_CALL_SECONDS", 120);
        let snapshot_interval = env_seconds("SNAPSHOT_INTERVAL_SECONDS", 30);

        let max_retries = std::env::var("MAX_CALL_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(1);

        let notifications_enabled = std::env::var("NOTIFICATIONS_ENABLED")
            .ok()
            .map(|s| s != "false" && s != "0")
            .unwrap_or(true);

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url: std::env::var("DATABASE_URL").ok(),
            gateway_base_url: std::env::var("GATEWAY_BASE_URL").ok(),
            gateway_account_sid: std::env::var("GATEWAY_ACCOUNT_SID").ok(),
            gateway_auth_token: std::env::var("GATEWAY_AUTH_TOKEN").ok(),
            caller_number: std::env::var("CALLER_NUMBER").ok(),
            allowed_target_number,
            public_base_url: std::env::var("PUBLIC_BASE_URL").ok(),
            ring_timeout,
            max_call_duration,
            max_retries,
            notifications_enabled,
            demo_notify_override: std::env::var("DEMO_NOTIFY_OVERRIDE").ok(),
            script_api_url: std::env::var("SCRIPT_API_URL").ok(),
            script_api_key: std::env::var("SCRIPT_API_KEY").ok(),
            script_model: std::env::var("SCRIPT_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            snapshot_interval,
        })
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.allowed_target_number.is_empty() {
            anyhow::bail!("allowed_target_number cannot be empty");
        }

        if let Some(url) = &self.gateway_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("gateway_base_url must start with http:// or https://");
            }
        }

        if let Some(url) = &self.public_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("public_base_url must start with http:// or https://");
            }
        }

        if self.ring_timeout.as_secs() == 0 {
            anyhow::bail!("ring_timeout must be greater than 0");
        }

        if self.max_call_duration.as_secs() == 0 {
            anyhow::bail!("max_call_duration must be greater than 0");
        }

        Ok(())
    }

    /// Configuration keys that must be present before a call can be placed.
    ///
    /// Returns the missing key names so the placement error can list them.
    pub fn telephony_missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.gateway_base_url.is_none() {
            missing.push("GATEWAY_BASE_URL");
        }
        if self.gateway_account_sid.is_none() {
            missing.push("GATEWAY_ACCOUNT_SID");
        }
        if self.gateway_auth_token.is_none() {
            missing.push("GATEWAY_AUTH_TOKEN");
        }
        if self.caller_number.is_none() {
            missing.push("CALLER_NUMBER");
        }
        if self.public_base_url.is_none() {
            missing.push("PUBLIC_BASE_URL");
        }
        missing
    }
}

fn env_seconds(key: &str, default: u64) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            gateway_base_url: Some("https://voice.example.com".to_string()),
            gateway_account_sid: Some("AC123".to_string()),
            gateway_auth_token: Some("token".to_string()),
            caller_number: Some("+15559870000".to_string()),
            allowed_target_number: "+15551230000".to_string(),
            public_base_url: Some("https://app.example.com".to_string()),
            ring_timeout: Duration::from_secs(25),
            max_call_duration: Duration::from_secs(120),
            max_retries: 1,
            notifications_enabled: true,
            demo_notify_override: None,
            script_api_url: None,
            script_api_key: None,
            script_model: "gpt-4o-mini".to_string(),
            snapshot_interval: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = test_config();
        assert!(config.validate().is_ok());
        assert!(config.telephony_missing_keys().is_empty());
    }

    #[test]
    fn test_missing_keys_are_listed() {
        let mut config = test_config();
        config.gateway_auth_token = None;
        config.public_base_url = None;

        let missing = config.telephony_missing_keys();
        assert_eq!(missing, vec!["GATEWAY_AUTH_TOKEN", "PUBLIC_BASE_URL"]);
    }

    #[test]
    fn test_config_validation() {
        let mut config = test_config();

        config.gateway_base_url = Some("not-a-url".to_string());
        assert!(config.validate().is_err());

        config.gateway_base_url = Some("https://voice.example.com".to_string());
        assert!(config.validate().is_ok());

        config.ring_timeout = Duration::from_secs(0);
        assert!(config.validate().is_err());
    }
}
