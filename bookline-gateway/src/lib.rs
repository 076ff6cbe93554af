//! Bookline Gateway Client
//!
//! A thin, type-safe HTTP client for the external voice/SMS gateway used by
//! the Bookline orchestrator. Call-control mechanics (ringing, IVR prompt
//! playback, digit gathering) happen entirely inside the gateway; this crate
//! only places calls, sends messages, and surfaces the opaque references the
//! gateway hands back.
//!
//! # Example
//!
//! ```no_run
//! use bookline_gateway::{GatewayClient, PlaceCallRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GatewayClient::new("https://voice.example.com", "AC123", "secret");
//!
//!     let placed = client
//!         .place_call(PlaceCallRequest {
//!             to: "+15551230000".to_string(),
//!             from: "+15559870000".to_string(),
//!             prompt_url: "https://app.example.com/call/abc/decision".to_string(),
//!             status_callback_url: "https://app.example.com/call/abc/status/0".to_string(),
//!             ring_timeout_seconds: 25,
//!             max_duration_seconds: 120,
//!         })
//!         .await?;
//!
//!     println!("placed call: {}", placed.call_reference);
//!     Ok(())
//! }
//! ```

pub mod error;

mod calls;
mod messages;

pub use calls::{PlaceCallRequest, PlacedCall};
pub use error::{GatewayError, Result};
pub use messages::SentMessage;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the voice/SMS gateway API
///
/// Authenticates with basic credentials (account sid + auth token) on every
/// request, matching the gateway's REST conventions.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    /// Base URL of the gateway (e.g., "https://voice.example.com")
    base_url: String,
    account_sid: String,
    auth_token: String,
    /// HTTP client instance
    client: Client,
}

impl GatewayClient {
    /// Create a new gateway client
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            client: Client::new(),
        }
    }

    /// Create a new gateway client with a custom HTTP client
    ///
    /// This allows configuring timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            client,
        }
    }

    /// Get the base URL of the gateway
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle a gateway response and deserialize JSON
    ///
    /// Checks the status code and returns an appropriate error if the
    /// request failed, or deserializes the response body if successful.
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::from_status(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::ParseError(format!("failed to parse JSON response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GatewayClient::new("https://voice.example.com", "AC123", "token");
        assert_eq!(client.base_url(), "https://voice.example.com");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = GatewayClient::new("https://voice.example.com/", "AC123", "token");
        assert_eq!(client.base_url(), "https://voice.example.com");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client =
            GatewayClient::with_client("https://voice.example.com", "AC123", "token", http_client);
        assert_eq!(client.base_url(), "https://voice.example.com");
    }
}
