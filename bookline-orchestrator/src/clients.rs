//! External collaborator contracts
//!
//! Traits for the telephony gateway, the notification transport, and the
//! voice script generator, plus their production implementations. The state
//! machine only sees the traits; tests substitute fakes.

use async_trait::async_trait;
use bookline_gateway::{GatewayClient, GatewayError, PlaceCallRequest, PlacedCall};

/// Places outbound IVR calls
#[async_trait]
pub trait TelephonyGateway: Send + Sync {
    async fn place_call(&self, req: PlaceCallRequest) -> Result<PlacedCall, GatewayError>;
}

/// Sends one confirmation message to one recipient
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Returns the gateway's delivery reference on success.
    async fn send(&self, to: &str, from: &str, body: &str) -> Result<String, GatewayError>;
}

/// Produces the spoken prompt text for a job
///
/// Implementations must not block indefinitely; the service layer retries a
/// bounded number of times and then falls back to a deterministic template.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate(&self, ctx: &ScriptContext) -> anyhow::Result<String>;
}

/// Everything a script generator may mention
#[derive(Debug, Clone)]
pub struct ScriptContext {
    pub restaurant_name: String,
    pub reservation_time: String,
    pub party_size: u32,
    pub special_request: String,
}

#[async_trait]
impl TelephonyGateway for GatewayClient {
    async fn place_call(&self, req: PlaceCallRequest) -> Result<PlacedCall, GatewayError> {
        GatewayClient::place_call(self, req).await
    }
}

#[async_trait]
impl NotificationTransport for GatewayClient {
    async fn send(&self, to: &str, from: &str, body: &str) -> Result<String, GatewayError> {
        let sent = self.send_message(to, from, body).await?;
        Ok(sent.delivery_reference)
    }
}

// =============================================================================
// Script Generators
// =============================================================================

/// Script generator backed by an OpenAI-compatible chat-completions endpoint
pub struct LlmScriptClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl LlmScriptClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ScriptGenerator for LlmScriptClient {
    async fn generate(&self, ctx: &ScriptContext) -> anyhow::Result<String> {
        let prompt = format!(
            "Write a short, friendly phone script for an automated reservation \
             request call to the restaurant \"{}\". The caller wants a table \
             for {} at {}.{} End by asking the listener to press 1 to confirm \
             the reservation or 2 to decline. Plain spoken text only.",
            ctx.restaurant_name,
            ctx.party_size,
            ctx.reservation_time,
            if ctx.special_request.is_empty() {
                String::new()
            } else {
                format!(" Special request: {}.", ctx.special_request)
            }
        );

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("script endpoint returned {status}: {text}");
        }

        let value: serde_json::Value = response.json().await?;
        let content = value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("script endpoint response had no content"))?
            .trim()
            .to_string();

        if content.is_empty() {
            anyhow::bail!("script endpoint returned an empty script");
        }

        Ok(content)
    }
}

/// Script generator that always renders the deterministic template
///
/// Used when no LLM endpoint is configured.
pub struct TemplateScriptGenerator;

#[async_trait]
impl ScriptGenerator for TemplateScriptGenerator {
    async fn generate(&self, ctx: &ScriptContext) -> anyhow::Result<String> {
        Ok(crate::service::script::fallback_script(ctx))
    }
}
