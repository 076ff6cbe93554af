//! Message send endpoint

use serde::{Deserialize, Serialize};

use crate::{GatewayClient, Result};

#[derive(Debug, Clone, Serialize)]
struct SendMessageRequest<'a> {
    to: &'a str,
    from: &'a str,
    body: &'a str,
}

/// A message accepted for delivery
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    /// Opaque delivery reference assigned by the gateway.
    pub delivery_reference: String,
}

impl GatewayClient {
    /// Send one text message
    ///
    /// Delivery is attempted exactly once; the caller decides what a failure
    /// means for the overall fan-out.
    pub async fn send_message(&self, to: &str, from: &str, body: &str) -> Result<SentMessage> {
        let url = format!("{}/v1/messages", self.base_url());

        tracing::debug!("Sending message to {} via {}", to, url);

        let response = self
            .authed_post(&url)
            .json(&SendMessageRequest { to, from, body })
            .send()
            .await?;

        self.handle_response(response).await
    }
}
