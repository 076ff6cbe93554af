//! Call placement endpoint

use serde::{Deserialize, Serialize};

use crate::{GatewayClient, Result};

/// Parameters for placing one outbound IVR call
#[derive(Debug, Clone, Serialize)]
pub struct PlaceCallRequest {
    /// Destination number in E.164 form.
    pub to: String,
    /// Caller id presented to the callee.
    pub from: String,
    /// URL the gateway fetches for the voice prompt and posts the captured
    /// digit back to.
    pub prompt_url: String,
    /// URL the gateway posts call lifecycle updates to.
    pub status_callback_url: String,
    /// How long to ring before giving up.
    pub ring_timeout_seconds: u32,
    /// Hard ceiling on total call duration.
    pub max_duration_seconds: u32,
}

/// A successfully placed call
#[derive(Debug, Clone, Deserialize)]
pub struct PlacedCall {
    /// Opaque id the gateway assigned to the call.
    pub call_reference: String,
    /// The gateway-reported initial lifecycle status (usually "queued").
    pub initial_status: String,
}

impl GatewayClient {
    /// Place an outbound call
    ///
    /// The gateway rings the destination, plays the prompt served at
    /// `prompt_url`, gathers a single digit, and reports progress to
    /// `status_callback_url`. All of that is asynchronous; this method only
    /// confirms the call was accepted for placement.
    pub async fn place_call(&self, req: PlaceCallRequest) -> Result<PlacedCall> {
        let url = format!("{}/v1/calls", self.base_url());

        tracing::debug!("Placing call to {} via {}", req.to, url);

        let response = self.authed_post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }
}
