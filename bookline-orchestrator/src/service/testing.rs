//! Shared test fakes and harness
//!
//! Everything the service tests need: an in-memory store, a scripted
//! telephony gateway, a recording notification transport, and canned script
//! generators.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bookline_core::domain::group::{GroupMember, NotifyGroup};
use bookline_core::domain::job::{
    CallJob, CallJobStatus, NotificationTarget, ReservationDecision,
};
use bookline_gateway::{GatewayError, PlaceCallRequest, PlacedCall};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::clients::{NotificationTransport, ScriptContext, ScriptGenerator, TelephonyGateway};
use crate::config::Config;
use crate::context::AppState;
use crate::locks::JobLocks;
use crate::store::MemoryStore;

pub const ALLOWED_NUMBER: &str = "+15551230000";
pub const CALLER_NUMBER: &str = "+15559870000";

/// Fully configured test configuration.
pub fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        database_url: None,
        gateway_base_url: Some("https://voice.example.com".to_string()),
        gateway_account_sid: Some("AC123".to_string()),
        gateway_auth_token: Some("token".to_string()),
        caller_number: Some(CALLER_NUMBER.to_string()),
        allowed_target_number: ALLOWED_NUMBER.to_string(),
        public_base_url: Some("https://app.example.com".to_string()),
        ring_timeout: Duration::from_secs(25),
        max_call_duration: Duration::from_secs(120),
        max_retries: 1,
        notifications_enabled: true,
        demo_notify_override: None,
        script_api_url: None,
        script_api_key: None,
        script_model: "test-model".to_string(),
        snapshot_interval: Duration::from_secs(30),
    }
}

/// A queued job with sensible defaults, not yet persisted.
pub fn sample_job(notification_target: NotificationTarget) -> CallJob {
    let now = chrono::Utc::now();
    CallJob {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        restaurant_name: "Test Bistro".to_string(),
        reservation_time: "7:30pm".to_string(),
        party_size: 2,
        special_request: String::new(),
        notification_target,
        target_number: ALLOWED_NUMBER.to_string(),
        caller_number: CALLER_NUMBER.to_string(),
        status: CallJobStatus::Queued,
        voice_script: "test script".to_string(),
        attempts: Vec::new(),
        retry_used: 0,
        max_retries: 1,
        decision_digit: String::new(),
        reservation_decision: ReservationDecision::Pending,
        confirmed_reservation_id: None,
        confirmed_plan_id: None,
        notification_outcome: None,
        last_error: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn group_with_members(id: Uuid, owner_id: Uuid, members: Vec<GroupMember>) -> NotifyGroup {
    NotifyGroup {
        id,
        owner_id,
        name: "dinner crew".to_string(),
        members,
    }
}

// =============================================================================
// Fakes
// =============================================================================

/// Telephony gateway fake that records placements and can be made to fail
pub struct FakeGateway {
    placed: Mutex<Vec<PlaceCallRequest>>,
    failing: AtomicBool,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            placed: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn placed(&self) -> Vec<PlaceCallRequest> {
        self.placed.lock().await.clone()
    }
}

#[async_trait]
impl TelephonyGateway for FakeGateway {
    async fn place_call(&self, req: PlaceCallRequest) -> Result<PlacedCall, GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::ApiError {
                status: 503,
                message: "gateway unavailable".to_string(),
            });
        }
        let mut placed = self.placed.lock().await;
        let call_reference = format!("CA{:03}", placed.len() + 1);
        placed.push(req);
        Ok(PlacedCall {
            call_reference,
            initial_status: "queued".to_string(),
        })
    }
}

/// Notification transport fake that records sends and fails chosen numbers
pub struct RecordingTransport {
    sent: Mutex<Vec<(String, String)>>,
    failing_numbers: Mutex<HashSet<String>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing_numbers: Mutex::new(HashSet::new()),
        }
    }

    pub async fn fail_number(&self, number: &str) {
        self.failing_numbers.lock().await.insert(number.to_string());
    }

    /// (recipient, body) pairs in send order.
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn send(&self, to: &str, _from: &str, body: &str) -> Result<String, GatewayError> {
        if self.failing_numbers.lock().await.contains(to) {
            return Err(GatewayError::ApiError {
                status: 500,
                message: "delivery failed".to_string(),
            });
        }
        let mut sent = self.sent.lock().await;
        let reference = format!("SM{:03}", sent.len() + 1);
        sent.push((to.to_string(), body.to_string()));
        Ok(reference)
    }
}

/// Script generator returning a fixed script
pub struct CannedScriptGenerator {
    script: String,
}

impl CannedScriptGenerator {
    pub fn new(script: impl Into<String>) -> Self {
        Self { script: script.into() }
    }
}

#[async_trait]
impl ScriptGenerator for CannedScriptGenerator {
    async fn generate(&self, _ctx: &ScriptContext) -> anyhow::Result<String> {
        Ok(self.script.clone())
    }
}

/// Script generator that always fails
pub struct FailingScriptGenerator;

#[async_trait]
impl ScriptGenerator for FailingScriptGenerator {
    async fn generate(&self, _ctx: &ScriptContext) -> anyhow::Result<String> {
        anyhow::bail!("model endpoint unreachable")
    }
}

/// Script generator that fails a fixed number of times, then succeeds
pub struct FlakyScriptGenerator {
    failures_left: AtomicU32,
    calls: AtomicU32,
    script: String,
}

impl FlakyScriptGenerator {
    pub fn new(failures: u32, script: impl Into<String>) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            script: script.into(),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptGenerator for FlakyScriptGenerator {
    async fn generate(&self, _ctx: &ScriptContext) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            anyhow::bail!("transient model error")
        }
        Ok(self.script.clone())
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Builder for the shared application state used in service tests
pub struct TestHarness {
    config: Config,
    script: Arc<dyn ScriptGenerator>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            script: Arc::new(CannedScriptGenerator::new("test script")),
        }
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn with_script(mut self, script: Arc<dyn ScriptGenerator>) -> Self {
        self.script = script;
        self
    }

    pub fn build(self) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(FakeGateway::new());
        let transport = Arc::new(RecordingTransport::new());

        let state = Arc::new(AppState {
            config: self.config,
            jobs: store.clone(),
            directory: store.clone(),
            confirmations: store.clone(),
            gateway: gateway.clone(),
            transport: transport.clone(),
            scripts: self.script,
            locks: JobLocks::new(),
        });

        Harness {
            state,
            store,
            gateway,
            transport,
        }
    }
}

/// Built state plus handles to the fakes for assertions
pub struct Harness {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub transport: Arc<RecordingTransport>,
}
