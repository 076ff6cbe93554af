//! Shared application state
//!
//! Everything the API handlers and the state machine need: configuration,
//! the injected stores, the collaborator clients, and the per-job locks.

use std::sync::Arc;

use crate::clients::{NotificationTransport, ScriptGenerator, TelephonyGateway};
use crate::config::Config;
use crate::locks::JobLocks;
use crate::store::{ConfirmationStore, GroupDirectory, JobStore};

/// Shared orchestrator state, cloned into every handler via Arc
pub struct AppState {
    pub config: Config,
    pub jobs: Arc<dyn JobStore>,
    pub directory: Arc<dyn GroupDirectory>,
    pub confirmations: Arc<dyn ConfirmationStore>,
    pub gateway: Arc<dyn TelephonyGateway>,
    pub transport: Arc<dyn NotificationTransport>,
    pub scripts: Arc<dyn ScriptGenerator>,
    pub locks: JobLocks,
}
