use std::sync::Arc;

use axum::extract::FromRef;

use super::config::GuardSettings;
use crate::executor::ExecutorClient;

/// Shared state for the portal route handlers.
#[derive(Clone)]
pub(super) struct PortalState {
    pub(super) executor: Arc<ExecutorClient>,
    pub(super) guard: GuardSettings,
    pub(super) logout_redirect: String,
}

// RequireCredential reads the cookie name from state
impl FromRef<PortalState> for GuardSettings {
    fn from_ref(state: &PortalState) -> Self {
        state.guard.clone()
    }
}
