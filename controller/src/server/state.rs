//! Server state

use std::sync::Arc;

use crate::services::SecretStore;
use crate::workers::dispatcher::JobSender;

/// Server state shared across handlers
pub struct ServerState {
    /// Accepted work is queued here for the dispatcher
    pub jobs: JobSender,

    pub secrets: Arc<dyn SecretStore>,

    /// Secret key of the webhook signing key
    pub hmac_key: String,

    /// Secret key of the invocation bearer token
    pub invoke_key: String,
}

impl ServerState {
    pub fn new(
        jobs: JobSender,
        secrets: Arc<dyn SecretStore>,
        hmac_key: impl Into<String>,
        invoke_key: impl Into<String>,
    ) -> Self {
        Self {
            jobs,
            secrets,
            hmac_key: hmac_key.into(),
            invoke_key: invoke_key.into(),
        }
    }
}
