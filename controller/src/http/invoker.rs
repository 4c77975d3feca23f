//! Asynchronous self-invocation

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::info;

use crate::authn::bearer::bearer_value;
use crate::errors::ControllerError;
use crate::http::client::HttpClient;
use crate::services::{Invoker, SecretStore};

/// Dispatches payloads to the controller's own invocation endpoints
pub struct HttpInvoker {
    client: HttpClient,
    secrets: Arc<dyn SecretStore>,

    /// Secret key of the invocation bearer token
    token_key: String,
}

impl HttpInvoker {
    pub fn new(client: HttpClient, secrets: Arc<dyn SecretStore>, token_key: String) -> Self {
        Self {
            client,
            secrets,
            token_key,
        }
    }
}

#[async_trait]
impl Invoker for HttpInvoker {
    async fn invoke(
        &self,
        function: &str,
        payload: &serde_json::Value,
    ) -> Result<(), ControllerError> {
        let token = self.secrets.get(&self.token_key).await?;
        let status = self
            .client
            .authorized(bearer_value(&token))
            .post(&format!("/invoke/{}", function), payload)
            .await
            .map_err(|e| ControllerError::InvokeError(format!("{}: {}", function, e)))?;

        if status != StatusCode::ACCEPTED {
            return Err(ControllerError::InvokeError(format!(
                "{}: expected 202 Accepted, got {}",
                function, status
            )));
        }

        info!(function, "Invocation dispatched");
        Ok(())
    }
}
