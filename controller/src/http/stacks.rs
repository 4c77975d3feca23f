//! Provisioning service adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::deploy::status::StackStatus;
use crate::errors::ControllerError;
use crate::http::client::{encode_path, HttpClient};
use crate::models::build::Parameter;
use crate::services::StackManager;

/// Capabilities granted to every pipeline stack
pub const CAPABILITIES: [&str; 2] = ["CAPABILITY_IAM", "CAPABILITY_NAMED_IAM"];

/// Stack as described by the provisioning service
#[derive(Debug, Clone, Deserialize)]
pub struct StackRecord {
    pub status: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct StackRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    template: &'a str,
    parameters: &'a [Parameter],
    capabilities: &'a [&'a str],
}

/// Stack manager over the provisioning service REST API
pub struct HttpStackManager {
    client: HttpClient,
}

/// Path of a stack resource
fn stack_path(name: &str) -> Result<String, ControllerError> {
    encode_path(["stacks", name])
}

/// Path of a stack's build trigger
fn builds_path(name: &str) -> Result<String, ControllerError> {
    encode_path(["stacks", name, "builds"])
}

impl HttpStackManager {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    async fn describe(&self, name: &str) -> Result<Option<StackRecord>, ControllerError> {
        match self.client.get(&stack_path(name)?).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn template_body(template: &[u8]) -> Result<&str, ControllerError> {
    std::str::from_utf8(template)
        .map_err(|e| ControllerError::ProvisioningError(format!("Template is not UTF-8: {}", e)))
}

#[async_trait]
impl StackManager for HttpStackManager {
    async fn create(
        &self,
        name: &str,
        parameters: &[Parameter],
        template: &[u8],
    ) -> Result<(), ControllerError> {
        let request = StackRequest {
            name: Some(name),
            template: template_body(template)?,
            parameters,
            capabilities: &CAPABILITIES,
        };
        self.client.post("/stacks", &request).await?;
        Ok(())
    }

    async fn update(
        &self,
        name: &str,
        parameters: &[Parameter],
        template: &[u8],
    ) -> Result<(), ControllerError> {
        let request = StackRequest {
            name: None,
            template: template_body(template)?,
            parameters,
            capabilities: &CAPABILITIES,
        };
        self.client.put(&stack_path(name)?, &request).await
    }

    async fn delete(&self, name: &str) -> Result<(), ControllerError> {
        self.client.delete(&stack_path(name)?).await
    }

    async fn status(&self, name: &str) -> Result<StackStatus, ControllerError> {
        let status = match self.describe(name).await? {
            Some(record) => StackStatus::existing(record.status),
            None => StackStatus::missing(),
        };
        debug!(stack = name, status = %status, "Queried stack status");
        Ok(status)
    }

    async fn last_updated(&self, name: &str) -> Result<Option<DateTime<Utc>>, ControllerError> {
        Ok(self.describe(name).await?.and_then(|record| record.last_updated))
    }

    async fn start_build(&self, name: &str) -> Result<(), ControllerError> {
        self.client.post_empty(&builds_path(name)?).await?;
        Ok(())
    }
}
