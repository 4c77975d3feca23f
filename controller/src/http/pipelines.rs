//! Pipeline service adapter

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::ControllerError;
use crate::http::client::{encode_path, HttpClient};
use crate::services::PipelineManager;

#[derive(Debug, Deserialize)]
struct PipelineSource {
    owner: String,
    repo: String,
}

#[derive(Debug, Deserialize)]
struct ExecutionSource {
    revision: String,
}

/// Pipeline metadata over the pipeline service REST API
pub struct HttpPipelineManager {
    client: HttpClient,
}

impl HttpPipelineManager {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PipelineManager for HttpPipelineManager {
    async fn repo_info(&self, pipeline: &str) -> Result<(String, String), ControllerError> {
        let path = encode_path(["pipelines", pipeline])?;
        let source: PipelineSource = self.client.get(&path).await?;
        Ok((source.owner, source.repo))
    }

    async fn revision(&self, pipeline: &str, execution_id: &str) -> Result<String, ControllerError> {
        let execution: ExecutionSource = self
            .client
            .get(&encode_path(["pipelines", pipeline, "executions", execution_id])?)
            .await?;
        Ok(execution.revision)
    }
}
