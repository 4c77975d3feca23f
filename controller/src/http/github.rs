//! GitHub repository adapter

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::errors::ControllerError;
use crate::http::client::{encode_path, encode_query, HttpClient};
use crate::models::CommitStatus;
use crate::services::{Repository, RepositoryProvider};

/// File contents as returned by the contents API
#[derive(Debug, Clone, Deserialize)]
pub struct ContentResponse {
    #[serde(default)]
    pub encoding: String,
    #[serde(default)]
    pub content: String,
}

impl ContentResponse {
    /// Decode the base64 body, which the API wraps with line breaks
    pub fn decode(&self) -> Result<Vec<u8>, ControllerError> {
        if self.encoding != "base64" {
            return Err(ControllerError::RepositoryError(format!(
                "Unsupported content encoding: {}",
                self.encoding
            )));
        }

        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        STANDARD
            .decode(compact)
            .map_err(|e| ControllerError::RepositoryError(format!("Invalid file content: {}", e)))
    }
}

/// One repository on the GitHub API
pub struct GitHubRepository {
    client: HttpClient,
    owner: String,
    name: String,
}

#[async_trait]
impl Repository for GitHubRepository {
    async fn get(&self, reference: &str, path: &str) -> Result<Vec<u8>, ControllerError> {
        let segments = ["repos", self.owner.as_str(), self.name.as_str(), "contents"]
            .into_iter()
            .chain(path.split('/').filter(|segment| !segment.is_empty()));
        let api_path = format!("{}?ref={}", encode_path(segments)?, encode_query(reference));
        debug!("Fetching {} at {}", path, reference);

        let content: ContentResponse = match self.client.get(&api_path).await {
            Ok(content) => content,
            Err(e) if e.is_not_found() => return Err(ControllerError::NotFound(path.to_string())),
            Err(e) => return Err(e),
        };
        content.decode()
    }

    async fn status(&self, revision: &str, status: &CommitStatus) -> Result<(), ControllerError> {
        let api_path = encode_path([
            "repos",
            self.owner.as_str(),
            self.name.as_str(),
            "statuses",
            revision,
        ])?;
        debug!(state = ?status.state, context = %status.context, "Posting commit status");

        self.client.post(&api_path, status).await?;
        Ok(())
    }
}

/// Opens GitHub repositories authenticated with an access token
pub struct GitHubProvider {
    client: HttpClient,
}

impl GitHubProvider {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl RepositoryProvider for GitHubProvider {
    fn open(
        &self,
        owner: &str,
        name: &str,
        token: &SecretString,
    ) -> Result<Arc<dyn Repository>, ControllerError> {
        let authorization = SecretString::from(format!("token {}", token.expose_secret()));

        Ok(Arc::new(GitHubRepository {
            client: self.client.authorized(authorization),
            owner: owner.to_string(),
            name: name.to_string(),
        }))
    }
}
