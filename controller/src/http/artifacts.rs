//! Artifact store adapter

use async_trait::async_trait;

use crate::errors::ControllerError;
use crate::http::client::HttpClient;
use crate::services::ArtifactStore;

/// Object store bucket reached over HTTP
pub struct HttpArtifactStore {
    client: HttpClient,
    store: String,
}

impl HttpArtifactStore {
    pub fn new(client: HttpClient, store: impl Into<String>) -> Self {
        Self {
            client,
            store: store.into(),
        }
    }

    pub fn location(&self, key: &str) -> String {
        format!("{}/{}", self.store, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<String, ControllerError> {
        let location = self.location(key);
        self.client
            .put_bytes(&format!("/{}", location), body)
            .await
            .map_err(|e| ControllerError::ArtifactError(format!("{}: {}", location, e)))?;
        Ok(location)
    }
}
