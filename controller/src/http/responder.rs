//! Custom resource response writer

use async_trait::async_trait;
use tracing::info;

use crate::errors::ControllerError;
use crate::http::client::HttpClient;
use crate::models::CustomResourceResponse;
use crate::services::ResourceResponder;

/// Writes responses to the pre-signed URL carried by each request
pub struct HttpResourceResponder {
    client: HttpClient,
}

impl HttpResourceResponder {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceResponder for HttpResourceResponder {
    async fn respond(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), ControllerError> {
        self.client.put_url(response_url, response).await?;
        info!(status = ?response.status, request_id = %response.request_id, "Custom resource response sent");
        Ok(())
    }
}
