//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::ControllerError;

/// JSON HTTP client bound to one base URL
pub struct HttpClient {
    client: Client,
    base_url: String,
    authorization: Option<SecretString>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ControllerError> {
        Url::parse(base_url)
            .map_err(|e| ControllerError::ConfigError(format!("Invalid base URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pipewright/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: None,
        })
    }

    /// Copy of this client sending `authorization` on every request
    pub fn authorized(&self, authorization: SecretString) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            authorization: Some(authorization),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request and decode the JSON body
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ControllerError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self.execute(self.client.get(&url), "GET", &url).await?;
        Ok(response.json().await?)
    }

    /// Make a POST request with a JSON body and return the response status
    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<StatusCode, ControllerError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .execute(self.client.post(&url).json(body), "POST", &url)
            .await?;
        Ok(response.status())
    }

    /// Make a POST request without a body
    pub async fn post_empty(&self, path: &str) -> Result<StatusCode, ControllerError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self.execute(self.client.post(&url), "POST", &url).await?;
        Ok(response.status())
    }

    /// Make a PUT request with a JSON body
    pub async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ControllerError> {
        let url = self.url(path);
        self.put_url(&url, body).await
    }

    /// Make a PUT request with a JSON body to an absolute URL
    pub async fn put_url<B: Serialize>(&self, url: &str, body: &B) -> Result<(), ControllerError> {
        debug!("PUT {}", url);

        self.execute(self.client.put(url).json(body), "PUT", url).await?;
        Ok(())
    }

    /// Make a PUT request with a raw body
    pub async fn put_bytes(&self, path: &str, body: Vec<u8>) -> Result<(), ControllerError> {
        let url = self.url(path);
        debug!("PUT {} ({} bytes)", url, body.len());

        let request = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(body);
        self.execute(request, "PUT", &url).await?;
        Ok(())
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), ControllerError> {
        let url = self.url(path);
        debug!("DELETE {}", url);

        self.execute(self.client.delete(&url), "DELETE", &url).await?;
        Ok(())
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        method: &str,
        url: &str,
    ) -> Result<Response, ControllerError> {
        let request = match &self.authorization {
            Some(authorization) => request.header(header::AUTHORIZATION, authorization.expose_secret()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("HTTP {} {} not found", method, url);
            return Err(ControllerError::NotFound(url.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP {} failed: {} - {}", method, status, body);
            return Err(ControllerError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

/// Join path segments into an absolute path, percent-encoding each one
pub fn encode_path<'a>(
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<String, ControllerError> {
    let mut url = Url::parse("http://localhost/")
        .map_err(|e| ControllerError::Internal(format!("Path base: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| ControllerError::Internal("Path base cannot hold segments".into()))?
        .clear()
        .extend(segments);
    Ok(url.path().to_string())
}

/// Percent-encode a query parameter value
pub fn encode_query(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
