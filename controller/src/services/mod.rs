//! Collaborator seams
//!
//! Every external system the controller talks to sits behind one of these
//! traits. Production implementations live in `http` and `authn`; tests swap
//! in in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::deploy::status::StackStatus;
use crate::errors::ControllerError;
use crate::models::build::Parameter;
use crate::models::{CommitStatus, CustomResourceResponse};

/// Source repository access for one repository
#[async_trait]
pub trait Repository: Send + Sync {
    /// Fetch a file at a ref. Missing files fail with `ControllerError::NotFound`.
    async fn get(&self, reference: &str, path: &str) -> Result<Vec<u8>, ControllerError>;

    /// Attach a commit status to a revision
    async fn status(&self, revision: &str, status: &CommitStatus) -> Result<(), ControllerError>;
}

/// Opens repository handles with a resolved access token
pub trait RepositoryProvider: Send + Sync {
    fn open(
        &self,
        owner: &str,
        name: &str,
        token: &SecretString,
    ) -> Result<Arc<dyn Repository>, ControllerError>;
}

/// Secret lookup by logical key
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<SecretString, ControllerError>;
}

/// Provisioning service managing pipeline stacks
#[async_trait]
pub trait StackManager: Send + Sync {
    async fn create(
        &self,
        name: &str,
        parameters: &[Parameter],
        template: &[u8],
    ) -> Result<(), ControllerError>;

    async fn update(
        &self,
        name: &str,
        parameters: &[Parameter],
        template: &[u8],
    ) -> Result<(), ControllerError>;

    async fn delete(&self, name: &str) -> Result<(), ControllerError>;

    async fn status(&self, name: &str) -> Result<StackStatus, ControllerError>;

    /// Time of the last completed update, `None` for stacks never updated
    async fn last_updated(&self, name: &str) -> Result<Option<DateTime<Utc>>, ControllerError>;

    /// Start the stack's pipeline execution
    async fn start_build(&self, name: &str) -> Result<(), ControllerError>;
}

/// Dispatches a new, independent invocation of a controller function
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, function: &str, payload: &serde_json::Value)
        -> Result<(), ControllerError>;
}

/// Object storage for build artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store an object and return its location
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<String, ControllerError>;
}

/// Source information for managed pipelines
#[async_trait]
pub trait PipelineManager: Send + Sync {
    /// Owner and repository name a pipeline builds from
    async fn repo_info(&self, pipeline: &str) -> Result<(String, String), ControllerError>;

    /// Source revision of a pipeline execution
    async fn revision(&self, pipeline: &str, execution_id: &str) -> Result<String, ControllerError>;
}

/// Writes custom resource responses back to the provisioning service
#[async_trait]
pub trait ResourceResponder: Send + Sync {
    async fn respond(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), ControllerError>;
}

/// Bundle of collaborators shared by every processor
#[derive(Clone)]
pub struct Services {
    pub repos: Arc<dyn RepositoryProvider>,
    pub secrets: Arc<dyn SecretStore>,
    pub stacks: Arc<dyn StackManager>,
    pub invoker: Arc<dyn Invoker>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub pipelines: Arc<dyn PipelineManager>,
    pub responder: Arc<dyn ResourceResponder>,
}
