//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::authn::secrets::EnvSecretStore;
use crate::cleaner::StackCleaner;
use crate::deploy::executor::PushExecutor;
use crate::errors::ControllerError;
use crate::http::artifacts::HttpArtifactStore;
use crate::http::client::HttpClient;
use crate::http::github::GitHubProvider;
use crate::http::invoker::HttpInvoker;
use crate::http::pipelines::HttpPipelineManager;
use crate::http::responder::HttpResourceResponder;
use crate::http::stacks::HttpStackManager;
use crate::notifier::PipelineNotifier;
use crate::services::{SecretStore, Services};
use crate::workers::dispatcher::Processors;

/// Main application state
pub struct AppState {
    /// Collaborators shared by every processor
    pub services: Services,

    /// Job processors run by the dispatcher
    pub processors: Arc<Processors>,
}

impl AppState {
    /// Wire the production collaborators from the configured endpoints
    pub fn init(options: &AppOptions) -> Result<Self, ControllerError> {
        let endpoints = &options.endpoints;
        let timeout = endpoints.http_timeout;

        let secrets: Arc<dyn SecretStore> =
            Arc::new(EnvSecretStore::new(options.secrets.env_prefix.clone()));

        let services = Services {
            repos: Arc::new(GitHubProvider::new(HttpClient::new(&endpoints.github_url, timeout)?)),
            secrets: secrets.clone(),
            stacks: Arc::new(HttpStackManager::new(HttpClient::new(
                &endpoints.provisioning_url,
                timeout,
            )?)),
            invoker: Arc::new(HttpInvoker::new(
                HttpClient::new(&endpoints.invoke_url, timeout)?,
                secrets,
                options.secrets.invoke_key.clone(),
            )),
            artifacts: Arc::new(HttpArtifactStore::new(
                HttpClient::new(&endpoints.artifacts_url, timeout)?,
                options.executor.artifact_store.clone(),
            )),
            pipelines: Arc::new(HttpPipelineManager::new(HttpClient::new(
                &endpoints.provisioning_url,
                timeout,
            )?)),
            responder: Arc::new(HttpResourceResponder::new(HttpClient::new(
                &endpoints.provisioning_url,
                timeout,
            )?)),
        };
        info!("Collaborators initialized");

        Ok(Self::with_services(services, options))
    }

    /// Build the processors around an existing set of collaborators
    pub fn with_services(services: Services, options: &AppOptions) -> Self {
        let processors = Processors {
            executor: PushExecutor::new(services.clone(), options.executor.clone()),
            cleaner: StackCleaner::new(services.clone(), options.cleaner.clone()),
            notifier: PipelineNotifier::new(services.clone(), options.notifier.clone()),
        };

        Self {
            services,
            processors: Arc::new(processors),
        }
    }
}
