//! Application configuration options

use std::time::Duration;

use crate::app::settings::Settings;
use crate::cleaner::CleanerOptions;
use crate::deploy::context::TemplateFiles;
use crate::deploy::continuation::ContinuationOptions;
use crate::deploy::executor::ExecutorOptions;
use crate::deploy::watch::WatchOptions;
use crate::notifier::NotifierOptions;
use crate::workers::dispatcher;

/// Main application options
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Collaborator endpoints
    pub endpoints: EndpointOptions,

    /// Secret store configuration
    pub secrets: SecretOptions,

    /// Push executor options
    pub executor: ExecutorOptions,

    /// Stack cleaner options
    pub cleaner: CleanerOptions,

    /// Pipeline notifier options
    pub notifier: NotifierOptions,

    /// Dispatcher worker options
    pub dispatcher: dispatcher::Options,
}

impl From<&Settings> for AppOptions {
    fn from(settings: &Settings) -> Self {
        let execution = &settings.execution;
        let continuation = ContinuationOptions {
            execution_budget: Duration::from_secs(execution.timeout_secs),
            deadline_ratio: execution.deadline_ratio,
            cancel_grace: Duration::from_secs(execution.cancel_grace_secs),
            function: "push".to_string(),
        };
        let watch = WatchOptions {
            poll_interval: Duration::from_millis(execution.poll_interval_ms),
        };

        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            endpoints: EndpointOptions {
                github_url: settings.github.base_url.clone(),
                provisioning_url: settings.provisioning.base_url.clone(),
                artifacts_url: settings.artifacts.base_url.clone(),
                invoke_url: settings.invoke.base_url.clone(),
                http_timeout: Duration::from_secs(settings.http_timeout_secs),
            },
            secrets: SecretOptions {
                env_prefix: settings.secrets.env_prefix.clone(),
                hmac_key: settings.secrets.hmac_key.clone(),
                invoke_key: settings.secrets.invoke_key.clone(),
            },
            executor: ExecutorOptions {
                continuation: continuation.clone(),
                watch: watch.clone(),
                files: TemplateFiles {
                    pipeline: settings.files.pipeline.clone(),
                    parameters: settings.files.parameters.clone(),
                    deploy: settings.files.deploy.clone(),
                },
                artifact_store: settings.artifacts.store.clone(),
                token_key: settings.secrets.token_key.clone(),
                status_context: settings.github.status_context.clone(),
                target_url: settings.github.target_url.clone(),
            },
            cleaner: CleanerOptions {
                continuation: continuation.with_function("cleanup"),
                watch,
                log_location: settings.cleanup.log_location.clone(),
            },
            notifier: NotifierOptions {
                token_key: settings.secrets.token_key.clone(),
                target_url: settings.github.pipeline_url.clone(),
            },
            dispatcher: dispatcher::Options::default(),
        }
    }
}

/// Lifecycle options for the controller
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(60),
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Base URLs of the external collaborators
#[derive(Debug, Clone)]
pub struct EndpointOptions {
    pub github_url: String,
    pub provisioning_url: String,
    pub artifacts_url: String,
    pub invoke_url: String,
    pub http_timeout: Duration,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            github_url: "https://api.github.com".to_string(),
            provisioning_url: "http://localhost:4566".to_string(),
            artifacts_url: "http://localhost:4566".to_string(),
            invoke_url: "http://127.0.0.1:8080".to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }
}

/// Secret store options
#[derive(Debug, Clone)]
pub struct SecretOptions {
    pub env_prefix: String,
    pub hmac_key: String,

    /// Bearer token shared by the invocation endpoints and the invoker
    pub invoke_key: String,
}

impl Default for SecretOptions {
    fn default() -> Self {
        Self {
            env_prefix: "PIPEWRIGHT_".to_string(),
            hmac_key: "github-hmac".to_string(),
            invoke_key: "invoke-token".to_string(),
        }
    }
}
