//! Settings file

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ControllerError;
use crate::logs::LogLevel;

/// Default settings file location
pub const DEFAULT_SETTINGS_FILE: &str = "/etc/pipewright/settings.json";

/// Controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default = "default_true")]
    pub json_logs: bool,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub github: GitHubSettings,

    #[serde(default)]
    pub provisioning: ProvisioningSettings,

    #[serde(default)]
    pub artifacts: ArtifactSettings,

    #[serde(default)]
    pub invoke: InvokeSettings,

    /// Timeout for every outbound HTTP request
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub secrets: SecretSettings,

    #[serde(default)]
    pub execution: ExecutionSettings,

    #[serde(default)]
    pub files: FileSettings,

    #[serde(default)]
    pub cleanup: CleanupSettings,
}

fn default_true() -> bool {
    true
}

fn default_http_timeout() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: true,
            server: ServerSettings::default(),
            github: GitHubSettings::default(),
            provisioning: ProvisioningSettings::default(),
            artifacts: ArtifactSettings::default(),
            invoke: InvokeSettings::default(),
            http_timeout_secs: default_http_timeout(),
            secrets: SecretSettings::default(),
            execution: ExecutionSettings::default(),
            files: FileSettings::default(),
            cleanup: CleanupSettings::default(),
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self, ControllerError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw)
            .map_err(|e| ControllerError::ConfigError(format!("{}: {}", path.display(), e)))
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Source host settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubSettings {
    #[serde(default = "default_github_url")]
    pub base_url: String,

    /// Commit status context for reconciliation results
    #[serde(default = "default_status_context")]
    pub status_context: String,

    /// Status target URL, `{commit}` is replaced with the revision
    #[serde(default)]
    pub target_url: String,

    /// Pipeline status target URL, `{pipeline}` is replaced with its name
    #[serde(default)]
    pub pipeline_url: String,
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

fn default_status_context() -> String {
    "pipeline/prep".to_string()
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            base_url: default_github_url(),
            status_context: default_status_context(),
            target_url: String::new(),
            pipeline_url: String::new(),
        }
    }
}

/// Provisioning service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningSettings {
    #[serde(default = "default_provisioning_url")]
    pub base_url: String,
}

fn default_provisioning_url() -> String {
    "http://localhost:4566".to_string()
}

impl Default for ProvisioningSettings {
    fn default() -> Self {
        Self {
            base_url: default_provisioning_url(),
        }
    }
}

/// Artifact store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSettings {
    #[serde(default = "default_provisioning_url")]
    pub base_url: String,

    /// Store (bucket) receiving build artifacts
    #[serde(default = "default_artifact_store")]
    pub store: String,
}

fn default_artifact_store() -> String {
    "pipewright-artifacts".to_string()
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            base_url: default_provisioning_url(),
            store: default_artifact_store(),
        }
    }
}

/// Self-invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeSettings {
    #[serde(default = "default_invoke_url")]
    pub base_url: String,
}

fn default_invoke_url() -> String {
    format!("http://127.0.0.1:{}", default_port())
}

impl Default for InvokeSettings {
    fn default() -> Self {
        Self {
            base_url: default_invoke_url(),
        }
    }
}

/// Secret lookup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretSettings {
    /// Prefix of the environment variables holding secrets
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,

    /// Key of the source host access token
    #[serde(default = "default_token_key")]
    pub token_key: String,

    /// Key of the webhook signing key
    #[serde(default = "default_hmac_key")]
    pub hmac_key: String,

    /// Key of the bearer token guarding the invocation endpoints
    #[serde(default = "default_invoke_key")]
    pub invoke_key: String,
}

fn default_env_prefix() -> String {
    "PIPEWRIGHT_".to_string()
}

fn default_token_key() -> String {
    "github-token".to_string()
}

fn default_hmac_key() -> String {
    "github-hmac".to_string()
}

fn default_invoke_key() -> String {
    "invoke-token".to_string()
}

impl Default for SecretSettings {
    fn default() -> Self {
        Self {
            env_prefix: default_env_prefix(),
            token_key: default_token_key(),
            hmac_key: default_hmac_key(),
            invoke_key: default_invoke_key(),
        }
    }
}

/// Execution budget settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSettings {
    /// Execution time granted to one invocation
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Share of the budget used before continuing in a new invocation
    #[serde(default = "default_deadline_ratio")]
    pub deadline_ratio: f64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Time cancelled work gets to stop before it is aborted
    #[serde(default = "default_cancel_grace_secs")]
    pub cancel_grace_secs: u64,
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_deadline_ratio() -> f64 {
    0.9
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_cancel_grace_secs() -> u64 {
    5
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            deadline_ratio: default_deadline_ratio(),
            poll_interval_ms: default_poll_interval_ms(),
            cancel_grace_secs: default_cancel_grace_secs(),
        }
    }
}

/// Repository paths of the stack files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default = "default_pipeline_file")]
    pub pipeline: String,

    #[serde(default = "default_parameters_file")]
    pub parameters: String,

    #[serde(default = "default_deploy_file")]
    pub deploy: String,
}

fn default_pipeline_file() -> String {
    "pipeline.json".to_string()
}

fn default_parameters_file() -> String {
    "parameters.json".to_string()
}

fn default_deploy_file() -> String {
    "deploy.json".to_string()
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            pipeline: default_pipeline_file(),
            parameters: default_parameters_file(),
            deploy: default_deploy_file(),
        }
    }
}

/// Stack cleaner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSettings {
    /// Where operators find cleanup logs; reported back with every response
    #[serde(default = "default_log_location")]
    pub log_location: String,
}

fn default_log_location() -> String {
    "pipewright/cleanup".to_string()
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            log_location: default_log_location(),
        }
    }
}
