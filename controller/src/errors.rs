//! Error types for the pipewright controller

use thiserror::Error;

/// How an error affects the current reconciliation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Abort the attempt and report failure upstream
    Fatal,

    /// The remote stack operation failed or rolled back
    TerminalRemoteFailure,

    /// Work was interrupted before finishing; not a failure
    Cancelled,
}

/// Main error type for the controller
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Template fetch error for {path}: {reason}")]
    TemplateFetchError { path: String, reason: String },

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Provisioning error: {0}")]
    ProvisioningError(String),

    #[error("Stack {stack} ended in status {status}")]
    StackFailed { stack: String, status: String },

    #[error("Watch on stack {0} was cancelled")]
    Cancelled(String),

    #[error("Secret error: {0}")]
    SecretError(String),

    #[error("Signature error: {0}")]
    SignatureError(String),

    #[error("Invocation error: {0}")]
    InvokeError(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),

    #[error("Artifact error: {0}")]
    ArtifactError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ControllerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ControllerError::Cancelled(_) => ErrorClass::Cancelled,
            ControllerError::StackFailed { .. } => ErrorClass::TerminalRemoteFailure,
            _ => ErrorClass::Fatal,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.class() == ErrorClass::Cancelled
    }

    /// The collaborator reported that the requested object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ControllerError::NotFound(_))
    }
}

impl From<anyhow::Error> for ControllerError {
    fn from(err: anyhow::Error) -> Self {
        ControllerError::Internal(err.to_string())
    }
}
