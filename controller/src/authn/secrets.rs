//! Secret store backed by environment variables

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::debug;

use crate::errors::ControllerError;
use crate::services::SecretStore;

/// Resolves secret `key` from the variable `<prefix><KEY>`
pub struct EnvSecretStore {
    prefix: String,
}

impl EnvSecretStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable holding `key`
    pub fn variable_name(&self, key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", self.prefix, suffix)
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get(&self, key: &str) -> Result<SecretString, ControllerError> {
        let variable = self.variable_name(key);
        debug!("Resolving secret {} from {}", key, variable);

        match std::env::var(&variable) {
            Ok(value) if !value.is_empty() => Ok(SecretString::from(value)),
            Ok(_) => Err(ControllerError::SecretError(format!("{} is empty", variable))),
            Err(e) => Err(ControllerError::SecretError(format!("{}: {}", variable, e))),
        }
    }
}
