//! Build context models

use serde::{Deserialize, Serialize};

use crate::deploy::refs::DeploymentClass;

/// A single stack parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "ParameterKey")]
    pub key: String,

    #[serde(rename = "ParameterValue")]
    pub value: String,
}

impl Parameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Parameter lists keyed by deployment class, as stored in the repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterManifest {
    #[serde(default, alias = "dev", skip_serializing_if = "Option::is_none")]
    pub development: Option<Vec<Parameter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<Vec<Parameter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<Vec<Parameter>>,
}

impl ParameterManifest {
    /// Parameters for a class. Classes without an entry use the development list.
    pub fn select(&self, class: DeploymentClass) -> Vec<Parameter> {
        let explicit = match class {
            DeploymentClass::Development => self.development.as_ref(),
            DeploymentClass::Master => self.master.as_ref(),
            DeploymentClass::Release => self.release.as_ref(),
        };

        explicit
            .or(self.development.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

/// Everything needed to create or update a pipeline stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub pipeline_template: Vec<u8>,
    pub deploy_template: Option<Vec<u8>>,
    pub parameters: Vec<Parameter>,
}

impl BuildContext {
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}
