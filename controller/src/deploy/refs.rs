//! Ref classification and stack naming

use serde::{Deserialize, Serialize};

/// Branch name that selects the master deployment class
pub const MASTER_BRANCH: &str = "master";

/// Deployment class of a pushed ref
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentClass {
    Development,
    Master,
    Release,
}

impl DeploymentClass {
    /// Name used for the `Stage` parameter and the parameter manifest key
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentClass::Development => "development",
            DeploymentClass::Master => "master",
            DeploymentClass::Release => "release",
        }
    }
}

impl std::fmt::Display for DeploymentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last `/`-delimited segment of a ref
pub fn branch_label(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Classify a ref into its deployment class and branch label.
///
/// `master` matches on the label alone, so `refs/tags/master` is also Master.
pub fn classify(reference: &str) -> (DeploymentClass, &str) {
    let label = branch_label(reference);

    let class = if label == MASTER_BRANCH {
        DeploymentClass::Master
    } else if is_release_tag(label) {
        DeploymentClass::Release
    } else {
        DeploymentClass::Development
    };

    (class, label)
}

/// `vMAJOR.MINOR.PATCH` with decimal components
pub fn is_release_tag(label: &str) -> bool {
    let Some(version) = label.strip_prefix('v') else {
        return false;
    };

    let parts: Vec<&str> = version.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

/// Canonical identity of the pipeline stack a push reconciles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackIdentity {
    pub repo: String,
    pub class: DeploymentClass,
    pub branch: String,
    pub name: String,
}

impl StackIdentity {
    pub fn resolve(repo: &str, reference: &str) -> Self {
        let (class, branch) = classify(reference);
        Self {
            repo: repo.to_string(),
            class,
            branch: branch.to_string(),
            name: stack_name(repo, reference),
        }
    }
}

/// Stack name for a repository and ref. Master and Release collapse to a
/// fixed suffix, Development keeps the branch label.
pub fn stack_name(repo: &str, reference: &str) -> String {
    match classify(reference) {
        (DeploymentClass::Master, _) => format!("{}-master", repo),
        (DeploymentClass::Release, _) => format!("{}-release", repo),
        (DeploymentClass::Development, branch) => format!("{}-{}", repo, branch),
    }
}
