//! Required stack parameters

use secrecy::{ExposeSecret, SecretString};

use crate::deploy::refs::classify;
use crate::models::build::Parameter;
use crate::models::PushEvent;

/// Keys appended to every parameter set. Repository parameter files must not
/// define these; collisions are not checked.
pub const RESERVED_KEYS: [&str; 6] = [
    "ArtifactStore",
    "RepoOwner",
    "RepoName",
    "RepoBranch",
    "RepoToken",
    "Stage",
];

/// Return a copy of `parameters` with the required parameters appended
pub fn enrich(
    parameters: &[Parameter],
    event: &PushEvent,
    token: &SecretString,
    artifact_store: &str,
) -> Vec<Parameter> {
    let (class, branch) = classify(&event.reference);

    let mut enriched = Vec::with_capacity(parameters.len() + RESERVED_KEYS.len());
    enriched.extend_from_slice(parameters);
    enriched.extend([
        Parameter::new("ArtifactStore", artifact_store),
        Parameter::new("RepoOwner", event.owner()),
        Parameter::new("RepoName", event.repo_name()),
        Parameter::new("RepoBranch", branch),
        Parameter::new("RepoToken", token.expose_secret()),
        Parameter::new("Stage", class.as_str()),
    ]);
    enriched
}
