//! Utility functions

use serde::{Deserialize, Serialize};

/// Version information for the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Abbreviated revision hash used in log fields
pub fn short_hash(revision: &str) -> &str {
    revision.get(..6).unwrap_or(revision)
}

/// Substitute `{placeholder}` in a URL template. Empty templates yield `None`.
pub fn render_url(template: &str, placeholder: &str, value: &str) -> Option<String> {
    if template.is_empty() {
        return None;
    }
    Some(template.replace(&format!("{{{}}}", placeholder), value))
}

/// Maximum commit status description length accepted by the source host
pub const MAX_DESCRIPTION_LEN: usize = 140;

/// Trim a status description to the accepted length
pub fn status_description(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION_LEN {
        return text.to_string();
    }
    let mut trimmed: String = text.chars().take(MAX_DESCRIPTION_LEN - 3).collect();
    trimmed.push_str("...");
    trimmed
}

/// Generate a random UUID v4
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
