//! Push event payload

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A source-host push event.
///
/// Only the fields the controller reads are typed. Everything else in the
/// payload is kept in `extra` so the event serializes back to the payload it
/// was decoded from, which is what a continuation re-dispatches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Full ref, `refs/heads/<branch>` or `refs/tags/<tag>`
    #[serde(rename = "ref")]
    pub reference: String,

    /// Revision before the push
    #[serde(default)]
    pub before: String,

    /// Revision after the push
    #[serde(default)]
    pub after: String,

    #[serde(default)]
    pub created: bool,

    /// Set when the ref was removed
    #[serde(default)]
    pub deleted: bool,

    pub repository: Repository,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Repository identity carried by a push event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,

    pub owner: Owner,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Repository owner. Push payloads carry `name`, API payloads carry `login`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Owner {
    /// Owner handle, preferring `name` over `login`
    pub fn handle(&self) -> &str {
        self.name
            .as_deref()
            .or(self.login.as_deref())
            .unwrap_or_default()
    }
}

impl PushEvent {
    /// Build a minimal push event
    pub fn new(reference: &str, owner: &str, repo: &str, after: &str) -> Self {
        Self {
            reference: reference.to_string(),
            before: String::new(),
            after: after.to_string(),
            created: false,
            deleted: false,
            repository: Repository {
                name: repo.to_string(),
                owner: Owner {
                    name: Some(owner.to_string()),
                    login: None,
                    extra: Map::new(),
                },
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    pub fn owner(&self) -> &str {
        self.repository.owner.handle()
    }

    pub fn repo_name(&self) -> &str {
        &self.repository.name
    }
}
