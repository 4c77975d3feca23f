//! HTTP client and collaborator adapters

pub mod artifacts;
pub mod client;
pub mod github;
pub mod invoker;
pub mod pipelines;
pub mod responder;
pub mod stacks;
