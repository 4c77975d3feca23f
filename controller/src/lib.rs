//! Pipewright Controller Library
//!
//! Reconciles per-branch pipeline stacks from source pushes and watches them
//! to completion within a bounded execution budget.

pub mod app;
pub mod authn;
pub mod cleaner;
pub mod deploy;
pub mod errors;
pub mod http;
pub mod logs;
pub mod models;
pub mod notifier;
pub mod server;
pub mod services;
pub mod utils;
pub mod workers;
