//! HTTP ingestion and invocation endpoints

pub mod handlers;
pub mod serve;
pub mod state;
