//! API models

pub mod pipeline;
pub mod push;
pub mod queue;
pub mod resource;
pub mod status;
