//! Secrets, webhook signatures and invocation tokens

pub mod bearer;
pub mod secrets;
pub mod signature;
