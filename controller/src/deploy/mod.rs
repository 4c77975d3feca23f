//! Stack reconciliation and watch controller

pub mod batch;
pub mod context;
pub mod continuation;
pub mod executor;
pub mod fsm;
pub mod params;
pub mod reconciler;
pub mod refs;
pub mod status;
pub mod watch;
