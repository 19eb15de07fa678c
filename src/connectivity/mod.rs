//! Connectivity supervision for the node's network link
//!
//! This module handles:
//! - Initial association with a bounded attempt budget
//! - Loss detection on every loop iteration
//! - Reconnection with a cool-down after an exhausted attempt

mod supervisor;

pub use supervisor::{ConnectivitySupervisor, RetryPolicy};
