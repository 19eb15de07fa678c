//! Command dispatch for the node
//!
//! This module handles:
//! - The fixed table of command names and device actions
//! - Looking up and executing one command at a time
//! - Reporting sensor readings back to the caller

mod dispatcher;
pub mod handlers;
mod table;

pub use dispatcher::{CommandDispatcher, DispatchResult, RejectReason};
pub use table::{ActionTable, ActionTableBuilder, DeviceAction};
