//! Network links the connectivity supervisor can drive
//!
//! - `TcpProbeLink`: association = a held TCP connection to a gateway
//! - `SimulatedLink`: scripted association for development and tests

pub mod simulated;
pub mod tcp;
pub mod traits;

pub use simulated::{LinkControl, SimulatedLink};
pub use tcp::TcpProbeLink;
pub use traits::{Credentials, LinkStatus, NetworkLink};
