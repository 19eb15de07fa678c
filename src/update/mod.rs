//! OTA firmware update handling
//!
//! The receiver task speaks the transfer protocol and forwards each callback
//! as an [`UpdateEvent`]; the lifecycle manager consumes them on the control
//! loop.

mod lifecycle;
mod receiver;

pub use lifecycle::UpdateLifecycleManager;
pub use receiver::{handle_upload, OtaReceiver, UploadSettings};

use smarthome_shared::{UpdateFailure, UpdateKind};

/// One transfer protocol callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent {
    Start(UpdateKind),
    Progress { current: u32, total: u32 },
    End,
    Error(UpdateFailure),
}
