//! Link trait abstraction for pluggable network backends

use std::net::IpAddr;

/// Status reported by the network layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// No association and none in progress
    Disconnected,
    /// Association in progress
    Connecting,
    /// Associated and usable
    Connected,
    /// Last association attempt failed
    Failed,
}

impl LinkStatus {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            LinkStatus::Disconnected => 0,
            LinkStatus::Connecting => 1,
            LinkStatus::Connected => 2,
            LinkStatus::Failed => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => LinkStatus::Connecting,
            2 => LinkStatus::Connected,
            3 => LinkStatus::Failed,
            _ => LinkStatus::Disconnected,
        }
    }
}

/// Credentials used to associate with the network
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub ssid: String,
    pub password: String,
}

/// A network link the supervisor can associate and poll
///
/// All methods return immediately; association progress is observed
/// through [`NetworkLink::status`].
pub trait NetworkLink: Send {
    /// Start associating with the given credentials
    fn begin(&mut self, credentials: &Credentials);

    /// Drop any association or association attempt
    fn disconnect(&mut self);

    /// Current status of the link
    fn status(&self) -> LinkStatus;

    /// Address of this node on the link, when connected
    fn local_addr(&self) -> Option<IpAddr>;

    /// Human-readable name for this link
    fn name(&self) -> &'static str;
}

impl<T: NetworkLink + ?Sized> NetworkLink for Box<T> {
    fn begin(&mut self, credentials: &Credentials) {
        (**self).begin(credentials)
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }

    fn status(&self) -> LinkStatus {
        (**self).status()
    }

    fn local_addr(&self) -> Option<IpAddr> {
        (**self).local_addr()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
