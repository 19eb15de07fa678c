//! Simulated link for development hosts
//!
//! Associates after a configurable number of status polls while the network
//! is marked reachable. A [`LinkControl`] handle flips reachability and
//! counts calls, which is how loss and recovery are exercised without a radio.

use crate::link::traits::{Credentials, LinkStatus, NetworkLink};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct ControlInner {
    reachable: AtomicBool,
    begins: AtomicU32,
    disconnects: AtomicU32,
    status_polls: AtomicU32,
}

/// Shared handle for steering a [`SimulatedLink`]
#[derive(Debug, Clone)]
pub struct LinkControl {
    inner: Arc<ControlInner>,
}

impl LinkControl {
    fn new(reachable: bool) -> Self {
        Self {
            inner: Arc::new(ControlInner {
                reachable: AtomicBool::new(reachable),
                begins: AtomicU32::new(0),
                disconnects: AtomicU32::new(0),
                status_polls: AtomicU32::new(0),
            }),
        }
    }

    /// Mark the network reachable or not
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        self.inner.reachable.load(Ordering::SeqCst)
    }

    /// Number of `begin` calls so far
    pub fn begins(&self) -> u32 {
        self.inner.begins.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls so far
    pub fn disconnects(&self) -> u32 {
        self.inner.disconnects.load(Ordering::SeqCst)
    }

    /// Number of `status` calls so far
    pub fn status_polls(&self) -> u32 {
        self.inner.status_polls.load(Ordering::SeqCst)
    }
}

pub struct SimulatedLink {
    control: LinkControl,
    associate_after: u32,
    status: AtomicU8,
    polls_since_begin: AtomicU32,
}

impl SimulatedLink {
    /// Create a reachable link that associates on poll `associate_after + 1`
    pub fn new(associate_after: u32) -> Self {
        Self::with_reachability(associate_after, true)
    }

    pub fn with_reachability(associate_after: u32, reachable: bool) -> Self {
        Self {
            control: LinkControl::new(reachable),
            associate_after,
            status: AtomicU8::new(LinkStatus::Disconnected.to_u8()),
            polls_since_begin: AtomicU32::new(0),
        }
    }

    /// Get a handle for steering this link
    pub fn control(&self) -> LinkControl {
        self.control.clone()
    }

    fn set_status(&self, status: LinkStatus) {
        self.status.store(status.to_u8(), Ordering::SeqCst);
    }

    fn current(&self) -> LinkStatus {
        LinkStatus::from_u8(self.status.load(Ordering::SeqCst))
    }
}

impl NetworkLink for SimulatedLink {
    fn begin(&mut self, _credentials: &Credentials) {
        self.control.inner.begins.fetch_add(1, Ordering::SeqCst);
        self.polls_since_begin.store(0, Ordering::SeqCst);
        self.set_status(LinkStatus::Connecting);
    }

    fn disconnect(&mut self) {
        self.control.inner.disconnects.fetch_add(1, Ordering::SeqCst);
        self.set_status(LinkStatus::Disconnected);
    }

    fn status(&self) -> LinkStatus {
        self.control.inner.status_polls.fetch_add(1, Ordering::SeqCst);
        let reachable = self.control.is_reachable();

        match self.current() {
            LinkStatus::Connecting => {
                let polls = self.polls_since_begin.fetch_add(1, Ordering::SeqCst) + 1;
                if reachable && polls > self.associate_after {
                    self.set_status(LinkStatus::Connected);
                }
            }
            LinkStatus::Connected if !reachable => {
                self.set_status(LinkStatus::Disconnected);
            }
            _ => {}
        }

        self.current()
    }

    fn local_addr(&self) -> Option<IpAddr> {
        (self.current() == LinkStatus::Connected).then_some(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_associates_after_polls() {
        let mut link = SimulatedLink::new(2);
        link.begin(&Credentials::default());

        assert_eq!(link.status(), LinkStatus::Connecting);
        assert_eq!(link.status(), LinkStatus::Connecting);
        assert_eq!(link.status(), LinkStatus::Connected);
        assert!(link.local_addr().is_some());
    }

    #[test]
    fn test_unreachable_never_associates() {
        let mut link = SimulatedLink::with_reachability(0, false);
        link.begin(&Credentials::default());

        for _ in 0..10 {
            assert_eq!(link.status(), LinkStatus::Connecting);
        }
        assert!(link.local_addr().is_none());
    }

    #[test]
    fn test_loss_and_counters() {
        let mut link = SimulatedLink::new(0);
        let control = link.control();

        link.begin(&Credentials::default());
        assert_eq!(link.status(), LinkStatus::Connected);

        control.set_reachable(false);
        assert_eq!(link.status(), LinkStatus::Disconnected);

        link.disconnect();
        assert_eq!(control.begins(), 1);
        assert_eq!(control.disconnects(), 1);
        assert_eq!(control.status_polls(), 2);
    }
}
