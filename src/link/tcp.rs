//! TCP reachability link
//!
//! Treats a live TCP connection to the configured gateway as the network
//! association. A watcher task owns the stream and publishes its status
//! through an atomic, so `status()` never blocks the control loop. A failed
//! connect is retried until the link is disconnected or begun again.

use crate::link::traits::{Credentials, LinkStatus, NetworkLink};
use smarthome_shared::policy::CONNECT_POLL_INTERVAL_MS;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

/// Status and local address shared with the watcher task
#[derive(Default)]
struct ProbeState {
    status: AtomicU8,
    local_addr: Mutex<Option<IpAddr>>,
}

impl ProbeState {
    fn set_status(&self, status: LinkStatus) {
        self.status.store(status.to_u8(), Ordering::SeqCst);
    }

    fn status(&self) -> LinkStatus {
        LinkStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    fn set_local_addr(&self, addr: Option<IpAddr>) {
        if let Ok(mut guard) = self.local_addr.lock() {
            *guard = addr;
        }
    }

    fn local_addr(&self) -> Option<IpAddr> {
        self.local_addr.lock().ok().and_then(|guard| *guard)
    }
}

/// Link that associates by holding a TCP connection to a gateway
pub struct TcpProbeLink {
    gateway: String,
    connect_timeout: Duration,
    retry_delay: Duration,
    state: Arc<ProbeState>,
    watcher: Option<JoinHandle<()>>,
}

impl TcpProbeLink {
    /// Create a link probing `gateway` (host:port)
    pub fn new(gateway: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            gateway: gateway.into(),
            connect_timeout,
            retry_delay: Duration::from_millis(CONNECT_POLL_INTERVAL_MS),
            state: Arc::new(ProbeState::default()),
            watcher: None,
        }
    }

    /// Set the pause between failed connects
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    fn stop_watcher(&mut self) {
        if let Some(handle) = self.watcher.take() {
            handle.abort();
        }
    }
}

impl NetworkLink for TcpProbeLink {
    fn begin(&mut self, credentials: &Credentials) {
        self.stop_watcher();
        // A fresh state per attempt keeps a stale watcher from publishing
        self.state = Arc::new(ProbeState::default());
        self.state.set_status(LinkStatus::Connecting);

        debug!("Probing gateway {} for network {}", self.gateway, credentials.ssid);

        let gateway = self.gateway.clone();
        let connect_timeout = self.connect_timeout;
        let retry_delay = self.retry_delay;
        let state = self.state.clone();
        self.watcher = Some(tokio::spawn(async move {
            watch_gateway(gateway, connect_timeout, retry_delay, state).await;
        }));
    }

    fn disconnect(&mut self) {
        self.stop_watcher();
        self.state = Arc::new(ProbeState::default());
    }

    fn status(&self) -> LinkStatus {
        self.state.status()
    }

    fn local_addr(&self) -> Option<IpAddr> {
        self.state.local_addr()
    }

    fn name(&self) -> &'static str {
        "tcp-probe"
    }
}

impl Drop for TcpProbeLink {
    fn drop(&mut self) {
        self.stop_watcher();
    }
}

/// Connect to the gateway, retrying until it answers, and hold the
/// connection until it closes
async fn watch_gateway(
    gateway: String,
    connect_timeout: Duration,
    retry_delay: Duration,
    state: Arc<ProbeState>,
) {
    let mut stream = loop {
        match timeout(connect_timeout, TcpStream::connect(&gateway)).await {
            Ok(Ok(stream)) => break stream,
            Ok(Err(e)) => debug!("Gateway {} unreachable: {}", gateway, e),
            Err(_) => debug!("Gateway {} connect timed out", gateway),
        }
        state.set_status(LinkStatus::Failed);
        tokio::time::sleep(retry_delay).await;
    };

    state.set_local_addr(stream.local_addr().ok().map(|addr| addr.ip()));
    state.set_status(LinkStatus::Connected);

    // Anything the gateway sends is discarded; only closure matters
    let mut buf = vec![0u8; 512];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                debug!("Gateway {} closed connection", gateway);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!("Gateway {} read error: {}", gateway, e);
                break;
            }
        }
    }

    state.set_local_addr(None);
    state.set_status(LinkStatus::Disconnected);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn wait_for(link: &TcpProbeLink, wanted: LinkStatus) -> bool {
        for _ in 0..200 {
            if link.status() == wanted {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_connects_and_detects_loss() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut link = TcpProbeLink::new(addr.to_string(), Duration::from_secs(1));
        assert_eq!(link.status(), LinkStatus::Disconnected);

        link.begin(&Credentials::default());
        let (socket, _) = listener.accept().await.unwrap();

        assert!(wait_for(&link, LinkStatus::Connected).await);
        assert!(link.local_addr().is_some());

        drop(socket);
        assert!(wait_for(&link, LinkStatus::Disconnected).await);
        assert!(link.local_addr().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_gateway_fails() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut link = TcpProbeLink::new(addr.to_string(), Duration::from_secs(1));
        link.begin(&Credentials::default());
        assert!(wait_for(&link, LinkStatus::Failed).await);
    }

    #[tokio::test]
    async fn test_gateway_coming_up_late_is_picked_up() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut link = TcpProbeLink::new(addr.to_string(), Duration::from_secs(1))
            .with_retry_delay(Duration::from_millis(10));
        link.begin(&Credentials::default());
        assert!(wait_for(&link, LinkStatus::Failed).await);

        let listener = TcpListener::bind(addr).await.unwrap();
        let _socket = listener.accept().await.unwrap();
        assert!(wait_for(&link, LinkStatus::Connected).await);
    }

    #[tokio::test]
    async fn test_disconnect_resets_status() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut link = TcpProbeLink::new(addr.to_string(), Duration::from_secs(1));
        link.begin(&Credentials::default());
        let _socket = listener.accept().await.unwrap();
        assert!(wait_for(&link, LinkStatus::Connected).await);

        link.disconnect();
        assert_eq!(link.status(), LinkStatus::Disconnected);
        assert_eq!(link.name(), "tcp-probe");
    }
}
