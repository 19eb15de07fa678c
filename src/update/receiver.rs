//! OTA image receiver
//!
//! Wire format: one header line `<password> <app|fs> <size>\n` followed by
//! exactly `size` bytes of image. The image is staged as
//! `<staging_dir>/<kind>.bin.part` and renamed to `<kind>.bin` once complete.
//! The uploader gets `OK\n` or `ERR <reason>\n` back.
//!
//! Every read is bounded by `receive_timeout`; a stalled uploader fails the
//! session instead of holding the receiver.

use super::UpdateEvent;
use anyhow::{Context, Result};
use smarthome_shared::{UpdateFailure, UpdateKind};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::{self, File};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Longest accepted header line
const MAX_HEADER_LEN: u64 = 256;

const CHUNK_SIZE: usize = 1024;

/// How uploads are authenticated, staged and paced
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub password: String,
    pub staging_dir: PathBuf,
    /// Longest wait for the header or for the next image chunk
    pub receive_timeout: Duration,
}

/// Accepts one upload at a time and forwards protocol callbacks
pub struct OtaReceiver {
    listener: TcpListener,
    settings: UploadSettings,
    events: mpsc::Sender<UpdateEvent>,
}

impl OtaReceiver {
    pub async fn bind(
        addr: &str,
        settings: UploadSettings,
        events: mpsc::Sender<UpdateEvent>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind OTA receiver on {}", addr))?;

        Ok(Self {
            listener,
            settings,
            events,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve uploads until the event channel closes
    pub async fn run(self) -> Result<()> {
        info!("OTA receiver listening on {}", self.local_addr()?);

        while !self.events.is_closed() {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("OTA accept failed: {}", e);
                    continue;
                }
            };

            debug!("OTA upload from {}", peer);
            match handle_upload(stream, &self.settings, &self.events).await {
                Ok(kind) => info!("OTA {} image from {} staged", kind, peer),
                Err(reason) => warn!("OTA upload from {} failed: {}", peer, reason),
            }
        }

        Ok(())
    }
}

/// Receive one upload over `stream` and reply to the uploader
pub async fn handle_upload<S>(
    stream: S,
    settings: &UploadSettings,
    events: &mpsc::Sender<UpdateEvent>,
) -> std::result::Result<UpdateKind, UpdateFailure>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    let result = receive(&mut reader, settings, events).await;
    if let Err(reason) = result {
        let _ = events.send(UpdateEvent::Error(reason)).await;
    }

    let reply = match &result {
        Ok(_) => "OK\n".to_string(),
        Err(reason) => format!("ERR {}\n", reason),
    };
    // The uploader may already be gone
    let _ = writer.write_all(reply.as_bytes()).await;
    let _ = writer.shutdown().await;

    result
}

async fn receive<R>(
    reader: &mut R,
    settings: &UploadSettings,
    events: &mpsc::Sender<UpdateEvent>,
) -> std::result::Result<UpdateKind, UpdateFailure>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let mut limited = (&mut *reader).take(MAX_HEADER_LEN);
    match timeout(settings.receive_timeout, limited.read_line(&mut line)).await {
        Ok(Ok(_)) => {}
        Ok(Err(_)) | Err(_) => return Err(UpdateFailure::BeginFailed),
    }

    let (secret, kind, size) = parse_header(&line).ok_or(UpdateFailure::BeginFailed)?;
    if secret != settings.password {
        return Err(UpdateFailure::AuthRejected);
    }

    let _ = events.send(UpdateEvent::Start(kind)).await;

    let part_path = settings
        .staging_dir
        .join(format!("{}.bin.part", file_stem(kind)));
    let final_path = settings.staging_dir.join(format!("{}.bin", file_stem(kind)));

    let mut file = File::create(&part_path)
        .await
        .map_err(|_| UpdateFailure::BeginFailed)?;

    match copy_image(reader, &mut file, size, settings.receive_timeout, events).await {
        Ok(()) => {}
        Err(reason) => {
            drop(file);
            let _ = fs::remove_file(&part_path).await;
            return Err(reason);
        }
    }

    file.flush().await.map_err(|_| UpdateFailure::FinalizeFailed)?;
    file.sync_all().await.map_err(|_| UpdateFailure::FinalizeFailed)?;
    drop(file);
    fs::rename(&part_path, &final_path)
        .await
        .map_err(|_| UpdateFailure::FinalizeFailed)?;

    let _ = events.send(UpdateEvent::End).await;
    Ok(kind)
}

async fn copy_image<R>(
    reader: &mut R,
    file: &mut File,
    size: u32,
    receive_timeout: Duration,
    events: &mpsc::Sender<UpdateEvent>,
) -> std::result::Result<(), UpdateFailure>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut received: u32 = 0;

    while received < size {
        let want = buf.len().min((size - received) as usize);
        let n = match timeout(receive_timeout, reader.read(&mut buf[..want])).await {
            Ok(Ok(0)) => return Err(UpdateFailure::ReceiveTruncated),
            Ok(Ok(n)) => n,
            Ok(Err(_)) => return Err(UpdateFailure::ConnectionDropped),
            Err(_) => {
                debug!("OTA image stalled after {} of {} bytes", received, size);
                return Err(UpdateFailure::ReceiveTruncated);
            }
        };

        // A write error leaves the image incomplete
        file.write_all(&buf[..n])
            .await
            .map_err(|_| UpdateFailure::ReceiveTruncated)?;

        received += n as u32;
        let _ = events
            .send(UpdateEvent::Progress {
                current: received,
                total: size,
            })
            .await;
    }

    Ok(())
}

fn parse_header(line: &str) -> Option<(&str, UpdateKind, u32)> {
    let mut parts = line.split_whitespace();
    let secret = parts.next()?;
    let kind = match parts.next()? {
        "app" => UpdateKind::Application,
        "fs" => UpdateKind::Filesystem,
        _ => return None,
    };
    let size = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((secret, kind, size))
}

fn file_stem(kind: UpdateKind) -> &'static str {
    match kind {
        UpdateKind::Application => "app",
        UpdateKind::Filesystem => "fs",
    }
}
