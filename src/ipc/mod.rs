//! Control socket between the settings window and the daemon
//!
//! Length-prefixed JSON over a Unix domain socket, one request and one
//! response per connection. The daemon is the only writer of settings.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants::ipc;

mod messages;
pub use messages::{ControlRequest, ControlResponse};

/// Get default socket path (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir)
            .join(ipc::SOCKET_DIR)
            .join(ipc::SOCKET_NAME));
    }

    // Fallback to cache dir
    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(ipc::SOCKET_DIR).join(ipc::SOCKET_NAME))
}

fn io_timeout() -> Option<Duration> {
    Some(Duration::from_millis(ipc::IO_TIMEOUT_MS))
}

/// Client side, used by the settings window
pub struct ControlClient {
    path: PathBuf,
}

impl ControlClient {
    pub fn new() -> Result<Self> {
        Ok(Self::at(default_socket_path()?))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Send `req` on a fresh connection and wait for the reply
    pub fn request(&self, req: &ControlRequest) -> Result<ControlResponse> {
        let mut stream = UnixStream::connect(&self.path).context(format!(
            "Failed to connect to daemon at {} (is `focus-veil run` running?)",
            self.path.display()
        ))?;
        stream
            .set_read_timeout(io_timeout())
            .context("Failed to set socket read timeout")?;
        stream
            .set_write_timeout(io_timeout())
            .context("Failed to set socket write timeout")?;

        write_message(&mut stream, req)?;
        read_message(&mut stream)
    }
}

/// One accepted connection awaiting its response
pub struct ControlConnection {
    stream: UnixStream,
}

impl ControlConnection {
    pub fn recv_request(&mut self) -> Result<ControlRequest> {
        read_message(&mut self.stream)
    }

    pub fn respond(mut self, response: &ControlResponse) -> Result<()> {
        write_message(&mut self.stream, response)
    }
}

/// Listener owned by the daemon
pub struct ControlServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl ControlServer {
    /// Create server and bind to default socket path
    pub fn bind() -> Result<Self> {
        let socket_path = default_socket_path()?;
        Self::bind_to(socket_path)
    }

    /// Create server and bind to specific socket path
    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create socket directory: {}", parent.display()))?;
        }

        // Remove stale socket if exists
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .context(format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .context(format!("Failed to bind socket at {}", socket_path.display()))?;
        // Polled alongside the X11 connection
        listener
            .set_nonblocking(true)
            .context("Failed to make control socket non-blocking")?;

        // Set permissions to 0700 (owner only)
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        debug!(path = %socket_path.display(), "Control socket bound");
        Ok(Self {
            listener,
            socket_path,
        })
    }

    pub fn listener(&self) -> &UnixListener {
        &self.listener
    }

    /// Drain every connection that is ready right now
    pub fn accept_pending(&self) -> Vec<ControlConnection> {
        let mut pending = Vec::new();
        loop {
            match self.listener.accept() {
                Ok((stream, _addr)) => {
                    let configured = stream
                        .set_nonblocking(false)
                        .and_then(|()| stream.set_read_timeout(io_timeout()))
                        .and_then(|()| stream.set_write_timeout(io_timeout()));
                    match configured {
                        Ok(()) => pending.push(ControlConnection { stream }),
                        Err(e) => warn!(error = %e, "Failed to configure control connection"),
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!(error = %e, "Failed to accept control connection");
                    break;
                }
            }
        }
        pending
    }

    /// Get socket path
    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        // Clean up socket file
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Write length-prefixed message to stream
fn write_message<T: Serialize>(stream: &mut impl Write, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;
    if json.len() > ipc::MAX_MESSAGE_SIZE {
        return Err(anyhow!(
            "Message too large: {} bytes (max: {})",
            json.len(),
            ipc::MAX_MESSAGE_SIZE
        ));
    }

    // Write length prefix (u32 little-endian)
    let len = json.len() as u32;
    stream
        .write_all(&len.to_le_bytes())
        .context("Failed to write message length")?;
    stream
        .write_all(&json)
        .context("Failed to write message payload")?;
    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read length-prefixed message from stream
fn read_message<T: for<'de> Deserialize<'de>>(stream: &mut impl Read) -> Result<T> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    // Sanity check (prevent DoS via huge allocation)
    if len > ipc::MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", len, ipc::MAX_MESSAGE_SIZE));
    }

    let mut json_buf = vec![0u8; len];
    stream
        .read_exact(&mut json_buf)
        .context("Failed to read message payload")?;

    serde_json::from_slice(&json_buf).context("Failed to deserialize message from JSON")
}
