//! Line-delimited JSON control transport.
//!
//! One controller at a time drives the view: an accept loop hands each
//! connection to a reader thread, which decodes commands and forwards
//! them to the view loop over a bounded channel. Outbound events
//! (SCREENSHOT_RESULT) travel back through a per-connection writer
//! thread. Later connections are refused while a controller is active.

use crate::control::controller::{ControlEndpoint, ControlMsg};
use crate::control::protocol::{self, Command};
use anyhow::Result;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};

/// Running server: the endpoint the view loop drains plus the accept
/// thread handle.
pub struct ControlServerHandle {
    /// Message stream for the view loop.
    pub endpoint: ControlEndpoint,
    #[allow(dead_code)]
    join: thread::JoinHandle<()>,
}

#[derive(Clone)]
struct ControlLog {
    writer: Arc<Mutex<BufWriter<std::fs::File>>>,
}

impl ControlLog {
    fn open(path: &PathBuf) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    fn write_json(&self, value: &Value) {
        if let Ok(mut guard) = self.writer.lock() {
            if serde_json::to_writer(&mut *guard, value).is_ok() {
                let _ = guard.write_all(b"\n");
                let _ = guard.flush();
            }
        }
    }
}

/// The control server entry points.
pub struct ControlServer;

impl ControlServer {
    /// Listen for controllers on a TCP address.
    pub fn start(addr: SocketAddr, log_path: Option<PathBuf>) -> Result<ControlServerHandle> {
        let (to_view_tx, to_view_rx) = mpsc::sync_channel::<ControlMsg>(256);

        let listener = TcpListener::bind(addr)?;
        let log = open_log(log_path);
        let controller_active = Arc::new(AtomicBool::new(false));

        let join = thread::spawn(move || {
            tracing::info!(addr = %addr, "Control server listening");
            loop {
                let (stream, peer) = match listener.accept() {
                    Ok(conn) => conn,
                    Err(err) => {
                        tracing::warn!(%err, "Control server accept failed");
                        continue;
                    }
                };

                let log = log.clone();
                let controller_active = Arc::clone(&controller_active);
                let to_view_tx = to_view_tx.clone();
                thread::spawn(move || {
                    handle_connection(stream, peer.to_string(), log, controller_active, to_view_tx);
                });
            }
        });

        Ok(ControlServerHandle {
            endpoint: ControlEndpoint { rx: to_view_rx },
            join,
        })
    }

    /// Listen for controllers on a unix domain socket.
    #[cfg(unix)]
    pub fn start_uds(path: PathBuf, log_path: Option<PathBuf>) -> Result<ControlServerHandle> {
        use std::os::unix::fs::FileTypeExt;

        let (to_view_tx, to_view_rx) = mpsc::sync_channel::<ControlMsg>(256);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if path.exists() {
            let meta = std::fs::metadata(&path)?;
            if meta.file_type().is_socket() {
                std::fs::remove_file(&path)?;
            } else {
                anyhow::bail!(
                    "--control-uds path exists and is not a socket: {}",
                    path.display()
                );
            }
        }

        let listener = UnixListener::bind(&path)?;
        let log = open_log(log_path);
        let controller_active = Arc::new(AtomicBool::new(false));

        let join = thread::spawn(move || {
            tracing::info!(path = %path.display(), "Control server listening (uds)");
            loop {
                let (stream, _peer) = match listener.accept() {
                    Ok(conn) => conn,
                    Err(err) => {
                        tracing::warn!(%err, "Control server accept failed");
                        continue;
                    }
                };

                let log = log.clone();
                let controller_active = Arc::clone(&controller_active);
                let to_view_tx = to_view_tx.clone();
                thread::spawn(move || {
                    handle_connection(stream, "uds".to_string(), log, controller_active, to_view_tx);
                });
            }
        });

        Ok(ControlServerHandle {
            endpoint: ControlEndpoint { rx: to_view_rx },
            join,
        })
    }
}

fn open_log(log_path: Option<PathBuf>) -> Option<ControlLog> {
    let path = log_path?;
    match ControlLog::open(&path) {
        Ok(log) => Some(log),
        Err(err) => {
            tracing::warn!(%err, path = %path.display(), "Failed to open control log");
            None
        }
    }
}

trait ControlStream: Read + Write + Send + 'static {
    fn try_clone(&self) -> std::io::Result<Self>
    where
        Self: Sized;
    fn shutdown(&self, how: Shutdown) -> std::io::Result<()>;
}

impl ControlStream for TcpStream {
    fn try_clone(&self) -> std::io::Result<Self> {
        TcpStream::try_clone(self)
    }

    fn shutdown(&self, how: Shutdown) -> std::io::Result<()> {
        TcpStream::shutdown(self, how)
    }
}

#[cfg(unix)]
impl ControlStream for UnixStream {
    fn try_clone(&self) -> std::io::Result<Self> {
        UnixStream::try_clone(self)
    }

    fn shutdown(&self, how: Shutdown) -> std::io::Result<()> {
        UnixStream::shutdown(self, how)
    }
}

fn handle_connection<S: ControlStream>(
    stream: S,
    peer: String,
    log: Option<ControlLog>,
    controller_active: Arc<AtomicBool>,
    to_view: SyncSender<ControlMsg>,
) {
    let claimed = controller_active
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok();

    if !claimed {
        tracing::warn!(peer = %peer, "Refusing controller: one already connected");
        let _ = stream.shutdown(Shutdown::Both);
        return;
    }

    if let Some(log) = &log {
        log.write_json(&serde_json::json!({"event": "connect", "peer": peer.as_str()}));
    }
    let _ = to_view.try_send(ControlMsg::Connected);

    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(err) => {
            tracing::warn!(%err, "Failed to clone control stream");
            controller_active.store(false, Ordering::SeqCst);
            return;
        }
    });

    // Outbound events drain through a dedicated writer thread; the
    // view loop only ever holds the sending half.
    let (event_tx, event_rx) = mpsc::sync_channel::<Value>(16);
    let writer_log = log.clone();
    let writer_peer = peer.clone();
    let writer = thread::spawn(move || {
        let mut writer = BufWriter::new(stream);
        while let Ok(event) = event_rx.recv() {
            if let Some(log) = &writer_log {
                log.write_json(&serde_json::json!({
                    "event": "send",
                    "peer": writer_peer.as_str(),
                    "type": event.get("type").cloned().unwrap_or(Value::Null),
                }));
            }
            if serde_json::to_writer(&mut writer, &event).is_err()
                || writer.write_all(b"\n").is_err()
                || writer.flush().is_err()
            {
                break;
            }
        }
    });

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break, // disconnect
            Ok(n) => {
                if n > protocol::MAX_LINE_BYTES {
                    tracing::warn!(peer = %peer, bytes = n, "Dropping controller: line too large");
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(%err, "Control read failed");
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let command = protocol::decode_command(trimmed);
        if let Some(log) = &log {
            log.write_json(&serde_json::json!({
                "event": "recv",
                "peer": peer.as_str(),
                "command": format!("{command:?}"),
            }));
        }
        if command == Command::Unknown {
            tracing::debug!(peer = %peer, line = trimmed, "Ignoring unrecognized command");
        }

        match to_view.try_send(ControlMsg::Command {
            command,
            respond_to: event_tx.clone(),
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(peer = %peer, "Control channel full, dropping command");
            }
            Err(TrySendError::Disconnected(_)) => break,
        }
    }

    if let Some(log) = &log {
        log.write_json(&serde_json::json!({"event": "disconnect", "peer": peer.as_str()}));
    }
    let _ = to_view.try_send(ControlMsg::Disconnected);
    controller_active.store(false, Ordering::SeqCst);
    drop(event_tx);
    let _ = writer.join();
}
