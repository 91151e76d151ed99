//! Per-connection request loop.
//!
//! # Connection Lifecycle
//!
//! ```text
//! 1. Client connects; the server spawns a session thread
//! 2. Each request line is dispatched to the shared estimator
//! 3. Each request gets exactly one response line
//! 4. The loop ends on disconnect or server shutdown
//! ```
//!
//! The read timeout lets the loop notice shutdown while a client is idle.

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::ServerSection;
use crate::error::{Result, ServerError};
use crate::protocol::{Action, ErrorResponse, Request, Response, encode};
use jaal_pose::Estimator;

/// Estimator shared by every connection.
pub type SharedEstimator = Arc<Mutex<Box<dyn Estimator>>>;

/// Poll interval for the shutdown flag while waiting for input.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Requests longer than this are rejected and the connection closed.
const MAX_LINE_BYTES: usize = 1 << 20;

/// Serves one client.
pub struct Session {
    estimator: SharedEstimator,
    default_particles: usize,
    max_particles: usize,
    running: Arc<AtomicBool>,
}

impl Session {
    /// Create a session over the shared estimator, with particle limits
    /// taken from `server`.
    pub fn new(estimator: SharedEstimator, server: &ServerSection, running: Arc<AtomicBool>) -> Self {
        Self {
            estimator,
            default_particles: server.default_particles,
            max_particles: server.max_particles,
            running,
        }
    }

    /// Answer one request line. Failures become error replies.
    pub fn handle_line(&self, line: &str) -> String {
        let reply = Request::parse(line).and_then(|req| self.dispatch(&req));
        match reply {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Request {:?} failed: {}", line.trim(), e);
                let error = ErrorResponse { error: e.to_string() };
                encode(&error).unwrap_or_else(|_| r#"{"error":"internal"}"#.to_string())
            }
        }
    }

    fn dispatch(&self, req: &Request) -> Result<String> {
        let action = req.action()?;
        let mut estimator = self.estimator.lock();
        let parts = match action {
            Action::Init => {
                let n = req.num_particles.unwrap_or(self.default_particles);
                if n > self.max_particles {
                    return Err(ServerError::Protocol(format!(
                        "num_particles {} exceeds the limit of {}",
                        n, self.max_particles
                    )));
                }
                log::info!("init: {} particles, informed = {}", n, req.informed());
                estimator.init(n, req.informed())?
            }
            Action::Update => {
                log::debug!("update");
                estimator.update()?
            }
            Action::Estimate => {
                log::debug!("estimate");
                estimator.estimate()?
            }
        };
        encode(&Response::new(estimator.name(), parts))
    }

    /// Serve `stream` until the client disconnects or the server stops.
    pub fn run(&self, stream: TcpStream) -> Result<()> {
        let peer = stream.peer_addr()?;
        if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
            log::warn!("Failed to set read timeout: {}", e);
        }
        let mut writer = stream.try_clone()?;
        let mut reader = BufReader::new(stream);
        let mut line = String::new();

        while self.running.load(Ordering::Relaxed) {
            // Never buffer more than one byte past the limit
            let budget = (MAX_LINE_BYTES + 1).saturating_sub(line.len()) as u64;
            match reader.by_ref().take(budget).read_line(&mut line) {
                Ok(_) if line.len() > MAX_LINE_BYTES && !line.ends_with('\n') => {
                    log::warn!("Dropping {}: request exceeds {} bytes", peer, MAX_LINE_BYTES);
                    break;
                }
                Ok(0) => {
                    log::debug!("{} closed the connection", peer);
                    break;
                }
                Ok(_) => {
                    if !line.trim().is_empty() {
                        let mut reply = self.handle_line(&line);
                        reply.push('\n');
                        writer.write_all(reply.as_bytes())?;
                        writer.flush()?;
                    }
                    line.clear();
                }
                // Partial input stays in `line` until the rest arrives
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
