//! Trap receiver session.
//!
//! A [`Session`] wraps a [`TrapListener`](crate::listener::TrapListener)
//! task and a [`TrapBuffer`]: traps land in the buffer as they arrive
//! and consumers pull them in batches with [`Session::get_no_wait`],
//! which never blocks on the network.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::buffer::{DEFAULT_CAPACITY, TrapBuffer};
use crate::error::{Error, Result};
use crate::listener::{PacketHandler, TrapListener, TrapParams};
use crate::normalize::MultiResult;

/// One received notification: when it arrived, who sent it, and every
/// varbind it carried, normalized.
#[derive(Debug, Clone)]
pub struct ReceivedTrap {
    pub timestamp: SystemTime,
    pub source: SocketAddr,
    pub results: Vec<MultiResult>,
}

enum ListenState {
    New,
    Listening {
        local_addr: SocketAddr,
        shutdown: CancellationToken,
        task: JoinHandle<Result<()>>,
    },
    Closed,
}

/// A trap receiver bound to one local address.
///
/// Lifecycle: [`connect`](Session::connect) binds the socket and
/// starts the listener task; [`close`](Session::close) stops it and
/// waits for it to finish. Both are idempotent, and a closed session
/// may be connected again.
pub struct Session {
    host: String,
    port: u16,
    params: TrapParams,
    buffer: Arc<TrapBuffer>,
    state: Mutex<ListenState>,
}

impl Session {
    /// Create a session that will bind to `host:port`. Port 0 asks
    /// the kernel for an ephemeral port; see
    /// [`local_addr`](Session::local_addr) for the resolved one.
    pub fn new(host: impl Into<String>, port: u16, params: TrapParams) -> Self {
        Self::with_capacity(host, port, params, DEFAULT_CAPACITY)
    }

    /// Create a session with an explicit buffer capacity.
    pub fn with_capacity(
        host: impl Into<String>,
        port: u16,
        params: TrapParams,
        capacity: usize,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            params,
            buffer: Arc::new(TrapBuffer::new(capacity)),
            state: Mutex::new(ListenState::New),
        }
    }

    /// Bind the socket and start listening.
    ///
    /// Returns once the socket is bound and the listener task is
    /// receiving, so a trap sent after `connect` returns cannot race
    /// the bind. A bind failure surfaces here, not in the background.
    /// Calling this on a session that is already listening is a no-op.
    pub async fn connect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if let ListenState::Listening { .. } = *state {
            return Ok(());
        }

        let addr = self.resolve_bind_addr().await?;
        let listener = TrapListener::new(self.params.clone(), self.packet_handler());
        let shutdown = listener.shutdown_token();

        let (ready_tx, ready_rx) = oneshot::channel();
        // A receive error after a successful bind is fatal: the
        // session must never stay Listening over a dead socket.
        let task = tokio::spawn(async move {
            if let Err(error) = listener.listen(addr, ready_tx).await {
                tracing::error!(
                    target: "trapsink::session",
                    %error,
                    "listener failed after bind, terminating"
                );
                std::process::exit(74);
            }
            Ok(())
        });

        let local_addr = match ready_rx.await {
            Ok(Ok(local_addr)) => local_addr,
            Ok(Err(e)) => return Err(e),
            // Listener dropped the sender without reporting; treat as
            // a failed bind.
            Err(_) => {
                return Err(Error::io(std::io::Error::other(
                    "listener task exited before binding",
                )));
            }
        };

        *state = ListenState::Listening {
            local_addr,
            shutdown,
            task,
        };
        Ok(())
    }

    /// Drain everything currently buffered, oldest first. Returns
    /// [`Error::EmptyBuffer`] immediately when nothing is waiting, so
    /// pollers distinguish "nothing yet" without checking the length.
    ///
    /// Synchronous on purpose: consumers poll from wherever they like
    /// without touching the runtime.
    pub fn get_no_wait(&self) -> Result<Vec<ReceivedTrap>> {
        let traps = self.buffer.drain();
        if traps.is_empty() {
            return Err(Error::EmptyBuffer);
        }
        Ok(traps)
    }

    /// Number of traps currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Stop the listener and wait for its task to finish. Traps
    /// already buffered remain readable afterwards. A no-op when the
    /// session is not listening.
    pub async fn close(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let prev = std::mem::replace(&mut *state, ListenState::Closed);
        match prev {
            ListenState::Listening { shutdown, task, .. } => {
                shutdown.cancel();
                match task.await {
                    Ok(result) => result,
                    Err(e) => {
                        // Cancelled or panicked; nothing left to stop.
                        tracing::error!(
                            target: "trapsink::session",
                            error = %e,
                            "listener task aborted"
                        );
                        Ok(())
                    }
                }
            }
            ListenState::New | ListenState::Closed => Ok(()),
        }
    }

    /// The bound local address while listening.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match *self.state.lock().await {
            ListenState::Listening { local_addr, .. } => Some(local_addr),
            _ => None,
        }
    }

    /// Whether the session is currently listening.
    pub async fn is_listening(&self) -> bool {
        matches!(*self.state.lock().await, ListenState::Listening { .. })
    }

    async fn resolve_bind_addr(&self) -> Result<SocketAddr> {
        if let Ok(ip) = self.host.parse() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        let mut addrs = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(Error::io)?;
        addrs.next().ok_or_else(|| {
            Error::io(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("no addresses for {}", self.host),
            ))
        })
    }

    /// The handler the listener runs for each accepted packet:
    /// normalize every varbind, stamp the trap, and buffer it.
    fn packet_handler(&self) -> PacketHandler {
        let buffer = Arc::clone(&self.buffer);
        Arc::new(move |packet, source| {
            let mut results = Vec::with_capacity(packet.varbinds.len());
            for vb in &packet.varbinds {
                match MultiResult::build(vb.oid.clone(), &vb.value) {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        // An unmappable value means the normalization
                        // table itself is incomplete. Continuing would
                        // silently hand consumers partial traps, so
                        // stop the process instead.
                        tracing::error!(
                            target: "trapsink::session",
                            %source,
                            error = %e,
                            "cannot normalize varbind, aborting"
                        );
                        std::process::exit(70);
                    }
                }
            }

            let trap = ReceivedTrap {
                timestamp: SystemTime::now(),
                source,
                results,
            };
            if let Err(dropped) = buffer.offer(trap) {
                tracing::warn!(
                    target: "trapsink::session",
                    source = %dropped.source,
                    varbinds = dropped.results.len(),
                    capacity = buffer.capacity(),
                    "trap buffer full, dropping newest trap"
                );
            }
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lifecycle_idempotent() {
        let session = Session::new("127.0.0.1", 0, TrapParams::new());
        assert!(!session.is_listening().await);
        assert!(session.local_addr().await.is_none());

        // Close before connect is a no-op
        session.close().await.unwrap();

        session.connect().await.unwrap();
        assert!(session.is_listening().await);
        let addr = session.local_addr().await.unwrap();
        assert_ne!(addr.port(), 0);

        // Second connect keeps the same binding
        session.connect().await.unwrap();
        assert_eq!(session.local_addr().await, Some(addr));

        session.close().await.unwrap();
        assert!(!session.is_listening().await);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_failure_surfaces_from_connect() {
        // Binding an address that cannot exist locally fails fast
        let session = Session::new("192.0.2.55", 0, TrapParams::new());
        assert!(session.connect().await.is_err());
        assert!(!session.is_listening().await);
    }

    #[tokio::test]
    async fn test_get_no_wait_empty() {
        let session = Session::new("127.0.0.1", 0, TrapParams::new());
        assert!(matches!(session.get_no_wait(), Err(Error::EmptyBuffer)));
        session.connect().await.unwrap();
        assert!(matches!(session.get_no_wait(), Err(Error::EmptyBuffer)));
        session.close().await.unwrap();
    }
}
