//! The client registry and broadcaster.
//!
//! One mutex over an insertion-ordered `Vec` is the whole concurrency
//! discipline here: contention is a handful of drawing peers, critical
//! sections never perform I/O, and broadcast iterates a point-in-time
//! snapshot taken under the lock.

use bytes::Bytes;
use parking_lot::Mutex;
use scrawl_proto::Message;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use super::client::{Client, ClientId, ClientInfo};

/// The live set of connected, handshaked clients.
#[derive(Debug, Default)]
pub struct Registry {
    clients: Mutex<Vec<Client>>,
    next_id: AtomicU64,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an identifier for a newly accepted connection.
    pub fn next_id(&self) -> ClientId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Add a handshaked client and announce its arrival to everyone else.
    pub fn register(&self, client: Client) {
        let nickname = client.nickname.clone();
        let id = client.id;
        self.clients.lock().push(client);

        info!(%nickname, id, "Client registered");
        let announcement = Message::JoinExit {
            message: format!("{} has joined!", nickname),
        };
        self.broadcast(Bytes::from(announcement.to_bytes()), Some(id));
    }

    /// Remove a client, announcing its departure to the remaining clients.
    ///
    /// Idempotent: removing an absent client is a no-op. Safe to call
    /// concurrently from any task. The socket itself closes in the
    /// connection task once its outgoing channel is dropped here.
    pub fn remove(&self, id: ClientId) -> Option<ClientInfo> {
        let removed = {
            let mut clients = self.clients.lock();
            clients
                .iter()
                .position(|c| c.id == id)
                .map(|idx| clients.remove(idx))
        };

        let client = removed?;
        let info = ClientInfo::from(&client);
        drop(client); // close the outgoing channel before announcing

        info!(nickname = %info.nickname, id, "Client removed");
        let announcement = Message::JoinExit {
            message: format!("{} has left.", info.nickname),
        };
        self.broadcast(Bytes::from(announcement.to_bytes()), None);
        Some(info)
    }

    /// Fan `bytes` out to every registered client except `exclude`.
    ///
    /// Sends are best-effort and non-blocking; a failed send never aborts
    /// the pass. Clients whose channel is gone are removed after the pass
    /// completes, so the snapshot being iterated is never mutated.
    pub fn broadcast(&self, bytes: Bytes, exclude: Option<ClientId>) {
        let snapshot: Vec<Client> = self.clients.lock().clone();

        let mut dead = Vec::new();
        for client in &snapshot {
            if Some(client.id) == exclude {
                continue;
            }
            if let Err(e) = client.try_send(bytes.clone()) {
                warn!(nickname = %client.nickname, id = client.id, error = %e, "Send failed, dropping client");
                dead.push(client.id);
            }
        }

        for id in dead {
            self.remove(id);
        }
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    /// Whether no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }

    /// Point-in-time view of every client, in registration order.
    pub fn snapshot(&self) -> Vec<ClientInfo> {
        self.clients.lock().iter().map(ClientInfo::from).collect()
    }

    /// Best-effort shutdown: notify every client, then drop them all.
    ///
    /// No acknowledgements are awaited; sockets close when the connection
    /// tasks observe their channels closing (or when the process exits).
    pub fn shutdown(&self) {
        let notice = Message::ServerShutdown {
            message: "server is shutting down".to_string(),
        };
        let bytes = Bytes::from(notice.to_bytes());

        let clients = std::mem::take(&mut *self.clients.lock());
        debug!(count = clients.len(), "Notifying clients of shutdown");
        for client in &clients {
            let _ = client.try_send(bytes.clone());
        }
    }
}
