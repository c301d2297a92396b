//! A registered client.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Unique client identifier, assigned at accept time.
pub type ClientId = u64;

/// A handshaked client as the registry sees it.
///
/// The connection task owns the socket; the registry only holds the sender
/// side of the connection's outgoing channel, so no I/O ever happens under
/// the registry lock.
#[derive(Debug, Clone)]
pub struct Client {
    /// Registry identity.
    pub id: ClientId,
    /// Nickname from the handshake. Not guaranteed unique: the legacy
    /// protocol never rejects duplicates, and neither do we.
    pub nickname: String,
    /// When the handshake completed.
    pub connected_at: DateTime<Utc>,
    /// Remote TCP port, kept for display alongside the nickname.
    pub remote_port: u16,
    sender: mpsc::Sender<Bytes>,
}

impl Client {
    /// Create a client record bound to a connection's outgoing channel.
    pub fn new(id: ClientId, nickname: String, remote_port: u16, sender: mpsc::Sender<Bytes>) -> Self {
        Self {
            id,
            nickname,
            connected_at: Utc::now(),
            remote_port,
            sender,
        }
    }

    /// Best-effort non-blocking send toward this client's writer task.
    pub fn try_send(&self, bytes: Bytes) -> Result<(), TrySendError<Bytes>> {
        self.sender.try_send(bytes)
    }
}

/// Point-in-time view of a client, for status display and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Registry identity.
    pub id: ClientId,
    /// Nickname from the handshake.
    pub nickname: String,
    /// When the handshake completed.
    pub connected_at: DateTime<Utc>,
    /// Remote TCP port.
    pub remote_port: u16,
}

impl From<&Client> for ClientInfo {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id,
            nickname: client.nickname.clone(),
            connected_at: client.connected_at,
            remote_port: client.remote_port,
        }
    }
}
