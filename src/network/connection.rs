//! Connection - Handles an individual client connection.
//!
//! Each Connection runs in its own Tokio task:
//!
//! Phase 1: Handshake - the relay sends the literal `NICK` token and takes
//! the next read as the client's nickname. No timeout guards this read; a
//! client that connects and never answers parks its task forever, exactly
//! like the legacy protocol.
//!
//! Phase 2: Relay loop - a `FramedRead` with the brace codec decodes the
//! incoming stream one frame at a time, while a writer task drains the
//! client's outgoing channel into a `FramedWrite`. Messages from one client
//! are forwarded in the order they arrived; nothing is ordered across
//! clients.

use crate::state::{Client, ClientId, Registry};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use scrawl_proto::{BraceCodec, Message};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, instrument, warn};

/// Capacity of a connection's outgoing channel. A client that cannot keep
/// up with the fan-out is treated as dead once this fills.
const OUTGOING_QUEUE: usize = 64;

/// Size of the single handshake read, matching the legacy clients' recv.
const HANDSHAKE_READ: usize = 1024;

/// A client connection handler, generic over plaintext and TLS streams.
pub struct Connection<S> {
    id: ClientId,
    addr: SocketAddr,
    registry: Arc<Registry>,
    stream: S,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Create a new connection handler.
    pub fn new(id: ClientId, stream: S, addr: SocketAddr, registry: Arc<Registry>) -> Self {
        Self {
            id,
            addr,
            registry,
            stream,
        }
    }

    /// Run the handshake and then the relay loop.
    #[instrument(skip(self), fields(id = self.id, addr = %self.addr), name = "connection")]
    pub async fn run(mut self) -> anyhow::Result<()> {
        // Phase 1: Handshake. Send the NICK token, take one read as the
        // nickname. Failure here tears the connection down unregistered, so
        // no departure is ever announced for it.
        self.stream.write_all(b"NICK").await?;

        let mut buf = [0u8; HANDSHAKE_READ];
        let nickname = match self.stream.read(&mut buf).await {
            Ok(0) => {
                info!("Client disconnected during handshake");
                return Ok(());
            }
            Ok(n) => parse_nickname(&buf[..n]),
            Err(e) => {
                warn!(error = %e, "Read error during handshake");
                return Ok(());
            }
        };
        info!(%nickname, "Handshake complete");

        // Phase 2: Relay loop. Split the stream; the writer task owns the
        // write half and drains the outgoing channel the registry sends on.
        let (read_half, write_half) = tokio::io::split(self.stream);
        let mut reader = FramedRead::new(read_half, BraceCodec::new());
        let mut writer = FramedWrite::new(write_half, BraceCodec::new());

        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Bytes>(OUTGOING_QUEUE);
        tokio::spawn(async move {
            while let Some(bytes) = outgoing_rx.recv().await {
                if writer.send(bytes).await.is_err() {
                    break;
                }
            }
            // Channel closed: the client was removed (or went dead). Orderly
            // shutdown of the write half, then drop closes the socket.
            let mut inner = writer.into_inner();
            let _ = inner.shutdown().await;
        });

        self.registry.register(Client::new(
            self.id,
            nickname.clone(),
            self.addr.port(),
            outgoing_tx,
        ));

        while let Some(result) = reader.next().await {
            match result {
                Ok(frame) => match &frame.message {
                    Message::Exit { nickname: declared } => {
                        info!(%nickname, %declared, "Client sent exit");
                        self.registry.remove(self.id);
                        // No further reads after an exit.
                        return Ok(());
                    }
                    msg if msg.is_relayable() => {
                        // Forward the original bytes, not a re-serialization.
                        self.registry.broadcast(frame.raw.clone(), Some(self.id));
                    }
                    other => {
                        debug!(message = ?other, "Ignoring server-only message type from client");
                    }
                },
                Err(e) => {
                    warn!(error = %e, "Read error");
                    break;
                }
            }
        }

        // EOF or transport error: same path as an explicit exit.
        self.registry.remove(self.id);
        Ok(())
    }
}

/// Interpret the handshake payload as a nickname.
///
/// The whole payload, trimmed of surrounding whitespace, is the nickname.
/// Compatibility shim: clients that answer with a structured payload send a
/// JSON object whose `nickname` field is used instead.
fn parse_nickname(payload: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(payload) {
        if let Some(nick) = value.get("nickname").and_then(|v| v.as_str()) {
            return nick.trim().to_string();
        }
    }
    String::from_utf8_lossy(payload).trim().to_string()
}
