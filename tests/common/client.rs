//! Test scrawl client.
//!
//! Performs the NICK handshake and frames messages with the same brace codec
//! the relay uses, over any stream type (plaintext or TLS).

use bytes::BytesMut;
use scrawl_proto::{BraceCodec, Frame, Message};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Decoder;

/// A plaintext test client.
pub type TcpTestClient = TestClient<TcpStream>;

/// A test client over an arbitrary stream.
pub struct TestClient<S> {
    stream: S,
    buf: BytesMut,
    codec: BraceCodec,
}

impl TestClient<TcpStream> {
    /// Connect over TCP and handshake as `nick`.
    pub async fn connect_tcp(addr: SocketAddr, nick: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Self::handshake(stream, nick).await
    }
}

impl<S> TestClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Run the NICK handshake on an already-connected stream.
    pub async fn handshake(mut stream: S, nick: &str) -> anyhow::Result<Self> {
        let mut token = [0u8; 4];
        timeout(Duration::from_secs(5), stream.read_exact(&mut token)).await??;
        anyhow::ensure!(&token == b"NICK", "expected NICK token, got {:?}", token);

        stream.write_all(nick.as_bytes()).await?;
        stream.flush().await?;

        Ok(Self {
            stream,
            buf: BytesMut::new(),
            codec: BraceCodec::new(),
        })
    }

    /// Send raw bytes, unframed and unmodified.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Send a message in its canonical serialization.
    pub async fn send(&mut self, msg: &Message) -> anyhow::Result<()> {
        self.send_raw(&msg.to_bytes()).await
    }

    /// Receive a single frame from the relay.
    pub async fn recv(&mut self) -> anyhow::Result<Frame> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a frame with a timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Frame> {
        let deadline = tokio::time::Instant::now() + dur;
        loop {
            if let Some(frame) = self.codec.decode(&mut self.buf)? {
                return Ok(frame);
            }

            let mut chunk = [0u8; 1024];
            let n = tokio::time::timeout_at(deadline, self.stream.read(&mut chunk)).await??;
            anyhow::ensure!(n > 0, "connection closed by relay");
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Assert that nothing arrives within `dur`.
    pub async fn assert_silent(&mut self, dur: Duration) {
        if let Ok(frame) = self.recv_timeout(dur).await {
            panic!("expected silence, received: {:?}", frame.message);
        }
    }

    /// Wait for the relay to close this connection (read returns EOF).
    pub async fn wait_for_close(&mut self, dur: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + dur;
        loop {
            let mut chunk = [0u8; 1024];
            let n = tokio::time::timeout_at(deadline, self.stream.read(&mut chunk)).await??;
            if n == 0 {
                return Ok(());
            }
            // Departure/shutdown notices may still arrive before the close.
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}
