//! Test server management.
//!
//! Runs an in-process scrawld gateway on an ephemeral port for integration
//! testing.

use scrawld::config::TlsConfig;
use scrawld::network::Gateway;
use scrawld::state::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A test relay instance.
pub struct TestServer {
    addr: SocketAddr,
    registry: Arc<Registry>,
    gateway_task: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a plaintext test relay on an ephemeral port.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with_tls(None).await
    }

    /// Spawn a test relay, optionally with TLS.
    pub async fn spawn_with_tls(tls: Option<TlsConfig>) -> anyhow::Result<Self> {
        let registry = Arc::new(Registry::new());
        let gateway =
            Gateway::bind("127.0.0.1:0".parse()?, tls, Arc::clone(&registry)).await?;
        let addr = gateway.local_addr()?;

        let gateway_task = tokio::spawn(async move {
            let _ = gateway.run().await;
        });

        Ok(Self {
            addr,
            registry,
            gateway_task,
        })
    }

    /// The relay's bound address.
    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    /// The relay's client registry, for asserting on registration state.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Create a test client connected and handshaked as `nick`.
    pub async fn connect(&self, nick: &str) -> anyhow::Result<super::client::TcpTestClient> {
        super::client::TestClient::connect_tcp(self.addr, nick).await
    }

    /// Wait until exactly `n` clients are registered.
    ///
    /// Registration happens in the connection task after the handshake, so
    /// tests synchronize on the registry rather than racing it.
    pub async fn wait_for_clients(&self, n: usize) -> anyhow::Result<()> {
        for _ in 0..100 {
            if self.registry.len() == n {
                return Ok(());
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        anyhow::bail!(
            "registry never reached {} clients (currently {})",
            n,
            self.registry.len()
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.gateway_task.abort();
    }
}
