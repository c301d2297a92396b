//! Gateway - TCP/TLS listener that accepts incoming connections.
//!
//! The Gateway binds one socket and spawns a Connection task for each
//! incoming client. When TLS is configured, every accepted socket is wrapped
//! by the acceptor before the protocol handshake runs.

use crate::config::TlsConfig;
use crate::network::Connection;
use crate::state::Registry;
use rustls_pemfile::{certs, pkcs8_private_keys};
use std::io::{BufReader, Cursor};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tracing::{error, info, instrument, warn};

/// The Gateway accepts incoming TCP/TLS connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    tls_acceptor: Option<TlsAcceptor>,
    registry: Arc<Registry>,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    ///
    /// Bind failure is fatal: the relay never starts accepting if the socket
    /// (or the TLS certificate/key pair) cannot be set up.
    pub async fn bind(
        addr: SocketAddr,
        tls_config: Option<TlsConfig>,
        registry: Arc<Registry>,
    ) -> anyhow::Result<Self> {
        let tls_acceptor = match tls_config {
            Some(tls_cfg) => {
                let acceptor = Self::load_tls(&tls_cfg)?;
                info!("TLS enabled");
                Some(acceptor)
            }
            None => None,
        };

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "Listener bound");

        Ok(Self {
            listener,
            tls_acceptor,
            registry,
        })
    }

    /// The bound address, useful when binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Load TLS certificates and create a TlsAcceptor.
    fn load_tls(config: &TlsConfig) -> anyhow::Result<TlsAcceptor> {
        // Load certificates
        let cert_file = std::fs::read(&config.cert_path)?;
        let cert_reader = &mut BufReader::new(Cursor::new(cert_file));
        let certs: Vec<CertificateDer> = certs(cert_reader).collect::<Result<Vec<_>, _>>()?;

        if certs.is_empty() {
            anyhow::bail!("No certificates found in {}", config.cert_path);
        }

        // Load private key
        let key_file = std::fs::read(&config.key_path)?;
        let key_reader = &mut BufReader::new(Cursor::new(key_file));
        let mut keys: Vec<PrivateKeyDer> = pkcs8_private_keys(key_reader)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(PrivateKeyDer::from)
            .collect();

        if keys.is_empty() {
            anyhow::bail!("No private keys found in {}", config.key_path);
        }

        let key = keys.remove(0);

        // Build TLS server config. Clients of this protocol skip certificate
        // validation, so no client auth is requested.
        let tls_config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)?;

        Ok(TlsAcceptor::from(Arc::new(tls_config)))
    }

    /// Run the gateway, accepting connections forever.
    ///
    /// A single connection's failure (accept error, TLS handshake error,
    /// handler error) is logged and never stops the accept loop.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!(%addr, "Connection accepted");

                    let registry = Arc::clone(&self.registry);
                    let id = registry.next_id();

                    match &self.tls_acceptor {
                        Some(acceptor) => {
                            let acceptor = acceptor.clone();
                            tokio::spawn(async move {
                                match acceptor.accept(stream).await {
                                    Ok(tls_stream) => {
                                        let connection =
                                            Connection::new(id, tls_stream, addr, registry);
                                        if let Err(e) = connection.run().await {
                                            error!(id, %addr, error = %e, "TLS connection error");
                                        }
                                        info!(id, %addr, "TLS connection closed");
                                    }
                                    Err(e) => {
                                        warn!(%addr, error = %e, "TLS handshake failed");
                                    }
                                }
                            });
                        }
                        None => {
                            tokio::spawn(async move {
                                let connection = Connection::new(id, stream, addr, registry);
                                if let Err(e) = connection.run().await {
                                    error!(id, %addr, error = %e, "Connection error");
                                }
                                info!(id, %addr, "Connection closed");
                            });
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
