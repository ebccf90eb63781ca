//! Name resolution and transport dialing.

use async_trait::async_trait;
use firehose_types::FirehoseError;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{self, ClientConfig, RootCertStore};

use crate::Security;

/// A bidirectional byte stream the client can speak HTTP over.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

/// An owned, type-erased transport.
pub type BoxTransport = Box<dyn Transport>;

/// Resolves host names and opens transports.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Resolves `host` to every socket address it has.
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;

    /// Opens a transport to `addr`, using `host` as the TLS server name.
    async fn dial(&self, addr: SocketAddr, host: &str, security: Security) -> io::Result<BoxTransport>;
}

/// Dialer backed by the system resolver, TCP sockets and rustls.
#[derive(Clone)]
pub struct NetDialer {
    tls: TlsConnector,
}

impl NetDialer {
    /// Creates a dialer trusting the bundled web PKI roots.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS configuration cannot be built.
    pub fn new() -> Result<Self, FirehoseError> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| FirehoseError::Config(format!("TLS configuration: {e}")))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            tls: TlsConnector::from(Arc::new(config)),
        })
    }
}

impl std::fmt::Debug for NetDialer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetDialer").finish_non_exhaustive()
    }
}

#[async_trait]
impl Dialer for NetDialer {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        Ok(tokio::net::lookup_host((host, port)).await?.collect())
    }

    async fn dial(&self, addr: SocketAddr, host: &str, security: Security) -> io::Result<BoxTransport> {
        let tcp = TcpStream::connect(addr).await?;
        tcp.set_nodelay(true)?;

        match security {
            Security::Plain => Ok(Box::new(tcp)),
            Security::Tls => {
                let name = ServerName::try_from(host.trim_end_matches('.').to_string())
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
                let stream = self.tls.connect(name, tcp).await?;
                Ok(Box::new(stream))
            }
        }
    }
}
