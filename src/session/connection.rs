//! Connection management for NNTP sessions
//!
//! This module handles TCP/TLS connection establishment, socket tuning,
//! welcome banner validation and teardown.

use crate::commands::{self, CRLF};
use crate::config::ServerConfig;
use crate::error::{NntpError, Result};
use crate::response::{Expect, classify, codes};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::{
    self, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::crypto::{
    CryptoProvider, WebPkiSupportedAlgorithms, ring, verify_tls12_signature,
    verify_tls13_signature,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tracing::{debug, warn};

use super::state::SessionState;
use super::{NntpSession, Transport};

/// Buffer capacity for each direction of the connection (256KB)
const BUFSTREAM_CAPACITY: usize = 256 * 1024;

/// Requested kernel receive buffer (4MB)
const RECV_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// Requested kernel send buffer (1MB)
const SEND_BUFFER_SIZE: usize = 1024 * 1024;

/// Verifier for `allow_insecure_tls`: any certificate chain is accepted
///
/// Handshake signatures are still checked against the presented certificate,
/// so only the chain of trust is skipped.
#[derive(Debug)]
struct InsecureVerifier {
    algorithms: WebPkiSupportedAlgorithms,
}

impl InsecureVerifier {
    fn new() -> Self {
        Self {
            algorithms: ring::default_provider().signature_verification_algorithms,
        }
    }
}

impl ServerCertVerifier for InsecureVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

impl NntpSession {
    /// Connect to the configured server and validate the welcome banner
    ///
    /// Opens TCP (wrapped in TLS when `config.tls` is set), reads one line and
    /// requires it to start with `20`. The session is connected but not yet
    /// authenticated afterwards.
    ///
    /// # Errors
    ///
    /// - [`NntpError::ConnectionSetup`] - connect, handshake or welcome failed
    /// - [`NntpError::Timeout`] - the TCP connect exceeded `connect_timeout`
    /// - [`NntpError::Usage`] - the session was already initialised
    pub async fn init(&mut self) -> Result<()> {
        self.require_state(SessionState::Unconnected, "init")?;
        let config = Arc::clone(&self.config);
        debug!("Connecting to NNTP server {}", config.address());

        let transport = match open_transport(&config).await {
            Ok(transport) => transport,
            Err(e) => {
                self.state = SessionState::Closed;
                return Err(match e {
                    NntpError::Timeout | NntpError::ConnectionSetup(_) => e,
                    other => NntpError::ConnectionSetup(other.to_string()),
                });
            }
        };
        self.handshake(transport).await
    }

    /// Run the welcome handshake over a caller supplied transport
    ///
    /// Same contract as [`init`](Self::init) without opening a socket.
    pub async fn init_with<T: Transport + 'static>(&mut self, transport: T) -> Result<()> {
        self.require_state(SessionState::Unconnected, "init")?;
        self.handshake(Box::new(transport)).await
    }

    async fn handshake(&mut self, transport: Box<dyn Transport>) -> Result<()> {
        self.stream = Some(BufStream::with_capacity(
            BUFSTREAM_CAPACITY,
            BUFSTREAM_CAPACITY,
            transport,
        ));
        self.state = SessionState::Connected;

        let welcome = self
            .read_line()
            .await
            .and_then(|line| classify(&line, &[Expect::ok(codes::WELCOME)]).map(|_| line));

        match welcome {
            Ok(line) => {
                debug!("Server welcome: {}", line);
                Ok(())
            }
            Err(e) => {
                self.stream = None;
                self.state = SessionState::Closed;
                Err(match e {
                    NntpError::UnexpectedResponse { received, .. } => {
                        NntpError::ConnectionSetup(format!("Invalid welcome: {}", received))
                    }
                    other => NntpError::ConnectionSetup(other.to_string()),
                })
            }
        }
    }

    /// Tear the session down
    ///
    /// Clears `ready`, sends `QUIT` on a best-effort basis and closes the
    /// connection. Returns the error of the close itself, if any. Calling it on
    /// a session without a connection only marks it closed.
    pub async fn close(&mut self) -> Result<()> {
        self.ready = false;
        self.state = SessionState::Closed;
        let Some(mut conn) = self.stream.take() else {
            return Ok(());
        };

        self.log_line(">>", commands::quit());
        let quit = format!("{}{}", commands::quit(), CRLF);
        if conn.write_all(quit.as_bytes()).await.is_ok() && conn.flush().await.is_ok() {
            self.bytes_out += quit.len() as u64;
        }

        conn.shutdown().await?;
        Ok(())
    }
}

/// Open TCP and, when configured, TLS to the server
async fn open_transport(config: &ServerConfig) -> Result<Box<dyn Transport>> {
    let addr = config.address();
    let connect = TcpStream::connect(addr.as_str());
    let tcp = match config.connect_timeout {
        Some(limit) => timeout(limit, connect)
            .await
            .map_err(|_| NntpError::Timeout)??,
        None => connect.await?,
    };
    tune_socket(&tcp);

    if !config.tls {
        return Ok(Box::new(tcp));
    }
    Ok(Box::new(tls_connect(config, tcp).await?))
}

/// Disable Nagle and ask for large kernel buffers; failures only warn
fn tune_socket(tcp: &TcpStream) {
    if let Err(e) = tcp.set_nodelay(true) {
        warn!("TCP_NODELAY not applied: {}", e);
    }

    let socket = socket2::SockRef::from(tcp);
    if let Err(e) = socket.set_recv_buffer_size(RECV_BUFFER_SIZE) {
        warn!("Receive buffer of {} bytes not applied: {}", RECV_BUFFER_SIZE, e);
    }
    if let Err(e) = socket.set_send_buffer_size(SEND_BUFFER_SIZE) {
        warn!("Send buffer of {} bytes not applied: {}", SEND_BUFFER_SIZE, e);
    }
    debug!(
        recv = ?socket.recv_buffer_size().ok(),
        send = ?socket.send_buffer_size().ok(),
        "Socket buffers"
    );
}

async fn tls_connect(
    config: &ServerConfig,
    tcp: TcpStream,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let _ = CryptoProvider::install_default(ring::default_provider());

    let tls_config = if config.allow_insecure_tls {
        warn!("TLS certificate chain not verified for {}", config.host);
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(InsecureVerifier::new()))
            .with_no_client_auth()
    } else {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth()
    };

    let connector = TlsConnector::from(Arc::new(tls_config));
    let server_name = ServerName::try_from(config.host.as_str())
        .map_err(|e| NntpError::Tls(format!("Invalid domain: {}", e)))?
        .to_owned();

    connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| NntpError::Tls(format!("TLS handshake failed: {}", e)))
}
