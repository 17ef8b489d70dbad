//! Transport listener and per-connection sessions.

use serde_json::Value;
use sqlgate_core::{Error, RpcError, RpcRequest, RpcResponse};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::gateway::Gateway;
use crate::tls;

/// Accepts connections and runs one independent session per connection.
pub struct Server {
    listener: TcpListener,
    acceptor: Option<TlsAcceptor>,
    gateway: Arc<Gateway>,
}

impl Server {
    /// Bind the listener and, if configured, load the TLS identity.
    /// Errors here abort startup before any connection is accepted.
    pub async fn bind(config: &ServerConfig, gateway: Gateway) -> io::Result<Self> {
        let acceptor = match (&config.cert, &config.key) {
            (Some(cert), Some(key)) => Some(tls::acceptor(cert, key)?),
            _ => None,
        };
        let listener = TcpListener::bind(config.bind_addr()).await?;

        Ok(Self {
            listener,
            acceptor,
            gateway: Arc::new(gateway),
        })
    }

    /// The bound address. Useful when binding port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. A failed accept or handshake is logged and skipped;
    /// it never takes the listener down.
    pub async fn serve(self) -> io::Result<()> {
        info!(addr = %self.local_addr()?, tls = self.acceptor.is_some(), "listening");

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(error = %err, "accept error");
                    continue;
                }
            };
            info!(%peer, "connection started");

            let gateway = Arc::clone(&self.gateway);
            match self.acceptor.clone() {
                Some(acceptor) => {
                    tokio::spawn(async move {
                        match acceptor.accept(stream).await {
                            Ok(stream) => session(stream, gateway, peer).await,
                            Err(err) => warn!(%peer, error = %err, "tls handshake failed"),
                        }
                    });
                }
                None => {
                    tokio::spawn(session(stream, gateway, peer));
                }
            }
        }
    }
}

/// One connection's request/response loop. Errors end this session
/// only; other sessions and the listener are unaffected.
async fn session<S>(stream: S, gateway: Arc<Gateway>, peer: SocketAddr)
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    if let Err(err) = run_session(stream, gateway).await {
        debug!(%peer, error = %err, "session ended with error");
    }
    info!(%peer, "connection closed");
}

async fn run_session<S>(stream: S, gateway: Arc<Gateway>) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    // Calls are processed one at a time in arrival order; a call blocks
    // this session (and only this session) until fully materialized.
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(frame) => gateway.dispatch(frame).await,
            Err(err) => RpcResponse::failure(
                Value::Null,
                RpcError::new(RpcError::PARSE_ERROR, format!("parse error: {err}")),
            ),
        };

        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        writer.write_all(&payload).await?;
        writer.flush().await?;
    }

    Ok(())
}
