//! Client for the sqlgate remote query gateway.
//!
//! Dials the server over TCP (optionally TLS-wrapped), then issues
//! `JSQL.Select` calls as line-delimited JSON-RPC. One outstanding call
//! at a time per connection; request ids increase monotonically.
//!
//! # Example
//! ```no_run
//! use sqlgate_client::Client;
//! use sqlgate_core::Scalar;
//!
//! # async fn example() -> Result<(), sqlgate_core::Error> {
//! let mut client = Client::connect("127.0.0.1:5123", "s3cret").await?;
//! let rows = client
//!     .query(
//!         "sqlite",
//!         "sqlite://./app.db",
//!         "select foot from foo where bar = ?",
//!         vec![Scalar::Text("hello".into())],
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use sqlgate_core::{Error, RpcError, RpcRequest, RpcResponse, Rowset, Scalar, SelectRequest};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio_rustls::rustls;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;

mod verify;

trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// A connection to one gateway server.
pub struct Client {
    stream: BufStream<Box<dyn Transport>>,
    password: String,
    next_id: u64,
}

impl Client {
    /// Dial the server over plaintext TCP.
    pub async fn connect(addr: &str, password: &str) -> Result<Self, Error> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::from_stream(Box::new(stream), password))
    }

    /// Dial the server over TLS. With `skip_verify` the server
    /// certificate is accepted without verification; only for servers
    /// you control with self-signed certificates.
    pub async fn connect_tls(addr: &str, password: &str, skip_verify: bool) -> Result<Self, Error> {
        let tcp = TcpStream::connect(addr).await?;

        let config = if skip_verify {
            rustls::ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(verify::NoVerification))
                .with_no_client_auth()
        } else {
            let mut roots = rustls::RootCertStore::empty();
            for cert in rustls_native_certs::load_native_certs().certs {
                let _ = roots.add(cert);
            }
            rustls::ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth()
        };

        let host = host_of(addr);
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|err| Error::Transport(format!("invalid server name {host:?}: {err}")))?;

        let connector = TlsConnector::from(Arc::new(config));
        let stream = connector.connect(server_name, tcp).await?;
        Ok(Self::from_stream(Box::new(stream), password))
    }

    fn from_stream(stream: Box<dyn Transport>, password: &str) -> Self {
        Self {
            stream: BufStream::new(stream),
            password: password.to_string(),
            next_id: 0,
        }
    }

    /// Run one read-only query and return the fully materialized
    /// rowset. The connection stays usable after a failed call unless
    /// the transport itself failed.
    pub async fn query(
        &mut self,
        driver: &str,
        data_source: &str,
        statement: &str,
        parameters: Vec<Scalar>,
    ) -> Result<Rowset, Error> {
        let id = self.next_id;
        self.next_id += 1;

        let request = SelectRequest {
            auth: self.password.clone(),
            driver: driver.to_string(),
            data_source: data_source.to_string(),
            statement: statement.to_string(),
            parameters,
        };
        let frame = RpcRequest::select(id, &request)?;

        let mut payload = serde_json::to_vec(&frame)?;
        payload.push(b'\n');
        self.stream.write_all(&payload).await?;
        self.stream.flush().await?;

        let mut line = String::new();
        if self.stream.read_line(&mut line).await? == 0 {
            return Err(Error::Transport("connection closed by server".to_string()));
        }

        let response: RpcResponse = serde_json::from_str(&line)?;
        if response.id != Value::from(id) {
            return Err(Error::Transport(format!(
                "response id mismatch: sent {id}, got {}",
                response.id
            )));
        }

        if let Some(err) = response.error {
            return Err(into_error(err));
        }
        match response.result {
            // The server replies with an empty result (not an error)
            // for no-op calls; treat null like the empty rowset.
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }
}

/// Extract the host part of a `host:port` address for SNI. Bracketed
/// IPv6 literals like `[::1]:5123` lose their brackets.
fn host_of(addr: &str) -> &str {
    if let (Some(start), Some(end)) = (addr.find('['), addr.find(']')) {
        if start == 0 && start < end {
            return &addr[1..end];
        }
    }
    addr.rsplit_once(':').map_or(addr, |(host, _)| host)
}

/// Map a wire error back onto the shared taxonomy.
fn into_error(err: RpcError) -> Error {
    match err.code {
        code if code == Error::Auth.rpc_code() => Error::Auth,
        code if code == Error::Connection(String::new()).rpc_code() => {
            Error::Connection(err.message)
        }
        code if code == Error::Query(String::new()).rpc_code() => Error::Query(err.message),
        _ => Error::Transport(format!("rpc error {}: {}", err.code, err.message)),
    }
}
