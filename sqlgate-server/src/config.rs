//! Process configuration, resolved once at startup.

use std::path::PathBuf;

/// Everything the listener needs, fixed before it binds.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind. The gateway is a trusted-network service, so
    /// the default is loopback only.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Shared secret required from clients; empty disables auth.
    pub secret: String,
    /// PEM certificate chain. TLS is enabled when both `cert` and
    /// `key` are set.
    pub cert: Option<PathBuf>,
    /// PEM private key.
    pub key: Option<PathBuf>,
    /// Skip peer certificate verification. Not used by the server
    /// itself; carried for the symmetric client role.
    pub skip_verify: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5123,
            secret: String::new(),
            cert: None,
            key: None,
            skip_verify: false,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tls_enabled(&self) -> bool {
        self.cert.is_some() && self.key.is_some()
    }
}
