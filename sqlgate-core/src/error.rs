//! Shared error taxonomy for gateway calls.

use thiserror::Error;

/// Everything that can go wrong while serving one `Select` call.
///
/// Each variant maps to a distinct JSON-RPC error code via
/// [`Error::rpc_code`]. Authentication failures never carry backend
/// detail; connection and query failures propagate the backend's own
/// message verbatim.
#[derive(Debug, Error)]
pub enum Error {
    /// The request's auth credential did not match the configured secret.
    #[error("incorrect password")]
    Auth,

    /// Unknown driver identifier, or the backend refused the connection.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The backend rejected or failed the statement.
    #[error("query failed: {0}")]
    Query(String),

    /// A scanned row did not match the cursor's reported column count.
    /// Defensive: cursors reject such rows at construction time.
    #[error("row has {actual} values but cursor reports {expected} columns")]
    Materialize { expected: usize, actual: usize },

    /// Socket-level failure on the RPC session.
    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    /// JSON-RPC error code for this failure (server-defined range).
    pub fn rpc_code(&self) -> i32 {
        match self {
            Error::Auth => -32001,
            Error::Connection(_) => -32002,
            Error::Query(_) => -32003,
            Error::Materialize { .. } => -32004,
            Error::Transport(_) => -32005,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
