//! sqlgate server: authenticated remote SQL queries over line-delimited
//! JSON-RPC.
//!
//! # Architecture
//!
//! ```text
//! +----------+     +---------+     +----------+     +--------------+
//! | Listener | --> | Gateway | --> | Executor | --> | Materializer |
//! +----------+     +---------+     +----------+     +--------------+
//!   TCP / TLS       auth check      one backend      cursor -> Rowset
//!   one task per    per request     connection
//!   connection                      per call
//! ```
//!
//! The listener accepts connections and runs one independent session per
//! connection. Each `JSQL.Select` call is authenticated against the
//! process-wide shared secret, executed against the named backend through
//! the driver registry, and the fully materialized rowset (or a
//! structured error) is written back on the same session.

pub mod backend;
pub mod config;
pub mod executor;
pub mod gateway;
pub mod materialize;
pub mod registry;
pub mod server;
mod tls;

pub use config::ServerConfig;
pub use executor::Executor;
pub use gateway::Gateway;
pub use materialize::materialize;
pub use registry::{Backend, BackendConnection, Cursor, DriverRegistry};
pub use server::Server;
