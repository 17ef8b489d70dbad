//! Core types for sqlgate, a remote SQL query gateway.
//!
//! This crate holds everything the server and client share: the dynamic
//! value model ([`Scalar`], [`Row`], [`Rowset`]), the request shape
//! ([`SelectRequest`]), the line-delimited JSON-RPC envelope, and the
//! error taxonomy. It performs no I/O.

pub mod error;
pub mod proto;
pub mod value;

pub use error::Error;
pub use proto::{RpcError, RpcRequest, RpcResponse, SelectRequest, METHOD_SELECT};
pub use value::{Row, Rowset, Scalar};
