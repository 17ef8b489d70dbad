//! Built-in backend connectors, one per sqlx driver.
//!
//! Each connector adapts one sqlx database to the uniform
//! [`Backend`](crate::registry::Backend) capability: open a connection,
//! bind parameters positionally, drain the result into a
//! [`Cursor`](crate::registry::Cursor) of scalars, close. Column
//! decoding is the one place driver-specific type knowledge is allowed;
//! nothing above this module sees a native database type.

pub mod mysql;
pub mod postgres;
pub mod sqlite;

use sqlgate_core::Error;

pub(crate) fn connect_err(err: sqlx::Error) -> Error {
    Error::Connection(err.to_string())
}

pub(crate) fn query_err(err: sqlx::Error) -> Error {
    Error::Query(err.to_string())
}
