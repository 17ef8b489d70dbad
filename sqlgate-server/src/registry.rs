//! Driver registry and the uniform backend capability.
//!
//! Each driver identifier maps to a [`Backend`]: "give me a connection
//! for this data source". The registry is built once at startup and
//! never mutated afterwards; sessions share it read-only. The gateway
//! never sees driver-specific types, only [`Cursor`]s of [`Scalar`]s.

use async_trait::async_trait;
use sqlgate_core::{Error, Scalar};
use std::collections::HashMap;
use std::sync::Arc;

use crate::backend;

/// A drained backend result: the reported column list plus every row's
/// raw values, already decoded into driver-agnostic scalars.
///
/// [`Cursor::push_row`] rejects rows whose arity does not match the
/// column list, so a column/value mismatch cannot reach the
/// materializer.
#[derive(Debug, Default)]
pub struct Cursor {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl Cursor {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append one row of scanned values.
    pub fn push_row(&mut self, values: Vec<Scalar>) -> Result<(), Error> {
        if values.len() != self.columns.len() {
            return Err(Error::Materialize {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        self.rows.push(values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Scalar>>) {
        (self.columns, self.rows)
    }
}

/// A backend connector: opens one connection per call.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Open a connection for the given connection string. The string's
    /// syntax is backend-specific and opaque to the gateway.
    async fn connect(&self, data_source: &str) -> Result<Box<dyn BackendConnection>, Error>;
}

/// One open backend connection, scoped to a single call.
#[async_trait]
pub trait BackendConnection: Send {
    /// Bind parameters positionally, execute the statement, and drain
    /// the result into a [`Cursor`].
    async fn query(&mut self, statement: &str, parameters: &[Scalar]) -> Result<Cursor, Error>;

    /// Release the connection. Called on every exit path.
    async fn close(self: Box<Self>) -> Result<(), Error>;
}

/// Immutable map from driver identifier to backend connector.
#[derive(Default)]
pub struct DriverRegistry {
    backends: HashMap<String, Arc<dyn Backend>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in sqlx connectors under their
    /// conventional names, legacy aliases included: `postgres`/`pg`,
    /// `mysql`, `sqlite`/`sqlite3`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let postgres: Arc<dyn Backend> = Arc::new(backend::postgres::Postgres);
        let mysql: Arc<dyn Backend> = Arc::new(backend::mysql::MySql);
        let sqlite: Arc<dyn Backend> = Arc::new(backend::sqlite::Sqlite);
        registry.register("postgres", Arc::clone(&postgres));
        registry.register("pg", postgres);
        registry.register("mysql", mysql);
        registry.register("sqlite", Arc::clone(&sqlite));
        registry.register("sqlite3", sqlite);
        registry
    }

    /// Add a connector. Only meaningful before the registry is shared.
    pub fn register(&mut self, name: impl Into<String>, backend: Arc<dyn Backend>) {
        self.backends.insert(name.into(), backend);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Backend>> {
        self.backends.get(name).cloned()
    }

    /// Registered driver identifiers, sorted for stable logging.
    pub fn drivers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
