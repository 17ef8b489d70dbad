//! Query execution: one connection per call, released on every path.

use sqlgate_core::{Error, Rowset, Scalar};
use std::sync::Arc;
use tracing::debug;

use crate::materialize::materialize;
use crate::registry::DriverRegistry;

/// Executes one statement against one backend per call.
///
/// No pooling, no reuse: the connection is opened for the call and
/// closed before the result is returned, whether the query succeeded
/// or not.
pub struct Executor {
    registry: Arc<DriverRegistry>,
}

impl Executor {
    pub fn new(registry: Arc<DriverRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(
        &self,
        driver: &str,
        data_source: &str,
        statement: &str,
        parameters: &[Scalar],
    ) -> Result<Rowset, Error> {
        let backend = self
            .registry
            .get(driver)
            .ok_or_else(|| Error::Connection(format!("unknown driver {driver:?}")))?;

        let mut conn = backend.connect(data_source).await?;
        let outcome = conn.query(statement, parameters).await;
        if let Err(err) = conn.close().await {
            // The query outcome is the interesting error; a close
            // failure must not mask it.
            debug!(error = %err, driver, "backend connection close failed");
        }

        Ok(materialize(outcome?))
    }
}
