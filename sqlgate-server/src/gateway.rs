//! The authenticated RPC endpoint.

use serde_json::Value;
use sqlgate_core::{
    Error, RpcError, RpcRequest, RpcResponse, Rowset, SelectRequest, METHOD_SELECT,
};
use std::sync::Arc;
use tracing::debug;

use crate::executor::Executor;
use crate::registry::DriverRegistry;

/// Server-side handler for `JSQL.Select`.
///
/// Memoryless: nothing is retained across calls except the immutable
/// shared secret and the registry behind the executor.
pub struct Gateway {
    secret: String,
    executor: Executor,
}

impl Gateway {
    /// An empty `secret` disables authentication.
    pub fn new(secret: impl Into<String>, registry: Arc<DriverRegistry>) -> Self {
        Self {
            secret: secret.into(),
            executor: Executor::new(registry),
        }
    }

    /// Execute one authenticated select. The secret check runs before
    /// any registry lookup or backend connection: unauthenticated
    /// callers never cost backend resources and never observe
    /// backend-shaped errors or timing.
    pub async fn select(&self, request: &SelectRequest) -> Result<Rowset, Error> {
        if !self.secret.is_empty() && request.auth != self.secret {
            return Err(Error::Auth);
        }

        self.executor
            .execute(
                &request.driver,
                &request.data_source,
                &request.statement,
                &request.parameters,
            )
            .await
    }

    /// Map one JSON-RPC frame to one response frame.
    ///
    /// Absent params are a protocol-defensive no-op (empty result, no
    /// error, matching what legacy clients expect); params that are
    /// present but undecodable get an explicit invalid-params
    /// rejection.
    pub async fn dispatch(&self, frame: RpcRequest) -> RpcResponse {
        let id = frame.id.clone();

        if frame.method != METHOD_SELECT {
            return RpcResponse::failure(id, RpcError::method_not_found(&frame.method));
        }

        let Some(params) = frame.param_object() else {
            debug!("select call with absent params, replying empty");
            return RpcResponse::result(id, Value::Array(Vec::new()));
        };

        let request: SelectRequest = match serde_json::from_value(params.clone()) {
            Ok(request) => request,
            Err(err) => return RpcResponse::failure(id, RpcError::invalid_params(err)),
        };

        debug!(driver = %request.driver, "dispatching select");
        match self.select(&request).await {
            Ok(rowset) => match serde_json::to_value(&rowset) {
                Ok(value) => RpcResponse::result(id, value),
                Err(err) => RpcResponse::failure(id, RpcError::from(&Error::from(err))),
            },
            Err(err) => {
                debug!(error = %err, "select failed");
                RpcResponse::failure(id, RpcError::from(&err))
            }
        }
    }
}
