//! Batched RPC calls.

use serde_json::{json, Value};
use crate::protocol::constants::rpc::DEFAULT_IDENTIFIER;

/// One call inside a batched RPC request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcCall {
    /// Procedure id.
    pub rpc_id: String,
    /// JSON payload, already serialized.
    pub payload: String,
    /// Tag echoed back in the response part, used to tell parts apart.
    pub identifier: String,
}

impl RpcCall {
    /// Creates a call with the default identifier.
    pub fn new(rpc_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            rpc_id: rpc_id.into(),
            payload: payload.into(),
            identifier: DEFAULT_IDENTIFIER.to_string(),
        }
    }

    /// Sets the identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Wire form: `[rpcId, payload, null, identifier]`.
    pub fn serialize(&self) -> Value {
        json!([self.rpc_id, self.payload, null, self.identifier])
    }
}
