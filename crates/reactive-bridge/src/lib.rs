//! Optional reactive-state library boundary.
//!
//! Presence is feature-detected by the embedder: hand the controller a bridge
//! and placeholder activations may carry a JSON payload to merge into the
//! injected subtree once the library has initialized it; hand it nothing and
//! the lifecycle runs unchanged. The bridge is never load-bearing: callers
//! downgrade every failure on this path to a warning.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shimmer_core_types::{NodeId, ShimmerError};
use thiserror::Error;

/// Errors surfaced by reactive bridge implementations.
#[derive(Debug, Error, Clone)]
pub enum ReactiveError {
    #[error("payload rejected: {0}")]
    PayloadInvalid(String),
    #[error("no reactive root in subtree")]
    RootMissing,
    #[error("subtree never initialized: {0}")]
    NotInitialized(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ReactiveError> for ShimmerError {
    fn from(value: ReactiveError) -> Self {
        ShimmerError::new(value.to_string())
    }
}

/// Parse the declarative state payload. Only JSON objects are accepted; a
/// bare scalar or array has nothing to merge into a reactive scope.
pub fn parse_state_payload(raw: &str) -> Result<Value, ReactiveError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(ReactiveError::PayloadInvalid(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(err) => Err(ReactiveError::PayloadInvalid(err.to_string())),
    }
}

#[async_trait]
pub trait ReactiveBridge: Send + Sync {
    /// Resolves once the library reports initialization for the subtree
    /// rooted at `root`.
    async fn subtree_ready(&self, root: &NodeId) -> Result<(), ReactiveError>;

    /// Merge `state` into the reactive scope rooted at `root`.
    async fn merge_state(&self, root: &NodeId, state: Value) -> Result<(), ReactiveError>;
}

/// Bridge for embeddings without a reactive library; accepts and discards.
pub struct NoopReactiveBridge;

impl NoopReactiveBridge {
    pub fn new() -> Arc<dyn ReactiveBridge> {
        Arc::new(Self)
    }
}

#[async_trait]
impl ReactiveBridge for NoopReactiveBridge {
    async fn subtree_ready(&self, _root: &NodeId) -> Result<(), ReactiveError> {
        Ok(())
    }

    async fn merge_state(&self, _root: &NodeId, _state: Value) -> Result<(), ReactiveError> {
        Ok(())
    }
}
