use thiserror::Error;

use shimmer_core_types::ShimmerError;

/// Errors surfaced by the lifecycle crate's public operations.
#[derive(Debug, Error, Clone)]
pub enum LifecycleError {
    /// The bus has no live subscribers left to deliver to.
    #[error("lifecycle bus closed")]
    BusClosed,
}

impl From<LifecycleError> for ShimmerError {
    fn from(value: LifecycleError) -> Self {
        ShimmerError::new(value.to_string())
    }
}
