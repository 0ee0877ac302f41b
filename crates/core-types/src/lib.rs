use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the shimmer workspace crates.
#[derive(Debug, Error, Clone)]
pub enum ShimmerError {
    #[error("{message}")]
    Message { message: String },
}

impl ShimmerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Identifier of one placeholder activation.
///
/// Generated fresh per activation so overlapping requests on different
/// regions can never collide.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Opaque handle to an element owned by a DOM surface implementation.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Element selector as used by the declarative contract.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Selector(pub String);

impl Selector {
    pub fn id(id: impl AsRef<str>) -> Self {
        Self(format!("#{}", id.as_ref()))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
