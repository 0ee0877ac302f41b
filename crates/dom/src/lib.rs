//! DOM surface boundary for the skeleton lifecycle controller.
//!
//! The controller never touches a page directly; every read and write goes
//! through [`DomSurface`]. Embedders back the trait with their page runtime,
//! while [`InMemoryDom`] keeps the whole lifecycle exercisable in plain unit
//! tests.

mod memory;

pub use memory::InMemoryDom;

use shimmer_core_types::{NodeId, Selector, ShimmerError};
use thiserror::Error;

/// Errors surfaced by DOM surface implementations.
#[derive(Debug, Error, Clone)]
pub enum DomError {
    #[error("node not found")]
    NodeGone,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DomError> for ShimmerError {
    fn from(value: DomError) -> Self {
        ShimmerError::new(value.to_string())
    }
}

/// Read/write boundary to the host page.
///
/// Lookup methods return `Option` because a missing element is a
/// pre-condition miss for the caller, not a fault; mutations return `Result`
/// because writing to a vanished node is.
pub trait DomSurface: Send + Sync {
    /// Resolve a selector to a node handle.
    fn query(&self, selector: &Selector) -> Option<NodeId>;

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError>;
    fn remove_attribute(&self, node: &NodeId, name: &str) -> Result<(), DomError>;

    fn has_class(&self, node: &NodeId, class: &str) -> bool;
    fn add_class(&self, node: &NodeId, class: &str) -> Result<(), DomError>;
    fn remove_class(&self, node: &NodeId, class: &str) -> Result<(), DomError>;

    fn inner_html(&self, node: &NodeId) -> Result<String, DomError>;
    fn set_inner_html(&self, node: &NodeId, markup: &str) -> Result<(), DomError>;

    /// Nearest ancestor-or-self element carrying the attribute `name`.
    fn closest_with_attribute(&self, node: &NodeId, name: &str) -> Option<NodeId>;

    /// First descendant element (document order) carrying the attribute
    /// `name`. The node itself is not considered.
    fn descendant_with_attribute(&self, node: &NodeId, name: &str) -> Option<NodeId>;

    /// First child of `node` that is an element.
    fn first_child_element(&self, node: &NodeId) -> Option<NodeId>;

    /// All elements carrying `class`, in document order.
    fn nodes_with_class(&self, class: &str) -> Vec<NodeId>;

    /// All elements carrying the attribute `name`, in document order.
    fn nodes_with_attribute(&self, name: &str) -> Vec<NodeId>;
}
