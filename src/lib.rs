//! Shimmer library
//!
//! Skeleton screens for asynchronous partial-page updates: snapshot a target
//! region, show placeholder content while a request is in flight, restore or
//! discard the snapshot depending on the outcome, including across
//! history-cache snapshotting.
//!
//! Re-exports the workspace surface for embedders and integration tests.

pub use shimmer_core_types::{InstanceId, NodeId, Selector, ShimmerError};
pub use shimmer_dom::{DomError, DomSurface, InMemoryDom};
pub use shimmer_lifecycle::{
    attach, ControllerConfig, LifecycleBus, LifecycleEvent, SkeletonController, StoreStats,
};
pub use shimmer_reactive_bridge::{
    parse_state_payload, NoopReactiveBridge, ReactiveBridge, ReactiveError,
};
