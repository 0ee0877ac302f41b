//! Skeleton lifecycle coordination over a page-update engine's event stream.
//!
//! The controller subscribes to the engine's request/history lifecycle,
//! snapshots a target region before overwriting it with placeholder content,
//! and restores or discards that snapshot depending on how the request ends,
//! including across history-cache snapshotting.

pub mod bus;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod resolve;
pub mod store;

pub use bus::{attach, LifecycleBus};
pub use config::ControllerConfig;
pub use controller::SkeletonController;
pub use error::LifecycleError;
pub use events::LifecycleEvent;
pub use resolve::{resolve_trigger, ResolvedTrigger};
pub use store::{InstanceStore, LifecycleState, PlaceholderInstance, StoreStats};
