//! Declarative contract configuration.

use serde::{Deserialize, Serialize};
use shimmer_core_types::Selector;

/// Attribute and class names the controller reads and writes, plus the
/// default template selector.
///
/// Defaults preserve the conventional wire contract: regions in flight carry
/// the `skeleton-loading` class, templates default to `#skeleton`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Opt-in capability flag, looked up on the control or an ancestor.
    pub opt_in_attribute: String,
    /// Per-control template override; the value is a selector.
    pub template_attribute: String,
    /// Per-control target-region override; the value is a selector.
    pub target_attribute: String,
    /// The engine's own declared-update-target attribute; the value is a
    /// selector. Absent both overrides, the control itself is the target.
    pub engine_target_attribute: String,
    /// Reactive-state initialization payload (JSON object text).
    pub state_attribute: String,
    /// Back-reference from a region to its live placeholder instance.
    pub instance_attribute: String,
    /// Marker naming a reactive root inside injected placeholder content.
    pub reactive_root_attribute: String,
    /// Visual state class applied to a region while a request is in flight.
    pub loading_class: String,
    /// Template used when no per-control override is present.
    pub default_template: Selector,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            opt_in_attribute: "data-skeleton".into(),
            template_attribute: "data-skeleton-template".into(),
            target_attribute: "data-skeleton-target".into(),
            engine_target_attribute: "data-target".into(),
            state_attribute: "data-skeleton-state".into(),
            instance_attribute: "data-skeleton-id".into(),
            reactive_root_attribute: "data-state".into(),
            loading_class: "skeleton-loading".into(),
            default_template: Selector::id("skeleton"),
        }
    }
}
