//! Trigger resolution: from a control element to the concrete pieces a
//! lifecycle step needs.

use shimmer_core_types::{NodeId, Selector};
use shimmer_dom::DomSurface;

use crate::config::ControllerConfig;

/// Everything a lifecycle step needs to act on a trigger.
#[derive(Clone, Debug)]
pub struct ResolvedTrigger {
    pub control: NodeId,
    pub target: NodeId,
    /// Present when the template selector resolved. Guaranteed for callers
    /// passing `require_template`.
    pub template: Option<NodeId>,
    /// Raw reactive-state payload declared on the control, if any.
    pub state_payload: Option<String>,
}

/// Resolve the declarative contract for `control`.
///
/// Returns `None` when the control has not opted in, when the target region
/// cannot be found, or when `require_template` is set and the template
/// selector resolves to nothing. `None` is a pre-condition miss; callers
/// treat it as a silent no-op, never an error.
pub fn resolve_trigger(
    dom: &dyn DomSurface,
    config: &ControllerConfig,
    control: &NodeId,
    require_template: bool,
) -> Option<ResolvedTrigger> {
    dom.closest_with_attribute(control, &config.opt_in_attribute)?;

    let target = resolve_target(dom, config, control)?;

    let template = dom.query(&template_selector(dom, config, control));
    if require_template && template.is_none() {
        return None;
    }

    let state_payload = dom.attribute(control, &config.state_attribute);

    Some(ResolvedTrigger {
        control: control.clone(),
        target,
        template,
        state_payload,
    })
}

/// Explicit override selector, else the engine-declared target selector,
/// else the control element itself (the engine's default resolution rule).
/// A selector that is present but resolves to nothing is a resolution
/// failure, not a fall-through.
fn resolve_target(
    dom: &dyn DomSurface,
    config: &ControllerConfig,
    control: &NodeId,
) -> Option<NodeId> {
    if let Some(selector) = dom.attribute(control, &config.target_attribute) {
        return dom.query(&Selector(selector));
    }
    if let Some(selector) = dom.attribute(control, &config.engine_target_attribute) {
        return dom.query(&Selector(selector));
    }
    Some(control.clone())
}

fn template_selector(
    dom: &dyn DomSurface,
    config: &ControllerConfig,
    control: &NodeId,
) -> Selector {
    dom.attribute(control, &config.template_attribute)
        .map(Selector)
        .unwrap_or_else(|| config.default_template.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    use shimmer_dom::InMemoryDom;

    fn page() -> (InMemoryDom, NodeId, NodeId) {
        let dom = InMemoryDom::new();

        let region = dom.create_element("div");
        dom.set_attribute(&region, "id", "content").unwrap();
        dom.append_child(&dom.root(), &region).unwrap();

        let template = dom.create_element("template");
        dom.set_attribute(&template, "id", "skeleton").unwrap();
        dom.append_child(&dom.root(), &template).unwrap();

        let control = dom.create_element("button");
        dom.set_attribute(&control, "data-skeleton", "").unwrap();
        dom.set_attribute(&control, "data-target", "#content").unwrap();
        dom.append_child(&dom.root(), &control).unwrap();

        (dom, region, control)
    }

    #[test]
    fn resolves_target_and_default_template() {
        let (dom, region, control) = page();
        let config = ControllerConfig::default();

        let resolved = resolve_trigger(&dom, &config, &control, true).expect("resolved");
        assert_eq!(resolved.target, region);
        assert!(resolved.template.is_some());
        assert!(resolved.state_payload.is_none());
    }

    #[test]
    fn control_without_opt_in_is_skipped() {
        let (dom, _, control) = page();
        let config = ControllerConfig::default();
        dom.remove_attribute(&control, "data-skeleton").unwrap();

        assert!(resolve_trigger(&dom, &config, &control, true).is_none());
    }

    #[test]
    fn opt_in_on_ancestor_is_honored() {
        let dom = InMemoryDom::new();
        let config = ControllerConfig::default();

        let container = dom.create_element("div");
        dom.set_attribute(&container, "data-skeleton", "").unwrap();
        dom.append_child(&dom.root(), &container).unwrap();

        let control = dom.create_element("button");
        dom.append_child(&container, &control).unwrap();

        // No target attributes: the control itself becomes the target, and
        // the error path does not require a template.
        let resolved = resolve_trigger(&dom, &config, &control, false).expect("resolved");
        assert_eq!(resolved.target, control);
        assert!(resolved.template.is_none());
    }

    #[test]
    fn template_override_wins_over_default() {
        let (dom, _, control) = page();
        let config = ControllerConfig::default();

        let custom = dom.create_element("template");
        dom.set_attribute(&custom, "id", "my-skeleton").unwrap();
        dom.append_child(&dom.root(), &custom).unwrap();
        dom.set_attribute(&control, "data-skeleton-template", "#my-skeleton")
            .unwrap();

        let resolved = resolve_trigger(&dom, &config, &control, true).expect("resolved");
        assert_eq!(resolved.template, Some(custom));
    }

    #[test]
    fn missing_template_blocks_only_when_required() {
        let (dom, _, control) = page();
        let config = ControllerConfig::default();
        dom.set_attribute(&control, "data-skeleton-template", "#nope")
            .unwrap();

        assert!(resolve_trigger(&dom, &config, &control, true).is_none());
        assert!(resolve_trigger(&dom, &config, &control, false).is_some());
    }

    #[test]
    fn stale_target_selector_is_a_resolution_failure() {
        let (dom, _, control) = page();
        let config = ControllerConfig::default();
        dom.set_attribute(&control, "data-skeleton-target", "#vanished")
            .unwrap();

        assert!(resolve_trigger(&dom, &config, &control, true).is_none());
    }
}
