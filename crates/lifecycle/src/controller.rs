//! The skeleton lifecycle controller.

use std::sync::Arc;

use shimmer_core_types::{InstanceId, NodeId};
use shimmer_dom::DomSurface;
use shimmer_reactive_bridge::{parse_state_payload, ReactiveBridge};
use tracing::{debug, warn};

use crate::config::ControllerConfig;
use crate::events::LifecycleEvent;
use crate::resolve::{resolve_trigger, ResolvedTrigger};
use crate::store::{InstanceStore, LifecycleState, PlaceholderInstance, StoreStats};

/// Coordinates placeholder display across the request lifecycle.
///
/// All handlers are synchronous: every store and DOM effect of an event is
/// complete when `handle_event` returns, so effect ordering is exactly the
/// order in which the engine dispatches events. The optional reactive-state
/// merge is the one deferred step and never gates the lifecycle.
pub struct SkeletonController {
    dom: Arc<dyn DomSurface>,
    reactive: Option<Arc<dyn ReactiveBridge>>,
    config: ControllerConfig,
    store: InstanceStore,
}

impl SkeletonController {
    pub fn new(dom: Arc<dyn DomSurface>, config: ControllerConfig) -> Self {
        Self {
            dom,
            reactive: None,
            config,
            store: InstanceStore::new(),
        }
    }

    /// Attach the optional reactive-state bridge.
    pub fn with_reactive(mut self, bridge: Arc<dyn ReactiveBridge>) -> Self {
        self.reactive = Some(bridge);
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Counters over completed transitions, for diagnostics.
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Number of in-flight placeholder instances.
    pub fn live_instances(&self) -> usize {
        self.store.len()
    }

    pub fn handle_event(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::RequestStarted { control } => self.on_request_started(&control),
            LifecycleEvent::BeforeSwap { target } => self.on_before_swap(&target),
            LifecycleEvent::AfterSwap { target } => self.on_after_swap(&target),
            LifecycleEvent::ResponseError { control } | LifecycleEvent::SendError { control } => {
                self.on_transport_error(&control)
            }
            LifecycleEvent::BeforeHistorySnapshot => self.on_before_history_snapshot(),
            LifecycleEvent::HistoryRestored => self.on_history_restored(),
        }
    }

    fn on_request_started(&self, control: &NodeId) {
        let Some(resolved) = resolve_trigger(self.dom.as_ref(), &self.config, control, true)
        else {
            return;
        };
        let Some(template) = resolved.template.as_ref() else {
            return;
        };

        let skeleton_markup = match self.dom.inner_html(template) {
            Ok(markup) => markup,
            Err(err) => {
                warn!(%err, "skeleton template unreadable");
                return;
            }
        };
        let saved_markup = match self.dom.inner_html(&resolved.target) {
            Ok(markup) => markup,
            Err(err) => {
                warn!(%err, "target region unreadable");
                return;
            }
        };

        let instance = PlaceholderInstance::capture(resolved.target.clone(), saved_markup);
        let id = self.store.activate(instance);
        debug!(instance = %id.0, state = ?LifecycleState::Loading, "placeholder activated");

        if let Err(err) =
            self.dom
                .set_attribute(&resolved.target, &self.config.instance_attribute, &id.0)
        {
            warn!(%err, "failed to tag target region");
        }
        if let Err(err) = self.dom.set_inner_html(&resolved.target, &skeleton_markup) {
            warn!(%err, "failed to inject placeholder content");
        }
        if let Err(err) = self.dom.add_class(&resolved.target, &self.config.loading_class) {
            warn!(%err, "failed to flag loading state");
        }

        self.schedule_state_merge(&resolved);
    }

    fn on_before_swap(&self, target: &NodeId) {
        if self.dom.has_class(target, &self.config.loading_class) {
            if let Err(err) = self.dom.remove_class(target, &self.config.loading_class) {
                warn!(%err, "failed to clear loading state before swap");
            }
        }
        // The in-flight request has reached its conclusion point. A marker
        // naming another region's activation is left alone.
        match self.tagged_instance(target) {
            Some(id) => self.store.clear_active_for(&id),
            None => self.store.clear_active(),
        }
    }

    fn on_after_swap(&self, target: &NodeId) {
        let Some(id) = self.tagged_instance(target) else {
            return;
        };
        if self.store.finish(&id, LifecycleState::Swapped).is_some() {
            debug!(instance = %id.0, state = ?LifecycleState::Swapped, "placeholder resolved");
        }
        if let Err(err) = self.dom.remove_attribute(target, &self.config.instance_attribute) {
            warn!(%err, "failed to untag swapped region");
        }
    }

    fn on_transport_error(&self, control: &NodeId) {
        let Some(resolved) = resolve_trigger(self.dom.as_ref(), &self.config, control, false)
        else {
            return;
        };
        let target = resolved.target;

        if let Some(id) = self.tagged_instance(&target) {
            if let Some(instance) = self.store.finish(&id, LifecycleState::Restored) {
                if let Err(err) = self.dom.set_inner_html(&target, &instance.saved_markup) {
                    warn!(%err, "failed to restore saved content");
                }
                debug!(instance = %id.0, state = ?LifecycleState::Restored, "placeholder restored after error");
            }
            if let Err(err) = self.dom.remove_attribute(&target, &self.config.instance_attribute) {
                warn!(%err, "failed to untag region after error");
            }
        }

        // The loading flag comes off even when no snapshot was found.
        if let Err(err) = self.dom.remove_class(&target, &self.config.loading_class) {
            warn!(%err, "failed to clear loading state after error");
        }
    }

    fn on_before_history_snapshot(&self) {
        let active = self.store.active();
        for region in self.dom.nodes_with_attribute(&self.config.instance_attribute) {
            let Some(id) = self.tagged_instance(&region) else {
                continue;
            };
            if active.as_ref() == Some(&id) {
                // An in-flight placeholder stays visible in the snapshot so a
                // later history restore still shows the loading state.
                continue;
            }
            if let Some(instance) = self.store.finish(&id, LifecycleState::Restored) {
                if let Err(err) = self.dom.set_inner_html(&region, &instance.saved_markup) {
                    warn!(%err, "failed to restore region before history snapshot");
                }
            }
            if let Err(err) = self.dom.remove_class(&region, &self.config.loading_class) {
                warn!(%err, "failed to clear loading state before history snapshot");
            }
            if let Err(err) = self.dom.remove_attribute(&region, &self.config.instance_attribute)
            {
                warn!(%err, "failed to untag region before history snapshot");
            }
        }
    }

    fn on_history_restored(&self) {
        // A reactivated snapshot is a static page; it must never present as
        // loading, whatever the store thinks.
        for region in self.dom.nodes_with_class(&self.config.loading_class) {
            if let Err(err) = self.dom.remove_class(&region, &self.config.loading_class) {
                warn!(%err, "failed to clear loading state after history restore");
            }
        }
    }

    /// Best-effort deferred merge of declared state into the injected
    /// subtree. Never gates placeholder display; every failure is a warning.
    fn schedule_state_merge(&self, resolved: &ResolvedTrigger) {
        let (Some(bridge), Some(raw)) = (self.reactive.as_ref(), resolved.state_payload.as_deref())
        else {
            return;
        };
        let state = match parse_state_payload(raw) {
            Ok(state) => state,
            Err(err) => {
                warn!(%err, "reactive state payload rejected");
                return;
            }
        };
        let root = self
            .dom
            .descendant_with_attribute(&resolved.target, &self.config.reactive_root_attribute)
            .or_else(|| self.dom.first_child_element(&resolved.target));
        let Some(root) = root else {
            warn!("no reactive root in injected placeholder content");
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; skipping reactive state merge");
            return;
        };
        let bridge = Arc::clone(bridge);
        handle.spawn(async move {
            if let Err(err) = bridge.subtree_ready(&root).await {
                warn!(%err, "reactive subtree never became ready");
                return;
            }
            if let Err(err) = bridge.merge_state(&root, state).await {
                warn!(%err, "reactive state merge failed");
            }
        });
    }

    fn tagged_instance(&self, target: &NodeId) -> Option<InstanceId> {
        self.dom
            .attribute(target, &self.config.instance_attribute)
            .map(InstanceId)
    }
}
