//! Broadcast bus carrying engine lifecycle events to the controller.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::controller::SkeletonController;
use crate::error::LifecycleError;
use crate::events::LifecycleEvent;

/// In-memory broadcast channel a page-update engine adapter publishes into.
///
/// Subscribe (or [`attach`] a controller) before publishing; a broadcast
/// channel does not buffer for subscribers that do not exist yet.
pub struct LifecycleBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleBus {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    pub fn publish(&self, event: LifecycleEvent) -> Result<(), LifecycleError> {
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|_| LifecycleError::BusClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}

/// Drive `controller` from `bus` on a background task, preserving
/// publication order. The task ends when the bus is dropped.
pub fn attach(bus: &LifecycleBus, controller: Arc<SkeletonController>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => controller.handle_event(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "lifecycle bus lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::ControllerConfig;
    use shimmer_dom::{DomSurface, InMemoryDom};

    #[tokio::test]
    async fn published_events_reach_the_controller_in_order() {
        let dom = Arc::new(InMemoryDom::new());

        let region = dom.create_element("div");
        dom.set_attribute(&region, "id", "content").unwrap();
        dom.set_inner_html(&region, "A").unwrap();
        dom.append_child(&dom.root(), &region).unwrap();

        let template = dom.create_element("template");
        dom.set_attribute(&template, "id", "skeleton").unwrap();
        dom.set_inner_html(&template, "<p>Loading</p>").unwrap();
        dom.append_child(&dom.root(), &template).unwrap();

        let control = dom.create_element("button");
        dom.set_attribute(&control, "data-skeleton", "").unwrap();
        dom.set_attribute(&control, "data-target", "#content").unwrap();
        dom.append_child(&dom.root(), &control).unwrap();

        let controller = Arc::new(SkeletonController::new(
            dom.clone(),
            ControllerConfig::default(),
        ));
        let bus = LifecycleBus::new(16);
        let pump = attach(&bus, controller.clone());

        bus.publish(LifecycleEvent::RequestStarted {
            control: control.clone(),
        })
        .unwrap();
        bus.publish(LifecycleEvent::ResponseError { control }).unwrap();

        let mut spins = 0;
        while controller.stats().restored == 0 {
            tokio::task::yield_now().await;
            spins += 1;
            assert!(spins < 100, "events never drained");
        }

        assert_eq!(dom.inner_html(&region).unwrap(), "A");
        assert!(!dom.has_class(&region, "skeleton-loading"));
        assert_eq!(controller.live_instances(), 0);

        drop(bus);
        pump.await.unwrap();
    }
}
