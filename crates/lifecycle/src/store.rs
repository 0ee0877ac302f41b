//! Keyed store of in-flight placeholder instances.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use shimmer_core_types::{InstanceId, NodeId};

/// Lifecycle of one placeholder activation.
///
/// `Idle` is implicit (no record exists). Records live in the store only
/// while `Loading`; reaching a terminal state removes the record and tallies
/// it in [`StoreStats`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LifecycleState {
    /// Placeholder content is on screen, the request is in flight.
    Loading,
    /// Real content was swapped in; the snapshot is discarded.
    Swapped,
    /// The saved snapshot was written back into the region.
    Restored,
    /// Superseded by a newer activation on the same region.
    Cleared,
}

/// One in-flight skeleton display: the saved original content of a region.
#[derive(Clone, Debug)]
pub struct PlaceholderInstance {
    pub id: InstanceId,
    pub region: NodeId,
    pub saved_markup: String,
    pub captured_at: DateTime<Utc>,
}

impl PlaceholderInstance {
    pub fn capture(region: NodeId, saved_markup: String) -> Self {
        Self {
            id: InstanceId::new(),
            region,
            saved_markup,
            captured_at: Utc::now(),
        }
    }
}

/// Counters over placeholder transitions, for diagnostics.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct StoreStats {
    pub activations: u64,
    pub swapped: u64,
    pub restored: u64,
    pub cleared: u64,
}

/// In-memory mapping from instance id to live placeholder instance, plus the
/// process-wide currently-active marker.
///
/// Invariants: at most one live instance per region (activating on a region
/// with a live instance clears the prior one first), and the marker names at
/// most one instance, cleared whenever that instance leaves `Loading`.
pub struct InstanceStore {
    instances: DashMap<InstanceId, PlaceholderInstance>,
    active: Mutex<Option<InstanceId>>,
    stats: Mutex<StoreStats>,
}

impl InstanceStore {
    pub fn new() -> Self {
        Self {
            instances: DashMap::new(),
            active: Mutex::new(None),
            stats: Mutex::new(StoreStats::default()),
        }
    }

    /// Record a freshly captured instance and mark it currently active,
    /// superseding any live instance on the same region so a region never
    /// owns two saved snapshots.
    pub fn activate(&self, instance: PlaceholderInstance) -> InstanceId {
        if self.take_for_region(&instance.region).is_some() {
            self.tally(LifecycleState::Cleared);
        }
        let id = instance.id.clone();
        self.instances.insert(id.clone(), instance);
        *self.active.lock() = Some(id.clone());
        let mut stats = self.stats.lock();
        stats.activations = stats.activations.saturating_add(1);
        id
    }

    pub fn get(&self, id: &InstanceId) -> Option<PlaceholderInstance> {
        self.instances.get(id).map(|entry| entry.value().clone())
    }

    /// Remove the record for `id`, tallying the terminal state reached, and
    /// clear the active marker when it names this instance. Idempotent.
    pub fn finish(&self, id: &InstanceId, state: LifecycleState) -> Option<PlaceholderInstance> {
        let removed = self.instances.remove(id).map(|(_, instance)| instance);
        if removed.is_some() {
            self.tally(state);
        }
        self.clear_active_for(id);
        removed
    }

    /// Identifier of the instance currently in flight, if any.
    pub fn active(&self) -> Option<InstanceId> {
        self.active.lock().clone()
    }

    pub fn clear_active(&self) {
        *self.active.lock() = None;
    }

    /// Clear the marker only when it names `id`.
    pub fn clear_active_for(&self, id: &InstanceId) {
        let mut active = self.active.lock();
        if active.as_ref() == Some(id) {
            *active = None;
        }
    }

    pub fn stats(&self) -> StoreStats {
        self.stats.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    fn take_for_region(&self, region: &NodeId) -> Option<PlaceholderInstance> {
        let id = self
            .instances
            .iter()
            .find(|entry| entry.value().region == *region)
            .map(|entry| entry.key().clone())?;
        self.clear_active_for(&id);
        self.instances.remove(&id).map(|(_, instance)| instance)
    }

    fn tally(&self, state: LifecycleState) {
        let mut stats = self.stats.lock();
        match state {
            LifecycleState::Loading => {}
            LifecycleState::Swapped => stats.swapped = stats.swapped.saturating_add(1),
            LifecycleState::Restored => stats.restored = stats.restored.saturating_add(1),
            LifecycleState::Cleared => stats.cleared = stats.cleared.saturating_add(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_sets_the_marker() {
        let store = InstanceStore::new();
        let region = NodeId::new();

        let id = store.activate(PlaceholderInstance::capture(region, "a".into()));
        assert_eq!(store.active(), Some(id.clone()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap().saved_markup, "a");
    }

    #[test]
    fn second_activation_on_region_supersedes_the_first() {
        let store = InstanceStore::new();
        let region = NodeId::new();

        let first = store.activate(PlaceholderInstance::capture(region.clone(), "a".into()));
        let second = store.activate(PlaceholderInstance::capture(region, "b".into()));

        assert_eq!(store.len(), 1);
        assert!(store.get(&first).is_none());
        assert_eq!(store.get(&second).unwrap().saved_markup, "b");
        assert_eq!(store.active(), Some(second));

        let stats = store.stats();
        assert_eq!(stats.activations, 2);
        assert_eq!(stats.cleared, 1);
    }

    #[test]
    fn finish_is_idempotent_and_clears_the_marker() {
        let store = InstanceStore::new();
        let region = NodeId::new();
        let id = store.activate(PlaceholderInstance::capture(region, "a".into()));

        assert!(store.finish(&id, LifecycleState::Swapped).is_some());
        assert!(store.finish(&id, LifecycleState::Swapped).is_none());
        assert!(store.active().is_none());
        assert!(store.is_empty());

        let stats = store.stats();
        assert_eq!(stats.swapped, 1);
    }

    #[test]
    fn finishing_a_stale_instance_keeps_the_current_marker() {
        let store = InstanceStore::new();
        let first = store.activate(PlaceholderInstance::capture(NodeId::new(), "a".into()));
        let second = store.activate(PlaceholderInstance::capture(NodeId::new(), "b".into()));

        store.finish(&first, LifecycleState::Restored);
        assert_eq!(store.active(), Some(second));
    }
}
