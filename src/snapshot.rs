//! Keyed snapshots and the previous/current store.
//!
//! A [`Snapshot`] is sorted by entity key once, at construction, so every
//! later lookup is a binary search. The store never mutates a promoted
//! snapshot; each cycle builds fresh records.

use crate::error::{KvmtopError, Result};
use crate::types::{
    Collector, CounterSources, DiskSample, Entity, GlobalCpu, NetIface, SystemSummary,
    ThreadSample,
};
use std::time::Instant;

/// All entities of one resource class captured at one instant.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    entities: Vec<T>,
    captured_at: Instant,
}

impl<T: Entity> Snapshot<T> {
    /// Builds a snapshot, sorting by key and keeping the first entity
    /// seen for any duplicated key.
    #[must_use]
    pub fn new(mut entities: Vec<T>, captured_at: Instant) -> Self {
        entities.sort_by(|a, b| a.key().cmp(b.key()));
        entities.dedup_by(|later, earlier| later.key() == earlier.key());
        Self { entities, captured_at }
    }

    /// An empty snapshot.
    #[must_use]
    pub fn empty(captured_at: Instant) -> Self {
        Self { entities: Vec::new(), captured_at }
    }

    /// Reads a collector and wraps the result.
    ///
    /// # Errors
    ///
    /// Propagates the collector's error.
    pub fn capture<C>(collector: &mut C) -> Result<Self>
    where
        C: Collector<Output = Vec<T>> + ?Sized,
    {
        let entities = collector.collect()?;
        Ok(Self::new(entities, Instant::now()))
    }

    /// Finds the entity with `key`.
    pub fn lookup(&self, key: &T::Key) -> Option<&T> {
        self.entities.binary_search_by(|e| e.key().cmp(key)).ok().map(|idx| &self.entities[idx])
    }

    /// Entities in key order.
    #[must_use]
    pub fn entities(&self) -> &[T] {
        &self.entities
    }

    /// Mutable access for attaching derived values; keys must not change.
    pub fn entities_mut(&mut self) -> &mut [T] {
        &mut self.entities
    }

    /// Capture timestamp.
    #[must_use]
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// A single timestamped value, for the non-keyed classes.
#[derive(Debug, Clone)]
pub struct Sampled<T> {
    /// The value.
    pub value: T,
    /// Capture timestamp.
    pub captured_at: Instant,
}

/// Previous and current slot for one resource class.
#[derive(Debug, Clone)]
pub struct Slots<S> {
    previous: Option<S>,
    current: Option<S>,
}

impl<S> Default for Slots<S> {
    fn default() -> Self {
        Self { previous: None, current: None }
    }
}

impl<S> Slots<S> {
    /// The snapshot from the last completed cycle.
    #[must_use]
    pub fn previous(&self) -> Option<&S> {
        self.previous.as_ref()
    }

    /// The snapshot of this cycle.
    #[must_use]
    pub fn current(&self) -> Option<&S> {
        self.current.as_ref()
    }

    /// Both slots, the current one mutable.
    pub fn pair_mut(&mut self) -> (Option<&S>, Option<&mut S>) {
        (self.previous.as_ref(), self.current.as_mut())
    }

    /// Installs this cycle's snapshot.
    pub fn set_current(&mut self, snapshot: S) {
        self.current = Some(snapshot);
    }

    /// Moves current into previous, leaving current empty.
    ///
    /// Without a current snapshot the previous one is kept.
    pub fn promote(&mut self) {
        if let Some(current) = self.current.take() {
            self.previous = Some(current);
        }
    }
}

/// Previous/current snapshots for every resource class.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    /// Thread snapshots.
    pub threads: Slots<Snapshot<ThreadSample>>,
    /// Interface snapshots.
    pub interfaces: Slots<Snapshot<NetIface>>,
    /// Block device snapshots.
    pub disks: Slots<Snapshot<DiskSample>>,
    /// Global CPU samples.
    pub cpu: Slots<Sampled<GlobalCpu>>,
    /// Latest system gauges; never diffed.
    pub system: SystemSummary,
}

/// Captures one class, degrading to an empty snapshot on read failure.
///
/// Allocation failure is the one error that always propagates.
fn capture_or_empty<T: Entity>(
    collector: &mut dyn Collector<Output = Vec<T>>,
) -> Result<Snapshot<T>> {
    match Snapshot::capture(&mut *collector) {
        Ok(snapshot) => {
            crate::debug!(
                "snapshot",
                "{}: {} entities",
                collector.display_name(),
                snapshot.len()
            );
            Ok(snapshot)
        }
        Err(e @ KvmtopError::OutOfMemory { .. }) => Err(e),
        Err(e) => {
            crate::warn!("snapshot", "{}: {}", collector.display_name(), e);
            Ok(Snapshot::empty(Instant::now()))
        }
    }
}

impl SnapshotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the current slot of every class from `sources`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if an entity collection cannot grow. Other
    /// source failures leave that class empty for the cycle.
    pub fn capture_all(&mut self, sources: &mut CounterSources) -> Result<()> {
        crate::time_scope!("snapshot", "capture_all");

        self.threads.set_current(capture_or_empty(sources.threads.as_mut())?);
        self.interfaces.set_current(capture_or_empty(sources.interfaces.as_mut())?);
        self.disks.set_current(capture_or_empty(sources.disks.as_mut())?);

        match sources.cpu.collect() {
            Ok(value) => self.cpu.set_current(Sampled { value, captured_at: Instant::now() }),
            Err(e) => crate::warn!("snapshot", "cpu: {}", e),
        }
        match sources.system.collect() {
            Ok(summary) => self.system = summary,
            Err(e) => crate::warn!("snapshot", "system: {}", e),
        }
        Ok(())
    }

    /// Replaces previous with current for every class.
    pub fn promote(&mut self) {
        self.threads.promote();
        self.interfaces.promote();
        self.disks.promote();
        self.cpu.promote();
    }
}
