//! Debounced write-behind for item field changes.
//!
//! Each item has at most one pending buffer and one timer. A new edit merges
//! into the buffer (newer keys win), cancels the old timer and starts a new
//! one, so a burst of edits inside the quiescence window becomes one write.
//! Writes for one item are serialized through a per-item async lock; writes
//! for different items run independently.
//!
//! A failed write is not retried. Its payload is kept, reported through
//! [`EngineEvent::WriteFailed`], and resent by [`DebouncedPersister::retry_failed`]
//! or by the next edit of the same item.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use auditdesk_core::identity::Actor;
use auditdesk_core::repository::AuditRepository;
use auditdesk_core::updates::ItemChanges;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

use crate::events::{EngineEvent, EventBus};

/// A write that reached the store and was refused or failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedWrite {
    pub item_id: String,
    pub changes: ItemChanges,
    pub actor: Actor,
    pub error: String,
}

/// Outcome of an explicit flush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Items whose buffered changes were written by this flush.
    pub committed: Vec<String>,
    /// Items among those flushed that currently hold a failed payload.
    pub failed: Vec<FailedWrite>,
}

impl FlushReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

struct PendingWrite {
    changes: ItemChanges,
    actor: Actor,
    generation: u64,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct State {
    next_generation: u64,
    pending: HashMap<String, PendingWrite>,
    failed: HashMap<String, FailedWrite>,
    slots: HashMap<String, Arc<AsyncMutex<()>>>,
}

impl State {
    /// Per-item write lock; holding it means a write for the item is in flight.
    fn slot(&mut self, item_id: &str) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.slots.entry(item_id.to_string()).or_default())
    }

    /// Forget an item's write lock once the caller is its last user. Every
    /// clone is taken under the state lock, so the count cannot grow here.
    fn release_slot(&mut self, item_id: &str, slot: &Arc<AsyncMutex<()>>) {
        let last_user = self
            .slots
            .get(item_id)
            .is_some_and(|held| Arc::ptr_eq(held, slot) && Arc::strong_count(slot) == 2);
        if last_user {
            self.slots.remove(item_id);
        }
    }
}

struct Inner<R> {
    repo: Arc<R>,
    events: EventBus,
    window: Duration,
    state: Mutex<State>,
}

pub struct DebouncedPersister<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for DebouncedPersister<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> Inner<R> {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: AuditRepository + 'static> Inner<R> {
    /// Timer expiry. Only the timer whose generation is still current writes.
    async fn fire(&self, item_id: &str, generation: u64) {
        let (changes, actor, slot) = {
            let mut state = self.lock_state();
            if state
                .pending
                .get(item_id)
                .is_none_or(|p| p.generation != generation)
            {
                return;
            }
            let Some(pending) = state.pending.remove(item_id) else {
                return;
            };
            (pending.changes, pending.actor, state.slot(item_id))
        };
        let _ = self.write(item_id, changes, actor, slot).await;
    }

    async fn write(
        &self,
        item_id: &str,
        changes: ItemChanges,
        actor: Actor,
        slot: Arc<AsyncMutex<()>>,
    ) -> Result<(), String> {
        let in_flight = slot.lock().await;
        let result = match self
            .repo
            .update_item_fields(item_id, &changes, &actor)
            .await
        {
            Ok(()) => {
                tracing::debug!(item_id, fields = ?changes.changed_fields(), "item write committed");
                self.events.emit_lossy(EngineEvent::WriteCommitted {
                    item_id: item_id.to_string(),
                });
                Ok(())
            }
            Err(err) => {
                let error = err.to_string();
                tracing::warn!(item_id, error = %error, "item write failed");
                self.record_failure(item_id, changes, actor, &error);
                self.events.emit_lossy(EngineEvent::WriteFailed {
                    item_id: item_id.to_string(),
                    error: error.clone(),
                });
                Err(error)
            }
        };
        drop(in_flight);
        self.lock_state().release_slot(item_id, &slot);
        result
    }

    /// Keep a failed payload. If newer edits are already buffered, the failed
    /// fields go underneath them so the next write carries both.
    fn record_failure(&self, item_id: &str, changes: ItemChanges, actor: Actor, error: &str) {
        let mut state = self.lock_state();
        if let Some(pending) = state.pending.get_mut(item_id) {
            let mut base = changes;
            base.merge(std::mem::take(&mut pending.changes));
            pending.changes = base;
            return;
        }
        match state.failed.entry(item_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let failed = entry.get_mut();
                failed.changes.merge(changes);
                failed.actor = actor;
                failed.error = error.to_string();
            }
            Entry::Vacant(entry) => {
                entry.insert(FailedWrite {
                    item_id: item_id.to_string(),
                    changes,
                    actor,
                    error: error.to_string(),
                });
            }
        }
    }
}

impl<R: AuditRepository + 'static> DebouncedPersister<R> {
    #[must_use]
    pub fn new(repo: Arc<R>, events: EventBus, window: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                repo,
                events,
                window,
                state: Mutex::new(State::default()),
            }),
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.inner.window
    }

    /// Buffer `changes` for `item_id` and (re)start its timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, item_id: &str, changes: ItemChanges, actor: &Actor) {
        if changes.is_empty() {
            return;
        }
        let mut state = self.inner.lock_state();
        state.next_generation += 1;
        let generation = state.next_generation;

        let mut merged = state
            .failed
            .remove(item_id)
            .map(|failed| failed.changes)
            .unwrap_or_default();
        let coalesced = if let Some(previous) = state.pending.remove(item_id) {
            previous.timer.abort();
            merged.merge(previous.changes);
            true
        } else {
            false
        };
        merged.merge(changes);

        let inner = Arc::clone(&self.inner);
        let id = item_id.to_string();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(inner.window).await;
            inner.fire(&id, generation).await;
        });

        state.pending.insert(
            item_id.to_string(),
            PendingWrite {
                changes: merged,
                actor: actor.clone(),
                generation,
                timer,
            },
        );
        tracing::debug!(item_id, generation, coalesced, "scheduled item write");
    }

    /// Write the buffers of `item_ids` now, and wait for any write of those
    /// items already in flight.
    pub async fn flush_items(&self, item_ids: &[String]) -> FlushReport {
        let mut jobs = Vec::new();
        {
            let mut state = self.inner.lock_state();
            for id in item_ids {
                if let Some(pending) = state.pending.remove(id) {
                    pending.timer.abort();
                    let slot = state.slot(id);
                    jobs.push((id.clone(), Some((pending.changes, pending.actor)), slot));
                } else if let Some(slot) = state.slots.get(id).cloned() {
                    jobs.push((id.clone(), None, slot));
                }
            }
        }

        let mut report = FlushReport::default();
        for (id, payload, slot) in jobs {
            match payload {
                Some((changes, actor)) => {
                    if self.inner.write(&id, changes, actor, slot).await.is_ok() {
                        report.committed.push(id);
                    }
                }
                None => {
                    drop(slot.lock().await);
                    self.inner.lock_state().release_slot(&id, &slot);
                }
            }
        }

        let state = self.inner.lock_state();
        report.failed = item_ids
            .iter()
            .filter_map(|id| state.failed.get(id).cloned())
            .collect();
        drop(state);

        tracing::debug!(
            committed = report.committed.len(),
            failed = report.failed.len(),
            "flushed item writes"
        );
        report
    }

    /// Flush every item with buffered or in-flight writes.
    pub async fn flush_all(&self) -> FlushReport {
        let ids: Vec<String> = {
            let state = self.inner.lock_state();
            state
                .pending
                .keys()
                .chain(state.slots.keys())
                .chain(state.failed.keys())
                .cloned()
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect()
        };
        self.flush_items(&ids).await
    }

    /// Reschedule the failed payload of an item through the debounce window.
    ///
    /// Returns `false` when the item has no failed write.
    pub fn retry_failed(&self, item_id: &str) -> bool {
        let failed = self.inner.lock_state().failed.remove(item_id);
        match failed {
            Some(failed) => {
                tracing::debug!(item_id, "retrying failed item write");
                self.schedule(item_id, failed.changes, &failed.actor);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn has_pending(&self, item_id: &str) -> bool {
        self.inner.lock_state().pending.contains_key(item_id)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.lock_state().pending.len()
    }

    #[must_use]
    pub fn failure(&self, item_id: &str) -> Option<FailedWrite> {
        self.inner.lock_state().failed.get(item_id).cloned()
    }

    /// Items that currently hold a write lock.
    #[cfg(test)]
    fn locked_items(&self) -> usize {
        self.inner.lock_state().slots.len()
    }

    #[must_use]
    pub fn failed_writes(&self) -> Vec<FailedWrite> {
        let mut failed: Vec<FailedWrite> = self.inner.lock_state().failed.values().cloned().collect();
        failed.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        failed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use auditdesk_core::enums::Remark;
    use auditdesk_core::identity::Actor;
    use auditdesk_core::updates::ItemChangesBuilder;
    use pretty_assertions::assert_eq;

    use super::DebouncedPersister;
    use crate::events::{EngineEvent, EventBus};
    use crate::test_support::helpers::MockRepo;

    const WINDOW: Duration = Duration::from_millis(1000);

    async fn setup(rows: u32) -> (Arc<MockRepo>, DebouncedPersister<MockRepo>, Vec<String>) {
        let repo = Arc::new(MockRepo::default());
        let (_, items) = repo.seed("user-1", rows).await;
        let persister = DebouncedPersister::new(Arc::clone(&repo), EventBus::new(64), WINDOW);
        (repo, persister, items.into_iter().map(|i| i.id).collect())
    }

    fn observation(text: &str) -> auditdesk_core::updates::ItemChanges {
        ItemChangesBuilder::new().observation(text).build()
    }

    #[tokio::test(start_paused = true)]
    async fn burst_on_one_item_is_one_write() {
        let (repo, persister, ids) = setup(1).await;
        let actor = Actor::new("user-1");

        for text in ["P", "Pa", "Pal", "Pallet"] {
            persister.schedule(&ids[0], observation(text), &actor);
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        persister.schedule(
            &ids[0],
            ItemChangesBuilder::new().remark(Some(Remark::No)).build(),
            &actor,
        );
        assert_eq!(repo.write_count(), 0);

        tokio::time::sleep(WINDOW + Duration::from_millis(10)).await;

        let writes = repo.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0].1,
            ItemChangesBuilder::new()
                .observation("Pallet")
                .remark(Some(Remark::No))
                .build()
        );
        assert!(!persister.has_pending(&ids[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_items_write_independently() {
        let (repo, persister, ids) = setup(3).await;
        let actor = Actor::new("user-1");
        for id in &ids {
            persister.schedule(id, observation("checked"), &actor);
        }
        assert_eq!(persister.pending_count(), 3);

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(repo.write_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_gaps_longer_than_window_write_twice() {
        let (repo, persister, ids) = setup(1).await;
        let actor = Actor::new("user-1");

        persister.schedule(&ids[0], observation("first"), &actor);
        tokio::time::sleep(WINDOW * 2).await;
        persister.schedule(&ids[0], observation("second"), &actor);
        tokio::time::sleep(WINDOW * 2).await;

        let writes = repo.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].1.observation.as_deref(), Some("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn one_write_in_flight_per_item() {
        let (repo, persister, ids) = setup(1).await;
        let actor = Actor::new("user-1");
        repo.set_write_delay(Duration::from_millis(1500));

        persister.schedule(&ids[0], observation("a"), &actor);
        tokio::time::sleep(WINDOW + Duration::from_millis(100)).await;
        // First write is now sleeping inside the store.
        persister.schedule(&ids[0], observation("b"), &actor);
        tokio::time::sleep(WINDOW * 4).await;

        assert_eq!(repo.write_count(), 2);
        assert_eq!(repo.max_in_flight(), 1);
        assert_eq!(repo.item(&ids[0]).observation, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn write_locks_are_released_after_writes() {
        let (repo, persister, ids) = setup(3).await;
        let actor = Actor::new("user-1");
        repo.set_write_delay(Duration::from_millis(500));

        for id in &ids {
            persister.schedule(id, observation("checked"), &actor);
        }
        tokio::time::sleep(WINDOW + Duration::from_millis(100)).await;
        assert_eq!(persister.locked_items(), 3);

        tokio::time::sleep(WINDOW).await;
        assert_eq!(repo.write_count(), 3);
        assert_eq!(persister.locked_items(), 0);

        persister.schedule(&ids[0], observation("again"), &actor);
        let report = persister.flush_all().await;
        assert_eq!(report.committed, vec![ids[0].clone()]);
        assert_eq!(persister.locked_items(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_reported_and_kept_for_retry() {
        let (repo, persister, ids) = setup(1).await;
        let events = persister.inner.events.clone();
        let mut rx = events.subscribe();
        let actor = Actor::new("user-1");
        repo.fail_writes(true);

        persister.schedule(&ids[0], observation("lost?"), &actor);
        tokio::time::sleep(WINDOW * 2).await;

        assert!(matches!(
            rx.recv().await.unwrap(),
            EngineEvent::WriteFailed { ref item_id, .. } if item_id == &ids[0]
        ));
        let failed = persister.failure(&ids[0]).unwrap();
        assert_eq!(failed.changes, observation("lost?"));
        // No automatic retry.
        tokio::time::sleep(WINDOW * 5).await;
        assert_eq!(repo.write_count(), 0);

        repo.fail_writes(false);
        assert!(persister.retry_failed(&ids[0]));
        assert!(!persister.retry_failed(&ids[0]));
        tokio::time::sleep(WINDOW * 2).await;

        assert_eq!(repo.item(&ids[0]).observation, "lost?");
        assert!(persister.failed_writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn next_edit_carries_failed_fields() {
        let (repo, persister, ids) = setup(1).await;
        let actor = Actor::new("user-1");
        repo.fail_writes(true);
        persister.schedule(
            &ids[0],
            ItemChangesBuilder::new().remark(Some(Remark::Yes)).build(),
            &actor,
        );
        tokio::time::sleep(WINDOW * 2).await;
        repo.fail_writes(false);

        persister.schedule(&ids[0], observation("ok"), &actor);
        tokio::time::sleep(WINDOW * 2).await;

        let item = repo.item(&ids[0]);
        assert_eq!(item.remark, Some(Remark::Yes));
        assert_eq!(item.observation, "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_immediately() {
        let (repo, persister, ids) = setup(2).await;
        let actor = Actor::new("user-1");
        persister.schedule(&ids[0], observation("x"), &actor);
        persister.schedule(&ids[1], observation("y"), &actor);

        let report = persister.flush_items(&ids[..1]).await;
        assert_eq!(report.committed, vec![ids[0].clone()]);
        assert!(report.is_clean());
        assert_eq!(repo.write_count(), 1);
        assert!(persister.has_pending(&ids[1]));

        let report = persister.flush_all().await;
        assert_eq!(report.committed, vec![ids[1].clone()]);
        assert_eq!(persister.pending_count(), 0);

        // Timers of flushed buffers never fire a second write.
        tokio::time::sleep(WINDOW * 3).await;
        assert_eq!(repo.write_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_reports_failures() {
        let (repo, persister, ids) = setup(1).await;
        let actor = Actor::new("user-1");
        repo.fail_writes(true);
        persister.schedule(&ids[0], observation("x"), &actor);

        let report = persister.flush_items(&ids).await;
        assert!(report.committed.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].error, "Backend failure: injected write failure");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_changes_are_ignored() {
        let (_, persister, ids) = setup(1).await;
        persister.schedule(
            &ids[0],
            auditdesk_core::updates::ItemChanges::default(),
            &Actor::new("user-1"),
        );
        assert_eq!(persister.pending_count(), 0);
    }
}
