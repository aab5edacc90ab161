//! In-memory progress registry with a single live observer per job.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, trace};

use super::types::ProgressSnapshot;

/// Per-job state. Each slot has its own lock, so jobs never contend with
/// one another once their slot exists.
#[derive(Debug)]
struct JobSlot {
    snapshot: Option<ProgressSnapshot>,
    observer: Option<mpsc::UnboundedSender<ProgressSnapshot>>,
    updated_at: Instant,
}

impl JobSlot {
    fn empty() -> Self {
        Self {
            snapshot: None,
            observer: None,
            updated_at: Instant::now(),
        }
    }

    fn is_terminal(&self) -> bool {
        self.snapshot
            .as_ref()
            .map(ProgressSnapshot::is_terminal)
            .unwrap_or(false)
    }

    /// Stores `snapshot` and hands a copy to the observer, if any.
    fn publish(&mut self, snapshot: ProgressSnapshot) {
        let terminal = snapshot.is_terminal();
        if let Some(tx) = &self.observer {
            if tx.send(snapshot.clone()).is_err() {
                trace!(job_id = %snapshot.job_id, "Observer gone, detaching");
                self.observer = None;
            }
        }
        if terminal {
            // Dropping the sender ends the observer's stream.
            self.observer = None;
        }
        self.snapshot = Some(snapshot);
        self.updated_at = Instant::now();
    }

    fn has_live_observer(&self) -> bool {
        self.observer.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

/// Live stream of snapshots for one job.
///
/// Ends after a terminal snapshot, or when a newer subscription to the same
/// job replaces this one.
#[derive(Debug)]
pub struct ProgressSubscription {
    rx: mpsc::UnboundedReceiver<ProgressSnapshot>,
}

impl ProgressSubscription {
    /// Waits for the next snapshot. `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<ProgressSnapshot> {
        self.rx.recv().await
    }

    /// Returns a snapshot if one is already queued.
    pub fn try_recv(&mut self) -> Option<ProgressSnapshot> {
        self.rx.try_recv().ok()
    }

    pub fn into_stream(self) -> UnboundedReceiverStream<ProgressSnapshot> {
        UnboundedReceiverStream::new(self.rx)
    }
}

/// Maps job ids to their latest snapshot and optional observer.
///
/// Terminal snapshots are sticky: once a job is `Completed` or `Failed`,
/// further updates for it are ignored.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    slots: RwLock<HashMap<String, Arc<Mutex<JobSlot>>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn existing_slot(&self, job_id: &str) -> Option<Arc<Mutex<JobSlot>>> {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots.get(job_id).cloned()
    }

    fn slot(&self, job_id: &str) -> Arc<Mutex<JobSlot>> {
        if let Some(slot) = self.existing_slot(job_id) {
            return slot;
        }
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        slots
            .entry(job_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(JobSlot::empty())))
            .clone()
    }

    fn lock(slot: &Mutex<JobSlot>) -> MutexGuard<'_, JobSlot> {
        slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records a `Processing` snapshot at `percent`.
    pub fn update(&self, job_id: &str, percent: u8) {
        let slot = self.slot(job_id);
        let mut slot = Self::lock(&slot);
        if slot.is_terminal() {
            trace!(job_id, percent, "Ignoring update for finished job");
            return;
        }
        slot.publish(ProgressSnapshot::processing(job_id, percent));
    }

    /// Records the successful terminal snapshot and releases the observer.
    pub fn mark_completed(&self, job_id: &str) {
        self.finish(ProgressSnapshot::completed(job_id));
    }

    /// Records the failed terminal snapshot and releases the observer.
    pub fn mark_failed(&self, job_id: &str, details: impl Into<String>) {
        self.finish(ProgressSnapshot::failed(job_id, details));
    }

    fn finish(&self, snapshot: ProgressSnapshot) {
        let slot = self.slot(&snapshot.job_id);
        let mut slot = Self::lock(&slot);
        if slot.is_terminal() {
            trace!(job_id = %snapshot.job_id, "Job already finished");
            return;
        }
        debug!(job_id = %snapshot.job_id, status = ?snapshot.status, "Job reached terminal state");
        slot.publish(snapshot);
    }

    /// Attaches an observer to `job_id`, replacing any previous one.
    ///
    /// The current snapshot, if any, is replayed first. A job that already
    /// finished yields its terminal snapshot and the stream then ends.
    pub fn subscribe(&self, job_id: &str) -> ProgressSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let slot = self.slot(job_id);
        let mut slot = Self::lock(&slot);

        if let Some(snapshot) = &slot.snapshot {
            let _ = tx.send(snapshot.clone());
        }
        if slot.is_terminal() {
            return ProgressSubscription { rx };
        }
        if slot.observer.replace(tx).is_some() {
            debug!(job_id, "Replaced existing progress observer");
        }
        ProgressSubscription { rx }
    }

    /// Latest snapshot for `job_id`, without waiting.
    pub fn get_snapshot(&self, job_id: &str) -> Option<ProgressSnapshot> {
        let slot = self.existing_slot(job_id)?;
        let slot = Self::lock(&slot);
        slot.snapshot.clone()
    }

    /// Drops slots that are finished (or were never started and have no
    /// live observer) and have not changed for `max_age`.
    ///
    /// Returns the number of slots removed.
    pub fn evict_terminal(&self, max_age: Duration) -> usize {
        let mut slots = self.slots.write().unwrap_or_else(|e| e.into_inner());
        let before = slots.len();
        slots.retain(|_, slot| {
            let slot = Self::lock(slot);
            let idle = slot.updated_at.elapsed() >= max_age;
            let stale = slot.is_terminal()
                || (slot.snapshot.is_none() && !slot.has_live_observer());
            !(idle && stale)
        });
        let removed = before - slots.len();
        if removed > 0 {
            debug!(removed, "Evicted stale progress entries");
        }
        removed
    }

    /// Number of jobs with an attached, still open observer.
    pub fn active_observers(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(|e| e.into_inner());
        slots
            .values()
            .filter(|slot| Self::lock(slot).has_live_observer())
            .count()
    }

    /// Number of jobs currently tracked.
    pub fn tracked_jobs(&self) -> usize {
        self.slots.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}
