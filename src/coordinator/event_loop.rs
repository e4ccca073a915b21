//! The coordinating event loop.

use chrono::{DateTime, Utc};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::{ExpiratorConfig, PersistenceConfig};
use crate::coordinator::handle::{ExpiratorHandle, ExpiratorStats, FlushError};
use crate::coordinator::request::Request;
use crate::expiration::{
    ExpirableId, ExpirationCause, ExpirationRecord, ExpirationTicket, PersistedExpiration, Registry,
    Timers,
};
use crate::observability::metrics;
use crate::persistence::{DirtyFlags, SnapshotError, SnapshotStore};
use crate::store::ExpirableStore;

type FlushReply = oneshot::Sender<Result<(), FlushError>>;

/// Where an upsert came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Caller,
    Snapshot,
}

/// A snapshot write running on the blocking pool.
struct InFlightSave {
    revision: u64,
    waiters: Vec<FlushReply>,
    task: JoinHandle<Result<usize, SnapshotError>>,
}

/// Expiration scheduler: owns the registry, the timers and the dirty flags.
///
/// Create it, take a [`handle`](Expirator::handle), then drive it with
/// [`run`](Expirator::run) on a Tokio task.
pub struct Expirator<S: ExpirableStore> {
    store: Arc<S>,
    registry: Registry,
    timers: Timers,
    expirations: mpsc::Receiver<ExpirationTicket>,
    forced: VecDeque<ExpirationTicket>,
    requests_tx: mpsc::UnboundedSender<Request>,
    requests: mpsc::UnboundedReceiver<Request>,
    persistence: PersistenceConfig,
    snapshot: Option<SnapshotStore>,
    flags: DirtyFlags,
    restored: bool,
    /// Identities scheduled or cancelled before the snapshot was applied.
    touched_before_restore: HashSet<ExpirableId>,
    next_generation: u64,
    in_flight: Option<InFlightSave>,
    flush_waiters: Vec<FlushReply>,
    snapshot_writes: u64,
    snapshot_failures: u64,
}

impl<S: ExpirableStore> Expirator<S> {
    pub fn new(config: ExpiratorConfig, store: Arc<S>) -> Self {
        let (timers, expirations) = Timers::new(
            config.scheduler.channel_capacity,
            config.scheduler.fire_send_timeout(),
        );
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let snapshot = config.persistence.path.clone().map(SnapshotStore::new);

        Self {
            store,
            registry: Registry::new(),
            timers,
            expirations,
            forced: VecDeque::new(),
            requests_tx,
            requests,
            restored: snapshot.is_none(),
            persistence: config.persistence,
            snapshot,
            flags: DirtyFlags::new(),
            touched_before_restore: HashSet::new(),
            next_generation: 0,
            in_flight: None,
            flush_waiters: Vec::new(),
            snapshot_writes: 0,
            snapshot_failures: 0,
        }
    }

    pub fn handle(&self) -> ExpiratorHandle {
        ExpiratorHandle::new(self.requests_tx.clone())
    }

    /// Run the event loop until `shutdown` fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            snapshot = ?self.persistence.path,
            flush_interval_secs = self.persistence.flush_interval_secs,
            urgent_flush_interval_secs = self.persistence.urgent_flush_interval_secs,
            "Launching expirator"
        );
        self.start_restore();

        let persist = self.snapshot.is_some();
        let mut flush_ticker = ticker(self.persistence.flush_interval_secs);
        let mut urgent_ticker = ticker(self.persistence.urgent_flush_interval_secs);

        loop {
            self.drain_forced();
            if !self.flush_waiters.is_empty() {
                self.start_save();
            }

            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Expirator received shutdown signal, exiting loop");
                    break;
                }
                Some(request) = self.requests.recv() => self.handle_request(request),
                Some(ticket) = self.expirations.recv() => self.expire(ticket),
                result = wait_for_save(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.finish_save(result);
                }
                // Soft cadence: flush if anything changed.
                _ = flush_ticker.tick(), if persist => {
                    if self.flags.is_dirty() {
                        self.start_save();
                    }
                }
                // Urgent cadence: flush only if the pending set changed.
                _ = urgent_ticker.tick(), if persist => {
                    if self.flags.urgent_flush_required() {
                        self.start_save();
                    }
                }
            }
        }

        self.stop().await;
    }

    fn handle_request(&mut self, request: Request) {
        match request {
            Request::Schedule { id, expires_at } => {
                self.note_touched(&id);
                self.upsert(id, expires_at, Origin::Caller);
            }
            Request::Cancel { id } => {
                self.note_touched(&id);
                self.cancel(&id);
            }
            Request::Contains { id, reply } => {
                let _ = reply.send(self.registry.contains(&id));
            }
            Request::Stats { reply } => {
                let _ = reply.send(self.stats());
            }
            Request::Flush { reply } => {
                if self.snapshot.is_none() {
                    let _ = reply.send(Err(FlushError::Disabled));
                } else {
                    self.flush_waiters.push(reply);
                }
            }
            Request::Restore { records } => self.restore(records),
        }
    }

    /// Install or replace the expiration for `id`.
    ///
    /// A deadline that is not in the future skips the registry and queues
    /// a forced expiration instead.
    fn upsert(&mut self, id: ExpirableId, expires_at: DateTime<Utc>, origin: Origin) {
        let now = Utc::now();

        let replaced = self.registry.cancel(&id);
        if let Some(previous) = &replaced {
            tracing::info!(
                id = %id,
                previous = %previous.expires_at(),
                "Existing expiration cancelled"
            );
        }

        let mut changed = replaced.is_some();
        match (expires_at - now).to_std() {
            Ok(delay) if !delay.is_zero() => {
                let generation = self.next_generation;
                self.next_generation += 1;

                let timer = self.timers.arm(id.clone(), generation, delay);
                self.registry
                    .upsert(ExpirationRecord::new(id.clone(), expires_at, generation, timer));

                // Restored records are already on disk.
                if origin == Origin::Caller {
                    changed = true;
                    metrics::record_registration();
                }
                tracing::info!(id = %id, expires_at = %expires_at, "Registered expiration");
            }
            _ => {
                let overdue = (now - expires_at).to_std().unwrap_or_default();
                tracing::warn!(
                    id = %id,
                    overdue_ms = overdue.as_millis() as u64,
                    "Force-expiring handle, outdated by {:?}",
                    overdue
                );
                self.forced.push_back(ExpirationTicket {
                    id,
                    cause: ExpirationCause::Forced,
                });
            }
        }

        if changed {
            self.flags.mark_changed();
        }
        metrics::record_pending(self.registry.len());
    }

    fn cancel(&mut self, id: &ExpirableId) {
        match self.registry.cancel(id) {
            Some(record) => {
                self.flags.mark_changed();
                metrics::record_cancellation();
                metrics::record_pending(self.registry.len());
                tracing::info!(id = %id, expires_at = %record.expires_at(), "Expiration cancelled");
            }
            None => tracing::debug!(id = %id, "No pending expiration to cancel"),
        }
    }

    /// Destroy the object behind `ticket` if the ticket is still current.
    fn expire(&mut self, ticket: ExpirationTicket) {
        if let ExpirationCause::Timer { generation } = ticket.cause {
            if self.registry.take_if_current(&ticket.id, generation).is_none() {
                tracing::debug!(id = %ticket.id, generation, "Ignoring stale timer fire");
                metrics::record_stale_fire();
                return;
            }
        }

        tracing::info!(id = %ticket.id, cause = ticket.cause.label(), "Expiring");
        match self.store.lookup(&ticket.id) {
            Some(object) => {
                self.store.destroy(object);
                metrics::record_expiration(ticket.cause.label());
            }
            None => {
                tracing::debug!(id = %ticket.id, "Object already gone, nothing to destroy");
                metrics::record_destroy_miss();
            }
        }

        self.flags.mark_expired();
        metrics::record_pending(self.registry.len());
    }

    fn drain_forced(&mut self) {
        while let Some(ticket) = self.forced.pop_front() {
            self.expire(ticket);
        }
    }

    fn note_touched(&mut self, id: &ExpirableId) {
        if !self.restored {
            self.touched_before_restore.insert(id.clone());
        }
    }

    /// Read the snapshot on the blocking pool and feed it back as a request.
    fn start_restore(&self) {
        let Some(snapshot) = self.snapshot.clone() else {
            return;
        };
        let requests = self.requests_tx.clone();

        tokio::spawn(async move {
            let records = match tokio::task::spawn_blocking(move || snapshot.load()).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::error!(error = %e, "Snapshot load task failed, starting empty");
                    Vec::new()
                }
            };
            let _ = requests.send(Request::Restore { records });
        });
    }

    fn restore(&mut self, records: Vec<PersistedExpiration>) {
        let loaded = records.len();
        let mut superseded = 0usize;

        for record in records {
            // Anything callers did before the snapshot arrived wins.
            if self.touched_before_restore.contains(&record.id) {
                superseded += 1;
                continue;
            }
            self.upsert(record.id, record.expires_at, Origin::Snapshot);
        }

        self.touched_before_restore = HashSet::new();
        self.restored = true;
        tracing::info!(loaded, superseded, pending = self.registry.len(), "Loaded expirations");
    }

    /// Start a snapshot write unless one is running or the restore is pending.
    fn start_save(&mut self) {
        let Some(snapshot) = self.snapshot.clone() else {
            return;
        };
        if !self.restored || self.in_flight.is_some() {
            return;
        }

        let records = self.registry.snapshot();
        let revision = self.flags.revision();
        let waiters = std::mem::take(&mut self.flush_waiters);
        let task = tokio::task::spawn_blocking(move || snapshot.save(&records));

        self.in_flight = Some(InFlightSave {
            revision,
            waiters,
            task,
        });
    }

    fn finish_save(&mut self, result: Result<Result<usize, SnapshotError>, JoinError>) {
        let Some(save) = self.in_flight.take() else {
            return;
        };

        let outcome = match result {
            Ok(Ok(count)) => {
                self.snapshot_writes += 1;
                metrics::record_snapshot_write(true);
                self.flags.clear_if_current(save.revision);
                tracing::info!(count, "Wrote expirations");
                Ok(())
            }
            Ok(Err(e)) => {
                self.snapshot_failures += 1;
                metrics::record_snapshot_write(false);
                tracing::error!(error = %e, "Error writing expiration data");
                Err(FlushError::Write(e.to_string()))
            }
            Err(e) => {
                self.snapshot_failures += 1;
                metrics::record_snapshot_write(false);
                tracing::error!(error = %e, "Snapshot write task failed");
                Err(FlushError::Write(e.to_string()))
            }
        };

        for waiter in save.waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    fn stats(&self) -> ExpiratorStats {
        ExpiratorStats {
            pending: self.registry.len(),
            restored: self.restored,
            dirty: self.flags.is_dirty(),
            snapshot_writes: self.snapshot_writes,
            snapshot_failures: self.snapshot_failures,
        }
    }

    /// Finish outstanding work after the loop exits.
    async fn stop(mut self) {
        self.drain_forced();

        if let Some(save) = self.in_flight.as_mut() {
            let result = (&mut save.task).await;
            self.finish_save(result);
        }

        let final_flush = self.persistence.flush_on_shutdown && self.flags.is_dirty();
        if final_flush || !self.flush_waiters.is_empty() {
            self.start_save();
            if let Some(save) = self.in_flight.as_mut() {
                let result = (&mut save.task).await;
                self.finish_save(result);
            }
        }

        // Dropping the registry disarms every remaining timer.
        tracing::info!(pending = self.registry.len(), "Expirator stopped");
    }
}

/// Interval whose first tick is one full period away.
fn ticker(secs: u64) -> time::Interval {
    let period = time::Duration::from_secs(secs.max(1));
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn wait_for_save(
    in_flight: &mut Option<InFlightSave>,
) -> Result<Result<usize, SnapshotError>, JoinError> {
    match in_flight {
        Some(save) => (&mut save.task).await,
        None => std::future::pending().await,
    }
}
