//! In-memory registry of pending expirations.

use std::collections::{BTreeMap, HashMap};

use crate::expiration::record::{ExpirableId, ExpirationRecord, PersistedExpiration};

/// Pending expirations keyed by identity.
///
/// Holds at most one record, and therefore at most one armed timer, per
/// identity. Only the coordinator mutates it.
#[derive(Debug, Default)]
pub struct Registry {
    records: HashMap<ExpirableId, ExpirationRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `record`, returning the record it replaced.
    ///
    /// The replaced record's timer is stopped before it is handed back.
    pub fn upsert(&mut self, record: ExpirationRecord) -> Option<ExpirationRecord> {
        let previous = self.records.insert(record.id().clone(), record);
        if let Some(previous) = &previous {
            previous.stop_timer();
        }
        previous
    }

    /// Stop and remove the record for `id`. Absent ids are a no-op.
    pub fn cancel(&mut self, id: &ExpirableId) -> Option<ExpirationRecord> {
        let removed = self.records.remove(id);
        if let Some(record) = &removed {
            record.stop_timer();
        }
        removed
    }

    /// Remove the record for `id` only if it was armed with `generation`.
    ///
    /// A fire from a timer that was re-armed or cancelled in the meantime
    /// leaves the registry untouched.
    pub fn take_if_current(
        &mut self,
        id: &ExpirableId,
        generation: u64,
    ) -> Option<ExpirationRecord> {
        match self.records.get(id) {
            Some(record) if record.generation() == generation => self.records.remove(id),
            _ => None,
        }
    }

    pub fn contains(&self, id: &ExpirableId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &ExpirableId) -> Option<&ExpirationRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persisted form of every pending record, ordered by identity.
    pub fn snapshot(&self) -> BTreeMap<ExpirableId, PersistedExpiration> {
        self.records
            .iter()
            .map(|(id, record)| (id.clone(), record.to_persisted()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expiration::timer::Timers;
    use chrono::Utc;
    use std::time::Duration;

    fn record(timers: &Timers, id: &str, generation: u64, secs: u64) -> ExpirationRecord {
        let expires_at = Utc::now() + chrono::Duration::seconds(secs as i64);
        let timer = timers.arm(id.into(), generation, Duration::from_secs(secs));
        ExpirationRecord::new(id.into(), expires_at, generation, timer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_upsert_replaces_and_stops_previous_timer() {
        let (timers, mut rx) = Timers::new(8, Duration::from_secs(1));
        let mut registry = Registry::new();

        assert!(registry.upsert(record(&timers, "a", 1, 1)).is_none());
        let previous = registry.upsert(record(&timers, "a", 2, 5)).unwrap();
        assert_eq!(previous.generation(), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&"a".into()).unwrap().generation(), 2);

        // Only the second timer ever fires.
        let ticket = rx.recv().await.unwrap();
        assert_eq!(
            ticket.cause,
            crate::expiration::ExpirationCause::Timer { generation: 2 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent() {
        let (timers, _rx) = Timers::new(8, Duration::from_secs(1));
        let mut registry = Registry::new();
        registry.upsert(record(&timers, "a", 1, 10));

        assert!(registry.cancel(&"a".into()).is_some());
        assert!(registry.cancel(&"a".into()).is_none());
        assert!(registry.cancel(&"missing".into()).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_if_current_ignores_stale_generation() {
        let (timers, _rx) = Timers::new(8, Duration::from_secs(1));
        let mut registry = Registry::new();
        registry.upsert(record(&timers, "a", 3, 10));

        assert!(registry.take_if_current(&"a".into(), 2).is_none());
        assert!(registry.contains(&"a".into()));
        assert!(registry.take_if_current(&"a".into(), 3).is_some());
        assert!(!registry.contains(&"a".into()));
        assert!(registry.take_if_current(&"a".into(), 3).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_lists_pending_records() {
        let (timers, _rx) = Timers::new(8, Duration::from_secs(1));
        let mut registry = Registry::new();
        registry.upsert(record(&timers, "b", 1, 10));
        registry.upsert(record(&timers, "a", 2, 20));

        let snapshot = registry.snapshot();
        let ids: Vec<_> = snapshot.keys().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(
            snapshot[&ExpirableId::from("a")].expires_at,
            registry.get(&"a".into()).unwrap().expires_at()
        );
    }
}
