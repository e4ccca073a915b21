//! Shared utilities for integration tests.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use expirator::config::ExpiratorConfig;
use expirator::lifecycle::{spawn_expirator, RunningExpirator, Shutdown};
use expirator::store::MemoryStore;
use expirator::{ExpirableId, ExpirableStore, ExpiratorHandle};

/// Store that remembers every destroy and when it happened.
#[derive(Clone, Default)]
pub struct RecordingStore {
    objects: MemoryStore<ExpirableId>,
    destroyed: Arc<Mutex<Vec<(ExpirableId, Instant)>>>,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn with_objects(ids: &[&str]) -> Arc<Self> {
        let store = Self::default();
        for id in ids {
            store.objects.insert(ExpirableId::from(*id));
        }
        Arc::new(store)
    }

    pub fn insert(&self, id: &str) {
        self.objects.insert(ExpirableId::from(id));
    }

    pub fn destroyed(&self) -> Vec<ExpirableId> {
        self.destroyed.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn destroy_count(&self, id: &str) -> usize {
        let id = ExpirableId::from(id);
        self.destroyed.lock().unwrap().iter().filter(|(d, _)| *d == id).count()
    }

    pub fn destroyed_at(&self, id: &str) -> Option<Instant> {
        let id = ExpirableId::from(id);
        self.destroyed
            .lock()
            .unwrap()
            .iter()
            .find(|(d, _)| *d == id)
            .map(|(_, at)| *at)
    }
}

impl ExpirableStore for RecordingStore {
    type Object = ExpirableId;

    fn lookup(&self, id: &ExpirableId) -> Option<ExpirableId> {
        self.objects.lookup(id)
    }

    fn destroy(&self, object: ExpirableId) {
        self.objects.destroy(object.clone());
        self.destroyed.lock().unwrap().push((object, Instant::now()));
    }
}

/// Config with persistence disabled.
#[allow(dead_code)]
pub fn memory_config() -> ExpiratorConfig {
    ExpiratorConfig::default()
}

/// Config persisting to `path` with a 1s urgent and 30s soft cadence.
#[allow(dead_code)]
pub fn persistent_config(path: &Path) -> ExpiratorConfig {
    let mut config = ExpiratorConfig::default();
    config.persistence.path = Some(path.to_path_buf());
    config.persistence.urgent_flush_interval_secs = 1;
    config.persistence.flush_interval_secs = 30;
    config
}

/// Spawn an expirator over `store`.
pub fn start(config: ExpiratorConfig, store: Arc<RecordingStore>) -> (Shutdown, RunningExpirator) {
    let shutdown = Shutdown::new();
    let running = spawn_expirator(config, store, &shutdown);
    (shutdown, running)
}

/// Wait (real time) until the startup snapshot has been applied.
#[allow(dead_code)]
pub async fn wait_restored(handle: &ExpiratorHandle) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        if handle.stats().await.is_some_and(|stats| stats.restored) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("snapshot was not restored within 5s");
}
