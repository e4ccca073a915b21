//! Daemon wiring: control commands driving the directory store.

use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

use expirator::config::ExpiratorConfig;
use expirator::control::{execute, ControlCommand};
use expirator::lifecycle::{spawn_expirator, Shutdown};
use expirator::store::DirectoryStore;

async fn run(handle: &expirator::ExpiratorHandle, line: &str) -> String {
    execute(handle, ControlCommand::parse(line).unwrap()).await
}

#[tokio::test(start_paused = true)]
async fn test_control_commands_delete_files() {
    let dir = TempDir::new().unwrap();
    for name in ["keep", "drop", "now"] {
        fs::write(dir.path().join(name), name).unwrap();
    }

    let shutdown = Shutdown::new();
    let store = Arc::new(DirectoryStore::new(dir.path()));
    let running = spawn_expirator(ExpiratorConfig::default(), store, &shutdown);
    let handle = &running.handle;

    assert_eq!(run(handle, "expire keep 5").await, "ok keep expires in 5.0s");
    run(handle, "expire drop 2").await;
    assert_eq!(run(handle, "has drop").await, "drop pending");
    assert_eq!(run(handle, "cancel keep").await, "ok keep cancelled");
    assert_eq!(run(handle, "has keep").await, "keep none");

    run(handle, "expire now -1").await;
    assert_eq!(run(handle, "has now").await, "now none");
    assert!(!dir.path().join("now").exists());

    sleep(Duration::from_secs(3)).await;
    assert!(!dir.path().join("drop").exists());
    assert!(dir.path().join("keep").exists());

    assert_eq!(
        run(handle, "stats").await,
        "pending=0 restored=true dirty=true writes=0 failures=0"
    );
    assert_eq!(run(handle, "flush").await, "error persistence is disabled");

    shutdown.trigger();
    running.task.await.unwrap();
}
