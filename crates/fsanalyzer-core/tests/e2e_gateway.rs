/// End-to-end tests for `ScanGateway`, the worker-pool front door.
///
/// These exercise real worker threads against real temporary trees. Every
/// wait is bounded so a deadlocked pool fails the test instead of hanging
/// the suite.
use fsanalyzer_core::error::{DirectoryAccessError, GatewayClosedError, TaskError};
use fsanalyzer_core::model::DirectoryStats;
use fsanalyzer_core::{GatewayConfig, ScanGateway, ShutdownOutcome};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────────

const WAIT: Duration = Duration::from_secs(30);

fn gateway(workers: usize) -> ScanGateway {
    ScanGateway::new(
        GatewayConfig::default()
            .with_workers(workers)
            .with_grace_period(Duration::from_secs(10)),
    )
    .expect("gateway must start")
}

fn write_bytes(path: &Path, n: usize) {
    let mut f = fs::File::create(path).unwrap();
    f.write_all(&vec![0u8; n]).unwrap();
}

/// root/{a.bin 100, sub/{b.bin 200, deeper/}}
fn make_temp_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_bytes(&tmp.path().join("a.bin"), 100);
    let deeper = tmp.path().join("sub").join("deeper");
    fs::create_dir_all(&deeper).unwrap();
    write_bytes(&tmp.path().join("sub").join("b.bin"), 200);
    tmp
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn stats_arrive_through_the_handle() {
    let tmp = make_temp_tree();
    let gw = gateway(2);

    let mut handle = gw.get_directory_stats_async(tmp.path()).unwrap();
    let stats = handle
        .wait_timeout(WAIT)
        .expect("stats task did not finish")
        .unwrap();
    assert_eq!(stats, DirectoryStats::new(300, 2, 2));

    assert_eq!(gw.shutdown(), ShutdownOutcome::Graceful);
}

#[test]
fn listing_arrives_through_the_handle() {
    let tmp = make_temp_tree();
    let gw = gateway(1);

    let records = gw.list_directory_async(tmp.path()).unwrap().wait().unwrap();
    assert_eq!(records.len(), 2);
    gw.shutdown();
}

/// Root-level failures come back through the handle, not the submit call.
#[test]
fn missing_root_fails_through_the_handle() {
    let tmp = TempDir::new().unwrap();
    let gw = gateway(1);

    let handle = gw
        .get_directory_stats_async(tmp.path().join("does-not-exist"))
        .expect("submission itself must succeed");
    match handle.wait() {
        Err(TaskError::Directory(DirectoryAccessError::NotFound(_))) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
    gw.shutdown();
}

#[test]
fn submission_after_shutdown_is_rejected() {
    let tmp = make_temp_tree();
    let gw = gateway(2);
    gw.shutdown();

    assert!(gw.is_closed());
    assert_eq!(
        gw.get_directory_stats_async(tmp.path()).err(),
        Some(GatewayClosedError)
    );
    assert_eq!(gw.list_directory_async(tmp.path()).err(), Some(GatewayClosedError));
}

#[test]
fn shutdown_twice_is_safe() {
    let gw = gateway(2);
    assert_eq!(gw.shutdown(), ShutdownOutcome::Graceful);
    assert_eq!(gw.shutdown(), ShutdownOutcome::AlreadyClosed);
}

/// Many concurrent walks of the same tree must agree; nothing is shared
/// between them.
#[test]
fn concurrent_aggregations_are_independent() {
    let tmp = make_temp_tree();
    let gw = gateway(4);

    let handles: Vec<_> = (0..16)
        .map(|_| gw.get_directory_stats_async(tmp.path()).unwrap())
        .collect();
    for mut handle in handles {
        let stats = handle.wait_timeout(WAIT).expect("timed out").unwrap();
        assert_eq!(stats, DirectoryStats::new(300, 2, 2));
    }
    assert_eq!(gw.shutdown(), ShutdownOutcome::Graceful);
}

/// Queued work submitted before shutdown still runs to completion.
#[test]
fn shutdown_drains_queued_tasks() {
    let tmp = make_temp_tree();
    let gw = gateway(1);

    let handles: Vec<_> = (0..8)
        .map(|_| gw.list_directory_async(tmp.path()).unwrap())
        .collect();
    assert_eq!(gw.shutdown(), ShutdownOutcome::Graceful);

    for handle in handles {
        assert_eq!(handle.wait().unwrap().len(), 2);
    }
}

#[test]
fn continuation_receives_result_on_worker() {
    let tmp = make_temp_tree();
    let gw = gateway(2);
    let (tx, rx) = crossbeam_channel::bounded(1);

    gw.aggregate_async(tmp.path()).unwrap().then(move |result| {
        let outcome = result.unwrap();
        tx.send((outcome.stats, outcome.inaccessible)).unwrap();
    });

    let (stats, inaccessible) = rx.recv_timeout(WAIT).expect("continuation never ran");
    assert_eq!(stats.total_size_bytes, 300);
    assert_eq!(inaccessible, 0);
    gw.shutdown();
}

/// Abandoning a handle must not disturb the pool.
#[test]
fn abandoned_handle_is_harmless() {
    let tmp = make_temp_tree();
    let gw = gateway(1);

    drop(gw.get_directory_stats_async(tmp.path()).unwrap());
    let stats = gw.get_directory_stats_async(tmp.path()).unwrap().wait().unwrap();
    assert_eq!(stats.file_count, 2);
    assert_eq!(gw.shutdown(), ShutdownOutcome::Graceful);
}
