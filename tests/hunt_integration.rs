//! Integration tests for the marker hunt over in-memory sources.
//!
//! These tests drive `hunt` end to end: real worker tasks, the real
//! coordinator and a real destination directory.

use std::sync::atomic::Ordering;
use std::time::Duration;

use earliest_core::{FailurePolicy, HuntConfig, HuntError, SourceError, hunt};
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;

mod support;
use support::{MemorySource, content_with_marker, dir_names, names};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn config(chunk_size: usize) -> HuntConfig {
    HuntConfig::default().with_chunk_size(chunk_size)
}

#[tokio::test]
async fn test_hunt_keeps_tied_earliest_markers() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let first = content_with_marker(20, Some(5), b'A');
    let second = content_with_marker(32, Some(5), b'A');
    let later = content_with_marker(20, Some(9), b'A');
    let source = MemorySource::new()
        .with_file("1.txt", first.clone())
        .with_file("2.txt", second.clone())
        .with_file("3.txt", later)
        .into_arc();

    let report = hunt(source, names(&["1.txt", "2.txt", "3.txt"]), temp_dir.path(), &config(4))
        .await
        .expect("hunt should succeed");

    assert_eq!(report.earliest, Some(5));
    assert_eq!(report.kept, names(&["1.txt", "2.txt"]));
    assert_eq!(report.removed, names(&["3.txt"]));
    assert_eq!(dir_names(temp_dir.path()), names(&["1.txt", "2.txt"]));

    // Winners are downloaded in full
    assert_eq!(std::fs::read(temp_dir.path().join("1.txt")).unwrap(), first);
    assert_eq!(std::fs::read(temp_dir.path().join("2.txt")).unwrap(), second);
}

#[tokio::test]
async fn test_hunt_without_markers_removes_everything() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let source = MemorySource::new()
        .with_file("a", content_with_marker(100, None, b'A'))
        .with_file("b", content_with_marker(7, None, b'A'))
        .with_file("empty", Vec::new())
        .into_arc();

    let report = hunt(source, names(&["a", "b", "empty"]), temp_dir.path(), &config(8))
        .await
        .expect("hunt should succeed");

    assert_eq!(report.earliest, None);
    assert!(report.kept.is_empty());
    assert_eq!(report.removed, names(&["a", "b", "empty"]));
    assert!(dir_names(temp_dir.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hunt_marker_at_zero_cancels_endless_losers() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let winner = content_with_marker(10, Some(0), b'A');
    let mut source = MemorySource::new().with_file("winner", winner.clone());
    let served_a = source.with_endless("loser-a", b'.');
    let served_b = source.with_endless("loser-b", b'.');

    let report = tokio::time::timeout(
        TEST_TIMEOUT,
        hunt(
            source.into_arc(),
            names(&["loser-a", "winner", "loser-b"]),
            temp_dir.path(),
            &config(16),
        ),
    )
    .await
    .expect("endless losers must be cancelled")
    .expect("hunt should succeed");

    assert_eq!(report.earliest, Some(0));
    assert_eq!(report.kept, names(&["winner"]));
    assert_eq!(report.cancelled, 2);
    assert_eq!(dir_names(temp_dir.path()), names(&["winner"]));
    assert_eq!(std::fs::read(temp_dir.path().join("winner")).unwrap(), winner);

    // Each loser was opened and then stopped part way
    for served in [&served_a, &served_b] {
        assert!(served.load(Ordering::Relaxed) > 0);
    }
    for removed in ["loser-a", "loser-b"] {
        assert!(report.removed.iter().any(|name| name == removed));
    }
}

#[tokio::test]
async fn test_hunt_single_file_smaller_than_chunk() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let content = content_with_marker(10, Some(3), b'A');
    let source = MemorySource::new().with_file("only", content.clone()).into_arc();

    let report = hunt(source, names(&["only"]), temp_dir.path(), &config(1024))
        .await
        .expect("hunt should succeed");

    assert_eq!(report.earliest, Some(3));
    assert_eq!(report.kept, names(&["only"]));
    assert_eq!(report.cancelled, 0);
    assert_eq!(std::fs::read(temp_dir.path().join("only")).unwrap(), content);
}

#[tokio::test]
async fn test_hunt_cancels_stalled_stream() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut source = MemorySource::new().with_file("fast", content_with_marker(4, Some(0), b'A'));
    let mut stalled = source.with_pipe("stalled");

    // One full chunk without a marker, then nothing until cancellation
    stalled
        .write_all(&content_with_marker(8, None, b'A'))
        .await
        .expect("pipe write should succeed");

    let report = tokio::time::timeout(
        TEST_TIMEOUT,
        hunt(
            source.into_arc(),
            names(&["stalled", "fast"]),
            temp_dir.path(),
            &config(8),
        ),
    )
    .await
    .expect("stalled stream must be cancelled")
    .expect("hunt should succeed");

    assert_eq!(report.kept, names(&["fast"]));
    assert_eq!(report.removed, names(&["stalled"]));
    assert_eq!(report.cancelled, 1);
    assert_eq!(dir_names(temp_dir.path()), names(&["fast"]));
    drop(stalled);
}

#[tokio::test]
async fn test_hunt_marker_on_chunk_boundary() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let source = MemorySource::new()
        .with_file("edge", content_with_marker(12, Some(4), b'A'))
        .with_file("before-edge", content_with_marker(12, Some(3), b'A'))
        .into_arc();

    let report = hunt(source, names(&["edge", "before-edge"]), temp_dir.path(), &config(4))
        .await
        .expect("hunt should succeed");

    assert_eq!(report.earliest, Some(3));
    assert_eq!(report.kept, names(&["before-edge"]));
    assert_eq!(dir_names(temp_dir.path()), names(&["before-edge"]));
}

#[tokio::test]
async fn test_hunt_custom_marker() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let source = MemorySource::new()
        .with_file("a", b"AAAAZ".to_vec())
        .with_file("b", b"AZAAA".to_vec())
        .into_arc();
    let config = config(2).with_marker(b'Z');

    let report = hunt(source, names(&["a", "b"]), temp_dir.path(), &config)
        .await
        .expect("hunt should succeed");

    assert_eq!(report.earliest, Some(1));
    assert_eq!(report.kept, names(&["b"]));
}

#[tokio::test]
async fn test_hunt_abort_policy_removes_all_files() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let source = MemorySource::new()
        .with_file("good", content_with_marker(64, Some(2), b'A'))
        .with_failure_after("broken", b"....".to_vec())
        .into_arc();

    let result = hunt(source, names(&["good", "broken"]), temp_dir.path(), &config(8)).await;

    match result {
        Err(HuntError::Source { filename, source }) => {
            assert_eq!(filename, "broken");
            assert!(matches!(source, SourceError::Read(_)));
        }
        other => panic!("expected source failure, got {other:?}"),
    }
    assert!(dir_names(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_hunt_abort_policy_on_open_failure() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let source = MemorySource::new()
        .with_file("good", content_with_marker(64, Some(2), b'A'))
        .with_status("gone", 404)
        .into_arc();

    let result = hunt(source, names(&["good", "gone"]), temp_dir.path(), &config(8)).await;

    assert!(matches!(
        result,
        Err(HuntError::Source {
            source: SourceError::HttpStatus { status: 404, .. },
            ..
        })
    ));
    assert!(dir_names(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_hunt_disqualify_policy_continues() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let good = content_with_marker(64, Some(2), b'A');
    let source = MemorySource::new()
        .with_file("good", good.clone())
        .with_failure_after("broken", b"....".to_vec())
        .with_status("gone", 503)
        .into_arc();
    let config = config(8).with_failure_policy(FailurePolicy::Disqualify);

    let report = hunt(source, names(&["broken", "good", "gone"]), temp_dir.path(), &config)
        .await
        .expect("disqualified failures should not fail the run");

    assert_eq!(report.kept, names(&["good"]));
    assert_eq!(report.failed, 2);
    assert_eq!(dir_names(temp_dir.path()), names(&["good"]));
    assert_eq!(std::fs::read(temp_dir.path().join("good")).unwrap(), good);
}

#[tokio::test]
async fn test_hunt_disqualified_file_still_sets_the_bound() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let source = MemorySource::new()
        .with_file("later", content_with_marker(16, Some(2), b'A'))
        .with_failure_after("broken", content_with_marker(4, Some(1), b'A'))
        .into_arc();
    let config = config(4).with_failure_policy(FailurePolicy::Disqualify);

    let report = hunt(source, names(&["later", "broken"]), temp_dir.path(), &config)
        .await
        .expect("hunt should succeed");

    assert_eq!(report.earliest, Some(1));
    assert!(report.kept.is_empty());
    assert_eq!(report.failed, 1);
    assert!(dir_names(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_hunt_empty_file_list() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let source = MemorySource::new().into_arc();

    let report = hunt(source, Vec::new(), temp_dir.path(), &HuntConfig::default())
        .await
        .expect("hunt should succeed");

    assert_eq!(report, earliest_core::HuntReport::default());
    assert!(dir_names(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_hunt_duplicate_names_downloaded_once() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let source = MemorySource::new()
        .with_file("x", content_with_marker(8, Some(1), b'A'))
        .into_arc();

    let report = hunt(source, names(&["x", "x"]), temp_dir.path(), &config(4))
        .await
        .expect("hunt should succeed");

    assert_eq!(report.kept, names(&["x"]));
    assert!(report.removed.is_empty());
}

#[tokio::test]
async fn test_hunt_rejects_path_like_names() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let source = MemorySource::new().into_arc();

    let result = hunt(source, names(&["../outside"]), temp_dir.path(), &config(4)).await;

    assert!(matches!(result, Err(HuntError::InvalidConfig { .. })));
}

#[tokio::test]
async fn test_hunt_rerun_over_existing_destination() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    std::fs::write(temp_dir.path().join("a"), b"stale data from an earlier run").unwrap();
    std::fs::write(temp_dir.path().join("unrelated"), b"not ours").unwrap();
    let source = MemorySource::new()
        .with_file("a", content_with_marker(4, None, b'A'))
        .with_file("b", content_with_marker(4, Some(0), b'A'))
        .into_arc();

    let report = hunt(source, names(&["a", "b"]), temp_dir.path(), &config(4))
        .await
        .expect("hunt should succeed");

    assert_eq!(report.kept, names(&["b"]));
    // Only files named by the run are touched
    assert_eq!(dir_names(temp_dir.path()), names(&["b", "unrelated"]));
}
