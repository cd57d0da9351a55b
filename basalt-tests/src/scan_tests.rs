//! Multi-region scan tests.
//!
//! The `users` fixture holds 3 rows in `[, d)`, 7 in `[d, m)` and 9 in
//! `[m, )`. The test config pages 2 rows at a time.

use basalt_client::ScanState;
use basalt_core::{ClientError, Families, RegionId, RowResult};
use bytes::Bytes;

use crate::init_test_logging;
use crate::simulated_cluster::{
    fixture_servers, users_cluster, SimulatedCluster, TestHarness, SCAN_FAILURE, USERS_ROWS,
};

fn harness() -> TestHarness {
    init_test_logging();
    TestHarness::new(users_cluster()).unwrap()
}

fn keys(rows: &[RowResult]) -> Vec<String> {
    rows.iter()
        .map(|row| String::from_utf8_lossy(row.row().unwrap()).into_owned())
        .collect()
}

fn requests_to(h: &TestHarness, server: usize) -> Vec<&'static str> {
    h.cluster
        .calls_to(&fixture_servers()[server])
        .iter()
        .map(|record| record.request)
        .collect()
}

#[tokio::test]
async fn test_scan_whole_table() {
    let h = harness();

    let rows = h.client.scan(b"users", Families::new(), b"", b"").await.unwrap();

    assert_eq!(keys(&rows), USERS_ROWS);
    assert_eq!(h.cluster.closed_scanners().len(), 3);
    assert_eq!(h.cluster.open_scanner_count(), 0);
}

#[tokio::test]
async fn test_scan_range_across_regions() {
    let h = harness();

    let rows = h
        .client
        .scan(b"users", Families::new(), b"carol", b"niaj")
        .await
        .unwrap();

    assert_eq!(
        keys(&rows),
        [
            "carol", "dave", "erin", "frank", "grace", "heidi", "ivan", "judy", "mallory"
        ]
    );
    assert_eq!(h.cluster.closed_scanners().len(), 3);
}

#[tokio::test]
async fn test_scan_stops_inside_second_region() {
    let h = harness();

    let rows = h.client.scan(b"users", Families::new(), b"a", b"e").await.unwrap();

    assert_eq!(keys(&rows), ["alice", "bob", "carol", "dave"]);
    assert!(requests_to(&h, 2).is_empty());
    assert_eq!(h.cluster.closed_scanners().len(), 2);
}

#[tokio::test]
async fn test_scan_stop_row_equal_to_region_stop() {
    let h = harness();

    let rows = h.client.scan(b"users", Families::new(), b"", b"m").await.unwrap();

    assert_eq!(rows.len(), 10);
    assert_eq!(keys(&rows).last().unwrap(), "judy");
    // "m" starts the third region, which holds nothing below "m".
    assert!(requests_to(&h, 2).is_empty());
}

#[tokio::test]
async fn test_scan_skips_empty_region() {
    init_test_logging();
    let cluster = SimulatedCluster::new();
    cluster.add_table(
        b"users",
        &[b"d".as_slice(), b"m".as_slice()],
        &fixture_servers(),
        RegionId::new(1),
    );
    for row in ["alice", "bob", "olivia"] {
        cluster.put_row(b"users", row.as_bytes());
    }
    let h = TestHarness::new(cluster).unwrap();

    let rows = h.client.scan(b"users", Families::new(), b"", b"").await.unwrap();

    assert_eq!(keys(&rows), ["alice", "bob", "olivia"]);
    assert_eq!(requests_to(&h, 1), ["open_scanner", "close_scanner"]);
}

#[tokio::test]
async fn test_scan_pages_until_empty_batch() {
    let h = harness();

    h.client.scan(b"users", Families::new(), b"", b"").await.unwrap();

    // Seven rows at two per batch: 2 from the open, then 2, 2, 1, 0.
    assert_eq!(
        requests_to(&h, 1),
        [
            "open_scanner",
            "scan_next",
            "scan_next",
            "scan_next",
            "scan_next",
            "close_scanner"
        ]
    );
    // Follow-up calls carry the open call's row so they reach the same region.
    assert!(h
        .cluster
        .calls_to(&fixture_servers()[1])
        .iter()
        .all(|record| record.key.as_ref() == b"d"));
}

#[tokio::test]
async fn test_scan_aborts_on_failed_region() {
    let h = harness();
    h.cluster.fail_scans_on(&fixture_servers()[1]);

    let err = h.client.scan(b"users", Families::new(), b"", b"").await.unwrap_err();

    match err {
        ClientError::Remote { exception, .. } => assert_eq!(exception, SCAN_FAILURE),
        other => panic!("expected a remote error, got {other:?}"),
    }
    // The first region was closed before the failure; nothing reached the third.
    assert_eq!(h.cluster.closed_scanners().len(), 1);
    assert!(requests_to(&h, 2).is_empty());
}

#[tokio::test]
async fn test_scan_error_leaves_scanner_done() {
    let h = harness();
    h.cluster.fail_scans_on(&fixture_servers()[0]);

    let mut scanner = h.client.scanner(b"users", Families::new(), b"", b"");
    assert!(scanner.step().await.is_err());
    assert_eq!(scanner.state(), &ScanState::Done);
    assert!(scanner.rows().is_empty());
}

#[tokio::test]
async fn test_scan_step_through_states() {
    let h = harness();
    let mut scanner = h.client.scanner(b"users", Families::new(), b"", b"c");

    scanner.step().await.unwrap();
    let ScanState::Paging(cursor) = scanner.state().clone() else {
        panic!("expected Paging, got {:?}", scanner.state());
    };
    assert_eq!(cursor.region_stop, Bytes::from_static(b"d"));
    assert_eq!(cursor.row_key, Bytes::new());
    assert_eq!(keys(scanner.rows()), ["alice", "bob"]);

    scanner.step().await.unwrap();
    assert_eq!(scanner.state(), &ScanState::ClosingRegion(cursor.clone()));

    scanner.step().await.unwrap();
    assert_eq!(scanner.state(), &ScanState::Done);
    assert_eq!(h.cluster.closed_scanners(), [cursor.scanner_id]);

    // Stepping a finished scan is a no-op.
    scanner.step().await.unwrap();
    assert_eq!(scanner.state(), &ScanState::Done);
    assert_eq!(scanner.rows().len(), 2);
}

#[tokio::test]
async fn test_scan_past_last_row_is_empty() {
    let h = harness();

    let rows = h.client.scan(b"users", Families::new(), b"x", b"").await.unwrap();

    assert!(rows.is_empty());
    assert_eq!(requests_to(&h, 2), ["open_scanner", "close_scanner"]);
}
