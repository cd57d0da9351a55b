//! Client facade tests: the per-verb helpers against a simulated cluster.

use std::collections::BTreeMap;

use basalt_core::{Families, MutationValues, ResolutionFailure};
use bytes::Bytes;

use crate::init_test_logging;
use crate::simulated_cluster::{users_cluster, TestHarness, FIXTURE_FAMILY, FIXTURE_QUALIFIER};

fn harness() -> TestHarness {
    init_test_logging();
    TestHarness::new(users_cluster()).unwrap()
}

fn values(family: &[u8], qualifier: &[u8], value: &[u8]) -> MutationValues {
    let mut qualifiers = BTreeMap::new();
    qualifiers.insert(Bytes::copy_from_slice(qualifier), Bytes::copy_from_slice(value));
    let mut values = MutationValues::new();
    values.insert(Bytes::copy_from_slice(family), qualifiers);
    values
}

#[tokio::test]
async fn test_client_put_then_get() {
    let h = harness();

    let result = h
        .client
        .put(b"users", b"zoe", values(FIXTURE_FAMILY, b"email", b"zoe@example.com"))
        .await
        .unwrap();
    assert!(result.processed);
    assert!(result.result.is_none());

    let row = h
        .client
        .get(b"users", b"zoe", Families::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        row.value(FIXTURE_FAMILY, b"email").unwrap().as_ref(),
        b"zoe@example.com"
    );
}

#[tokio::test]
async fn test_client_get_filters_families() {
    let h = harness();
    h.cluster.put_cell(b"users", b"erin", b"meta", b"age", b"31");

    let mut families = Families::new();
    families.insert(Bytes::from_static(b"meta"), Vec::new());
    let row = h.client.get(b"users", b"erin", families).await.unwrap().unwrap();

    assert_eq!(row.cells.len(), 1);
    assert_eq!(row.value(b"meta", b"age").unwrap().as_ref(), b"31");
    assert!(row.value(FIXTURE_FAMILY, FIXTURE_QUALIFIER).is_none());
}

#[tokio::test]
async fn test_client_get_missing_row() {
    let h = harness();

    let row = h.client.get(b"users", b"nobody", Families::new()).await.unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn test_client_delete_row() {
    let h = harness();

    let result = h
        .client
        .delete(b"users", b"frank", MutationValues::new())
        .await
        .unwrap();
    assert!(result.processed);

    let row = h.client.get(b"users", b"frank", Families::new()).await.unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn test_client_append_returns_new_value() {
    let h = harness();

    let result = h
        .client
        .append(b"users", b"bob", values(FIXTURE_FAMILY, FIXTURE_QUALIFIER, b"-jr"))
        .await
        .unwrap();

    let row = result.result.unwrap();
    assert_eq!(
        row.value(FIXTURE_FAMILY, FIXTURE_QUALIFIER).unwrap().as_ref(),
        b"bob-jr"
    );
}

#[tokio::test]
async fn test_client_increment_counter() {
    let h = harness();
    let column: &[u8] = b"logins";

    for _ in 0..2 {
        h.client
            .increment(b"users", b"peggy", values(FIXTURE_FAMILY, column, &5i64.to_be_bytes()))
            .await
            .unwrap();
    }
    let result = h
        .client
        .increment(b"users", b"peggy", values(FIXTURE_FAMILY, column, &(-3i64).to_be_bytes()))
        .await
        .unwrap();

    let row = result.result.unwrap();
    let value = row.value(FIXTURE_FAMILY, column).unwrap();
    assert_eq!(value.as_ref(), 7i64.to_be_bytes());
}

#[tokio::test]
async fn test_client_check_table() {
    let h = harness();

    // The probe row does not exist, but the table does.
    assert!(h.client.check_table(b"users").await.unwrap().is_none());

    let err = h.client.check_table(b"accounts").await.unwrap_err();
    assert!(matches!(
        err.resolution_failure(),
        Some(ResolutionFailure::TableNotFound)
    ));
}

#[tokio::test]
async fn test_client_clones_share_caches() {
    let h = harness();
    let other = h.client.clone();

    h.client.get(b"users", b"alice", Families::new()).await.unwrap();
    other.get(b"users", b"bob", Families::new()).await.unwrap();

    assert_eq!(h.cluster.meta_query_count(), 1);
    assert_eq!(other.resolver().cached_region_count(), 1);
    assert_eq!(h.locator.lookup_count(), 1);
}
