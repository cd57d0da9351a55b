//! Dispatch integration tests: region stamping, waiting, deadlines, and
//! errors surfaced without retry.

use std::sync::Arc;
use std::time::Duration;

use basalt_client::ClientConfig;
use basalt_core::{Call, CallContext, ClientError, Families, Request, ResolutionFailure};
use bytes::Bytes;

use crate::init_test_logging;
use crate::simulated_cluster::{
    fixture_servers, users_cluster, SimulatedConnectionFactory, TestHarness, FIXTURE_FAMILY,
    FIXTURE_QUALIFIER, NOT_SERVING_REGION,
};

fn harness() -> TestHarness {
    init_test_logging();
    TestHarness::new(users_cluster()).unwrap()
}

fn get_call(row: &'static str, context: CallContext) -> Arc<Call> {
    Arc::new(Call::new(
        "users",
        row,
        Request::Get {
            families: Families::new(),
            closest_row_before: false,
        },
        context,
    ))
}

#[tokio::test]
async fn test_dispatcher_stamps_region_before_handoff() {
    let h = harness();
    let servers = fixture_servers();

    let row = h.client.get(b"users", b"erin", Families::new()).await.unwrap();
    assert_eq!(
        row.unwrap().value(FIXTURE_FAMILY, FIXTURE_QUALIFIER).unwrap().as_ref(),
        b"erin"
    );

    let calls = h.cluster.calls_to(&servers[1]);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].request, "get");
    assert_eq!(calls[0].region_name, Some(Bytes::from_static(b"users,d,1")));
    assert_eq!(calls[0].key.as_ref(), b"erin");
}

#[tokio::test]
async fn test_dispatcher_enqueue_then_wait_for_result() {
    let h = harness();
    let call = get_call("olivia", CallContext::with_timeout(Duration::from_secs(1)));
    let rx = call.take_result_receiver().unwrap();

    h.client.enqueue(Arc::clone(&call)).await.unwrap();
    assert_eq!(call.region().unwrap().region_name.as_ref(), b"users,m,1");

    let row = call.await_result(rx).await.unwrap().into_get().unwrap().unwrap();
    assert_eq!(row.row().unwrap().as_ref(), b"olivia");
}

#[tokio::test(start_paused = true)]
async fn test_dispatcher_unresponsive_server_hits_deadline() {
    let h = harness();
    h.cluster.set_unresponsive(&fixture_servers()[0]);

    let started = tokio::time::Instant::now();
    let err = h.client.get(b"users", b"alice", Families::new()).await.unwrap_err();
    assert!(err.is_deadline_exceeded());
    assert!(started.elapsed() >= h.client.config().call_timeout);
}

#[tokio::test(start_paused = true)]
async fn test_dispatcher_expired_deadline_returns_promptly() {
    let h = harness();
    let servers = fixture_servers();
    let rs1 = &servers[0];
    h.client.resolve(b"users", b"alice").await.unwrap();
    h.cluster.set_unresponsive(rs1);

    let deadline = tokio::time::Instant::now();
    tokio::time::advance(Duration::from_millis(5)).await;
    let call = get_call("alice", CallContext::with_deadline(deadline));
    assert!(call.context().is_done());

    let started = tokio::time::Instant::now();
    let err = h.client.send_sync(Arc::clone(&call)).await.unwrap_err();
    assert!(matches!(err, ClientError::DeadlineExceeded));
    assert!(started.elapsed() < Duration::from_millis(10));
    // The call was still handed to the server.
    assert_eq!(h.cluster.calls_to(rs1).len(), 1);
    assert!(!call.is_completed());
}

#[tokio::test(start_paused = true)]
async fn test_dispatcher_cancelled_context_ends_wait() {
    let h = harness();
    h.cluster.set_unresponsive(&fixture_servers()[0]);
    let call = get_call("alice", CallContext::background());

    let canceller = Arc::clone(&call);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.context().cancel();
    });

    let err = h.client.send_sync(call).await.unwrap_err();
    assert!(matches!(err, ClientError::DeadlineExceeded));
}

#[tokio::test(start_paused = true)]
async fn test_dispatcher_late_result_still_completes_call() {
    init_test_logging();
    let cluster = users_cluster();
    let factory =
        SimulatedConnectionFactory::new(cluster.clone()).with_latency(Duration::from_secs(2));
    let h = TestHarness::with_parts(
        cluster,
        ClientConfig::fast_for_testing().with_meta_lookup_timeout(Duration::from_secs(5)),
        factory,
    )
    .unwrap();
    // Warm the caches so the call's deadline only covers the region server.
    h.client.resolve(b"users", b"bob").await.unwrap();
    let call = get_call("bob", CallContext::with_timeout(Duration::from_secs(1)));

    let started = tokio::time::Instant::now();
    let err = h.client.send_sync(Arc::clone(&call)).await.unwrap_err();
    assert!(err.is_deadline_exceeded());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!call.is_completed());

    // The server still answers at the 2 s mark; nobody is listening.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(call.is_completed());
    assert!(!call.complete(Err(ClientError::ResultChannelClosed)));
}

#[tokio::test]
async fn test_dispatcher_remote_error_surfaces_without_retry() {
    let h = harness();
    let servers = fixture_servers();
    h.client.get(b"users", b"erin", Families::new()).await.unwrap();

    h.cluster.move_region(b"users,d,1", servers[2].clone());
    let err = h.client.get(b"users", b"erin", Families::new()).await.unwrap_err();
    match err {
        ClientError::Remote { exception, .. } => assert_eq!(exception, NOT_SERVING_REGION),
        other => panic!("expected a remote error, got {other:?}"),
    }

    // The stale cache entry was used as is.
    assert_eq!(h.cluster.meta_query_count(), 1);
    assert!(h.cluster.calls_to(&servers[2]).is_empty());
}

#[tokio::test]
async fn test_dispatcher_resolution_failure_reaches_no_region_server() {
    let h = harness();

    let err = h.client.get(b"accounts", b"a", Families::new()).await.unwrap_err();
    assert!(matches!(
        err.resolution_failure(),
        Some(ResolutionFailure::TableNotFound)
    ));
    assert!(h
        .cluster
        .calls()
        .iter()
        .all(|record| &record.server == h.cluster.meta_addr()));
}
