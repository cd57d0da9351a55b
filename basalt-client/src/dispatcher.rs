//! Call dispatch.
//!
//! The dispatcher resolves a call's row, stamps the region on the call, and
//! hands it to the connection serving that region. Nothing is retried: a
//! failed resolution or a failed call is returned as is.

use std::sync::Arc;

use basalt_core::{Call, CallResult, ClientError, ClientResult};
use basalt_routing::{RegionResolver, Resolved};
use tracing::debug;

/// Routes calls to region connections.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    resolver: Arc<RegionResolver>,
}

impl Dispatcher {
    /// Creates a dispatcher over `resolver`.
    #[must_use]
    pub const fn new(resolver: Arc<RegionResolver>) -> Self {
        Self { resolver }
    }

    /// Returns the resolver.
    #[must_use]
    pub const fn resolver(&self) -> &Arc<RegionResolver> {
        &self.resolver
    }

    /// Routes the call and queues it on its region's connection.
    ///
    /// The result is delivered through the call's result slot. If
    /// resolution fails, no connection sees the call.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, or the connection's refusal to queue.
    pub async fn enqueue(&self, call: Arc<Call>) -> ClientResult<()> {
        let Resolved { region, connection } =
            self.resolver.resolve(call.table(), call.key()).await?;

        call.set_region(region.region_name().clone(), region.stop_key().clone());
        debug!(
            request = call.request().name(),
            region = %region,
            server = %connection.addr(),
            "Dispatching call"
        );
        connection.enqueue(call).await
    }

    /// Routes the call and waits for its result or its context.
    ///
    /// When the context fires first the call may still complete at the
    /// server; its outcome is unknown.
    ///
    /// # Errors
    ///
    /// Returns `DeadlineExceeded` if the context fires first,
    /// `ResultChannelClosed` if the call is dropped undelivered, any error
    /// from [`Self::enqueue`], or the error the server delivered.
    pub async fn send_sync(&self, call: Arc<Call>) -> CallResult {
        let rx = call.take_result_receiver().ok_or(ClientError::InvalidCall {
            reason: "result receiver already taken",
        })?;
        self.enqueue(Arc::clone(&call)).await?;
        call.await_result(rx).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use basalt_core::{CallContext, Families, Request, ResolutionFailure, ServerAddr};
    use basalt_routing::{
        ConnectionFactory, MetaLocator, RegionConnection, ResolverConfig, StaticMetaLocator,
    };

    use super::*;

    struct RefusingFactory;

    #[async_trait]
    impl ConnectionFactory for RefusingFactory {
        async fn connect(&self, addr: &ServerAddr) -> ClientResult<Arc<dyn RegionConnection>> {
            Err(ClientError::connection(addr, "connection refused"))
        }
    }

    struct NoMeta;

    #[async_trait]
    impl MetaLocator for NoMeta {
        async fn locate_meta(&self, _quorum: &str) -> ClientResult<ServerAddr> {
            Err(ClientError::connection("zk:2181", "no node"))
        }
    }

    fn dispatcher(locator: Arc<dyn MetaLocator>) -> Dispatcher {
        let resolver = RegionResolver::new(
            ResolverConfig::default(),
            locator,
            Arc::new(RefusingFactory),
        );
        Dispatcher::new(Arc::new(resolver))
    }

    fn get_call() -> Arc<Call> {
        Arc::new(Call::new(
            "users",
            "alice",
            Request::Get {
                families: Families::new(),
                closest_row_before: false,
            },
            CallContext::background(),
        ))
    }

    #[tokio::test]
    async fn test_resolution_failure_leaves_call_unrouted() {
        let dispatcher = dispatcher(Arc::new(NoMeta));
        let call = get_call();

        let err = dispatcher.enqueue(Arc::clone(&call)).await.unwrap_err();
        assert!(matches!(
            err.resolution_failure(),
            Some(ResolutionFailure::MetaLocation(_))
        ));
        assert!(call.region().is_none());
        assert!(!call.is_completed());
    }

    #[tokio::test]
    async fn test_connect_failure_surfaces_verbatim() {
        let dispatcher = dispatcher(Arc::new(StaticMetaLocator::new(ServerAddr::new("meta", 1))));

        let err = dispatcher.send_sync(get_call()).await.unwrap_err();
        match err {
            ClientError::Connection { addr, message } => {
                assert_eq!(addr, "meta:1");
                assert_eq!(message, "connection refused");
            }
            other => panic!("expected a connection error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_sync_requires_receiver() {
        let dispatcher = dispatcher(Arc::new(NoMeta));
        let call = get_call();
        let _rx = call.take_result_receiver();

        let err = dispatcher.send_sync(call).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidCall { .. }));
    }
}
