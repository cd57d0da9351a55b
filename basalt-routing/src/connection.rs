//! Connection abstractions.
//!
//! The transport to a region server (framing, auth, socket I/O) lives behind
//! [`RegionConnection`]. Production code plugs in a real connection; tests
//! use the simulated cluster in `basalt-tests`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use basalt_core::{Call, CallResult, ClientError, ClientResult, ServerAddr};

/// A connection to one region server.
///
/// # Implementation Notes
///
/// `enqueue` must eventually complete the call at most once via
/// [`Call::complete`]. It may also never complete it; callers bound their
/// wait with the call's context.
#[async_trait]
pub trait RegionConnection: Send + Sync + fmt::Debug {
    /// Returns the address of the server this connection talks to.
    fn addr(&self) -> &ServerAddr;

    /// Queues a call for sending.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection can no longer accept calls.
    async fn enqueue(&self, call: Arc<Call>) -> ClientResult<()>;

    /// Queues a call and waits for its result or its context.
    ///
    /// # Errors
    ///
    /// Returns `DeadlineExceeded` if the context fires first, any error
    /// from `enqueue`, or the error the server delivered.
    async fn send(&self, call: Arc<Call>) -> CallResult {
        let rx = call.take_result_receiver().ok_or(ClientError::InvalidCall {
            reason: "result receiver already taken",
        })?;
        self.enqueue(Arc::clone(&call)).await?;
        call.await_result(rx).await
    }
}

/// Builds connections to region servers.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Opens a connection to `addr`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` if the server cannot be reached.
    async fn connect(&self, addr: &ServerAddr) -> ClientResult<Arc<dyn RegionConnection>>;
}
