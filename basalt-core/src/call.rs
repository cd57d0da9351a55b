//! A request in flight.
//!
//! A [`Call`] carries the target table and row, the request body, the
//! caller's [`CallContext`], the region it was routed to, and a single-slot
//! result channel. The connection completes the call exactly once; the
//! caller waits on the receiving end or on its context, whichever fires
//! first.

use std::sync::Mutex;

use bytes::Bytes;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ClientResult};
use crate::types::{Request, Response};

/// What a call resolves to.
pub type CallResult = ClientResult<Response>;

/// Receiving end of a call's result slot.
pub type ResultReceiver = oneshot::Receiver<CallResult>;

/// Deadline and cancellation for a caller.
///
/// Clones share the cancellation token, so cancelling any clone cancels all.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl CallContext {
    /// A context with neither deadline nor cancellation.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: CancellationToken::new(),
        }
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the cancellation token shared by this context's clones.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels the context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true if the context is cancelled or past its deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the context is cancelled or its deadline passes.
    ///
    /// Never resolves for a background context that nobody cancels.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = tokio::time::sleep_until(deadline) => {}
                    () = self.cancel.cancelled() => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

/// The region a call was routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionAssignment {
    /// Name of the region the call targets.
    pub region_name: Bytes,
    /// Stop key of that region; empty for the last region.
    pub stop_key: Bytes,
}

/// One request routed to one region.
#[derive(Debug)]
pub struct Call {
    table: Bytes,
    key: Bytes,
    request: Request,
    context: CallContext,
    assignment: Mutex<Option<RegionAssignment>>,
    result_tx: Mutex<Option<oneshot::Sender<CallResult>>>,
    result_rx: Mutex<Option<ResultReceiver>>,
}

impl Call {
    /// Creates a call with a fresh result slot.
    #[must_use]
    pub fn new(
        table: impl Into<Bytes>,
        key: impl Into<Bytes>,
        request: Request,
        context: CallContext,
    ) -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            table: table.into(),
            key: key.into(),
            request,
            context,
            assignment: Mutex::new(None),
            result_tx: Mutex::new(Some(tx)),
            result_rx: Mutex::new(Some(rx)),
        }
    }

    /// Returns the target table.
    #[must_use]
    pub const fn table(&self) -> &Bytes {
        &self.table
    }

    /// Returns the target row key.
    #[must_use]
    pub const fn key(&self) -> &Bytes {
        &self.key
    }

    /// Returns the request body.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the caller's context.
    #[must_use]
    pub const fn context(&self) -> &CallContext {
        &self.context
    }

    /// Records the region this call is routed to.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn set_region(&self, region_name: Bytes, stop_key: Bytes) {
        let mut assignment = self.assignment.lock().expect("call mutex poisoned");
        *assignment = Some(RegionAssignment {
            region_name,
            stop_key,
        });
    }

    /// Returns the recorded region, if the call has been routed.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn region(&self) -> Option<RegionAssignment> {
        self.assignment.lock().expect("call mutex poisoned").clone()
    }

    /// Returns the stop key of the recorded region.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn region_stop_key(&self) -> Option<Bytes> {
        self.assignment
            .lock()
            .expect("call mutex poisoned")
            .as_ref()
            .map(|a| a.stop_key.clone())
    }

    /// Delivers the result. Only the first delivery is kept.
    ///
    /// Returns false if a result was already delivered or nobody is
    /// listening any more.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    pub fn complete(&self, result: CallResult) -> bool {
        let tx = self.result_tx.lock().expect("call mutex poisoned").take();
        tx.is_some_and(|tx| tx.send(result).is_ok())
    }

    /// Returns true once a result has been delivered (or delivery attempted).
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.result_tx.lock().expect("call mutex poisoned").is_none()
    }

    /// Takes the receiving end of the result slot. Only the first taker gets it.
    ///
    /// Take it before handing the call to a connection, so a result that
    /// arrives immediately is not missed.
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned.
    #[must_use]
    pub fn take_result_receiver(&self) -> Option<ResultReceiver> {
        self.result_rx.lock().expect("call mutex poisoned").take()
    }

    /// Waits for the result or for the context, whichever comes first.
    ///
    /// A result that is already available wins over an expired context.
    ///
    /// # Errors
    ///
    /// Returns `DeadlineExceeded` if the context fires first, or
    /// `ResultChannelClosed` if the call is dropped undelivered.
    pub async fn await_result(&self, rx: ResultReceiver) -> CallResult {
        tokio::select! {
            biased;
            result = rx => result.unwrap_or(Err(ClientError::ResultChannelClosed)),
            () = self.context.done() => Err(ClientError::DeadlineExceeded),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::{Families, RowResult};

    fn get_call(context: CallContext) -> Call {
        Call::new(
            "users",
            "row1",
            Request::Get {
                families: Families::new(),
                closest_row_before: false,
            },
            context,
        )
    }

    #[tokio::test]
    async fn test_result_delivered_once() {
        let call = get_call(CallContext::background());
        let rx = call.take_result_receiver().unwrap();

        assert!(call.complete(Ok(Response::Get(Some(RowResult::default())))));
        assert!(!call.complete(Ok(Response::Get(None))));
        assert!(call.is_completed());

        let result = call.await_result(rx).await.unwrap();
        assert_eq!(result, Response::Get(Some(RowResult::default())));
    }

    #[tokio::test]
    async fn test_receiver_taken_once() {
        let call = get_call(CallContext::background());
        assert!(call.take_result_receiver().is_some());
        assert!(call.take_result_receiver().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires_without_result() {
        let call = get_call(CallContext::with_timeout(Duration::from_millis(50)));
        let rx = call.take_result_receiver().unwrap();

        let err = call.await_result(rx).await.unwrap_err();
        assert!(err.is_deadline_exceeded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_result_beats_expired_deadline() {
        let call = get_call(CallContext::with_timeout(Duration::from_millis(1)));
        let rx = call.take_result_receiver().unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;
        assert!(call.context().is_done());

        call.complete(Ok(Response::Get(None)));
        assert_eq!(call.await_result(rx).await.unwrap(), Response::Get(None));
    }

    #[tokio::test]
    async fn test_cancel_stops_wait() {
        let call = Arc::new(get_call(CallContext::background()));
        let rx = call.take_result_receiver().unwrap();

        let waiter = {
            let call = Arc::clone(&call);
            tokio::spawn(async move { call.await_result(rx).await })
        };
        call.context().cancel();

        let err = waiter.await.unwrap().unwrap_err();
        assert!(err.is_deadline_exceeded());
    }

    #[tokio::test]
    async fn test_clones_share_cancellation_token() {
        let context = CallContext::with_timeout(Duration::from_secs(60));
        let call = get_call(context.clone());
        let rx = call.take_result_receiver().unwrap();
        assert!(!call.context().is_done());

        // Cancelling through the token reaches every clone of the context.
        context.cancellation_token().cancel();
        assert!(call.context().cancellation_token().is_cancelled());
        assert!(call.context().is_done());

        let err = call.await_result(rx).await.unwrap_err();
        assert!(err.is_deadline_exceeded());
    }

    #[tokio::test]
    async fn test_dropped_sender_closes_channel() {
        let call = get_call(CallContext::background());
        let rx = call.take_result_receiver().unwrap();
        // Take and drop the sender without sending.
        drop(call.result_tx.lock().unwrap().take());

        let err = call.await_result(rx).await.unwrap_err();
        assert!(matches!(err, ClientError::ResultChannelClosed));
    }

    #[test]
    fn test_region_assignment() {
        let call = get_call(CallContext::background());
        assert!(call.region().is_none());

        call.set_region(Bytes::from_static(b"users,,1"), Bytes::from_static(b"m"));
        assert_eq!(call.region_stop_key().as_deref(), Some(b"m".as_slice()));
        assert_eq!(
            call.region().unwrap().region_name,
            Bytes::from_static(b"users,,1")
        );
    }
}
