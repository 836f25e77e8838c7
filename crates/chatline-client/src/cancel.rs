use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::errors::ChatError;

/// Handle used to request cancellation of one or more operations.
///
/// Cloning shares the same underlying flag. Once aborted it stays aborted.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Requests cancellation.
    ///
    /// Cancellation is cooperative: local consumption stops promptly, the
    /// remote generation may keep running.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    /// Returns an observer for this handle.
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of an [`AbortHandle`], passed into client operations.
#[derive(Clone, Debug)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal is active.
    ///
    /// Never resolves if every handle is dropped without aborting.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Runs `operation` under an optional cancellation signal.
///
/// An already-active signal fails fast without polling the operation, so no
/// I/O is issued. Activation mid-flight drops the operation. A failure seen
/// while the signal is active is reported as `Cancelled`.
pub(crate) async fn guard<T, F>(signal: Option<&AbortSignal>, operation: F) -> Result<T, ChatError>
where
    F: Future<Output = Result<T, ChatError>>,
{
    let Some(signal) = signal else {
        return operation.await;
    };
    if signal.is_aborted() {
        return Err(ChatError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = signal.aborted() => Err(ChatError::Cancelled),
        result = operation => result.map_err(|err| classify(Some(signal), err)),
    }
}

/// Re-labels a failure as `Cancelled` when the signal is active.
pub(crate) fn classify(signal: Option<&AbortSignal>, err: ChatError) -> ChatError {
    match signal {
        Some(signal) if signal.is_aborted() => ChatError::Cancelled,
        _ => err,
    }
}

pub(crate) fn is_aborted(signal: Option<&AbortSignal>) -> bool {
    signal.is_some_and(AbortSignal::is_aborted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn pre_aborted_signal_never_polls_operation() {
        let handle = AbortHandle::new();
        handle.abort();
        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();
        let result: Result<(), ChatError> = guard(Some(&handle.signal()), async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;
        assert_eq!(result, Err(ChatError::Cancelled));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn abort_mid_flight_cancels_pending_operation() {
        let handle = AbortHandle::new();
        let signal = handle.signal();
        let aborter = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            aborter.abort();
        });
        let result: Result<(), ChatError> =
            guard(Some(&signal), std::future::pending::<Result<(), ChatError>>()).await;
        assert_eq!(result, Err(ChatError::Cancelled));
    }

    #[tokio::test]
    async fn failure_while_aborted_is_classified_as_cancelled() {
        let handle = AbortHandle::new();
        let signal = handle.signal();
        let inner = handle.clone();
        let result: Result<(), ChatError> = guard(Some(&signal), async move {
            inner.abort();
            Err(ChatError::transport("connection reset", None))
        })
        .await;
        assert_eq!(result, Err(ChatError::Cancelled));
    }

    #[tokio::test]
    async fn failure_without_abort_is_preserved() {
        let handle = AbortHandle::new();
        let result: Result<(), ChatError> = guard(Some(&handle.signal()), async {
            Err(ChatError::transport("boom", Some(500)))
        })
        .await;
        assert_eq!(result, Err(ChatError::transport("boom", Some(500))));
    }

    #[tokio::test]
    async fn no_signal_passes_result_through() {
        let result = guard(None, async { Ok::<_, ChatError>(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[test]
    fn signal_created_after_abort_observes_it() {
        let handle = AbortHandle::new();
        handle.abort();
        assert!(handle.is_aborted());
        assert!(handle.signal().is_aborted());
        assert!(is_aborted(Some(&handle.signal())));
        assert!(!is_aborted(None));
    }
}
