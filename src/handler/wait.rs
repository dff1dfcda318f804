use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// Races the delay against the cancellation signal. Exactly one side wins;
/// the losing future is dropped without running anything. When both are
/// ready at the same poll, cancellation wins.
pub async fn wait_or_cancel(delay: Duration, cancel: &CancellationToken) -> WaitOutcome {
    tokio::select! {
        biased;
        () = cancel.cancelled() => WaitOutcome::Cancelled,
        () = tokio::time::sleep(delay) => WaitOutcome::Elapsed,
    }
}
