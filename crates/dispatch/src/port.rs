//! Guarded execution of persistence-port calls.
//!
//! Every port operation runs under the configured per-call timeout and
//! races against the caller's cancellation token, so a stalled backend
//! or an abandoned request cannot wedge a dispatch service.

use std::future::Future;
use std::time::Duration;

use fleetline_db::store::{Capability, DispatchStore, StoreError};
use tokio_util::sync::CancellationToken;

use crate::error::DispatchError;

/// Require a capability up front, before doing any work that would be
/// wasted if a later call must fail with `Unsupported`.
pub(crate) fn require(
    store: &dyn DispatchStore,
    cap: Capability,
    operation: &'static str,
) -> Result<(), DispatchError> {
    if store.supports(cap) {
        Ok(())
    } else {
        Err(DispatchError::Unsupported { operation })
    }
}

/// Run one port call under the per-call timeout, racing cancellation.
pub(crate) async fn call<T, F>(
    operation: &'static str,
    timeout: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T, DispatchError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    // Biased so an already-cancelled caller never commits more work.
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DispatchError::Cancelled),
        outcome = tokio::time::timeout(timeout, fut) => match outcome {
            Err(_) => Err(DispatchError::Timeout { operation, timeout }),
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(DispatchError::from_store(operation, source)),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn call_passes_through_success() {
        let cancel = CancellationToken::new();
        let result = call("op", TIMEOUT, &cancel, async { Ok::<_, StoreError>(7) }).await;
        assert_matches!(result, Ok(7));
    }

    #[tokio::test]
    async fn call_maps_unsupported_to_its_own_variant() {
        let cancel = CancellationToken::new();
        let result = call("op", TIMEOUT, &cancel, async {
            Err::<(), _>(StoreError::Unsupported { operation: "op" })
        })
        .await;
        assert_matches!(result, Err(DispatchError::Unsupported { operation: "op" }));
    }

    #[tokio::test]
    async fn call_times_out_a_stalled_future() {
        let cancel = CancellationToken::new();
        let result = call("op", TIMEOUT, &cancel, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, StoreError>(())
        })
        .await;
        assert_matches!(result, Err(DispatchError::Timeout { operation: "op", .. }));
    }

    #[tokio::test]
    async fn call_observes_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = call("op", Duration::from_secs(60), &cancel, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, StoreError>(())
        })
        .await;
        assert_matches!(result, Err(DispatchError::Cancelled));
    }
}
