//! Shared cancellation-racing helper for any future that can fail with
//! [`ForwardError`] — used by every suspension point the engine calls out
//! to: sends, album fetch, and uploader staging.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::errors::ForwardError;

/// Race `fut` against `cancel`. If cancellation fires first, returns
/// `ForwardError::Cancelled` immediately without waiting for `fut` to settle.
pub(crate) async fn cancellable<T>(
    fut: impl Future<Output = Result<T, ForwardError>>,
    cancel: &CancellationToken,
) -> Result<T, ForwardError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(ForwardError::Cancelled),
        res = fut => res,
    }
}
