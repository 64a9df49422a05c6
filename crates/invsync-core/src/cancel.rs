// ── Cancellation ──
//
// Every collaborator call races the caller's token. Writes that already
// completed stay committed; nothing after the cancellation point runs.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

/// Run `fut` unless `cancel` fires first.
pub(crate) async fn guarded<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = T>,
) -> Result<T, CoreError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(CoreError::Cancelled),
        out = fut => Ok(out),
    }
}
