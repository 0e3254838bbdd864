use thiserror::Error;

/// Failure to acquire local capture devices. Recoverable: the session
/// stays in `Idle` and the join can be retried.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("capture permission denied")]
    PermissionDenied,

    #[error("capture device unavailable: {0}")]
    Unavailable(String),
}
