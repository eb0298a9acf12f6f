use thiserror::Error;

use crate::handles::Handle;

/// The closed error taxonomy every fallible URC entry point returns
/// (spec.md §7). Kept flat and `thiserror`-derived the way the teacher's
/// `ConfigFromStrErr` is, rather than boxing an opaque `anyhow::Error` at the
/// public boundary — callers branch on `UrcError` variants (e.g. to retry on
/// `SurfaceLost`), they don't just log it.
#[derive(Debug, Error)]
pub enum UrcError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("stale handle: {0:?}")]
    StaleHandle(Handle),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("ordering violation: {handle:?} updated after it was first referenced by {op}")]
    OrderingViolation { handle: Handle, op: &'static str },

    #[error("out of resources: {0}")]
    OutOfResources(String),

    #[error("backend failure: {0}")]
    BackendFailure(String),

    #[error("surface lost")]
    SurfaceLost,

    #[error("io failure: {0}")]
    IoFailure(String),
}

impl UrcError {
    /// Whether a caller can simply retry the failing call on the next frame
    /// tick without additional recovery steps (spec.md §7: "retry-safe").
    pub fn is_retry_safe(&self) -> bool {
        matches!(self, UrcError::SurfaceLost)
    }
}

pub type UrcResult<T> = Result<T, UrcError>;
