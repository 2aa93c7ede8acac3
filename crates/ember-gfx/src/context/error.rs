use thiserror::Error;

use super::ContextState;

/// Errors reported by the context adapter.
///
/// Every error is returned synchronously from the call that caused it; there is
/// no retry. On `InstanceCreation` / `SurfaceAttachment` the adapter is left in
/// `FailedInit` and the caller picks a fallback.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Driver/API unavailable or required features missing.
    #[error("GPU instance creation failed: {0:#}")]
    InstanceCreation(anyhow::Error),

    /// Invalid surface, unsupported size, or device lost while binding.
    #[error("surface attachment failed: {0:#}")]
    SurfaceAttachment(anyhow::Error),

    /// A lifecycle call made out of order.
    #[error("lifecycle call out of order: {0}")]
    Misordered(&'static str),

    /// The adapter already reached a terminal state.
    #[error("graphics context is {0}")]
    Unusable(ContextState),
}

/// Result type for adapter lifecycle calls.
pub type ContextResult<T = ()> = Result<T, ContextError>;
