//! Injected progress reporting
//!
//! The orchestrator reports coarse progress through this trait instead of
//! owning any progress-bar state. Listeners run on worker threads and must
//! never influence numerical results; the default listener does nothing.

/// Receiver for coarse-grained progress updates
pub trait ProgressListener: Send + Sync {
    /// Reports that `n` more packet histories have completed
    fn advance(&self, n: usize);
}

/// The default listener: ignores all updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn advance(&self, _n: usize) {}
}

impl<F> ProgressListener for F
where
    F: Fn(usize) + Send + Sync,
{
    fn advance(&self, n: usize) {
        self(n)
    }
}
