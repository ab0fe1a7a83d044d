//! Errors surfaced by thread lifecycle operations

/// Result alias for fallible lifecycle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned from `start()`
///
/// Spawning the hosted OS thread is the only fallible step in the runtime.
/// Enqueueing, cancellation and `stop()` never fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The OS refused to create a hosted thread
    #[error("failed to spawn thread `{name}`: {source}")]
    Spawn {
        /// Name the thread would have had
        name: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },
}
