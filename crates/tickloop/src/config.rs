//! Loop and pool configuration

use std::time::Duration;

/// Idle sleep used by a hosted loop when neither queue has ready work
pub const DEFAULT_TICK: Duration = Duration::from_nanos(20);

/// Default prefix for hosted thread names
pub const DEFAULT_THREAD_NAME: &str = "tickloop";

/// Construction parameters for `LoopThread` and `LoopThreadPool`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LoopConfig {
    /// Number of pool threads (0 = hardware concurrency). Ignored by `LoopThread`.
    pub threads: usize,

    /// Idle sleep between empty loop iterations
    pub tick: Duration,

    /// Prefix for hosted thread names; the member index is appended
    pub thread_name: String,
}

impl LoopConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool thread count (0 = hardware concurrency)
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the idle tick
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Set the thread name prefix
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Thread count a pool built from this config will actually spawn
    pub fn resolved_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    pub(crate) fn thread_name_for(&self, index: usize) -> String {
        format!("{}-{}", self.thread_name, index)
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            tick: DEFAULT_TICK,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}
