//! Demo subcommands

pub mod intervals;
pub mod objects;
pub mod reenqueue;

use anyhow::Context;
use std::path::Path;
use tickloop::LoopConfig;

/// Read a `LoopConfig` from a JSON file, or use the defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LoopConfig> {
    let Some(path) = path else {
        return Ok(LoopConfig::default());
    };

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

/// Name of the current OS thread, for demo output
pub(crate) fn thread_label() -> String {
    std::thread::current()
        .name()
        .unwrap_or("<unnamed>")
        .to_string()
}
