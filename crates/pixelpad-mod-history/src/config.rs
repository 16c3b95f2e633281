/// Configuration for the history ledger.
use std::time::Duration;

/// Two same-category adjustments closer together than this merge into
/// one undo step.
const DEFAULT_MERGE_WINDOW_MS: u64 = 1000;

/// Total snapshot memory the ledger tries to stay under.
const DEFAULT_FOOTPRINT_CEILING_BYTES: usize = 256 * 1024 * 1024;

/// Undo steps kept reachable even when over the memory ceiling.
const DEFAULT_RETAIN_MINIMUM: usize = 1;

/// Maximum number of top-level entries.
const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Configuration for the history ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Merge window in milliseconds. Zero disables merging.
    pub merge_window_ms: u64,
    /// Soft memory ceiling for all retained entries.
    pub footprint_ceiling_bytes: usize,
    /// Eviction never leaves fewer undoable entries than this.
    pub retain_minimum: usize,
    /// Entry count ceiling, enforced like the memory ceiling.
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            merge_window_ms: DEFAULT_MERGE_WINDOW_MS,
            footprint_ceiling_bytes: DEFAULT_FOOTPRINT_CEILING_BYTES,
            retain_minimum: DEFAULT_RETAIN_MINIMUM,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl HistoryConfig {
    /// The merge window as a `Duration`.
    pub fn merge_window(&self) -> Duration {
        Duration::from_millis(self.merge_window_ms)
    }

    /// Config with merging disabled, handy for step-by-step histories.
    pub fn without_merging() -> Self {
        Self {
            merge_window_ms: 0,
            ..Self::default()
        }
    }
}
