/// Persisted undo history settings.
use serde::{Deserialize, Serialize};

/// Upper bound for the merge window, in milliseconds.
pub const MAX_MERGE_WINDOW_MS: u64 = 60_000;

/// History limits as stored in the config file.
///
/// The memory ceiling is kept in MiB so the file stays readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Window within which same-kind adjustments fold into one step. 0 disables merging.
    pub merge_window_ms: u64,
    pub memory_ceiling_mb: u64,
    /// Undoable steps kept even when over the memory ceiling (minimum 1).
    pub retain_minimum: usize,
    pub max_entries: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            merge_window_ms: 1000,
            memory_ceiling_mb: 256,
            retain_minimum: 1,
            max_entries: 1000,
        }
    }
}

impl HistorySettings {
    /// Clamps values to valid ranges.
    pub fn sanitize(&mut self) {
        self.merge_window_ms = self.merge_window_ms.min(MAX_MERGE_WINDOW_MS);
        self.memory_ceiling_mb = self.memory_ceiling_mb.max(1);
        self.retain_minimum = self.retain_minimum.max(1);
        self.max_entries = self.max_entries.max(self.retain_minimum);
    }

    /// The memory ceiling in bytes.
    pub fn memory_ceiling_bytes(&self) -> usize {
        usize::try_from(self.memory_ceiling_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}
