// Re-exports from pixelpad-mod-history and settings conversion.
// Bridges the config file's history section with the ledger's limits.
pub use pixelpad_mod_history::{
    Adjustment, EffectKind, EffectStep, HistoryConfig, HistoryError, HistoryLedger, LedgerState,
    LeafOperation, MemorySurface, Operation, OperationError, OperationKind, OperationSummary,
    PixelBuffer, PixelSurface, Region, SharedSurface,
};

use pixelpad_config::HistorySettings;

/// Builds ledger limits from persisted settings.
pub fn config_from_settings(settings: &HistorySettings) -> HistoryConfig {
    HistoryConfig {
        merge_window_ms: settings.merge_window_ms,
        footprint_ceiling_bytes: settings.memory_ceiling_bytes(),
        retain_minimum: settings.retain_minimum.max(1),
        max_entries: settings.max_entries.max(1),
    }
}
