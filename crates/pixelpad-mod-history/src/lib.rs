/// Undo/redo history for pixel edits.
///
/// Provides reversible [`Operation`]s (leaf adjustments, groups, no-ops)
/// bound to a [`PixelSurface`], and a [`HistoryLedger`] that executes them,
/// merges rapid same-kind adjustments, groups batches into one step, and
/// evicts old entries to stay within a memory ceiling.
pub mod config;
pub mod effect;
pub mod error;
pub mod ledger;
pub mod operation;
pub mod summary;
pub mod surface;

#[cfg(test)]
mod test_support;

pub use config::HistoryConfig;
pub use effect::{Adjustment, EffectFn, EffectKind, EffectStep};
pub use error::{HistoryError, OperationError, OperationResult};
pub use ledger::HistoryLedger;
pub use operation::{
    GroupOperation, LeafOperation, NoOpOperation, Operation, OperationId, OperationKind,
    OperationState, Reversible,
};
pub use summary::{LedgerState, OperationSummary};
pub use surface::{
    MemorySurface, PixelBuffer, PixelSurface, Region, SharedSurface, WeakSurface, BYTES_PER_PIXEL,
};
