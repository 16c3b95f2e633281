//! Editing session: one canvas plus its undo/redo history.
//!
//! An `EditorSession` owns the canvas as a shared surface and hands the
//! ledger operations that only hold a weak handle to it. Dropping the
//! session tears the surface down, which invalidates any operation still
//! floating around outside the ledger.

use std::cell::RefCell;
use std::rc::Rc;

use pixelpad_config::HistorySettings;

use crate::effects::{self, Levels};
use crate::history::{
    config_from_settings, Adjustment, HistoryConfig, HistoryError, HistoryLedger, LeafOperation,
    LedgerState, MemorySurface, Operation, OperationSummary, PixelBuffer, PixelSurface, Region,
    SharedSurface,
};

/// A canvas being edited, with its history.
pub struct EditorSession {
    canvas: Rc<RefCell<MemorySurface>>,
    ledger: HistoryLedger,
    /// Bumped every time the canvas pixels change through the session.
    content_version: u64,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("dimensions", &self.dimensions())
            .field("ledger", &self.ledger)
            .field("content_version", &self.content_version)
            .finish_non_exhaustive()
    }
}

impl EditorSession {
    /// Starts a session over `buffer` with default history limits.
    pub fn new(buffer: PixelBuffer) -> Self {
        Self::with_config(buffer, HistoryConfig::default())
    }

    /// Starts a session with explicit history limits.
    pub fn with_config(buffer: PixelBuffer, config: HistoryConfig) -> Self {
        Self {
            canvas: MemorySurface::new(buffer).into_shared(),
            ledger: HistoryLedger::new(config),
            content_version: 0,
        }
    }

    /// Starts a session with limits taken from the config file.
    pub fn with_settings(buffer: PixelBuffer, settings: &HistorySettings) -> Self {
        Self::with_config(buffer, config_from_settings(settings))
    }

    /// Starts a session on a canvas filled with one color.
    pub fn blank(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self::new(PixelBuffer::filled(width, height, rgba))
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.borrow().dimensions()
    }

    /// Copy of the current canvas pixels.
    pub fn snapshot(&self) -> PixelBuffer {
        self.canvas.borrow().buffer().clone()
    }

    /// Shared handle to the canvas, for building custom operations.
    pub fn surface(&self) -> SharedSurface {
        self.canvas.clone()
    }

    pub fn content_version(&self) -> u64 {
        self.content_version
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    /// Applies `adjustment` to the whole canvas.
    ///
    /// # Errors
    ///
    /// Returns an error if the effect rejects its parameters or the canvas
    /// cannot be read or written. The canvas and history are left unchanged.
    pub fn adjust(&mut self, adjustment: Adjustment) -> Result<(), HistoryError> {
        let (width, height) = self.dimensions();
        self.adjust_region(adjustment, Region::full(width, height))
    }

    /// Applies `adjustment` to `region` only.
    ///
    /// # Errors
    ///
    /// As [`adjust`](Self::adjust); a region outside the canvas also fails.
    pub fn adjust_region(
        &mut self,
        adjustment: Adjustment,
        region: Region,
    ) -> Result<(), HistoryError> {
        let surface = self.surface();
        let op = LeafOperation::new(adjustment.label(), &surface, region, effects::step(adjustment));
        tracing::debug!("Adjusting {region:?} with {adjustment:?}");
        self.execute_operation(op.into())
    }

    /// Analyzes the canvas and stretches its levels.
    ///
    /// Returns the levels used, or `None` when the canvas already spans the
    /// full range and nothing was recorded.
    ///
    /// # Errors
    ///
    /// As [`adjust`](Self::adjust).
    pub fn auto_enhance(&mut self) -> Result<Option<Levels>, HistoryError> {
        let levels = self.analyze_levels();
        if levels.is_identity() {
            tracing::debug!("Auto-enhance skipped, levels already span the full range");
            return Ok(None);
        }
        self.adjust(levels.into())?;
        Ok(Some(levels))
    }

    /// Computes auto-enhance levels for the canvas without changing anything.
    pub fn analyze_levels(&self) -> Levels {
        effects::analyze_levels(self.canvas.borrow().buffer())
    }

    /// Executes a prebuilt operation through the ledger.
    ///
    /// # Errors
    ///
    /// Propagates the ledger's apply error.
    pub fn execute_operation(&mut self, op: Operation) -> Result<(), HistoryError> {
        self.ledger.execute(op)?;
        self.bump_version();
        Ok(())
    }

    /// Undoes the last step. Returns `Ok(false)` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Propagates the ledger's revert error.
    pub fn undo(&mut self) -> Result<bool, HistoryError> {
        let undone = self.ledger.undo()?;
        if undone {
            self.bump_version();
        }
        Ok(undone)
    }

    /// Redoes the next step. Returns `Ok(false)` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Propagates the ledger's apply error.
    pub fn redo(&mut self) -> Result<bool, HistoryError> {
        let redone = self.ledger.redo()?;
        if redone {
            self.bump_version();
        }
        Ok(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.ledger.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.ledger.can_redo()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.ledger.undo_label()
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.ledger.redo_label()
    }

    /// Starts collecting the following adjustments into one undo step.
    pub fn start_grouping(&mut self, label: impl Into<String>) {
        self.ledger.start_grouping(label);
    }

    pub fn end_grouping(&mut self) {
        self.ledger.end_grouping();
    }

    pub fn is_grouping(&self) -> bool {
        self.ledger.is_grouping()
    }

    /// Stops the next adjustment from merging into the current step.
    pub fn seal_tail(&mut self) {
        self.ledger.seal_tail();
    }

    /// Forgets all history. The canvas keeps its current pixels.
    pub fn clear_history(&mut self) {
        self.ledger.clear();
    }

    pub fn history_state(&self) -> LedgerState {
        self.ledger.state()
    }

    pub fn summaries(&self) -> Vec<OperationSummary> {
        self.ledger.summaries()
    }

    #[inline]
    fn bump_version(&mut self) {
        self.content_version = self.content_version.wrapping_add(1);
    }
}
