/// Undo/redo ledger with merge windows, grouping, and memory-bounded retention.
///
/// Entries live in one vector with a cursor pointing at the last applied
/// entry. Entries above the cursor are redo-pending. Recording a new entry
/// drops the redo-pending tail first.
use crate::config::HistoryConfig;
use crate::error::{HistoryError, OperationError};
use crate::operation::{GroupOperation, Operation, Reversible};
use crate::summary::{LedgerState, OperationSummary};

/// Manages the undo/redo history of one editing session.
pub struct HistoryLedger {
    /// Top-level entries, oldest first.
    entries: Vec<Operation>,
    /// Index of the last applied entry. `None` when nothing is applied.
    cursor: Option<usize>,
    /// Group currently collecting executed operations.
    active_group: Option<GroupOperation>,
    /// Sum of `estimate_footprint()` over `entries`.
    total_footprint: usize,
    /// Whether the entry at the cursor may still absorb the next operation.
    tail_open: bool,
    config: HistoryConfig,
}

impl std::fmt::Debug for HistoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLedger")
            .field("entries", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("grouping", &self.active_group.is_some())
            .field("total_footprint", &self.total_footprint)
            .field("tail_open", &self.tail_open)
            .finish()
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HistoryLedger {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            active_group: None,
            total_footprint: 0,
            tail_open: false,
            config,
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Applies `op` and records it.
    ///
    /// While a group is open the operation becomes a child of that group.
    /// Otherwise it is merged into the entry at the cursor when the merge
    /// policy allows, or appended as a new entry.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Apply`] if the operation is no longer valid
    /// or its apply fails. Nothing is recorded in that case.
    pub fn execute(&mut self, mut op: Operation) -> Result<(), HistoryError> {
        if !op.is_still_valid() {
            return Err(HistoryError::Apply {
                label: op.label().to_string(),
                source: OperationError::invalid_state("operation is bound to a torn-down surface"),
            });
        }
        if let Err(source) = op.apply() {
            tracing::warn!("Failed to apply '{}': {source}", op.label());
            return Err(HistoryError::Apply {
                label: op.label().to_string(),
                source,
            });
        }

        if let Some(group) = self.active_group.as_mut() {
            let label = op.label().to_string();
            group
                .push(op)
                .map_err(|source| HistoryError::Apply { label, source })?;
            tracing::debug!("Added operation to group ({} children)", group.len());
            return Ok(());
        }

        self.record(op);
        Ok(())
    }

    /// Reverts the entry at the cursor.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. An open group is
    /// closed first.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Revert`] if the revert fails; the cursor
    /// does not move.
    pub fn undo(&mut self) -> Result<bool, HistoryError> {
        if self.active_group.is_some() {
            self.end_grouping();
        }
        let Some(index) = self.cursor else {
            return Ok(false);
        };

        let entry = &mut self.entries[index];
        if !entry.is_still_valid() {
            return Err(HistoryError::Revert {
                label: entry.label().to_string(),
                source: OperationError::invalid_state("operation is bound to a torn-down surface"),
            });
        }
        if let Err(source) = entry.revert() {
            tracing::warn!("Failed to undo '{}': {source}", entry.label());
            return Err(HistoryError::Revert {
                label: entry.label().to_string(),
                source,
            });
        }

        self.cursor = index.checked_sub(1);
        self.tail_open = false;
        Ok(true)
    }

    /// Re-applies the first redo-pending entry.
    ///
    /// Returns `Ok(false)` when there is nothing to redo. An open group is
    /// closed first.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Apply`] if the apply fails; the cursor does
    /// not move.
    pub fn redo(&mut self) -> Result<bool, HistoryError> {
        if self.active_group.is_some() {
            self.end_grouping();
        }
        let index = self.next_index();
        let Some(entry) = self.entries.get_mut(index) else {
            return Ok(false);
        };

        if !entry.is_still_valid() {
            return Err(HistoryError::Apply {
                label: entry.label().to_string(),
                source: OperationError::invalid_state("operation is bound to a torn-down surface"),
            });
        }
        if let Err(source) = entry.apply() {
            tracing::warn!("Failed to redo '{}': {source}", entry.label());
            return Err(HistoryError::Apply {
                label: entry.label().to_string(),
                source,
            });
        }

        self.cursor = Some(index);
        self.tail_open = false;
        Ok(true)
    }

    /// Whether an entry is available to undo.
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    /// Whether a redo-pending entry exists.
    pub fn can_redo(&self) -> bool {
        self.next_index() < self.entries.len()
    }

    /// Label of the entry `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.cursor
            .and_then(|i| self.entries.get(i))
            .map(Operation::label)
    }

    /// Label of the entry `redo` would apply.
    pub fn redo_label(&self) -> Option<&str> {
        self.entries.get(self.next_index()).map(Operation::label)
    }

    /// Opens a group; subsequent executes become its children.
    ///
    /// Ignored when a group is already open, since groups do not nest.
    pub fn start_grouping(&mut self, label: impl Into<String>) {
        if self.active_group.is_some() {
            tracing::debug!("Group already open, ignoring start_grouping");
            return;
        }
        self.active_group = Some(GroupOperation::new(label));
    }

    /// Closes the open group and records it as one entry.
    ///
    /// Its children are already applied, so nothing is re-run. An empty
    /// group is discarded.
    pub fn end_grouping(&mut self) {
        let Some(mut group) = self.active_group.take() else {
            return;
        };
        if group.is_empty() {
            tracing::debug!("Discarding empty group");
            return;
        }
        group.seal();
        self.record(group.into());
    }

    /// Whether a group is currently open.
    pub fn is_grouping(&self) -> bool {
        self.active_group.is_some()
    }

    /// Forces the next executed operation into a new entry even if it
    /// would merge with the current one.
    pub fn seal_tail(&mut self) {
        self.tail_open = false;
    }

    /// Drops all entries and any open group.
    ///
    /// Nothing is reverted; the surface keeps its current pixels.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
        self.active_group = None;
        self.total_footprint = 0;
        self.tail_open = false;
    }

    /// Read-only counters for display.
    pub fn state(&self) -> LedgerState {
        LedgerState {
            entry_count: self.entries.len(),
            cursor: self.cursor,
            total_footprint_bytes: self.total_footprint,
        }
    }

    /// Describes every entry, oldest first.
    pub fn summaries(&self) -> Vec<OperationSummary> {
        self.entries.iter().map(Reversible::describe).collect()
    }

    fn next_index(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }

    /// Stores an applied operation at the top of the history.
    fn record(&mut self, op: Operation) {
        self.truncate_redo();

        match self.merge_with_tail(&op) {
            Some((index, combined)) => {
                let added = combined.estimate_footprint();
                let replaced = std::mem::replace(&mut self.entries[index], combined);
                self.total_footprint = self
                    .total_footprint
                    .saturating_sub(replaced.estimate_footprint())
                    + added;
                tracing::debug!("Merged '{}' into entry {index}", op.label());
            }
            None => {
                self.total_footprint += op.estimate_footprint();
                self.entries.push(op);
                self.cursor = Some(self.entries.len() - 1);
            }
        }
        self.tail_open = true;
        self.evict();
    }

    /// Drops every redo-pending entry.
    fn truncate_redo(&mut self) {
        let keep = self.next_index();
        if keep >= self.entries.len() {
            return;
        }
        let dropped: usize = self
            .entries
            .drain(keep..)
            .map(|e| e.estimate_footprint())
            .sum();
        self.total_footprint = self.total_footprint.saturating_sub(dropped);
        tracing::debug!("Discarded redo branch ({dropped} bytes)");
    }

    /// Combines `next` with the entry at the cursor if the merge policy allows.
    fn merge_with_tail(&self, next: &Operation) -> Option<(usize, Operation)> {
        if !self.tail_open {
            return None;
        }
        let index = self.cursor?;
        let tail = self.entries.get(index)?;
        let elapsed = next
            .created_at()
            .saturating_duration_since(tail.created_at());
        if elapsed >= self.config.merge_window() {
            return None;
        }
        tail.try_combine(next).map(|combined| (index, combined))
    }

    /// Drops the oldest entries while over the memory or count ceiling,
    /// keeping at least `retain_minimum` undoable entries.
    fn evict(&mut self) {
        let undoable = self.next_index();
        let mut total = self.total_footprint;
        let mut len = self.entries.len();
        let mut count = 0;

        while (total > self.config.footprint_ceiling_bytes || len > self.config.max_entries)
            && undoable - count > self.config.retain_minimum
        {
            total = total.saturating_sub(self.entries[count].estimate_footprint());
            len -= 1;
            count += 1;
        }
        if count == 0 {
            return;
        }

        self.entries.drain(..count);
        self.total_footprint = total;
        self.cursor = (undoable - count).checked_sub(1);
        tracing::debug!(
            "Evicted {count} oldest history entries ({} bytes retained)",
            self.total_footprint
        );
    }
}
