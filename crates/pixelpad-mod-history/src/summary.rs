/// Serializable introspection records for logging and debug displays.
///
/// None of these are used to rebuild history; they describe it.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::operation::{OperationKind, OperationState};

/// Snapshot of an operation's identity and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub id: Uuid,
    pub label: String,
    /// Wall-clock time the operation was created.
    pub timestamp: DateTime<Utc>,
    pub kind: OperationKind,
    pub state: OperationState,
    /// Effect-specific parameters (`null` for no-ops and groups).
    pub params: serde_json::Value,
    pub footprint_bytes: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OperationSummary>,
}

/// Read-only ledger counters for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub entry_count: usize,
    /// Index of the last applied entry; `None` when nothing is applied.
    pub cursor: Option<usize>,
    pub total_footprint_bytes: usize,
}

impl LedgerState {
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.entry_count
    }
}
