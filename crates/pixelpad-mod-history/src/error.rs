/// Error types for operations and the history ledger.
use crate::effect::EffectKind;

pub type OperationResult<T> = Result<T, OperationError>;

/// Failure of a single operation's apply or revert.
#[derive(thiserror::Error, Debug)]
pub enum OperationError {
    #[error("operation has not been applied yet")]
    NotYetApplied,

    #[error("pixel surface is no longer available")]
    SurfaceUnavailable,

    #[error("{effect} effect failed")]
    EffectFailed {
        effect: EffectKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid operation state: {0}")]
    InvalidState(String),

    #[error("surface access failed")]
    Surface(#[source] anyhow::Error),
}

impl OperationError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

/// Failure reported by the ledger. The ledger state is unchanged when one
/// of these is returned.
#[derive(thiserror::Error, Debug)]
pub enum HistoryError {
    #[error("failed to apply '{label}'")]
    Apply {
        label: String,
        #[source]
        source: OperationError,
    },

    #[error("failed to revert '{label}'")]
    Revert {
        label: String,
        #[source]
        source: OperationError,
    },
}

impl HistoryError {
    /// The underlying operation failure.
    pub fn operation_error(&self) -> &OperationError {
        match self {
            Self::Apply { source, .. } | Self::Revert { source, .. } => source,
        }
    }

    /// Label of the operation that failed.
    pub fn label(&self) -> &str {
        match self {
            Self::Apply { label, .. } | Self::Revert { label, .. } => label,
        }
    }
}
