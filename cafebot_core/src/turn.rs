use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of beginning or continuing a dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    /// The dialog is suspended until the next user turn.
    Waiting,
    /// The dialog finished.
    Complete,
    /// The dialog asked for the whole stack to be unwound.
    Cancelled,
    /// Nothing happened, or the dialog declined the input.
    Empty,
}

impl TurnStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
            Self::Empty => "empty",
        }
    }
}

impl std::fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub status: TurnStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl TurnResult {
    #[must_use]
    pub const fn new(status: TurnStatus) -> Self {
        Self {
            status,
            value: None,
        }
    }

    #[must_use]
    pub const fn waiting() -> Self {
        Self::new(TurnStatus::Waiting)
    }

    #[must_use]
    pub const fn complete() -> Self {
        Self::new(TurnStatus::Complete)
    }

    #[must_use]
    pub const fn cancelled() -> Self {
        Self::new(TurnStatus::Cancelled)
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::new(TurnStatus::Empty)
    }

    /// Attach the value a finished dialog hands back.
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == TurnStatus::Complete
    }
}
