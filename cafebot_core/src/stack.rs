//! Per-conversation dialog stack.
//!
//! The top frame is the active dialog. An empty stack means the
//! conversation is idle.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One active dialog and the state it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogFrame {
    pub dialog_id: String,
    /// Opaque to everything except the dialog named by `dialog_id`.
    #[serde(default)]
    pub state: Value,
}

impl DialogFrame {
    #[must_use]
    pub fn new(dialog_id: impl Into<String>) -> Self {
        Self {
            dialog_id: dialog_id.into(),
            state: Value::Null,
        }
    }
}

/// Ordered dialog frames, bottom first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogStack {
    frames: Vec<DialogFrame>,
}

impl DialogStack {
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn top(&self) -> Option<&DialogFrame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut DialogFrame> {
        self.frames.last_mut()
    }

    /// Id of the active dialog, or `""` when idle.
    #[must_use]
    pub fn active_dialog_id(&self) -> &str {
        self.top().map_or("", |f| f.dialog_id.as_str())
    }

    pub fn push(&mut self, frame: DialogFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<DialogFrame> {
        self.frames.pop()
    }

    #[must_use]
    pub fn frames(&self) -> &[DialogFrame] {
        &self.frames
    }

    #[must_use]
    pub fn contains(&self, dialog_id: &str) -> bool {
        self.frames.iter().any(|f| f.dialog_id == dialog_id)
    }
}
