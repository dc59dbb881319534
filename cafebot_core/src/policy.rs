//! Interruption policy.
//!
//! Decides whether a requested operation may take over the conversation
//! given the dialog that is currently active. Rules are checked in order and
//! the first match denies; anything unmatched is allowed. Each rule is keyed
//! on its own operation so rule order never changes an outcome.

use thiserror::Error;

/// Operation that lists what the bot can do.
pub const SHOW_CAPABILITIES: &str = "ShowCapabilities";

/// Operation that abandons everything in progress.
pub const CANCEL: &str = "Cancel";

pub const ALREADY_SHOWING_CAPABILITIES: &str = "You are already looking at what I can do. \
     Pick one of the options, or say \"cancel\" to start over.";

pub const NOTHING_TO_CANCEL: &str = "There is nothing to cancel right now.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub allowed: bool,
    /// User-facing explanation; empty when allowed.
    pub reason: String,
}

impl PolicyDecision {
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
        }
    }

    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Which active dialog a rule fires on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveDialog {
    /// No dialog is active.
    Idle,
    /// The named dialog is on top of the stack.
    Is(String),
}

impl ActiveDialog {
    fn matches(&self, active_dialog_id: &str) -> bool {
        match self {
            Self::Idle => active_dialog_id.is_empty(),
            Self::Is(id) => id == active_dialog_id,
        }
    }
}

/// A single deny rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub operation: String,
    pub when: ActiveDialog,
    pub reason: String,
}

impl PolicyRule {
    /// Deny `operation` while `dialog_id` is the active dialog.
    #[must_use]
    pub fn deny_while_active(
        operation: impl Into<String>,
        dialog_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            when: ActiveDialog::Is(dialog_id.into()),
            reason: reason.into(),
        }
    }

    /// Deny `operation` while nothing is active.
    #[must_use]
    pub fn deny_while_idle(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            when: ActiveDialog::Idle,
            reason: reason.into(),
        }
    }

    fn matches(&self, active_dialog_id: &str, requested_operation: &str) -> bool {
        self.operation == requested_operation && self.when.matches(active_dialog_id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("a rule for operation '{0}' already exists")]
    DuplicateOperation(String),
}

#[derive(Debug, Clone)]
pub struct InterruptionPolicy {
    rules: Vec<PolicyRule>,
}

impl InterruptionPolicy {
    /// A policy with no rules; every operation is allowed.
    #[must_use]
    pub const fn permissive() -> Self {
        Self { rules: Vec::new() }
    }

    /// The café bot's rule table.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            rules: vec![
                PolicyRule::deny_while_active(
                    SHOW_CAPABILITIES,
                    SHOW_CAPABILITIES,
                    ALREADY_SHOWING_CAPABILITIES,
                ),
                PolicyRule::deny_while_idle(CANCEL, NOTHING_TO_CANCEL),
            ],
        }
    }

    /// Append a rule after the existing ones.
    pub fn add_rule(&mut self, rule: PolicyRule) -> Result<(), PolicyError> {
        if self.rules.iter().any(|r| r.operation == rule.operation) {
            return Err(PolicyError::DuplicateOperation(rule.operation));
        }
        self.rules.push(rule);
        Ok(())
    }

    #[must_use]
    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    #[must_use]
    pub fn evaluate(&self, active_dialog_id: &str, requested_operation: &str) -> PolicyDecision {
        self.rules
            .iter()
            .find(|rule| rule.matches(active_dialog_id, requested_operation))
            .map_or_else(PolicyDecision::allow, |rule| {
                PolicyDecision::deny(rule.reason.clone())
            })
    }
}

impl Default for InterruptionPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}
