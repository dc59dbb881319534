//! Registered dialogs and the per-turn context they run in.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::channel::{Channel, ConversationRef};
use crate::error::{BuildError, DispatchError};
use crate::input::OnTurnInput;
use crate::stack::DialogStack;
use crate::store::StateStore;
use crate::turn::TurnResult;

/// Everything a dialog may touch while handling one turn.
///
/// Tracks whether anything has been sent so the dispatcher can avoid
/// answering the same turn twice.
pub struct DialogContext<'a> {
    conversation: &'a ConversationRef,
    input: OnTurnInput,
    channel: &'a dyn Channel,
    store: &'a dyn StateStore,
    responded: bool,
    end_requested: bool,
}

impl<'a> DialogContext<'a> {
    #[must_use]
    pub fn new(
        conversation: &'a ConversationRef,
        input: OnTurnInput,
        channel: &'a dyn Channel,
        store: &'a dyn StateStore,
    ) -> Self {
        Self {
            conversation,
            input,
            channel,
            store,
            responded: false,
            end_requested: false,
        }
    }

    #[must_use]
    pub const fn conversation(&self) -> &ConversationRef {
        self.conversation
    }

    #[must_use]
    pub const fn input(&self) -> &OnTurnInput {
        &self.input
    }

    #[must_use]
    pub fn store(&self) -> &'a dyn StateStore {
        self.store
    }

    /// Whether a message went out during this turn.
    #[must_use]
    pub const fn responded(&self) -> bool {
        self.responded
    }

    /// Finish the resumed dialog when it declines the turn.
    ///
    /// Only honored when `resume` returns an empty result: the frame is
    /// popped and the dialog underneath is offered the same turn.
    pub fn end_dialog(&mut self) {
        self.end_requested = true;
    }

    pub(crate) fn take_end_request(&mut self) -> bool {
        std::mem::take(&mut self.end_requested)
    }

    pub(crate) fn replace_input(&mut self, input: OnTurnInput) {
        self.input = input;
    }

    pub async fn send(&mut self, text: &str) -> anyhow::Result<()> {
        self.channel.send(self.conversation, text).await?;
        self.responded = true;
        Ok(())
    }

    pub async fn send_with_suggestions(
        &mut self,
        text: &str,
        suggestions: &[String],
    ) -> anyhow::Result<()> {
        self.channel
            .send_with_suggestions(self.conversation, text, suggestions)
            .await?;
        self.responded = true;
        Ok(())
    }
}

/// A named conversational component that may span several turns.
///
/// `state` is the dialog's own frame state; it starts as `null` on `begin`
/// and is persisted between turns while the dialog waits.
#[async_trait]
pub trait Dialog: Send + Sync {
    fn id(&self) -> &str;

    async fn begin(
        &self,
        ctx: &mut DialogContext<'_>,
        state: &mut Value,
        options: &Value,
    ) -> anyhow::Result<TurnResult>;

    async fn resume(
        &self,
        ctx: &mut DialogContext<'_>,
        state: &mut Value,
    ) -> anyhow::Result<TurnResult>;

    /// Called for every frame of this dialog while the stack is unwound.
    async fn on_cancel(&self, _ctx: &mut DialogContext<'_>, _state: &Value) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Dialogs addressable by id.
#[derive(Default)]
pub struct DialogRegistry {
    dialogs: HashMap<String, Arc<dyn Dialog>>,
}

impl DialogRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, dialog: Arc<dyn Dialog>) -> Result<(), BuildError> {
        let id = dialog.id().to_string();
        if self.dialogs.contains_key(&id) {
            return Err(BuildError::DuplicateDialog(id));
        }
        info!("Registering dialog: {id}");
        self.dialogs.insert(id, dialog);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, dialog_id: &str) -> Option<&Arc<dyn Dialog>> {
        self.dialogs.get(dialog_id)
    }

    #[must_use]
    pub fn contains(&self, dialog_id: &str) -> bool {
        self.dialogs.contains_key(dialog_id)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.dialogs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    /// Unwind the whole stack, top frame first.
    pub async fn cancel_all(
        &self,
        ctx: &mut DialogContext<'_>,
        stack: &mut DialogStack,
    ) -> Result<(), DispatchError> {
        debug!("Unwinding {} dialog frame(s)", stack.depth());
        while let Some(frame) = stack.pop() {
            let Some(dialog) = self.get(&frame.dialog_id) else {
                warn!("Dropping frame of unregistered dialog: {}", frame.dialog_id);
                continue;
            };
            dialog
                .on_cancel(ctx, &frame.state)
                .await
                .map_err(DispatchError::dialog(&frame.dialog_id))?;
        }
        Ok(())
    }
}
