//! Store round-trip around the dispatcher.
//!
//! The dispatcher works on a stack value it is handed; [`TurnHandler`] loads
//! that value for a conversation, runs the turn and writes it back. Callers
//! must not run two turns of the same conversation at once.

use std::sync::Arc;

use tracing::{debug, info};

use crate::channel::{Channel, ConversationRef};
use crate::dialog::DialogContext;
use crate::dispatcher::Dispatcher;
use crate::error::{BuildError, DispatchError};
use crate::input::OnTurnInput;
use crate::stack::DialogStack;
use crate::store::{self, StateKey, StateStore};
use crate::turn::TurnResult;

pub struct TurnHandler {
    dispatcher: Arc<Dispatcher>,
    store: Arc<dyn StateStore>,
    channel: Arc<dyn Channel>,
}

impl TurnHandler {
    #[must_use]
    pub fn builder() -> TurnHandlerBuilder {
        TurnHandlerBuilder::default()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// First turn of a conversation; starts from an empty stack.
    pub async fn on_begin_turn(
        &self,
        conversation: &ConversationRef,
        input: OnTurnInput,
    ) -> Result<TurnResult, DispatchError> {
        info!("Starting conversation: {}", conversation.conversation_id);
        self.run(conversation, input, DialogStack::new()).await
    }

    /// Later turn of a conversation; resumes the persisted stack.
    pub async fn on_continue_turn(
        &self,
        conversation: &ConversationRef,
        input: OnTurnInput,
    ) -> Result<TurnResult, DispatchError> {
        let stack = self.load_stack(conversation).await?.unwrap_or_default();
        self.run(conversation, input, stack).await
    }

    /// Route to `on_begin_turn` or `on_continue_turn` depending on whether a
    /// stack has been persisted for the conversation.
    pub async fn handle_turn(
        &self,
        conversation: &ConversationRef,
        input: OnTurnInput,
    ) -> Result<TurnResult, DispatchError> {
        match self.load_stack(conversation).await? {
            Some(stack) => self.run(conversation, input, stack).await,
            None => self.on_begin_turn(conversation, input).await,
        }
    }

    /// Forget the conversation's dialog stack and last turn input.
    pub async fn end_conversation(&self, conversation: &ConversationRef) -> Result<(), DispatchError> {
        let id = conversation.conversation_id.as_str();
        for key in [StateKey::DialogStack(id), StateKey::OnTurn(id)] {
            self.store
                .delete(&key.to_string())
                .await
                .map_err(DispatchError::Store)?;
        }
        info!("Ended conversation: {id}");
        Ok(())
    }

    /// Persisted stack of a conversation, if it has one.
    pub async fn load_stack(
        &self,
        conversation: &ConversationRef,
    ) -> Result<Option<DialogStack>, DispatchError> {
        let key = StateKey::DialogStack(&conversation.conversation_id).to_string();
        store::load(self.store.as_ref(), &key)
            .await
            .map_err(DispatchError::Store)
    }

    async fn run(
        &self,
        conversation: &ConversationRef,
        input: OnTurnInput,
        mut stack: DialogStack,
    ) -> Result<TurnResult, DispatchError> {
        debug!(
            "Turn for {}: intent='{}', depth={}",
            conversation.conversation_id,
            input.intent,
            stack.depth()
        );

        let mut ctx = DialogContext::new(
            conversation,
            input,
            self.channel.as_ref(),
            self.store.as_ref(),
        );
        let result = self.dispatcher.dispatch(&mut ctx, &mut stack).await?;

        let key = StateKey::DialogStack(&conversation.conversation_id).to_string();
        store::save(self.store.as_ref(), &key, &stack)
            .await
            .map_err(DispatchError::Store)?;

        Ok(result)
    }
}

#[derive(Default)]
pub struct TurnHandlerBuilder {
    dispatcher: Option<Arc<Dispatcher>>,
    store: Option<Arc<dyn StateStore>>,
    channel: Option<Arc<dyn Channel>>,
}

impl TurnHandlerBuilder {
    #[must_use]
    pub fn dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn channel(mut self, channel: Arc<dyn Channel>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn build(self) -> Result<TurnHandler, BuildError> {
        Ok(TurnHandler {
            dispatcher: self
                .dispatcher
                .ok_or(BuildError::MissingDependency("dispatcher"))?,
            store: self
                .store
                .ok_or(BuildError::MissingDependency("state store"))?,
            channel: self
                .channel
                .ok_or(BuildError::MissingDependency("channel"))?,
        })
    }
}
