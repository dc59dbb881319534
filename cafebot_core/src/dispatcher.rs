//! Per-turn dispatch.
//!
//! One call to [`Dispatcher::dispatch`] handles one user turn: it consults the
//! interruption policy, continues the active dialog, falls back to beginning
//! a dialog routed from the intent, and applies the resulting status to the
//! stack.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::card::{CHOOSE_AN_OPTION, CardInput, CardPayload};
use crate::dialog::{DialogContext, DialogRegistry};
use crate::error::{BuildError, DispatchError};
use crate::policy::InterruptionPolicy;
use crate::stack::{DialogFrame, DialogStack};
use crate::store::{self, StateKey};
use crate::turn::{TurnResult, TurnStatus};

/// User-facing text the dispatcher sends on its own behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Prompt sent after a dialog completes.
    #[serde(default = "DispatcherConfig::default_anything_else_prompt")]
    pub anything_else_prompt: String,
    /// Quick replies offered with the prompt.
    #[serde(default = "DispatcherConfig::default_suggestions")]
    pub suggestions: Vec<String>,
    /// Sent when an intent has no route. `None` keeps the turn silent.
    #[serde(default = "DispatcherConfig::default_fallback_reply")]
    pub fallback_reply: Option<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            anything_else_prompt: Self::default_anything_else_prompt(),
            suggestions: Self::default_suggestions(),
            fallback_reply: Self::default_fallback_reply(),
        }
    }
}

impl DispatcherConfig {
    fn default_anything_else_prompt() -> String {
        "Is there anything else I can help you with?".to_string()
    }

    fn default_suggestions() -> Vec<String> {
        vec![
            "What can you do?".to_string(),
            "Book a table".to_string(),
            "Who are you?".to_string(),
        ]
    }

    #[expect(clippy::unnecessary_wraps, reason = "serde default for an Option field")]
    fn default_fallback_reply() -> Option<String> {
        Some("I'm still learning. Sorry, I don't know how to help you with that yet.".to_string())
    }
}

pub struct Dispatcher {
    registry: DialogRegistry,
    routes: HashMap<String, String>,
    policy: InterruptionPolicy,
    config: DispatcherConfig,
}

impl Dispatcher {
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    #[must_use]
    pub const fn registry(&self) -> &DialogRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn policy(&self) -> &InterruptionPolicy {
        &self.policy
    }

    /// Dialog id the intent routes to, if any.
    #[must_use]
    pub fn route(&self, intent: &str) -> Option<&str> {
        self.routes.get(intent).map(String::as_str)
    }

    /// Run one turn against `stack`.
    ///
    /// The stack is only modified when the turn is allowed and a dialog
    /// reports a status that calls for it.
    pub async fn dispatch(
        &self,
        ctx: &mut DialogContext<'_>,
        stack: &mut DialogStack,
    ) -> Result<TurnResult, DispatchError> {
        let on_turn_key = StateKey::OnTurn(&ctx.conversation().conversation_id).to_string();
        store::save(ctx.store(), &on_turn_key, ctx.input())
            .await
            .map_err(DispatchError::Store)?;

        let active = stack.active_dialog_id();
        let decision = self.policy.evaluate(active, &ctx.input().intent);
        if !decision.allowed {
            info!(
                "Blocked '{}' while '{}' is active",
                ctx.input().intent,
                active
            );
            ctx.send(&decision.reason)
                .await
                .map_err(DispatchError::Channel)?;
            return Ok(TurnResult::empty());
        }

        // A broken card never reaches a dialog, so no frame state can change.
        let card = match CardInput::inspect(ctx.input()) {
            CardInput::Absent => None,
            CardInput::Decoded(payload) => Some(payload),
            CardInput::Malformed(err) => {
                warn!("Malformed card payload: {err}");
                ctx.send(CHOOSE_AN_OPTION)
                    .await
                    .map_err(DispatchError::Channel)?;
                return Ok(TurnResult::empty());
            }
        };

        let mut result = self.resume_active(ctx, stack).await?;

        let completed = result.as_ref().is_some_and(TurnResult::is_complete);
        if !ctx.responded() && !completed {
            if let Some(begun) = self.begin_child(ctx, stack, card).await? {
                result = Some(begun);
            }
        }

        let Some(result) = result else {
            debug!("Nothing continued and nothing began");
            return Ok(TurnResult::empty());
        };

        debug!("Turn finished with status {}", result.status);
        match result.status {
            TurnStatus::Complete => {
                if let Some(finished) = stack.pop() {
                    info!("Dialog completed: {}", finished.dialog_id);
                }
                ctx.send_with_suggestions(
                    &self.config.anything_else_prompt,
                    &self.config.suggestions,
                )
                .await
                .map_err(DispatchError::Channel)?;
            }
            TurnStatus::Cancelled => {
                info!("Cancelling {} dialog(s)", stack.depth());
                self.registry.cancel_all(ctx, stack).await?;
            }
            TurnStatus::Waiting | TurnStatus::Empty => {}
        }

        Ok(result)
    }

    /// Offer the turn to the top frame.
    ///
    /// A frame that declines and asks to end is popped, and the frame
    /// underneath gets the same turn.
    async fn resume_active(
        &self,
        ctx: &mut DialogContext<'_>,
        stack: &mut DialogStack,
    ) -> Result<Option<TurnResult>, DispatchError> {
        while let Some(frame) = stack.top_mut() {
            let result = self.resume(ctx, frame).await?;
            let ended = ctx.take_end_request() && result.status == TurnStatus::Empty;
            if !ended {
                return Ok(Some(result));
            }

            if let Some(finished) = stack.pop() {
                info!("Dialog ended: {}", finished.dialog_id);
            }
            if ctx.responded() {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    async fn resume(
        &self,
        ctx: &mut DialogContext<'_>,
        frame: &mut DialogFrame,
    ) -> Result<TurnResult, DispatchError> {
        let dialog = self
            .registry
            .get(&frame.dialog_id)
            .ok_or_else(|| DispatchError::UnknownDialog(frame.dialog_id.clone()))?;

        debug!("Continuing dialog: {}", frame.dialog_id);
        dialog
            .resume(ctx, &mut frame.state)
            .await
            .map_err(DispatchError::dialog(&frame.dialog_id))
    }

    /// Begin the dialog the turn asks for.
    ///
    /// A decoded card is echoed and replaces the recognized input first.
    async fn begin_child(
        &self,
        ctx: &mut DialogContext<'_>,
        stack: &mut DialogStack,
        card: Option<CardPayload>,
    ) -> Result<Option<TurnResult>, DispatchError> {
        let Some(payload) = card else {
            let intent = ctx.input().intent.clone();
            let options = ctx.input().entity_options();
            return self.begin_for_intent(ctx, stack, &intent, &options).await;
        };

        let synthesized = payload.to_turn_input(ctx.input());

        if let Some(text) = payload.text() {
            ctx.send(&format!("You said: '{text}'."))
                .await
                .map_err(DispatchError::Channel)?;
        }

        let on_turn_key = StateKey::OnTurn(&ctx.conversation().conversation_id).to_string();
        store::save(ctx.store(), &on_turn_key, &synthesized)
            .await
            .map_err(DispatchError::Store)?;

        let intent = synthesized.intent.clone();
        ctx.replace_input(synthesized);
        self.begin_for_intent(ctx, stack, &intent, &payload.to_options())
            .await
    }

    async fn begin_for_intent(
        &self,
        ctx: &mut DialogContext<'_>,
        stack: &mut DialogStack,
        intent: &str,
        options: &Value,
    ) -> Result<Option<TurnResult>, DispatchError> {
        let Some(dialog_id) = self.route(intent) else {
            debug!("No dialog routed for intent: {intent}");
            if let Some(reply) = &self.config.fallback_reply {
                ctx.send(reply).await.map_err(DispatchError::Channel)?;
            }
            return Ok(None);
        };

        let dialog = self
            .registry
            .get(dialog_id)
            .ok_or_else(|| DispatchError::UnknownDialog(dialog_id.to_string()))?;

        info!("Beginning dialog '{dialog_id}' for intent '{intent}'");
        let mut frame = DialogFrame::new(dialog_id);
        let result = dialog
            .begin(ctx, &mut frame.state, options)
            .await
            .map_err(DispatchError::dialog(dialog_id))?;

        // A dialog that declines to start leaves no frame behind.
        if result.status != TurnStatus::Empty {
            stack.push(frame);
        }
        Ok(Some(result))
    }
}

#[derive(Default)]
pub struct DispatcherBuilder {
    registry: Option<DialogRegistry>,
    routes: HashMap<String, String>,
    policy: Option<InterruptionPolicy>,
    config: DispatcherConfig,
}

impl DispatcherBuilder {
    #[must_use]
    pub fn registry(mut self, registry: DialogRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Route `intent` to the dialog registered as `dialog_id`.
    #[must_use]
    pub fn route(mut self, intent: impl Into<String>, dialog_id: impl Into<String>) -> Self {
        self.routes.insert(intent.into(), dialog_id.into());
        self
    }

    #[must_use]
    pub fn routes<I, K, V>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.routes
            .extend(routes.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Defaults to [`InterruptionPolicy::with_defaults`].
    #[must_use]
    pub fn policy(mut self, policy: InterruptionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    #[must_use]
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Dispatcher, BuildError> {
        let registry = self
            .registry
            .ok_or(BuildError::MissingDependency("dialog registry"))?;

        for (intent, dialog) in &self.routes {
            if !registry.contains(dialog) {
                return Err(BuildError::UnknownRouteTarget {
                    intent: intent.clone(),
                    dialog: dialog.clone(),
                });
            }
        }

        info!(
            "Dispatcher ready: {} dialog(s), {} route(s)",
            registry.len(),
            self.routes.len()
        );

        Ok(Dispatcher {
            registry,
            routes: self.routes,
            policy: self.policy.unwrap_or_default(),
            config: self.config,
        })
    }
}
