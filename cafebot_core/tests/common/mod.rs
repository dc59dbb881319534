//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cafebot_core::{
    Channel, ConversationRef, Dialog, DialogContext, DialogRegistry, Dispatcher, StateStore,
    TurnResult, TurnStatus,
};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub text: String,
    pub suggestions: Vec<String>,
}

#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingChannel {
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|s| s.iter().map(|m| m.text.clone()).collect())
            .unwrap_or_default()
    }

    pub fn all(&self) -> Vec<Sent> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn record(&self, text: &str, suggestions: &[String]) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(Sent {
                text: text.to_string(),
                suggestions: suggestions.to_vec(),
            });
        }
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    async fn send(&self, _conversation: &ConversationRef, text: &str) -> anyhow::Result<()> {
        self.record(text, &[]);
        Ok(())
    }

    async fn send_with_suggestions(
        &self,
        _conversation: &ConversationRef,
        text: &str,
        suggestions: &[String],
    ) -> anyhow::Result<()> {
        self.record(text, suggestions);
        Ok(())
    }
}

#[derive(Default)]
pub struct MapStore {
    entries: tokio::sync::Mutex<HashMap<String, Value>>,
}

impl MapStore {
    pub async fn snapshot(&self, key: &str) -> Option<Value> {
        self.entries.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl StateStore for MapStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> anyhow::Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// What a scripted dialog does when begun or resumed.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub status: TurnStatus,
    pub reply: Option<&'static str>,
    /// Ask the dispatcher to drop the frame after declining.
    pub ends: bool,
}

impl Step {
    pub const fn silent(status: TurnStatus) -> Self {
        Self {
            status,
            reply: None,
            ends: false,
        }
    }

    pub const fn reply(status: TurnStatus, reply: &'static str) -> Self {
        Self {
            status,
            reply: Some(reply),
            ends: false,
        }
    }

    pub const fn ending(mut self) -> Self {
        self.ends = true;
        self
    }
}

/// Observed call to a scripted dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub kind: &'static str,
    pub raw_text: String,
    pub options: Value,
}

pub struct ScriptedDialog {
    id: &'static str,
    on_begin: Step,
    on_resume: Step,
    calls: Mutex<Vec<Call>>,
    cancelled: AtomicUsize,
}

impl ScriptedDialog {
    pub fn new(id: &'static str, on_begin: Step, on_resume: Step) -> Arc<Self> {
        Arc::new(Self {
            id,
            on_begin,
            on_resume,
            calls: Mutex::new(Vec::new()),
            cancelled: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn record(&self, kind: &'static str, ctx: &DialogContext<'_>, options: Value) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Call {
                kind,
                raw_text: ctx.input().raw_text.clone(),
                options,
            });
        }
    }

    async fn act(&self, ctx: &mut DialogContext<'_>, step: Step) -> anyhow::Result<TurnResult> {
        if let Some(reply) = step.reply {
            ctx.send(reply).await?;
        }
        if step.ends {
            ctx.end_dialog();
        }
        Ok(TurnResult::new(step.status))
    }
}

#[async_trait]
impl Dialog for ScriptedDialog {
    fn id(&self) -> &str {
        self.id
    }

    async fn begin(
        &self,
        ctx: &mut DialogContext<'_>,
        state: &mut Value,
        options: &Value,
    ) -> anyhow::Result<TurnResult> {
        self.record("begin", ctx, options.clone());
        *state = serde_json::json!({ "turns": 1 });
        self.act(ctx, self.on_begin).await
    }

    async fn resume(
        &self,
        ctx: &mut DialogContext<'_>,
        state: &mut Value,
    ) -> anyhow::Result<TurnResult> {
        self.record("resume", ctx, Value::Null);
        let turns = state.get("turns").and_then(Value::as_u64).unwrap_or(0);
        *state = serde_json::json!({ "turns": turns + 1 });
        self.act(ctx, self.on_resume).await
    }

    async fn on_cancel(&self, _ctx: &mut DialogContext<'_>, _state: &Value) -> anyhow::Result<()> {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn conversation() -> ConversationRef {
    ConversationRef::new("conv-1", "user-1")
}

/// Build a dispatcher routing each dialog's id as its own intent.
pub fn dispatcher_for(dialogs: &[Arc<ScriptedDialog>]) -> Dispatcher {
    let mut registry = DialogRegistry::new();
    let mut builder = Dispatcher::builder();
    for dialog in dialogs {
        registry
            .register(dialog.clone())
            .expect("dialog ids should be unique");
        builder = builder.route(dialog.id, dialog.id);
    }
    builder
        .registry(registry)
        .build()
        .expect("dispatcher should build")
}
