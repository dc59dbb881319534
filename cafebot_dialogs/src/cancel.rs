use async_trait::async_trait;
use cafebot_core::{CANCEL, Dialog, DialogContext, TurnResult};
use serde_json::Value;

const CANCELLED: &str = "Sure, I've cancelled that. What else can I do for you?";

/// Unwinds every active dialog.
#[derive(Default)]
pub struct CancelDialog;

impl CancelDialog {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Dialog for CancelDialog {
    fn id(&self) -> &str {
        CANCEL
    }

    async fn begin(
        &self,
        ctx: &mut DialogContext<'_>,
        _state: &mut Value,
        _options: &Value,
    ) -> anyhow::Result<TurnResult> {
        ctx.send(CANCELLED).await?;
        Ok(TurnResult::cancelled())
    }

    async fn resume(
        &self,
        _ctx: &mut DialogContext<'_>,
        _state: &mut Value,
    ) -> anyhow::Result<TurnResult> {
        Ok(TurnResult::cancelled())
    }
}
