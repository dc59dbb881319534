use thiserror::Error;

/// Fatal configuration problems found while wiring the bot together.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("missing required dependency: {0}")]
    MissingDependency(&'static str),

    #[error("dialog registered twice: {0}")]
    DuplicateDialog(String),

    #[error("intent '{intent}' routes to unregistered dialog '{dialog}'")]
    UnknownRouteTarget { intent: String, dialog: String },
}

/// Failures that abort a turn.
///
/// Policy denials, unrouted intents and malformed cards are ordinary
/// outcomes and never show up here.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dialog '{0}' is on the stack but not registered")]
    UnknownDialog(String),

    #[error("dialog '{dialog_id}' failed: {source}")]
    Dialog {
        dialog_id: String,
        source: anyhow::Error,
    },

    #[error("state store error: {0}")]
    Store(anyhow::Error),

    #[error("channel error: {0}")]
    Channel(anyhow::Error),
}

impl DispatchError {
    pub(crate) fn dialog(dialog_id: &str) -> impl FnOnce(anyhow::Error) -> Self + '_ {
        move |source| Self::Dialog {
            dialog_id: dialog_id.to_string(),
            source,
        }
    }
}
