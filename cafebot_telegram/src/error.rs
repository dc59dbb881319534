use cafebot_core::DispatchError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Turn failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Recognizer error: {0}")]
    Recognizer(anyhow::Error),

    #[error("Unauthorized access from chat_id: {0}")]
    Unauthorized(i64),

    #[error("Not a Telegram chat id: {0}")]
    InvalidChat(String),

    #[error("Unsupported update: {0}")]
    Unsupported(&'static str),
}
