use thiserror::Error;

#[derive(Debug, Error)]
pub enum NluError {
    #[error("invalid pattern for intent '{intent}': {source}")]
    InvalidPattern {
        intent: String,
        source: regex::Error,
    },

    #[error("invalid entity pattern: {0}")]
    InvalidEntityPattern(#[from] regex::Error),
}
