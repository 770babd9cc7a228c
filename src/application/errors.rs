//! Application layer errors

use std::fmt;

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("invalid command pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: regex_lite::Error,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure raised by a command handler.
///
/// Carries an optional user-facing message plus an optional underlying cause.
/// The dispatcher renders these as a best-effort reply: the message (or a
/// fixed generic line when there is none), followed by the cause when present.
#[derive(Debug, Clone, Default)]
pub struct HandlerError {
    pub message: Option<String>,
    pub cause: Option<String>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            cause: None,
        }
    }

    /// A failure with no user-facing message at all.
    pub fn opaque() -> Self {
        Self::default()
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, &self.cause) {
            (Some(message), Some(cause)) => write!(f, "{} ({})", message, cause),
            (Some(message), None) => write!(f, "{}", message),
            (None, Some(cause)) => write!(f, "handler failed ({})", cause),
            (None, None) => write!(f, "handler failed"),
        }
    }
}

impl std::error::Error for HandlerError {}

/// NS travel information API errors
#[derive(Error, Debug)]
pub enum NsError {
    #[error("request to NS API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("NS API returned status {0}")]
    Status(reqwest::StatusCode),
}

impl From<NsError> for HandlerError {
    fn from(err: NsError) -> Self {
        HandlerError::new("De NS dienst gaf geen antwoord..").with_cause(err.to_string())
    }
}
