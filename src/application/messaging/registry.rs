//! Command registry - the ordered pattern/handler table

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use regex_lite::Regex;

use crate::application::errors::{BotError, HandlerError};
use crate::domain::entities::Inbound;

/// Future returned by a command handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Vec<String>, HandlerError>> + Send>>;

/// Handler function type.
///
/// Receives the full inbound message plus the capture groups of the winning
/// pattern (group 0 excluded, left to right) and eventually yields the reply
/// strings for that message.
pub type Handler = Arc<dyn Fn(Inbound, Vec<String>) -> HandlerFuture + Send + Sync>;

/// Ordered table of pattern -> handler bindings.
///
/// Patterns are compiled once at registration time and tried in registration
/// order at dispatch time; the first match wins. The table is write-once:
/// commands are registered during startup, before any adapter delivers
/// traffic, and the registry is shared read-only afterwards.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<(Regex, Handler)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command pattern.
    ///
    /// The pattern is a regular expression matched unanchored against the raw
    /// inbound text. An invalid pattern fails here, never at match time; no
    /// duplicate detection is performed.
    pub fn register<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<(), BotError>
    where
        F: Fn(Inbound, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<String>, HandlerError>> + Send + 'static,
    {
        let regex = Regex::new(pattern).map_err(|source| BotError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let handler: Handler =
            Arc::new(move |msg, args| -> HandlerFuture { Box::pin(handler(msg, args)) });
        self.entries.push((regex, handler));
        Ok(())
    }

    /// First entry, in registration order, whose pattern matches the text.
    pub fn find(&self, text: &str) -> Option<&(Regex, Handler)> {
        self.entries.iter().find(|(regex, _)| regex.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::BotError;

    fn noop() -> impl Fn(Inbound, Vec<String>) -> std::future::Ready<Result<Vec<String>, HandlerError>>
    {
        |_msg, _args| std::future::ready(Ok(vec![]))
    }

    #[test]
    fn invalid_pattern_fails_at_registration() {
        let mut registry = CommandRegistry::new();
        let err = registry.register("(", noop()).unwrap_err();
        assert!(matches!(err, BotError::Pattern { ref pattern, .. } if pattern == "("));
        assert!(registry.is_empty());
    }

    #[test]
    fn find_returns_first_registered_match() {
        let mut registry = CommandRegistry::new();
        registry.register("/a", noop()).unwrap();
        registry.register("/ab", noop()).unwrap();
        assert_eq!(registry.len(), 2);

        let (regex, _) = registry.find("/ab").expect("should match");
        assert_eq!(regex.as_str(), "/a");
    }

    #[test]
    fn find_uses_unanchored_substring_semantics() {
        let mut registry = CommandRegistry::new();
        registry.register("/trein", noop()).unwrap();

        assert!(registry.find("zeg /trein maar").is_some());
        assert!(registry.find("/tre").is_none());
    }
}
