//! Message dispatcher - routes inbound text to command handlers

use std::sync::Arc;

use regex_lite::Regex;

use crate::application::errors::HandlerError;
use crate::application::messaging::registry::CommandRegistry;
use crate::domain::entities::Inbound;
use crate::domain::traits::Channel;

/// Reply for messages that match no registered command.
const FALLBACK_REPLY: &str = "Ik begrijp niet wat je zegt.. ";

/// Reply line for handler failures that carry no message of their own.
const GENERIC_FAILURE: &str = "Something went really wrong..";

/// Routes each inbound message through the command table.
///
/// Every message runs the same short path: log it, select the first
/// registered pattern that matches, invoke its handler with the extracted
/// capture groups, and deliver the resulting reply strings in order. A
/// message matching no pattern gets the fixed fallback reply; a failing
/// handler gets a best-effort error reply. No state is kept across messages,
/// so concurrent dispatches are independent.
pub struct Dispatcher {
    registry: CommandRegistry,
    channel: Arc<dyn Channel>,
    fallback: String,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, channel: Arc<dyn Channel>) -> Self {
        Self {
            registry,
            channel,
            fallback: FALLBACK_REPLY.to_string(),
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Handle one inbound message to completion.
    ///
    /// Exactly one handler executes per message: the first pattern, in
    /// registration order, whose regex matches the text. Delivery failures
    /// are logged and swallowed; nothing here retries or propagates.
    pub async fn dispatch(&self, msg: Inbound) {
        let sender = msg.sender_label();
        tracing::info!("@{} => {}", sender, msg.text);

        let Some((regex, handler)) = self.registry.find(&msg.text) else {
            tracing::warn!("@{} <= ????", sender);
            let fallback = vec![self.fallback.clone()];
            self.deliver(&msg, &fallback).await;
            return;
        };

        let args = captured_args(regex, &msg.text);
        match handler(msg.clone(), args).await {
            Ok(replies) => self.deliver(&msg, &replies).await,
            Err(err) => {
                tracing::error!("!! Error while handling \"@{} => {}\": {}", sender, msg.text, err);
                self.deliver(&msg, &error_reply(&err)).await;
            }
        }
    }

    async fn deliver(&self, msg: &Inbound, texts: &[String]) {
        if let Err(err) = self.channel.send_many(msg, texts).await {
            tracing::error!("Failed to deliver reply to {}: {}", msg.chat_id, err);
        }
    }
}

/// Capture groups of the winning pattern, group 0 excluded.
///
/// A group that did not participate in the match is passed as an empty
/// string, so the argument count always equals the pattern's group count.
fn captured_args(regex: &Regex, text: &str) -> Vec<String> {
    match regex.captures(text) {
        Some(caps) => (1..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect(),
        None => Vec::new(),
    }
}

/// Up to two reply lines for a failed handler: the handler's own message (or
/// the fixed generic line), then the underlying cause when there is one.
fn error_reply(err: &HandlerError) -> Vec<String> {
    let mut lines = vec![err
        .message
        .clone()
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())];
    if let Some(cause) = &err.cause {
        lines.push(cause.clone());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::BotError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every outbound send in order.
    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        async fn send_text(&self, _msg: &Inbound, text: &str) -> Result<(), BotError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    impl RecordingChannel {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    fn inbound(text: &str) -> Inbound {
        Inbound::new("chat-1", text).with_platform("test")
    }

    #[tokio::test]
    async fn first_registered_match_wins() {
        let channel = Arc::new(RecordingChannel::default());
        let mut registry = CommandRegistry::new();
        registry
            .register("/a", |_msg, _args| async { Ok(vec!["short".to_string()]) })
            .unwrap();
        registry
            .register("/ab", |_msg, _args| async { Ok(vec!["long".to_string()]) })
            .unwrap();

        let dispatcher = Dispatcher::new(registry, channel.clone());
        dispatcher.dispatch(inbound("/ab")).await;

        assert_eq!(channel.sent(), vec!["short".to_string()]);
    }

    #[tokio::test]
    async fn unmatched_text_gets_fallback_and_no_handler_runs() {
        let invoked = Arc::new(AtomicUsize::new(0));
        let counter = invoked.clone();

        let channel = Arc::new(RecordingChannel::default());
        let mut registry = CommandRegistry::new();
        registry
            .register("/trein", move |_msg, _args| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![])
                }
            })
            .unwrap();

        let dispatcher = Dispatcher::new(registry, channel.clone());
        dispatcher.dispatch(inbound("hallo bot")).await;

        assert_eq!(channel.sent(), vec![FALLBACK_REPLY.to_string()]);
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_fallback_sends_nothing() {
        let channel = Arc::new(RecordingChannel::default());
        let dispatcher = Dispatcher::new(CommandRegistry::new(), channel.clone()).with_fallback("");

        dispatcher.dispatch(inbound("hallo")).await;

        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn capture_groups_become_handler_arguments() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_handler = seen.clone();

        let channel = Arc::new(RecordingChannel::default());
        let mut registry = CommandRegistry::new();
        registry
            .register(r"/trein (\w*) (\w*)", move |_msg, args| {
                let seen = seen_in_handler.clone();
                async move {
                    *seen.lock().unwrap() = args;
                    Ok(vec![])
                }
            })
            .unwrap();

        let dispatcher = Dispatcher::new(registry, channel);
        dispatcher.dispatch(inbound("/trein ut asd")).await;

        assert_eq!(*seen.lock().unwrap(), vec!["ut".to_string(), "asd".to_string()]);
    }

    #[tokio::test]
    async fn zero_capture_pattern_passes_no_arguments() {
        let seen = Arc::new(Mutex::new(None));
        let seen_in_handler = seen.clone();

        let channel = Arc::new(RecordingChannel::default());
        let mut registry = CommandRegistry::new();
        registry
            .register("/ping", move |_msg, args| {
                let seen = seen_in_handler.clone();
                async move {
                    *seen.lock().unwrap() = Some(args);
                    Ok(vec!["pong".to_string()])
                }
            })
            .unwrap();

        let dispatcher = Dispatcher::new(registry, channel.clone());
        dispatcher.dispatch(inbound("/ping")).await;

        assert_eq!(seen.lock().unwrap().as_deref(), Some(&[][..]));
        assert_eq!(channel.sent(), vec!["pong".to_string()]);
    }

    #[tokio::test]
    async fn empty_reply_strings_are_dropped() {
        let channel = Arc::new(RecordingChannel::default());
        let mut registry = CommandRegistry::new();
        registry
            .register("/multi", |_msg, _args| async {
                Ok(vec!["hello".to_string(), String::new(), "world".to_string()])
            })
            .unwrap();

        let dispatcher = Dispatcher::new(registry, channel.clone());
        dispatcher.dispatch(inbound("/multi")).await;

        assert_eq!(channel.sent(), vec!["hello".to_string(), "world".to_string()]);
    }

    #[tokio::test]
    async fn handler_error_message_is_surfaced() {
        let channel = Arc::new(RecordingChannel::default());
        let mut registry = CommandRegistry::new();
        registry
            .register("/boom", |_msg, _args| async { Err(HandlerError::new("boom")) })
            .unwrap();

        let dispatcher = Dispatcher::new(registry, channel.clone());
        dispatcher.dispatch(inbound("/boom")).await;

        assert_eq!(channel.sent(), vec!["boom".to_string()]);
    }

    #[tokio::test]
    async fn handler_error_without_message_gets_generic_line() {
        let channel = Arc::new(RecordingChannel::default());
        let mut registry = CommandRegistry::new();
        registry
            .register("/boom", |_msg, _args| async { Err(HandlerError::opaque()) })
            .unwrap();

        let dispatcher = Dispatcher::new(registry, channel.clone());
        dispatcher.dispatch(inbound("/boom")).await;

        assert_eq!(channel.sent(), vec![GENERIC_FAILURE.to_string()]);
    }

    #[tokio::test]
    async fn handler_error_cause_becomes_second_line() {
        let channel = Arc::new(RecordingChannel::default());
        let mut registry = CommandRegistry::new();
        registry
            .register("/boom", |_msg, _args| async {
                Err(HandlerError::new("boom").with_cause("connection refused"))
            })
            .unwrap();

        let dispatcher = Dispatcher::new(registry, channel.clone());
        dispatcher.dispatch(inbound("/boom")).await;

        assert_eq!(
            channel.sent(),
            vec!["boom".to_string(), "connection refused".to_string()]
        );
    }

    #[tokio::test]
    async fn concurrent_dispatches_keep_their_own_reply_order() {
        let channel = Arc::new(RecordingChannel::default());
        let mut registry = CommandRegistry::new();
        registry
            .register("/slow", |_msg, _args| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(vec!["slow-1".to_string(), "slow-2".to_string()])
            })
            .unwrap();
        registry
            .register("/fast", |_msg, _args| async {
                Ok(vec!["fast-1".to_string(), "fast-2".to_string()])
            })
            .unwrap();

        let dispatcher = Dispatcher::new(registry, channel.clone());
        tokio::join!(
            dispatcher.dispatch(inbound("/slow")),
            dispatcher.dispatch(inbound("/fast"))
        );

        let sent = channel.sent();
        assert_eq!(sent.len(), 4);
        let pos = |needle: &str| sent.iter().position(|s| s == needle).unwrap();
        assert!(pos("slow-1") < pos("slow-2"));
        assert!(pos("fast-1") < pos("fast-2"));
    }
}
