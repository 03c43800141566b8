//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns conversation
//! state, the input draft, and the submission lifecycle, and handles
//! streaming endpoint interactions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::Stream;
use futures::{StreamExt, pin_mut};

use crate::chat::config::ChatConfig;
use crate::error::{Error, Result};
use crate::observability;
use crate::render::Renderer;
use crate::types::{Message, MessageRole, SessionStatus, StreamEvent};
use crate::{ChatEndpoint, transcript_to_string};

/// How a turn's reply consumption ended.
enum TurnOutcome {
    /// The reply finished (terminal part or end of stream).
    Completed,

    /// The user interrupted mid-reply.
    Interrupted,

    /// The transport failed.
    Failed(Error),
}

/// A chat session that owns conversation state and endpoint interactions.
///
/// The session holds the ordered message history, the current input draft,
/// and the submission status. State mutates only between awaited stream
/// events on the session's task; there is at most one request in flight.
pub struct ChatSession {
    client: ChatEndpoint,
    config: ChatConfig,
    messages: Vec<Message>,
    draft: String,
    status: SessionStatus,
    request_count: u64,
    rollback_count: u64,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The endpoint the session talks to.
    pub endpoint_url: String,
    /// The number of messages in the conversation.
    pub message_count: usize,
    /// The current submission status.
    pub status: SessionStatus,
    /// Total number of requests made.
    pub total_requests: u64,
    /// Number of turns rolled back after a failure.
    pub total_rollbacks: u64,
    /// Whether failed submissions retain the optimistic message.
    pub keep_last_message_on_error: bool,
    /// Whether replies are consumed as streams.
    pub streaming: bool,
}

impl ChatSession {
    /// Creates a new chat session with the given client and configuration.
    pub fn new(client: ChatEndpoint, config: ChatConfig) -> Self {
        Self {
            client,
            config,
            messages: Vec::new(),
            draft: String::new(),
            status: SessionStatus::Idle,
            request_count: 0,
            rollback_count: 0,
        }
    }

    /// Replaces the input draft. No side effects, no network activity.
    pub fn update_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    /// Returns the current input draft.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Returns the current submission status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns the ordered conversation history.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Clears the conversation history.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Submits the current draft and consumes the reply.
    ///
    /// Appends an optimistic user message with a fresh id, clears the draft,
    /// and sends the full history to the endpoint. Streamed deltas are
    /// rendered as they arrive and accumulate into exactly one assistant
    /// message.
    ///
    /// An empty or whitespace-only draft is rejected without mutating any
    /// state. On transport failure the session transitions to errored and
    /// the optimistic turn is kept or rolled back per configuration.
    pub async fn submit(
        &mut self,
        renderer: &mut dyn Renderer,
        interrupted: Arc<AtomicBool>,
    ) -> Result<()> {
        let draft = self.draft.trim();
        if draft.is_empty() {
            return Err(Error::validation(
                "cannot submit an empty draft",
                Some("draft".to_string()),
            ));
        }

        let rollback_len = self.messages.len();
        let user_message = Message::user(draft);
        self.draft.clear();
        self.messages.push(user_message);
        self.status = SessionStatus::AwaitingReply;
        observability::SESSION_SUBMITS.click();

        self.run_turn(rollback_len, renderer, interrupted).await
    }

    /// Resubmits the existing history without appending a new user message.
    ///
    /// This is the retry path after a failed turn: with the optimistic
    /// message retained, one more request completes the exchange without
    /// re-typing. A trailing assistant message, such as a partial reply
    /// kept from the failed turn, is dropped so the reply is regenerated
    /// from the last user message.
    pub async fn resubmit(
        &mut self,
        renderer: &mut dyn Renderer,
        interrupted: Arc<AtomicBool>,
    ) -> Result<()> {
        let rollback_len = self.prepare_resubmit()?;
        self.status = SessionStatus::AwaitingReply;
        observability::SESSION_SUBMITS.click();

        self.run_turn(rollback_len, renderer, interrupted).await
    }

    /// Trims the history for a resubmission and returns the rollback length.
    ///
    /// The history must end with a user message once any trailing assistant
    /// message is removed; otherwise nothing mutates. The user message
    /// predates the retried turn, so a rollback must not remove it.
    fn prepare_resubmit(&mut self) -> Result<usize> {
        let trailing_reply = self.messages.last().map(|m| m.role) == Some(MessageRole::Assistant);
        let resend_len = self.messages.len() - usize::from(trailing_reply);
        if resend_len == 0 || self.messages[resend_len - 1].role != MessageRole::User {
            return Err(Error::validation(
                "nothing to resubmit: the conversation has no trailing user message",
                None,
            ));
        }
        self.messages.truncate(resend_len);
        Ok(resend_len)
    }

    async fn run_turn(
        &mut self,
        rollback_len: usize,
        renderer: &mut dyn Renderer,
        interrupted: Arc<AtomicBool>,
    ) -> Result<()> {
        self.request_count += 1;
        let (reply, outcome) = if self.config.streaming {
            self.stream_reply(renderer, interrupted).await
        } else {
            self.buffered_reply(renderer, interrupted).await
        };
        self.settle_turn(rollback_len, reply, outcome, renderer)
    }

    async fn stream_reply(
        &self,
        renderer: &mut dyn Renderer,
        interrupted: Arc<AtomicBool>,
    ) -> (Message, TurnOutcome) {
        renderer.begin_reply();
        let mut reply = Message::assistant("");
        let stream = match self.client.stream(&self.messages).await {
            Ok(stream) => stream,
            Err(err) => return (reply, TurnOutcome::Failed(err)),
        };
        let outcome = Self::consume_events(stream, &mut reply, renderer, &interrupted).await;
        (reply, outcome)
    }

    /// Applies decoded events to the in-progress reply until a terminal
    /// signal, a failure, or an interruption.
    ///
    /// Dropping the stream on early return abandons the in-flight request;
    /// no further updates reach the reply after that.
    async fn consume_events<S>(
        stream: S,
        reply: &mut Message,
        renderer: &mut dyn Renderer,
        interrupted: &AtomicBool,
    ) -> TurnOutcome
    where
        S: Stream<Item = Result<StreamEvent>>,
    {
        pin_mut!(stream);
        while let Some(event) = stream.next().await {
            if interrupted.load(Ordering::Relaxed) {
                return TurnOutcome::Interrupted;
            }
            match event {
                Ok(StreamEvent::TextDelta(text)) => {
                    renderer.print_text(&text);
                    reply.push_delta(&text);
                }
                // Data parts are observed by the client logger, not the session
                Ok(StreamEvent::Data(_)) => {}
                Ok(StreamEvent::Error(message)) => {
                    return TurnOutcome::Failed(Error::streaming(message, None));
                }
                Ok(StreamEvent::Finish) => return TurnOutcome::Completed,
                Err(err) => return TurnOutcome::Failed(err),
            }
        }
        // The endpoint may close the body without an explicit finish part
        TurnOutcome::Completed
    }

    async fn buffered_reply(
        &self,
        renderer: &mut dyn Renderer,
        interrupted: Arc<AtomicBool>,
    ) -> (Message, TurnOutcome) {
        renderer.begin_reply();
        match self.client.send(&self.messages).await {
            Ok(content) => {
                if interrupted.load(Ordering::Relaxed) {
                    return (Message::assistant(""), TurnOutcome::Interrupted);
                }
                renderer.print_text(&content);
                (Message::assistant(content), TurnOutcome::Completed)
            }
            Err(err) => (Message::assistant(""), TurnOutcome::Failed(err)),
        }
    }

    /// Applies a finished turn to session state.
    ///
    /// The rollback decision is applied atomically: either the whole turn
    /// stays (with any partial reply finalized as-is) or the history is
    /// truncated back to `rollback_len`.
    fn settle_turn(
        &mut self,
        rollback_len: usize,
        reply: Message,
        outcome: TurnOutcome,
        renderer: &mut dyn Renderer,
    ) -> Result<()> {
        match outcome {
            TurnOutcome::Completed => {
                self.messages.push(reply);
                self.status = SessionStatus::Idle;
                observability::SESSION_REPLIES.click();
                renderer.finish_response();
                Ok(())
            }
            TurnOutcome::Interrupted => {
                // A partial reply is never finalized
                self.status = SessionStatus::Idle;
                observability::SESSION_INTERRUPTS.click();
                renderer.print_interrupted();
                Ok(())
            }
            TurnOutcome::Failed(err) => {
                self.status = SessionStatus::Errored;
                if self.config.keep_last_message_on_error {
                    if !reply.content.is_empty() {
                        self.messages.push(reply);
                    }
                } else {
                    self.messages.truncate(rollback_len);
                    self.rollback_count += 1;
                    observability::SESSION_ROLLBACKS.click();
                }
                Err(err)
            }
        }
    }

    /// Renders the conversation as a formatted transcript.
    pub fn transcript(&self) -> String {
        transcript_to_string(&self.messages, self.config.use_color)
    }

    /// Changes the chat endpoint, rebuilding the client.
    pub fn set_endpoint(&mut self, url: String) -> Result<()> {
        self.client =
            ChatEndpoint::with_options(Some(url.clone()), Some(self.config.request_timeout))?;
        self.config.endpoint_url = Some(url);
        Ok(())
    }

    /// Sets whether failed submissions retain the optimistic message.
    pub fn set_keep_last_message_on_error(&mut self, keep: bool) {
        self.config.keep_last_message_on_error = keep;
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            endpoint_url: self.client.url().to_string(),
            message_count: self.message_count(),
            status: self.status,
            total_requests: self.request_count,
            total_rollbacks: self.rollback_count,
            keep_last_message_on_error: self.config.keep_last_message_on_error,
            streaming: self.config.streaming,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BufferedRenderer;
    use futures::stream;

    fn session() -> ChatSession {
        let client = ChatEndpoint::new(Some("http://localhost:8000/chat".to_string())).unwrap();
        ChatSession::new(client, ChatConfig::default())
    }

    fn session_with(config: ChatConfig) -> ChatSession {
        let client = ChatEndpoint::new(Some("http://localhost:8000/chat".to_string())).unwrap();
        ChatSession::new(client, config)
    }

    #[test]
    fn new_session_empty_and_idle() {
        let session = session();
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.draft(), "");
    }

    #[test]
    fn update_draft_has_no_other_effect() {
        let mut session = session();
        session.update_draft("Hel");
        session.update_draft("Hello");
        assert_eq!(session.draft(), "Hello");
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn empty_draft_submit_mutates_nothing() {
        let mut session = session();
        let mut renderer = BufferedRenderer::new();
        let interrupted = Arc::new(AtomicBool::new(false));

        let err = session
            .submit(&mut renderer, interrupted.clone())
            .await
            .unwrap_err();
        assert!(err.is_validation());

        session.update_draft("   ");
        let err = session.submit(&mut renderer, interrupted).await.unwrap_err();
        assert!(err.is_validation());

        assert_eq!(session.message_count(), 0);
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.draft(), "   ");
    }

    #[tokio::test]
    async fn deltas_accumulate_into_one_message() {
        let mut reply = Message::assistant("");
        let id = reply.id.clone();
        let mut renderer = BufferedRenderer::new();
        let interrupted = AtomicBool::new(false);

        let events = stream::iter(vec![
            Ok(StreamEvent::TextDelta("Hi ".to_string())),
            Ok(StreamEvent::TextDelta("there".to_string())),
            Ok(StreamEvent::Finish),
        ]);
        let outcome =
            ChatSession::consume_events(events, &mut reply, &mut renderer, &interrupted).await;

        assert!(matches!(outcome, TurnOutcome::Completed));
        assert_eq!(reply.content, "Hi there");
        assert_eq!(reply.id, id);
        assert_eq!(renderer.text, "Hi there");
    }

    #[tokio::test]
    async fn end_of_stream_is_terminal() {
        let mut reply = Message::assistant("");
        let mut renderer = BufferedRenderer::new();
        let interrupted = AtomicBool::new(false);

        let events = stream::iter(vec![Ok(StreamEvent::TextDelta("done".to_string()))]);
        let outcome =
            ChatSession::consume_events(events, &mut reply, &mut renderer, &interrupted).await;

        assert!(matches!(outcome, TurnOutcome::Completed));
        assert_eq!(reply.content, "done");
    }

    #[tokio::test]
    async fn error_part_fails_the_turn() {
        let mut reply = Message::assistant("");
        let mut renderer = BufferedRenderer::new();
        let interrupted = AtomicBool::new(false);

        let events = stream::iter(vec![
            Ok(StreamEvent::TextDelta("par".to_string())),
            Ok(StreamEvent::Error("workflow failed".to_string())),
            Ok(StreamEvent::TextDelta("never applied".to_string())),
        ]);
        let outcome =
            ChatSession::consume_events(events, &mut reply, &mut renderer, &interrupted).await;

        assert!(matches!(outcome, TurnOutcome::Failed(_)));
        assert_eq!(reply.content, "par");
    }

    #[tokio::test]
    async fn interrupt_stops_consumption() {
        let mut reply = Message::assistant("");
        let mut renderer = BufferedRenderer::new();
        let interrupted = AtomicBool::new(false);

        interrupted.store(true, Ordering::Relaxed);
        let events = stream::iter(vec![
            Ok(StreamEvent::TextDelta("never applied".to_string())),
            Ok(StreamEvent::Finish),
        ]);
        let outcome =
            ChatSession::consume_events(events, &mut reply, &mut renderer, &interrupted).await;

        assert!(matches!(outcome, TurnOutcome::Interrupted));
        assert_eq!(reply.content, "");
    }

    #[test]
    fn settle_completed_appends_and_idles() {
        let mut session = session();
        session.messages.push(Message::user("Hello"));
        session.status = SessionStatus::AwaitingReply;
        let mut renderer = BufferedRenderer::new();

        session
            .settle_turn(
                0,
                Message::assistant("Hi there"),
                TurnOutcome::Completed,
                &mut renderer,
            )
            .unwrap();

        assert_eq!(session.message_count(), 2);
        assert_eq!(session.messages()[0].role, MessageRole::User);
        assert_eq!(session.messages()[0].content, "Hello");
        assert_eq!(session.messages()[1].role, MessageRole::Assistant);
        assert_eq!(session.messages()[1].content, "Hi there");
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn settle_failure_keeps_turn_by_default() {
        let mut session = session();
        session.messages.push(Message::user("Hello"));
        session.status = SessionStatus::AwaitingReply;
        let mut renderer = BufferedRenderer::new();

        let err = session
            .settle_turn(
                0,
                Message::assistant(""),
                TurnOutcome::Failed(Error::connection("refused", None)),
                &mut renderer,
            )
            .unwrap_err();

        assert!(err.is_connection());
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.messages()[0].content, "Hello");
        assert_eq!(session.status(), SessionStatus::Errored);
    }

    #[test]
    fn settle_failure_finalizes_partial_reply_when_keeping() {
        let mut session = session();
        session.messages.push(Message::user("Hello"));
        session.status = SessionStatus::AwaitingReply;
        let mut renderer = BufferedRenderer::new();

        let result = session.settle_turn(
            0,
            Message::assistant("Hi th"),
            TurnOutcome::Failed(Error::streaming("cut off", None)),
            &mut renderer,
        );

        assert!(result.is_err());
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.messages()[1].content, "Hi th");
        assert_eq!(session.status(), SessionStatus::Errored);
    }

    #[test]
    fn settle_failure_rolls_back_when_configured() {
        let mut session =
            session_with(ChatConfig::default().with_keep_last_message_on_error(false));
        session.messages.push(Message::user("kept"));
        session.messages.push(Message::user("Hello"));
        session.status = SessionStatus::AwaitingReply;
        let mut renderer = BufferedRenderer::new();

        let result = session.settle_turn(
            1,
            Message::assistant("part"),
            TurnOutcome::Failed(Error::connection("refused", None)),
            &mut renderer,
        );

        assert!(result.is_err());
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.messages()[0].content, "kept");
        assert_eq!(session.status(), SessionStatus::Errored);
        assert_eq!(session.stats().total_rollbacks, 1);
    }

    #[test]
    fn settle_interrupt_discards_partial_reply() {
        let mut session = session();
        session.messages.push(Message::user("Hello"));
        session.status = SessionStatus::AwaitingReply;
        let mut renderer = BufferedRenderer::new();

        session
            .settle_turn(
                0,
                Message::assistant("par"),
                TurnOutcome::Interrupted,
                &mut renderer,
            )
            .unwrap();

        assert_eq!(session.message_count(), 1);
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(renderer.interrupted);
    }

    #[tokio::test]
    async fn resubmit_requires_a_user_turn() {
        let mut session = session();
        let mut renderer = BufferedRenderer::new();
        let interrupted = Arc::new(AtomicBool::new(false));

        let err = session
            .resubmit(&mut renderer, interrupted.clone())
            .await
            .unwrap_err();
        assert!(err.is_validation());

        session.messages.push(Message::assistant("unprompted"));
        let err = session.resubmit(&mut renderer, interrupted).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn retry_after_kept_partial_reply_resends_user_turn() {
        let mut session = session();
        session.messages.push(Message::user("Hello"));
        session.status = SessionStatus::AwaitingReply;
        let mut renderer = BufferedRenderer::new();

        // A mid-stream failure with the default config finalizes the partial
        let result = session.settle_turn(
            0,
            Message::assistant("Hi th"),
            TurnOutcome::Failed(Error::streaming("cut off", None)),
            &mut renderer,
        );
        assert!(result.is_err());
        assert_eq!(session.message_count(), 2);

        let rollback_len = session.prepare_resubmit().unwrap();
        assert_eq!(rollback_len, 1);
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.messages()[0].role, MessageRole::User);
        assert_eq!(session.messages()[0].content, "Hello");
    }

    #[test]
    fn resubmit_regenerates_a_completed_reply() {
        let mut session = session();
        session.messages.push(Message::user("Hello"));
        session.messages.push(Message::assistant("Hi there"));

        let rollback_len = session.prepare_resubmit().unwrap();
        assert_eq!(rollback_len, 1);
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.messages()[0].content, "Hello");
    }

    #[test]
    fn clear_session() {
        let mut session = session();
        session.messages.push(Message::user("test"));
        assert_eq!(session.message_count(), 1);

        session.clear();
        assert_eq!(session.message_count(), 0);
    }

    #[test]
    fn set_endpoint_rebuilds_client() {
        let mut session = session();
        session
            .set_endpoint("http://localhost:9000/chat".to_string())
            .unwrap();
        assert_eq!(session.stats().endpoint_url, "http://localhost:9000/chat");
        assert!(session.set_endpoint("not a url".to_string()).is_err());
    }
}
