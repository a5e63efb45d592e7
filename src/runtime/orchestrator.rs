//! Single-flight request orchestrator

use super::{IgnoreReason, Outcome, SessionEvent, Submission, QUICK_QUESTIONS};
use crate::chat::{ChatErrorKind, ChatRequest, ChatService};
use crate::config::{ClientConfig, ThreadMode};
use crate::conversation::{ConversationStore, Message, MessageId, StoreError, GREETING};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Per-conversation settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for one outbound request; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    pub thread_mode: ThreadMode,
    pub greeting: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for SessionConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            request_timeout: config.request_timeout,
            thread_mode: config.thread_mode,
            greeting: GREETING.to_string(),
        }
    }
}

/// Drives queries for one conversation end to end
///
/// The transcript is only mutated here. The awaiting flag is raised before
/// the outbound call and cleared only by resolving the pending message.
/// The outbound call runs on a task owned by the orchestrator, so dropping a
/// `submit_query` future never strands the pending message.
pub struct RequestOrchestrator<C: ChatService> {
    session: Arc<Session<C>>,
}

struct Session<C: ChatService> {
    conversation_id: String,
    config: SessionConfig,
    store: RwLock<ConversationStore>,
    chat: C,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    cancel: CancellationToken,
}

impl<C: ChatService + 'static> RequestOrchestrator<C> {
    pub fn new(chat: C, config: SessionConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store = ConversationStore::new(config.greeting.clone());
        Self {
            session: Arc::new(Session {
                conversation_id: uuid::Uuid::new_v4().to_string(),
                config,
                store: RwLock::new(store),
                chat,
                broadcast_tx,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.session.conversation_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.broadcast_tx.subscribe()
    }

    pub async fn snapshot(&self) -> Vec<Message> {
        self.session.store.read().await.snapshot()
    }

    pub async fn awaiting_response(&self) -> bool {
        self.session.store.read().await.awaiting_response()
    }

    /// Submit one query and wait for it to settle
    ///
    /// Never fails: remote problems become fallback text in the transcript.
    /// If the returned future is dropped early, the exchange still runs to
    /// completion in the background and resolves the pending message.
    pub async fn submit_query(&self, raw: &str) -> Submission {
        let session = &self.session;
        let query = raw.trim();
        if query.is_empty() {
            tracing::debug!(conv_id = %session.conversation_id, "Ignoring empty query");
            return Submission::Ignored(IgnoreReason::Empty);
        }
        if session.cancel.is_cancelled() {
            return Submission::Ignored(IgnoreReason::Discarded);
        }

        let pending_id = {
            let mut store = session.store.write().await;
            let (user_msg, pending_msg) = match begin_exchange(&mut store, raw) {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::debug!(
                        conv_id = %session.conversation_id,
                        error = %e,
                        "Submission ignored"
                    );
                    return Submission::Ignored(match e {
                        StoreError::InvalidInput => IgnoreReason::Empty,
                        StoreError::AlreadyPending | StoreError::NotPending(_) => {
                            IgnoreReason::AwaitingResponse
                        }
                    });
                }
            };
            let pending_id = pending_msg.id;

            // Sent under the guard so observers see events in transcript order
            session.notify(SessionEvent::MessageAppended { message: user_msg });
            session.notify(SessionEvent::MessageAppended {
                message: pending_msg,
            });
            session.notify(SessionEvent::AwaitingChanged { awaiting: true });
            pending_id
        };

        tracing::info!(
            conv_id = %session.conversation_id,
            message_id = %pending_id,
            endpoint = %session.chat.endpoint(),
            "Submitting query"
        );

        // No await between begin_exchange and the spawn
        let request = session.build_request(query);
        let task = tokio::spawn(Arc::clone(session).run_exchange(pending_id, request));

        match task.await {
            Ok(submission) => submission,
            Err(e) => {
                tracing::error!(
                    conv_id = %session.conversation_id,
                    message_id = %pending_id,
                    error = %e,
                    "Exchange task failed"
                );
                session
                    .resolve(pending_id, Outcome::Unreachable(ChatErrorKind::Network))
                    .await
            }
        }
    }

    /// Submit entry `index` of the quick-question list
    pub async fn submit_quick_question(&self, index: usize) -> Option<Submission> {
        let question = QUICK_QUESTIONS.get(index)?;
        Some(self.submit_query(question).await)
    }

    /// Stop accepting submissions and abandon any request in flight
    pub fn discard(&self) {
        tracing::debug!(conv_id = %self.session.conversation_id, "Discarding conversation");
        self.session.cancel.cancel();
    }

    pub fn is_discarded(&self) -> bool {
        self.session.cancel.is_cancelled()
    }
}

impl<C: ChatService> Session<C> {
    fn build_request(&self, query: &str) -> ChatRequest {
        let request = ChatRequest::new(query);
        match self.config.thread_mode {
            ThreadMode::Stateless => request,
            ThreadMode::PerConversation => request.with_thread(self.conversation_id.clone()),
        }
    }

    async fn run_exchange(
        self: Arc<Self>,
        pending_id: MessageId,
        request: ChatRequest,
    ) -> Submission {
        let outcome = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                tracing::info!(
                    conv_id = %self.conversation_id,
                    message_id = %pending_id,
                    "Conversation discarded, abandoning request"
                );
                return Submission::Abandoned { message_id: pending_id };
            }
            outcome = self.exchange(&request) => outcome,
        };

        self.resolve(pending_id, outcome).await
    }

    /// The single outbound call, bounded by the configured deadline
    async fn exchange(&self, request: &ChatRequest) -> Outcome {
        let call = self.chat.send(request);
        match self.config.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => Outcome::from_result(result),
                Err(_) => {
                    tracing::warn!(
                        conv_id = %self.conversation_id,
                        timeout_ms = %limit.as_millis(),
                        "Chat request exceeded deadline"
                    );
                    Outcome::TimedOut
                }
            },
            None => Outcome::from_result(call.await),
        }
    }

    async fn resolve(&self, pending_id: MessageId, outcome: Outcome) -> Submission {
        {
            let mut store = self.store.write().await;
            match store.resolve_pending_message(pending_id, outcome.text()) {
                Ok(()) => {
                    if let Some(message) = store.get(pending_id).cloned() {
                        self.notify(SessionEvent::MessageResolved { message });
                    }
                    self.notify(SessionEvent::AwaitingChanged { awaiting: false });
                }
                Err(e) => {
                    tracing::error!(
                        conv_id = %self.conversation_id,
                        message_id = %pending_id,
                        error = %e,
                        "Failed to resolve pending message"
                    );
                }
            }
        }

        tracing::info!(
            conv_id = %self.conversation_id,
            message_id = %pending_id,
            replied = outcome.is_reply(),
            "Query settled"
        );

        Submission::Resolved {
            message_id: pending_id,
            outcome,
        }
    }

    fn notify(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.broadcast_tx.send(event);
    }
}

/// Record the user message and the pending placeholder under one lock
fn begin_exchange(
    store: &mut ConversationStore,
    text: &str,
) -> Result<(Message, Message), StoreError> {
    if store.awaiting_response() {
        return Err(StoreError::AlreadyPending);
    }
    let user_id = store.append_user_message(text)?;
    let pending_id = store.append_pending_assistant_message()?;

    let user_msg = store.get(user_id).cloned();
    let pending_msg = store.get(pending_id).cloned();
    user_msg.zip(pending_msg).ok_or(StoreError::NotPending(pending_id))
}
