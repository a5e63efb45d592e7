//! Mock implementations for testing
//!
//! These mocks drive the orchestrator without a real assistant service.

use crate::chat::{ChatError, ChatReply, ChatRequest, ChatService, HealthStatus};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Chat Client
// ============================================================================

/// Mock chat client that returns queued replies
pub struct MockChatClient {
    replies: Mutex<VecDeque<Result<ChatReply, ChatError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(ChatReply::new(text)));
    }

    /// Queue an error
    pub fn queue_error(&self, error: ChatError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::network("No mock reply queued")))
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        self.next_reply(request)
    }

    async fn health(&self) -> Result<HealthStatus, ChatError> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
            service: Some("mock".to_string()),
        })
    }

    fn endpoint(&self) -> &str {
        "mock://assistant"
    }
}

// ============================================================================
// Delayed Mock Chat Client (for in-flight testing)
// ============================================================================

/// Mock chat client that holds every request for a fixed delay
pub struct DelayedMockChatClient {
    inner: MockChatClient,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockChatClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockChatClient::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, text: &str) {
        self.inner.queue_reply(text);
    }

    pub fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl ChatService for DelayedMockChatClient {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        // Record before sleeping so in-flight assertions see the request
        self.inner.requests.lock().unwrap().push(request.clone());
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::network("No mock reply queued")))
    }

    async fn health(&self) -> Result<HealthStatus, ChatError> {
        self.inner.health().await
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThreadMode;
    use crate::conversation::{MessageStatus, Role, GREETING};
    use crate::runtime::{
        IgnoreReason, Outcome, RequestOrchestrator, SessionConfig, SessionEvent, Submission,
        CONNECTIVITY_FALLBACK, PROCESSING_FALLBACK, QUICK_QUESTIONS, TIMEOUT_FALLBACK,
    };

    fn config() -> SessionConfig {
        SessionConfig {
            request_timeout: Some(Duration::from_secs(5)),
            ..SessionConfig::default()
        }
    }

    fn orchestrator(mock: &Arc<MockChatClient>) -> RequestOrchestrator<Arc<MockChatClient>> {
        RequestOrchestrator::new(mock.clone(), config())
    }

    fn delayed(
        delay: Duration,
        config: SessionConfig,
    ) -> (
        Arc<DelayedMockChatClient>,
        Arc<RequestOrchestrator<Arc<DelayedMockChatClient>>>,
    ) {
        let mock = Arc::new(DelayedMockChatClient::new(delay));
        let orch = Arc::new(RequestOrchestrator::new(mock.clone(), config));
        (mock, orch)
    }

    #[tokio::test]
    async fn test_mock_chat_client() {
        let mock = MockChatClient::new();
        mock.queue_reply("Hello");

        let reply = mock.send(&ChatRequest::new("hi")).await.unwrap();
        assert_eq!(reply.text, "Hello");

        // Second call should fail (no more replies)
        assert!(mock.send(&ChatRequest::new("hi")).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_fresh_conversation_has_greeting() {
        let mock = Arc::new(MockChatClient::new());
        let orch = orchestrator(&mock);

        let msgs = orch.snapshot().await;
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, Role::Assistant);
        assert_eq!(msgs[0].text, GREETING);
        assert!(!orch.awaiting_response().await);
    }

    /// Pending placeholder is visible while the request is in flight
    #[tokio::test]
    async fn test_pending_then_reply() {
        let (mock, orch) = delayed(Duration::from_millis(200), config());
        mock.queue_reply("hi there");

        let task = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.submit_query("hello").await })
        };
        mock.request_started.notified().await;

        let msgs = orch.snapshot().await;
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1].role, Role::User);
        assert_eq!(msgs[1].text, "hello");
        assert_eq!(msgs[2].role, Role::Assistant);
        assert_eq!(msgs[2].status, MessageStatus::Pending);
        assert!(msgs[2].text.is_empty());
        assert!(orch.awaiting_response().await);

        let submission = task.await.unwrap();
        assert_eq!(
            submission,
            Submission::Resolved {
                message_id: msgs[2].id,
                outcome: Outcome::Replied("hi there".to_string()),
            }
        );

        let msgs = orch.snapshot().await;
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[2].text, "hi there");
        assert_eq!(msgs[2].status, MessageStatus::Final);
        assert!(!orch.awaiting_response().await);
    }

    /// A second submission while one is outstanding is a no-op
    #[tokio::test]
    async fn test_single_flight() {
        let (mock, orch) = delayed(Duration::from_millis(200), config());
        mock.queue_reply("first reply");
        mock.queue_reply("never used");

        let task = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.submit_query("hello").await })
        };
        mock.request_started.notified().await;

        let before = orch.snapshot().await;
        let second = orch.submit_query("ping").await;
        assert_eq!(second, Submission::Ignored(IgnoreReason::AwaitingResponse));
        assert_eq!(orch.snapshot().await, before);

        task.await.unwrap();
        assert_eq!(mock.recorded_requests().len(), 1);
        assert_eq!(mock.recorded_requests()[0].query, "hello");
    }

    /// Concurrent submissions race for the lock; exactly one wins
    #[tokio::test]
    async fn test_concurrent_submissions_issue_one_request() {
        let (mock, orch) = delayed(Duration::from_millis(50), config());
        mock.queue_reply("only reply");

        let (a, b) = futures::join!(orch.submit_query("one"), orch.submit_query("two"));

        let ignored = [&a, &b].iter().filter(|s| s.is_ignored()).count();
        assert_eq!(ignored, 1);
        assert_eq!(mock.recorded_requests().len(), 1);
        assert_eq!(orch.snapshot().await.len(), 3);
    }

    #[tokio::test]
    async fn test_blank_queries_never_mutate() {
        let mock = Arc::new(MockChatClient::new());
        let orch = orchestrator(&mock);

        for raw in ["", "   ", "\n\t "] {
            assert_eq!(
                orch.submit_query(raw).await,
                Submission::Ignored(IgnoreReason::Empty)
            );
        }
        assert_eq!(orch.snapshot().await.len(), 1);
        assert!(mock.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_query_is_trimmed_for_request() {
        let mock = Arc::new(MockChatClient::new());
        mock.queue_reply("ok");
        let orch = orchestrator(&mock);

        orch.submit_query("  hello  ").await;

        let requests = mock.recorded_requests();
        assert_eq!(requests[0].query, "hello");
        assert_eq!(requests[0].thread_id, None);
    }

    #[tokio::test]
    async fn test_connection_refused_uses_connectivity_fallback() {
        let mock = Arc::new(MockChatClient::new());
        mock.queue_error(ChatError::network("Connection refused"));
        let orch = orchestrator(&mock);

        let submission = orch.submit_query("hello").await;
        assert!(matches!(
            submission,
            Submission::Resolved {
                outcome: Outcome::Unreachable(_),
                ..
            }
        ));

        let msgs = orch.snapshot().await;
        assert_eq!(msgs[2].text, CONNECTIVITY_FALLBACK);
        assert_eq!(msgs[2].status, MessageStatus::Final);
        assert!(!orch.awaiting_response().await);
    }

    #[tokio::test]
    async fn test_missing_reply_uses_processing_fallback() {
        let mock = Arc::new(MockChatClient::new());
        mock.queue_error(ChatError::missing_reply("No reply in response: {}"));
        let orch = orchestrator(&mock);

        orch.submit_query("hello").await;

        let msgs = orch.snapshot().await;
        assert_eq!(msgs[2].text, PROCESSING_FALLBACK);
        assert!(!orch.awaiting_response().await);
    }

    #[tokio::test]
    async fn test_empty_reply_uses_processing_fallback() {
        let mock = Arc::new(MockChatClient::new());
        mock.queue_reply("");
        let orch = orchestrator(&mock);

        let submission = orch.submit_query("hello").await;
        assert!(matches!(
            submission,
            Submission::Resolved {
                outcome: Outcome::MissingReply,
                ..
            }
        ));

        let msgs = orch.snapshot().await;
        assert_eq!(msgs[2].text, PROCESSING_FALLBACK);
        assert_eq!(msgs[2].status, MessageStatus::Final);
        assert!(!orch.awaiting_response().await);
    }

    /// A caller that stops waiting does not leave the conversation stuck
    #[tokio::test]
    async fn test_dropped_submission_still_settles() {
        let (mock, orch) = delayed(Duration::from_millis(200), config());
        mock.queue_reply("first reply");
        mock.queue_reply("second reply");
        let mut rx = orch.subscribe();

        let dropped =
            tokio::time::timeout(Duration::from_millis(20), orch.submit_query("hello")).await;
        assert!(dropped.is_err());
        assert!(orch.awaiting_response().await);

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let SessionEvent::AwaitingChanged { awaiting: false } = rx.recv().await.unwrap()
                {
                    break;
                }
            }
        })
        .await
        .expect("abandoned exchange never settled");

        let msgs = orch.snapshot().await;
        assert_eq!(msgs[2].text, "first reply");
        assert_eq!(msgs[2].status, MessageStatus::Final);
        assert!(!orch.awaiting_response().await);

        let second = orch.submit_query("again").await;
        assert!(matches!(
            second,
            Submission::Resolved {
                outcome: Outcome::Replied(ref text),
                ..
            } if text == "second reply"
        ));
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_deadline_releases_flag() {
        let (mock, orch) = delayed(
            Duration::from_secs(30),
            SessionConfig {
                request_timeout: Some(Duration::from_millis(50)),
                ..SessionConfig::default()
            },
        );
        mock.queue_reply("too late");

        let submission = orch.submit_query("hello").await;
        assert!(matches!(
            submission,
            Submission::Resolved {
                outcome: Outcome::TimedOut,
                ..
            }
        ));

        let msgs = orch.snapshot().await;
        assert_eq!(msgs[2].text, TIMEOUT_FALLBACK);
        assert!(!orch.awaiting_response().await);
    }

    #[tokio::test]
    async fn test_no_retry_after_failure() {
        let mock = Arc::new(MockChatClient::new());
        mock.queue_error(ChatError::status(502, "Bad gateway"));
        mock.queue_reply("second");
        let orch = orchestrator(&mock);

        orch.submit_query("hello").await;
        assert_eq!(mock.recorded_requests().len(), 1);

        // Manual resubmission is accepted
        orch.submit_query("hello").await;
        assert_eq!(mock.recorded_requests().len(), 2);
        assert_eq!(orch.snapshot().await[4].text, "second");
    }

    #[tokio::test]
    async fn test_transcript_alternates_in_order() {
        let mock = Arc::new(MockChatClient::new());
        let orch = orchestrator(&mock);

        for i in 0..4 {
            mock.queue_reply(&format!("answer {i}"));
            orch.submit_query(&format!("question {i}")).await;
        }

        let msgs = orch.snapshot().await;
        assert_eq!(msgs.len(), 9);
        assert_eq!(msgs[0].text, GREETING);
        for (i, pair) in msgs[1..].chunks(2).enumerate() {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[0].text, format!("question {i}"));
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[1].text, format!("answer {i}"));
            assert_eq!(pair[1].status, MessageStatus::Final);
        }
    }

    #[tokio::test]
    async fn test_discard_abandons_in_flight_request() {
        let (mock, orch) = delayed(Duration::from_secs(30), config());
        mock.queue_reply("never delivered");

        let task = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.submit_query("hello").await })
        };
        mock.request_started.notified().await;

        orch.discard();
        let submission = task.await.unwrap();
        let msgs = orch.snapshot().await;
        assert_eq!(
            submission,
            Submission::Abandoned {
                message_id: msgs[2].id
            }
        );
        assert_eq!(msgs[2].status, MessageStatus::Pending);

        assert_eq!(
            orch.submit_query("again").await,
            Submission::Ignored(IgnoreReason::Discarded)
        );
        assert!(orch.is_discarded());
    }

    #[tokio::test]
    async fn test_per_conversation_thread_id() {
        let mock = Arc::new(MockChatClient::new());
        mock.queue_reply("ok");
        let orch = RequestOrchestrator::new(
            mock.clone(),
            SessionConfig {
                thread_mode: ThreadMode::PerConversation,
                ..config()
            },
        );

        orch.submit_query("hello").await;

        let requests = mock.recorded_requests();
        assert_eq!(
            requests[0].thread_id.as_deref(),
            Some(orch.conversation_id())
        );
    }

    #[tokio::test]
    async fn test_quick_question_uses_submit_path() {
        let mock = Arc::new(MockChatClient::new());
        mock.queue_reply("26 cameras");
        let orch = orchestrator(&mock);

        let submission = orch.submit_quick_question(1).await;
        assert!(matches!(submission, Some(Submission::Resolved { .. })));
        assert_eq!(mock.recorded_requests()[0].query, QUICK_QUESTIONS[1]);
        assert_eq!(orch.snapshot().await[1].text, QUICK_QUESTIONS[1]);

        assert!(orch.submit_quick_question(QUICK_QUESTIONS.len()).await.is_none());
    }

    #[tokio::test]
    async fn test_events_broadcast_in_order() {
        let mock = Arc::new(MockChatClient::new());
        mock.queue_reply("hi there");
        let orch = orchestrator(&mock);
        let mut rx = orch.subscribe();

        orch.submit_query("hello").await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 5);
        assert!(matches!(
            &events[0],
            SessionEvent::MessageAppended { message } if message.role == Role::User
        ));
        assert!(matches!(
            &events[1],
            SessionEvent::MessageAppended { message } if message.status == MessageStatus::Pending
        ));
        assert_eq!(events[2], SessionEvent::AwaitingChanged { awaiting: true });
        assert!(matches!(
            &events[3],
            SessionEvent::MessageResolved { message } if message.text == "hi there"
        ));
        assert_eq!(events[4], SessionEvent::AwaitingChanged { awaiting: false });
    }

    /// Racing submitters on a multi-thread runtime still produce a coherent
    /// event stream: awaiting flips strictly true/false, one resolution each
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_events_stay_ordered_across_threads() {
        let mock = Arc::new(MockChatClient::new());
        for i in 0..9 {
            mock.queue_reply(&format!("answer {i}"));
        }
        let orch = Arc::new(orchestrator(&mock));
        let mut rx = orch.subscribe();

        let tasks: Vec<_> = (0..3)
            .map(|t| {
                let orch = orch.clone();
                tokio::spawn(async move {
                    for i in 0..3 {
                        orch.submit_query(&format!("task {t} question {i}")).await;
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(!events.is_empty());

        let mut awaiting = false;
        let mut resolved_in_flight = 0;
        for event in &events {
            match event {
                SessionEvent::AwaitingChanged { awaiting: next } => {
                    assert_ne!(*next, awaiting, "awaiting flag repeated: {events:?}");
                    if !next {
                        assert_eq!(resolved_in_flight, 1);
                        resolved_in_flight = 0;
                    }
                    awaiting = *next;
                }
                SessionEvent::MessageResolved { .. } => {
                    assert!(awaiting, "resolution outside a request: {events:?}");
                    resolved_in_flight += 1;
                }
                SessionEvent::MessageAppended { .. } => {
                    assert!(!awaiting, "append while a request was in flight");
                }
            }
        }
        assert!(!awaiting);
        assert!(!orch.awaiting_response().await);
        assert!(orch.snapshot().await.iter().all(|m| !m.is_pending()));
    }

    #[tokio::test]
    async fn test_conversations_are_isolated() {
        let mock = Arc::new(MockChatClient::new());
        mock.queue_reply("for a");
        let a = orchestrator(&mock);
        let b = orchestrator(&mock);

        a.submit_query("hello").await;

        assert_eq!(a.snapshot().await.len(), 3);
        assert_eq!(b.snapshot().await.len(), 1);
        assert_ne!(a.conversation_id(), b.conversation_id());
    }
}
