//! Conversation management
//!
//! Turns a new customer message plus a session's stored history into one
//! model call, then records the exchange.
//!
//! Ordering of side effects inside [`ConversationManager::send`]:
//!
//! 1. validate the request
//! 2. read the session history
//! 3. call the model
//! 4. write the human turn
//! 5. write the ai turn
//! 6. write the cache entry (when requested)
//!
//! Nothing is written before the model has answered, so a failed read or
//! a failed model call leaves the store untouched. Writes are not
//! transactional: if step 5 fails the human turn from step 4 stays, and
//! if step 6 fails both turns stay. The error is always returned.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::agent::prompts::FLOWER_SHOP_PERSONA;
use crate::agent::types::Message;
use crate::core::{CacheEntry, ChatModel, HistoryStore, SemanticCacheStore, Turn};
use crate::error::{Error, Result};

/// One customer message to send
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Session the message belongs to
    pub session_id: String,
    /// Text actually sent to the model (may carry retrieved context)
    pub enhanced_message: String,
    /// The customer's own words, stored as the turn content
    pub original_message: String,
    /// Whether to record a cache entry for this exchange
    pub should_cache: bool,
    /// Caller-supplied embedding of the request
    pub embedding: Vec<f32>,
}

impl ChatRequest {
    /// Create a request whose original and enhanced text are the same
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        ChatRequest {
            session_id: session_id.into(),
            original_message: message.clone(),
            enhanced_message: message,
            should_cache: false,
            embedding: Vec::new(),
        }
    }

    /// Set the customer's original text
    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original_message = original.into();
        self
    }

    /// Record a cache entry with the given embedding
    pub fn cache_with(mut self, embedding: Vec<f32>) -> Self {
        self.should_cache = true;
        self.embedding = embedding;
        self
    }

    /// Set the cache flag and embedding independently
    pub fn with_cache(mut self, should_cache: bool, embedding: Vec<f32>) -> Self {
        self.should_cache = should_cache;
        self.embedding = embedding;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.session_id.trim().is_empty() {
            return Err(Error::InvalidInput("session id must not be empty".to_string()));
        }
        if self.enhanced_message.trim().is_empty() {
            return Err(Error::InvalidInput("message must not be empty".to_string()));
        }
        // Stored as the human turn and replayed in every later call
        if self.original_message.trim().is_empty() {
            return Err(Error::InvalidInput("original message must not be empty".to_string()));
        }
        if self.should_cache {
            if self.embedding.is_empty() {
                return Err(Error::InvalidInput(
                    "an embedding is required when caching the response".to_string(),
                ));
            }
            if self.embedding.iter().any(|v| !v.is_finite()) {
                return Err(Error::InvalidInput(
                    "embedding values must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Drives one model call per customer message and persists the exchange
#[derive(Clone)]
pub struct ConversationManager {
    model: Arc<dyn ChatModel>,
    history: Arc<dyn HistoryStore>,
    cache: Arc<dyn SemanticCacheStore>,
    system_prompt: String,
}

impl ConversationManager {
    /// Create a manager using the built-in persona as system instruction
    pub fn new(
        model: Arc<dyn ChatModel>,
        history: Arc<dyn HistoryStore>,
        cache: Arc<dyn SemanticCacheStore>,
    ) -> Self {
        ConversationManager {
            model,
            history,
            cache,
            system_prompt: FLOWER_SHOP_PERSONA.to_string(),
        }
    }

    /// Replace the system instruction
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// The system instruction sent first in every call
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Outgoing message list: system instruction, history, new message
    pub fn build_messages(&self, history: &[Turn], enhanced_message: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::user(&self.system_prompt));
        messages.extend(history.iter().map(Turn::to_message));
        messages.push(Message::user(enhanced_message));
        messages
    }

    /// Stored turns for a session, in store order
    pub async fn history(&self, session_id: &str) -> Result<Vec<Turn>> {
        self.history.find_by_session(session_id).await
    }

    /// Send a message and return the generated text
    pub async fn send(&self, request: &ChatRequest) -> Result<String> {
        request.validate()?;
        let session_id = request.session_id.as_str();

        let history = self.history.find_by_session(session_id).await?;
        let messages = self.build_messages(&history, &request.enhanced_message);
        debug!(
            session_id,
            history_len = history.len(),
            messages = messages.len(),
            "Calling model"
        );

        let response = self.model.converse(&messages).await.map_err(|e| {
            warn!(session_id, error = %e, "Model call failed; nothing persisted");
            e
        })?;
        let model_name = self.model.model_label();

        self.history
            .insert(&Turn::human(
                session_id,
                &request.original_message,
                &request.enhanced_message,
            ))
            .await?;

        if let Err(e) = self
            .history
            .insert(&Turn::ai(session_id, &response, model_name))
            .await
        {
            warn!(session_id, error = %e, "Human turn persisted without its reply");
            return Err(e);
        }

        if request.should_cache {
            let entry = CacheEntry::new(
                request.embedding.clone(),
                &request.original_message,
                &request.enhanced_message,
                &response,
                model_name,
            );
            self.cache.insert(&entry).await?;
            debug!(session_id, dims = entry.embedding.len(), "Cache entry recorded");
        }

        info!(
            session_id,
            total_tokens = response.usage.total_tokens,
            finish_reason = %response.finish_reason,
            cached = request.should_cache,
            "Exchange recorded"
        );

        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::{ModelResponse, Role, TokenUsage};
    use crate::core::TurnKind;
    use crate::database::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Model that records the messages it receives and echoes a fixed reply
    struct ScriptedModel {
        reply: Result<ModelResponse>,
        calls: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(ScriptedModel {
                reply: Ok(ModelResponse {
                    text: text.to_string(),
                    usage: TokenUsage {
                        input_tokens: 30,
                        output_tokens: 10,
                        total_tokens: 40,
                    },
                    finish_reason: "STOP".to_string(),
                }),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: Error) -> Arc<Self> {
            Arc::new(ScriptedModel {
                reply: Err(err),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Vec<Message>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn model_label(&self) -> &str {
            "Gemini 1.5 Flash"
        }

        async fn converse(&self, messages: &[Message]) -> Result<ModelResponse> {
            self.calls.lock().unwrap().push(messages.to_vec());
            match &self.reply {
                Ok(response) => Ok(response.clone()),
                Err(Error::BackendRejected(msg)) => Err(Error::BackendRejected(msg.clone())),
                Err(e) => Err(Error::BackendUnavailable(e.to_string())),
            }
        }
    }

    /// History store wrapper that fails reads, or writes of a given turn kind
    struct FlakyHistory {
        inner: Arc<InMemoryStore>,
        fail_reads: bool,
        fail_writes_of: Option<TurnKind>,
    }

    #[async_trait]
    impl HistoryStore for FlakyHistory {
        fn id(&self) -> &str {
            "flaky"
        }

        async fn find_by_session(&self, session_id: &str) -> Result<Vec<Turn>> {
            if self.fail_reads {
                return Err(Error::StoreReadFailed("connection reset".to_string()));
            }
            self.inner.find_by_session(session_id).await
        }

        async fn insert(&self, turn: &Turn) -> Result<()> {
            if self.fail_writes_of == Some(turn.kind()) {
                return Err(Error::StoreWriteFailed("disk full".to_string()));
            }
            HistoryStore::insert(self.inner.as_ref(), turn).await
        }
    }

    struct BrokenCache {
        attempted: AtomicBool,
    }

    #[async_trait]
    impl SemanticCacheStore for BrokenCache {
        fn id(&self) -> &str {
            "broken"
        }

        async fn insert(&self, _entry: &CacheEntry) -> Result<()> {
            self.attempted.store(true, Ordering::SeqCst);
            Err(Error::StoreWriteFailed("cache unavailable".to_string()))
        }
    }

    fn manager(model: Arc<ScriptedModel>, store: Arc<InMemoryStore>) -> ConversationManager {
        ConversationManager::new(model, store.clone(), store)
    }

    #[tokio::test]
    async fn test_first_message_in_new_session() {
        let store = Arc::new(InMemoryStore::new());
        let model = ScriptedModel::replying("Dạ, 2 bông hồng là 100.000đ ạ.");
        let manager = manager(model.clone(), store.clone());

        let request = ChatRequest::new("s1", "Hi, 2 roses please");
        let reply = manager.send(&request).await.unwrap();
        assert_eq!(reply, "Dạ, 2 bông hồng là 100.000đ ạ.");

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 2);
        assert_eq!(calls[0][0], Message::user(FLOWER_SHOP_PERSONA));
        assert_eq!(calls[0][1], Message::user("Hi, 2 roses please"));

        let turns = store.find_by_session("s1").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].kind(), TurnKind::Human);
        assert_eq!(turns[1].kind(), TurnKind::Ai);
        assert_eq!(store.cache_entries().await.len(), 0);
    }

    #[tokio::test]
    async fn test_history_is_replayed_in_order() {
        let store = Arc::new(InMemoryStore::new());
        let model = ScriptedModel::replying("reply");
        let manager = manager(model.clone(), store.clone());

        manager.send(&ChatRequest::new("s1", "first")).await.unwrap();
        manager.send(&ChatRequest::new("s1", "second")).await.unwrap();
        manager.send(&ChatRequest::new("other", "unrelated")).await.unwrap();
        manager.send(&ChatRequest::new("s1", "third")).await.unwrap();

        let last = model.calls().pop().unwrap();
        // 4 prior turns + system + new message
        assert_eq!(last.len(), 6);
        let roles: Vec<Role> = last.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::User, Role::Model, Role::User, Role::Model, Role::User]
        );
        assert_eq!(last[1].content, "first");
        assert_eq!(last[3].content, "second");
        assert_eq!(last[5].content, "third");

        assert_eq!(store.find_by_session("s1").await.unwrap().len(), 6);
        assert_eq!(store.find_by_session("other").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_enhanced_text_is_sent_and_original_stored() {
        let store = Arc::new(InMemoryStore::new());
        let model = ScriptedModel::replying("ok");
        let manager = manager(model.clone(), store.clone());

        let request = ChatRequest::new("s1", "roses? [catalog: red rose 50k]").with_original("roses?");
        manager.send(&request).await.unwrap();

        assert_eq!(model.calls()[0][1].content, "roses? [catalog: red rose 50k]");

        let turns = store.find_by_session("s1").await.unwrap();
        let human = &turns[0].history.data;
        assert_eq!(human.content, "roses?");
        assert_eq!(
            human.enhanced_content.as_deref(),
            Some("roses? [catalog: red rose 50k]")
        );

        let ai = &turns[1].history.data;
        assert_eq!(ai.content, "ok");
        assert_eq!(ai.usage_metadata.unwrap().total_tokens, 40);
        assert_eq!(ai.response_metadata.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(
            ai.response_metadata.model_name.as_deref(),
            Some("Gemini 1.5 Flash")
        );
    }

    #[tokio::test]
    async fn test_cache_entry_written_when_requested() {
        let store = Arc::new(InMemoryStore::new());
        let manager = manager(ScriptedModel::replying("cached reply"), store.clone());

        let request = ChatRequest::new("s1", "tulips?").cache_with(vec![0.25, -0.5, 1.0]);
        manager.send(&request).await.unwrap();

        let entries = store.cache_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].embedding, vec![0.25, -0.5, 1.0]);
        assert_eq!(entries[0].response_text(), Some("cached reply"));

        let turns = store.find_by_session("s1").await.unwrap();
        assert_eq!(entries[0].response_text(), Some(turns[1].content()));
    }

    #[tokio::test]
    async fn test_no_cache_entry_when_flag_is_off() {
        let store = Arc::new(InMemoryStore::new());
        let manager = manager(ScriptedModel::replying("reply"), store.clone());

        let request = ChatRequest::new("s1", "lilies?").with_cache(false, vec![0.1, 0.2]);
        manager.send(&request).await.unwrap();

        assert!(store.cache_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_requests_touch_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let model = ScriptedModel::replying("reply");
        let manager = manager(model.clone(), store.clone());

        for request in [
            ChatRequest::new("", "hello"),
            ChatRequest::new("s1", "   "),
            ChatRequest::new("s1", "hello").with_cache(true, Vec::new()),
            ChatRequest::new("s1", "roses? [catalog: red rose]").with_original(""),
            ChatRequest::new("s1", "roses?").with_original("  "),
            ChatRequest::new("s1", "hello").cache_with(vec![0.1, f32::NAN]),
            ChatRequest::new("s1", "hello").cache_with(vec![f32::INFINITY, 0.2]),
        ] {
            let err = manager.send(&request).await.unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }

        assert!(model.calls().is_empty());
        assert!(store.find_by_session("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_prevents_model_call() {
        let inner = Arc::new(InMemoryStore::new());
        let history = Arc::new(FlakyHistory {
            inner: inner.clone(),
            fail_reads: true,
            fail_writes_of: None,
        });
        let model = ScriptedModel::replying("reply");
        let manager = ConversationManager::new(model.clone(), history, inner.clone());

        let err = manager.send(&ChatRequest::new("s1", "hi")).await.unwrap_err();
        assert!(matches!(err, Error::StoreReadFailed(_)));
        assert!(model.calls().is_empty());
        assert!(inner.find_by_session("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_writes_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let manager = manager(
            ScriptedModel::failing(Error::BackendRejected("SAFETY".to_string())),
            store.clone(),
        );

        let request = ChatRequest::new("s1", "hi").cache_with(vec![1.0]);
        let err = manager.send(&request).await.unwrap_err();
        assert!(matches!(err, Error::BackendRejected(_)));

        assert!(store.find_by_session("s1").await.unwrap().is_empty());
        assert!(store.cache_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_ai_write_failure_leaves_human_turn() {
        let inner = Arc::new(InMemoryStore::new());
        let history = Arc::new(FlakyHistory {
            inner: inner.clone(),
            fail_reads: false,
            fail_writes_of: Some(TurnKind::Ai),
        });
        let manager =
            ConversationManager::new(ScriptedModel::replying("reply"), history, inner.clone());

        let request = ChatRequest::new("s1", "hi").cache_with(vec![1.0]);
        let err = manager.send(&request).await.unwrap_err();
        assert!(matches!(err, Error::StoreWriteFailed(_)));

        let turns = inner.find_by_session("s1").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].kind(), TurnKind::Human);
        assert!(inner.cache_entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_cache_failure_surfaces_after_turns_persisted() {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(BrokenCache {
            attempted: AtomicBool::new(false),
        });
        let manager =
            ConversationManager::new(ScriptedModel::replying("reply"), store.clone(), cache.clone());

        let request = ChatRequest::new("s1", "hi").cache_with(vec![1.0]);
        let err = manager.send(&request).await.unwrap_err();
        assert!(matches!(err, Error::StoreWriteFailed(_)));
        assert!(cache.attempted.load(Ordering::SeqCst));
        assert_eq!(store.find_by_session("s1").await.unwrap().len(), 2);
    }

    #[test]
    fn test_build_messages_length_is_history_plus_two() {
        let store = Arc::new(InMemoryStore::new());
        let manager = manager(ScriptedModel::replying("x"), store)
            .with_system_prompt("You sell bread.");

        let response = ModelResponse {
            text: "Hello!".to_string(),
            usage: TokenUsage::default(),
            finish_reason: "STOP".to_string(),
        };
        let history = vec![
            Turn::human("s", "hi", "hi"),
            Turn::ai("s", &response, "m"),
            Turn::human("s", "rye?", "rye? [stock: 3]"),
        ];

        let messages = manager.build_messages(&history, "sourdough?");
        assert_eq!(messages.len(), history.len() + 2);
        assert_eq!(messages[0], Message::user("You sell bread."));
        assert_eq!(messages[2], Message::model("Hello!"));
        assert_eq!(messages[3], Message::user("rye?"));
        assert_eq!(messages[4], Message::user("sourdough?"));
    }
}
