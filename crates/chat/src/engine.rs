//! Chat engine: runs turns against a caller-owned session.

use crate::augmentor::RetrievalAugmentor;
use crate::session::ConversationSession;
use ragchat_core::{AppConfig, AppError, AppResult};
use ragchat_knowledge::{
    create_provider, InMemoryChunkStore, IngestionPipeline, LocalSource, QueryRouter,
    RetrievalResult, TavilySearchEngine, WebSource,
};
use ragchat_llm::{create_client, LlmClient, LlmRequest};
use ragchat_prompt::load_prompt_or_default;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Maximum snippet length for source references.
const MAX_SNIPPET_LENGTH: usize = 150;

/// Model-call settings fixed for the engine's lifetime.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Upper bound on one model call
    pub model_timeout: Duration,
    /// Memory window of new sessions
    pub max_messages: usize,
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            model_timeout: Duration::from_secs(config.llm.timeout_secs),
            max_messages: config.memory.max_messages,
        }
    }
}

/// Where a piece of retrieved context came from.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    /// File path or URL
    pub source: String,
    /// Retrieval source name
    pub origin: String,
    pub score: f32,
    /// Short snippet of the chunk (truncated if needed)
    pub snippet: String,
}

/// A successful turn.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    /// Sequence number of the recorded turn
    pub turn: u32,
    pub sources: Vec<SourceRef>,
}

/// Outcome of a turn as shown to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TurnReply {
    Answered(Answer),
    /// The input was refused before anything happened
    Rejected { message: String },
    /// Retrieval, prompt or model failure; no turn was recorded
    Failed { message: String },
}

impl TurnReply {
    /// Text to display: the answer or the error message.
    pub fn message(&self) -> &str {
        match self {
            TurnReply::Answered(answer) => &answer.text,
            TurnReply::Rejected { message } | TurnReply::Failed { message } => message,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, TurnReply::Answered(_))
    }
}

/// Process-wide, immutable turn executor.
///
/// Holds the model gateway, the query router and the augmentor. Sessions are
/// passed in by the caller, so one engine serves any number of conversations.
pub struct ChatEngine {
    llm: Arc<dyn LlmClient>,
    router: QueryRouter,
    augmentor: RetrievalAugmentor,
    settings: EngineSettings,
}

impl ChatEngine {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        router: QueryRouter,
        augmentor: RetrievalAugmentor,
        settings: EngineSettings,
    ) -> Self {
        Self {
            llm,
            router,
            augmentor,
            settings,
        }
    }

    /// Build the engine from configuration: validate, connect the model,
    /// ingest every corpus and register the retrieval sources.
    ///
    /// Configuration errors (unknown provider, missing model key, bad
    /// template) abort; individual documents that fail to ingest do not.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let api_key = config.llm_api_key();
        let llm = create_client(
            &config.llm.provider,
            config.llm.endpoint.as_deref(),
            api_key.as_deref(),
            Duration::from_secs(config.llm.timeout_secs),
        )?;

        let template_path = config
            .prompt_template
            .as_ref()
            .map(|p| config.resolve_path(p));
        let template = load_prompt_or_default(template_path.as_deref())?;

        let router = build_router(config).await?;
        let augmentor = RetrievalAugmentor::new(template, config.retrieval.max_context_chars);

        tracing::info!(
            "Chat engine ready: provider={}, model={}, sources={:?}",
            llm.provider_name(),
            config.llm.model,
            router.source_names()
        );

        Ok(Self::new(
            llm,
            router,
            augmentor,
            EngineSettings::from_config(config),
        ))
    }

    /// Start a new, unlocked conversation.
    pub fn new_conversation(&self) -> ConversationSession {
        ConversationSession::new(self.settings.max_messages)
    }

    pub fn router(&self) -> &QueryRouter {
        &self.router
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run one turn.
    ///
    /// A blank question is rejected with [`AppError::Validation`] before
    /// anything changes. Otherwise the session locks before the model is
    /// called, and the turn is recorded only when the model answers.
    pub async fn submit(
        &self,
        session: &mut ConversationSession,
        question: &str,
    ) -> AppResult<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation(
                "The question text is empty".to_string(),
            ));
        }

        session.lock();

        let retrieval = self.router.route(question).await;
        let prompt = self
            .augmentor
            .augment(question, session.system_role(), &retrieval)?;

        let mut request = LlmRequest::new(prompt.user, self.settings.model.as_str())
            .with_temperature(self.settings.temperature)
            .with_history(session.history().cloned());
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }
        if let Some(max_tokens) = self.settings.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        tracing::debug!(
            session = %session.id(),
            history = request.history.len(),
            context = prompt.metadata.context_included,
            "Calling model"
        );

        let response = tokio::time::timeout(self.settings.model_timeout, self.llm.complete(&request))
            .await
            .map_err(|_| {
                AppError::Model(format!(
                    "No answer from the model within {}s",
                    self.settings.model_timeout.as_secs()
                ))
            })??;

        let turn = session.record_turn(question, &response.content).sequence;

        tracing::info!(
            session = %session.id(),
            turn,
            sources = retrieval.len(),
            "Turn completed"
        );

        Ok(Answer {
            text: response.content,
            turn,
            sources: source_refs(&retrieval),
        })
    }

    /// Run one turn and turn any error into a user-visible reply.
    pub async fn respond(&self, session: &mut ConversationSession, question: &str) -> TurnReply {
        match self.submit(session, question).await {
            Ok(answer) => TurnReply::Answered(answer),
            Err(AppError::Validation(message)) => TurnReply::Rejected { message },
            Err(e) => {
                tracing::error!(session = %session.id(), kind = e.kind(), "Turn failed: {}", e);
                TurnReply::Failed {
                    message: format!("Unable to get an answer ({})", e),
                }
            }
        }
    }
}

/// Ingest every configured corpus and register one local source per corpus,
/// plus the web source when a search key is configured.
pub async fn build_router(config: &AppConfig) -> AppResult<QueryRouter> {
    let embedder = create_provider(
        &config.embedding,
        Duration::from_secs(config.llm.timeout_secs),
    )?;
    let pipeline =
        IngestionPipeline::from_settings(&config.retrieval, &config.embedding, embedder)?;

    let mut router = QueryRouter::from_settings(&config.retrieval);

    for corpus in &config.corpora {
        let sources: Vec<_> = corpus
            .sources
            .iter()
            .map(|p| config.resolve_path(p))
            .collect();

        let mut store = InMemoryChunkStore::new(corpus.name.as_str());
        let stats = pipeline.ingest_corpus(&sources, &mut store).await;

        tracing::info!(
            "Corpus '{}': {} chunks from {} sources ({} failed)",
            corpus.name,
            stats.chunks_count,
            stats.sources_count,
            stats.failed_count
        );

        router = router.with_source(Arc::new(LocalSource::new(
            corpus.name.as_str(),
            Arc::new(store),
            pipeline.embedder(),
            config.retrieval.max_results,
            config.retrieval.min_score,
        )));
    }

    match config.web_search_api_key() {
        Some(key) => {
            let engine = TavilySearchEngine::new(
                &key,
                config.web_search.endpoint.as_deref(),
                Duration::from_secs(config.retrieval.source_timeout_secs),
            )?;
            router = router.with_source(Arc::new(WebSource::new(
                Arc::new(engine),
                config.web_search.max_results,
            )));
        }
        None => {
            tracing::info!(
                "{} not set, web search disabled",
                config.web_search.api_key_env
            );
        }
    }

    Ok(router)
}

/// Map retrieved chunks to source references, one per distinct chunk text.
fn source_refs(retrieval: &RetrievalResult) -> Vec<SourceRef> {
    let mut refs: Vec<SourceRef> = Vec::new();

    for candidate in &retrieval.candidates {
        let snippet = truncate_snippet(candidate.chunk.text.trim(), MAX_SNIPPET_LENGTH);
        if refs
            .iter()
            .any(|r| r.source == candidate.chunk.source_id && r.snippet == snippet)
        {
            continue;
        }

        refs.push(SourceRef {
            source: candidate.chunk.source_id.clone(),
            origin: candidate.origin.clone(),
            score: candidate.score,
            snippet,
        });
    }

    refs
}

fn truncate_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();
    // Break at a word boundary when there is one
    match truncated.rfind(char::is_whitespace) {
        Some(last_space) => format!("{}...", &truncated[..last_space]),
        None => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use async_trait::async_trait;
    use ragchat_knowledge::{Chunk, RetrievalSource, ScoredChunk};
    use ragchat_llm::{LlmResponse, LlmUsage};
    use ragchat_prompt::PromptDefinition;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Mode {
        Answer,
        Fail,
        Hang,
    }

    struct MockLlm {
        mode: Mode,
        calls: AtomicUsize,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlm {
        fn new(mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                mode,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> LlmRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlm {
        fn provider_name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.requests.lock().unwrap().push(request.clone());

            match self.mode {
                Mode::Answer => Ok(LlmResponse {
                    content: format!("answer {}", n),
                    model: request.model.clone(),
                    usage: LlmUsage::default(),
                }),
                Mode::Fail => Err(AppError::Model("service unavailable".to_string())),
                Mode::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(AppError::Model("unreachable".to_string()))
                }
            }
        }
    }

    struct FranceSource;

    #[async_trait]
    impl RetrievalSource for FranceSource {
        fn name(&self) -> &str {
            "guides"
        }

        async fn retrieve(&self, _query: &str) -> AppResult<Vec<ScoredChunk>> {
            Ok(vec![ScoredChunk {
                chunk: Chunk {
                    id: "c0".to_string(),
                    source_id: "guides/france.md".to_string(),
                    position: 0,
                    offset: 0,
                    text: "Paris is the capital of France.".to_string(),
                },
                score: 0.9,
                origin: "guides".to_string(),
            }])
        }
    }

    fn settings(max_messages: usize) -> EngineSettings {
        EngineSettings {
            model: "test-model".to_string(),
            temperature: 0.8,
            max_tokens: Some(256),
            model_timeout: Duration::from_millis(200),
            max_messages,
        }
    }

    fn engine_with(llm: Arc<MockLlm>, router: QueryRouter, max_messages: usize) -> ChatEngine {
        ChatEngine::new(
            llm,
            router,
            RetrievalAugmentor::new(PromptDefinition::default(), 4000),
            settings(max_messages),
        )
    }

    fn empty_router() -> QueryRouter {
        QueryRouter::new(9, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_successful_turn_records_history() {
        let llm = MockLlm::new(Mode::Answer);
        let engine = engine_with(Arc::clone(&llm), empty_router(), 30);
        let mut session = engine.new_conversation();

        let answer = engine.submit(&mut session, "  Hello  ").await.unwrap();

        assert_eq!(answer.text, "answer 1");
        assert_eq!(answer.turn, 1);
        assert_eq!(session.state(), SessionState::Locked);
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].question, "Hello");
        assert_eq!(
            session.history_text(),
            "== User:\nHello\n== Assistant:\nanswer 1\n"
        );

        let request = llm.last_request();
        assert_eq!(request.model, "test-model");
        assert_eq!(request.temperature, Some(0.8));
        assert_eq!(request.max_tokens, Some(256));
        assert_eq!(request.prompt, "Hello");
    }

    #[tokio::test]
    async fn test_blank_question_has_no_side_effects() {
        let llm = MockLlm::new(Mode::Answer);
        let engine = engine_with(Arc::clone(&llm), empty_router(), 30);
        let mut session = engine.new_conversation();

        for question in ["", "   ", "\n\t"] {
            let err = engine.submit(&mut session, question).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        assert_eq!(llm.calls(), 0);
        assert!(session.turns().is_empty());
        assert_eq!(session.state(), SessionState::Unlocked);
        session.set_system_role("Translator").unwrap();
    }

    #[tokio::test]
    async fn test_role_is_fixed_after_first_turn() {
        let llm = MockLlm::new(Mode::Answer);
        let engine = engine_with(Arc::clone(&llm), empty_router(), 30);
        let mut session = engine.new_conversation();

        session.set_system_role("Translator").unwrap();
        engine.submit(&mut session, "Hello").await.unwrap();

        assert_eq!(session.state(), SessionState::Locked);
        let err = session.set_system_role("Other").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(session.system_role(), Some("Translator"));

        engine.submit(&mut session, "Good night").await.unwrap();
        assert_eq!(llm.last_request().system.as_deref(), Some("Translator"));
    }

    #[tokio::test]
    async fn test_model_failure_only_locks() {
        let llm = MockLlm::new(Mode::Fail);
        let engine = engine_with(Arc::clone(&llm), empty_router(), 30);
        let mut session = engine.new_conversation();
        session.set_system_role("Tour guide").unwrap();

        let err = engine.submit(&mut session, "Rome?").await.unwrap_err();

        assert!(matches!(err, AppError::Model(_)));
        assert_eq!(llm.calls(), 1);
        assert_eq!(session.state(), SessionState::Locked);
        assert!(session.turns().is_empty());
        assert!(session.memory().is_empty());
        assert_eq!(session.system_role(), Some("Tour guide"));
    }

    #[tokio::test]
    async fn test_model_timeout_is_model_error() {
        let llm = MockLlm::new(Mode::Hang);
        let engine = engine_with(Arc::clone(&llm), empty_router(), 30);
        let mut session = engine.new_conversation();

        let err = engine.submit(&mut session, "Hello").await.unwrap_err();
        assert!(matches!(err, AppError::Model(_)));
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn test_history_window_is_bounded() {
        let llm = MockLlm::new(Mode::Answer);
        let engine = engine_with(Arc::clone(&llm), empty_router(), 4);
        let mut session = engine.new_conversation();
        session.set_system_role("Assistant").unwrap();

        for i in 0..10 {
            engine
                .submit(&mut session, &format!("question {}", i))
                .await
                .unwrap();
            assert!(session.memory().len() <= 4);
            assert!(llm.last_request().history.len() <= 4);
        }

        let request = llm.last_request();
        assert_eq!(request.system.as_deref(), Some("Assistant"));
        assert_eq!(request.history[0].content, "question 7");
        assert_eq!(request.messages()[0].content, "Assistant");
        assert_eq!(session.turns().len(), 10);
    }

    #[tokio::test]
    async fn test_context_is_injected_but_not_stored() {
        let llm = MockLlm::new(Mode::Answer);
        let router = empty_router().with_source(Arc::new(FranceSource));
        let engine = engine_with(Arc::clone(&llm), router, 30);
        let mut session = engine.new_conversation();

        let answer = engine
            .submit(&mut session, "What is the capital of France?")
            .await
            .unwrap();

        let prompt = llm.last_request().prompt;
        let context_at = prompt.find("Paris is the capital of France.").unwrap();
        let question_at = prompt.find("What is the capital of France?").unwrap();
        assert!(context_at < question_at);

        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].source, "guides/france.md");
        assert_eq!(answer.sources[0].origin, "guides");

        engine.submit(&mut session, "And Italy?").await.unwrap();
        let history = llm.last_request().history;
        assert_eq!(history[0].content, "What is the capital of France?");
    }

    #[tokio::test]
    async fn test_respond_converts_errors() {
        let engine = engine_with(MockLlm::new(Mode::Fail), empty_router(), 30);
        let mut session = engine.new_conversation();

        let reply = engine.respond(&mut session, " ").await;
        assert!(matches!(reply, TurnReply::Rejected { .. }));

        let reply = engine.respond(&mut session, "Hello").await;
        assert!(matches!(reply, TurnReply::Failed { .. }));
        assert!(reply.message().contains("service unavailable"));
        assert!(!reply.is_answered());

        let engine = engine_with(MockLlm::new(Mode::Answer), empty_router(), 30);
        let mut session = engine.new_conversation();
        let reply = engine.respond(&mut session, "Hello").await;
        assert!(reply.is_answered());
        assert_eq!(reply.message(), "answer 1");

        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["status"], "answered");
        assert_eq!(json["text"], "answer 1");
    }

    #[tokio::test]
    async fn test_new_conversation_is_fresh() {
        let engine = engine_with(MockLlm::new(Mode::Answer), empty_router(), 30);
        let mut first = engine.new_conversation();
        first.set_system_role("Translator").unwrap();
        engine.submit(&mut first, "Hello").await.unwrap();

        let second = engine.new_conversation();
        assert_ne!(first.id(), second.id());
        assert_eq!(second.state(), SessionState::Unlocked);
        assert!(second.system_role().is_none());
        assert!(second.turns().is_empty());
    }

    fn offline_config(workspace: &std::path::Path) -> AppConfig {
        let mut config = AppConfig {
            workspace: workspace.to_path_buf(),
            ..AppConfig::default()
        };
        config.llm.provider = "ollama".to_string();
        config.llm.model = "llama3.2".to_string();
        config.web_search.api_key_env = "RAGCHAT_TEST_UNSET_TAVILY_KEY".to_string();
        config
    }

    #[tokio::test]
    async fn test_from_config_ingests_corpora() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("guides")).unwrap();
        std::fs::write(
            dir.path().join("guides/france.md"),
            "# France\n\nParis is the capital of France.",
        )
        .unwrap();

        let mut config = offline_config(dir.path());
        config.corpora = vec![ragchat_core::config::CorpusConfig {
            name: "guides".to_string(),
            sources: vec![std::path::PathBuf::from("guides")],
        }];

        let engine = ChatEngine::from_config(&config).await.unwrap();
        assert_eq!(engine.router().source_names(), vec!["guides"]);
        assert_eq!(engine.settings().model, "llama3.2");

        let result = engine.router().route("capital of France").await;
        assert!(!result.is_empty());
        assert!(result.candidates[0].chunk.text.contains("Paris"));
    }

    #[tokio::test]
    async fn test_from_config_without_corpora() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ChatEngine::from_config(&offline_config(dir.path()))
            .await
            .unwrap();
        assert!(engine.router().source_names().is_empty());
    }

    #[tokio::test]
    async fn test_web_source_registered_when_key_is_set() {
        std::env::set_var("RAGCHAT_TEST_TAVILY_KEY_PRESENT", "tvly-test-key");

        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config(dir.path());
        config.web_search.api_key_env = "RAGCHAT_TEST_TAVILY_KEY_PRESENT".to_string();

        let router = build_router(&config).await.unwrap();
        assert_eq!(router.source_names(), vec!["tavily"]);
    }

    #[tokio::test]
    async fn test_from_config_requires_gemini_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = offline_config(dir.path());
        config.llm.provider = "gemini".to_string();
        config.llm.api_key_env = "RAGCHAT_TEST_UNSET_GEMINI_KEY".to_string();
        config.api_key = None;

        match ChatEngine::from_config(&config).await {
            Err(AppError::Config(_)) => {}
            Err(other) => panic!("Expected configuration error, got {}", other),
            Ok(_) => panic!("Expected error for Gemini without API key"),
        }
    }

    #[test]
    fn test_truncate_snippet() {
        assert_eq!(truncate_snippet("short", 150), "short");
        assert_eq!(truncate_snippet("hello wonderful world", 12), "hello...");
        assert_eq!(truncate_snippet("ééééé", 3), "ééé...");
    }
}
