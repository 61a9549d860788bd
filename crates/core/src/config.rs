//! Configuration management for ragchat.
//!
//! Configuration is assembled in layers, later layers winning:
//! - Built-in defaults
//! - Config file (`ragchat.yaml` in the workspace, or `RAGCHAT_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Credentials are never stored in the file itself; the file names the
//! environment variables that hold them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the model gateway knows how to build.
pub const KNOWN_LLM_PROVIDERS: [&str; 2] = ["gemini", "ollama"];

/// Providers the embedding factory knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root; relative corpus paths resolve against it
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Explicit API key override for the LLM provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Language model settings
    pub llm: LlmSettings,

    /// Embedding settings shared by ingestion and local retrieval
    pub embedding: EmbeddingSettings,

    /// Chunking and retrieval settings
    pub retrieval: RetrievalSettings,

    /// Web search settings
    pub web_search: WebSearchSettings,

    /// Conversation memory settings
    pub memory: MemorySettings,

    /// Corpora to ingest at startup, one chunk store each
    pub corpora: Vec<CorpusConfig>,

    /// Optional YAML file overriding the augmentation template
    pub prompt_template: Option<PathBuf>,
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// Provider name ("gemini", "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Per-call timeout
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            endpoint: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            temperature: 0.8,
            max_tokens: None,
            timeout_secs: 60,
        }
    }
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Provider name ("trigram", "ollama")
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Number of chunks embedded per request
    pub batch_size: usize,

    /// Custom endpoint URL
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            batch_size: 32,
            endpoint: None,
        }
    }
}

/// Chunking, search and routing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalSettings {
    /// Chunk size in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,

    /// Top-k kept per source
    pub max_results: usize,

    /// Minimum relevance for local results; relevance is `(cosine + 1) / 2`,
    /// so 0.5 admits every chunk with non-negative cosine similarity
    pub min_score: f32,

    /// Cap on merged candidates across all sources
    pub max_candidates: usize,

    /// Cap on the context block, in characters
    pub max_context_chars: usize,

    /// Timeout for a single source's retrieval
    pub source_timeout_secs: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            chunk_overlap: 30,
            max_results: 3,
            min_score: 0.5,
            max_candidates: 9,
            max_context_chars: 4000,
            source_timeout_secs: 10,
        }
    }
}

/// Web search settings. The web source is only registered when the key is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WebSearchSettings {
    /// Environment variable holding the search API key
    pub api_key_env: String,

    /// Results requested per query
    pub max_results: usize,

    /// Custom endpoint URL
    pub endpoint: Option<String>,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            api_key_env: "TAVILY_API_KEY".to_string(),
            max_results: 5,
            endpoint: None,
        }
    }
}

/// Sliding-window memory settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MemorySettings {
    /// Non-pinned messages kept in the window
    pub max_messages: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self { max_messages: 30 }
    }
}

/// A named corpus and the documents it is built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusConfig {
    pub name: String,

    /// Files or directories
    pub sources: Vec<PathBuf>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    retrieval: Option<RetrievalSettings>,
    web_search: Option<WebSearchSettings>,
    memory: Option<MemorySettings>,
    corpora: Option<Vec<CorpusConfig>>,
    prompt: Option<PromptFileConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PromptFileConfig {
    template: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            web_search: WebSearchSettings::default(),
            memory: MemorySettings::default(),
            corpora: Vec::new(),
            prompt_template: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `RAGCHAT_WORKSPACE`: Override workspace path
    /// - `RAGCHAT_CONFIG`: Path to config file
    /// - `RAGCHAT_PROVIDER`: LLM provider
    /// - `RAGCHAT_MODEL`: Model identifier
    /// - `RAGCHAT_API_KEY`: API key, overriding the provider's key variable
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use ragchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Corpora: {}", config.corpora.len());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], with a workspace and config file that take
    /// precedence over `RAGCHAT_WORKSPACE` and `RAGCHAT_CONFIG`.
    ///
    /// Only one YAML file is read: the explicit one, or `ragchat.yaml` in the
    /// chosen workspace.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace
            .or_else(|| std::env::var("RAGCHAT_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("RAGCHAT_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.workspace.join("ragchat.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        if let Ok(provider) = std::env::var("RAGCHAT_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("RAGCHAT_MODEL") {
            config.llm.model = model;
        }

        config.api_key = std::env::var("RAGCHAT_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(web_search) = config_file.web_search {
            result.web_search = web_search;
        }
        if let Some(memory) = config_file.memory {
            result.memory = memory;
        }
        if let Some(corpora) = config_file.corpora {
            result.corpora = corpora;
        }
        if let Some(template) = config_file.prompt.and_then(|p| p.template) {
            result.prompt_template = Some(template);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over the environment and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve a possibly relative path against the workspace.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Resolve the LLM API key: explicit override first, then the provider's variable.
    pub fn llm_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.trim().is_empty() {
                return Some(key.clone());
            }
        }
        non_blank_env(&self.llm.api_key_env)
    }

    /// Resolve the web search API key. `None` means the web source is disabled.
    pub fn web_search_api_key(&self) -> Option<String> {
        non_blank_env(&self.web_search.api_key_env)
    }

    /// Validate the configuration before anything is built from it.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.llm.provider.to_lowercase();
        if !KNOWN_LLM_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if provider == "gemini" && self.llm_api_key().is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.llm.api_key_env
            )));
        }

        let embedding = self.embedding.provider.to_lowercase();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than 0".to_string(),
            ));
        }

        let retrieval = &self.retrieval;
        if retrieval.chunk_size == 0 || retrieval.chunk_overlap >= retrieval.chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                retrieval.chunk_overlap, retrieval.chunk_size
            )));
        }

        if !(0.0..=1.0).contains(&retrieval.min_score) {
            return Err(AppError::Config(format!(
                "Minimum score must be within [0, 1], got {}",
                retrieval.min_score
            )));
        }

        if self.memory.max_messages == 0 {
            return Err(AppError::Config(
                "Memory window must hold at least one message".to_string(),
            ));
        }

        Ok(())
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
