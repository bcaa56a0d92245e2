//! Configuration System
//!
//! Layered configuration for a postsmith workspace: built-in defaults, the
//! user-level config file, workspace config files and `POSTSMITH__*`
//! environment variables, merged by [`ConfigLoader`]. CLI flags are applied
//! on top by the caller.

use crate::error::PipelineError;
use crate::generation::OrchestratorSettings;
use crate::logging::LoggingConfig;
use crate::provider::{
    BackoffPolicy, CompletionOptions, ModelProvider, OllamaApi, DEFAULT_OLLAMA_URL,
};
use crate::quality::{
    QualityGate, DEFAULT_MIN_WORDS, DEFAULT_REPETITION_THRESHOLD, DEFAULT_REQUIRED_SECTIONS,
};
use crate::window::DEFAULT_MAX_CHARS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostsmithConfig {
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Workspace paths; relative paths resolve against the workspace root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("documents")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".postsmith/cache")
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".postsmith/posts.db")
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            cache_dir: default_cache_dir(),
            store_path: default_store_path(),
        }
    }
}

/// Provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Ollama,
    #[serde(alias = "openai-compatible")]
    OpenAI,
}

/// Generation collaborator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderType,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: Option<String>,
    /// Ollama API; inferred from the endpoint when it names one
    #[serde(default = "default_api")]
    pub api: OllamaApi,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_context_window")]
    pub context_window: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_backoff_step_ms")]
    pub backoff_step_ms: u64,
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

fn default_provider() -> ProviderType {
    ProviderType::Ollama
}

fn default_model() -> String {
    "llama3:latest".to_string()
}

fn default_endpoint() -> Option<String> {
    Some(format!("{}/api/chat", DEFAULT_OLLAMA_URL))
}

fn default_api() -> OllamaApi {
    OllamaApi::Chat
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_context_window() -> u32 {
    8192
}

fn default_request_timeout_secs() -> u64 {
    240
}

fn default_max_attempts() -> usize {
    3
}

fn default_backoff_step_ms() -> u64 {
    1000
}

fn default_pacing_ms() -> u64 {
    600
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            endpoint: default_endpoint(),
            api: default_api(),
            api_key: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            context_window: default_context_window(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_step_ms: default_backoff_step_ms(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

impl GeneratorConfig {
    /// Validate provider configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Invalid endpoint URL: {}", endpoint));
            }
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn to_model_provider(&self) -> ModelProvider {
        match self.provider {
            ProviderType::Ollama => ModelProvider::Ollama {
                model: self.model.clone(),
                base_url: self.endpoint.clone(),
                api: self.api,
            },
            ProviderType::OpenAI => ModelProvider::OpenAI {
                model: self.model.clone(),
                base_url: self.endpoint.clone(),
                api_key: self.api_key.clone(),
            },
        }
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            context_window: Some(self.context_window),
            max_tokens: None,
        }
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_step_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// Quality gate settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_true")]
    pub repair: bool,
    #[serde(default = "default_required_sections")]
    pub required_sections: Vec<String>,
    #[serde(default = "default_repetition_threshold")]
    pub repetition_threshold: usize,
    #[serde(default)]
    pub require_title_match: bool,
}

fn default_min_words() -> usize {
    DEFAULT_MIN_WORDS
}

fn default_true() -> bool {
    true
}

fn default_required_sections() -> Vec<String> {
    DEFAULT_REQUIRED_SECTIONS.iter().map(|s| s.to_string()).collect()
}

fn default_repetition_threshold() -> usize {
    DEFAULT_REPETITION_THRESHOLD
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_words: default_min_words(),
            repair: true,
            required_sections: default_required_sections(),
            repetition_threshold: default_repetition_threshold(),
            require_title_match: false,
        }
    }
}

impl QualityConfig {
    pub fn gate(&self) -> QualityGate {
        QualityGate {
            min_words: self.min_words,
            required_sections: self.required_sections.clone(),
            repetition_threshold: self.repetition_threshold,
            require_title_match: self.require_title_match,
        }
    }
}

/// Run switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub dry_run: bool,
    /// Max items that may invoke the generator; 0 = unlimited
    #[serde(default)]
    pub limit: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_context_max_chars")]
    pub context_max_chars: usize,
    #[serde(default)]
    pub skip_existing: bool,
}

fn default_workers() -> usize {
    1
}

fn default_context_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            limit: 0,
            workers: default_workers(),
            context_max_chars: default_context_max_chars(),
            skip_existing: false,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Generator(String),
    Quality(String),
    Run(String),
    Workspace(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Generator(msg) => write!(f, "Generator: {}", msg),
            ValidationError::Quality(msg) => write!(f, "Quality: {}", msg),
            ValidationError::Run(msg) => write!(f, "Run: {}", msg),
            ValidationError::Workspace(msg) => write!(f, "Workspace: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PostsmithConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.generator.validate() {
            errors.push(ValidationError::Generator(e));
        }

        if self.quality.min_words == 0 {
            errors.push(ValidationError::Quality("min_words must be at least 1".to_string()));
        }
        if self.quality.repetition_threshold < 2 {
            errors.push(ValidationError::Quality(
                "repetition_threshold must be at least 2".to_string(),
            ));
        }
        if self.quality.required_sections.iter().any(|s| s.trim().is_empty()) {
            errors.push(ValidationError::Quality(
                "required_sections cannot contain empty markers".to_string(),
            ));
        }

        if self.run.workers == 0 {
            errors.push(ValidationError::Run("workers must be at least 1".to_string()));
        }
        if self.run.context_max_chars == 0 {
            errors.push(ValidationError::Run(
                "context_max_chars must be at least 1".to_string(),
            ));
        }

        for (name, path) in [
            ("source_dir", &self.workspace.source_dir),
            ("cache_dir", &self.workspace.cache_dir),
            ("store_path", &self.workspace.store_path),
        ] {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::Workspace(format!("{} cannot be empty", name)));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every error into one [`PipelineError::ConfigError`].
    pub fn ensure_valid(&self) -> Result<(), PipelineError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PipelineError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            repair: self.quality.repair,
            dry_run: self.run.dry_run,
            skip_existing: self.run.skip_existing,
            context_max_chars: self.run.context_max_chars,
        }
    }

    /// Resolve workspace paths against `workspace_root`.
    pub fn resolve_paths(&mut self, workspace_root: &Path) {
        let root = dunce::canonicalize(workspace_root).unwrap_or_else(|_| workspace_root.to_path_buf());
        for path in [
            &mut self.workspace.source_dir,
            &mut self.workspace.cache_dir,
            &mut self.workspace.store_path,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        if self.logging.file.is_relative() {
            self.logging.file = root.join(&self.logging.file);
        }
    }
}
