//! Shared test utilities for integration tests
//!
//! A scripted in-memory generation provider, a temporary workspace with a
//! source directory, and helpers that wire the pipeline the same way the CLI
//! does, minus the HTTP client.

use async_trait::async_trait;
use parking_lot::Mutex;
use postsmith::cache::FileCacheStore;
use postsmith::config::PostsmithConfig;
use postsmith::error::PipelineError;
use postsmith::generation::{GenerationBudget, GenerationOrchestrator};
use postsmith::pipeline::Pipeline;
use postsmith::provider::{
    BackoffPolicy, ChatMessage, CompletionOptions, CompletionResponse, GenerationService,
    ModelProviderClient,
};
use postsmith::store::SledPostStore;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// How the scripted provider answers a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Always a complete article for the requested title
    Good,
    /// A short article on first generation, a complete one on repair
    ShortThenGood,
    /// Always too short, including on repair
    AlwaysShort,
    /// Every call fails with a transport error
    Unreachable,
}

/// In-memory `ModelProviderClient` that answers from the prompt it receives
pub struct ScriptedProvider {
    behavior: Behavior,
    model: String,
    calls: AtomicUsize,
    repair_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Self::with_model(behavior, "scripted-model")
    }

    pub fn with_model(behavior: Behavior, model: &str) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            model: model.to_string(),
            calls: AtomicUsize::new(0),
            repair_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn repair_calls(&self) -> usize {
        self.repair_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

/// Title requested by a generation or repair prompt.
pub fn requested_title(prompt: &str) -> String {
    prompt
        .lines()
        .find_map(|line| {
            line.strip_prefix("1) First line: # ")
                .or_else(|| line.strip_prefix("- Keep the same topic and the same title: # "))
        })
        .unwrap_or("Untitled")
        .trim()
        .to_string()
}

/// An article that passes the default quality gate.
pub fn good_article(title: &str) -> String {
    let mut body = String::new();
    for i in 0..30 {
        body.push_str(&format!(
            "Paragraph {} explains how {} behaves in practice with a concrete example.\n",
            i, title
        ));
    }
    format!(
        "# {}\n**Meta:** A practical guide to {}.\n\n{}\n## Pitfalls\n- Ignoring edge cases\n\n## Checklist\n- Review the basics\n\n## Next steps\n- Practice\n",
        title, title, body
    )
}

pub fn short_article(title: &str) -> String {
    format!("# {}\nToo short to publish.", title)
}

#[async_trait]
impl ModelProviderClient for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<CompletionResponse, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let is_repair = prompt.starts_with("The following article failed the quality check");
        if is_repair {
            self.repair_calls.fetch_add(1, Ordering::SeqCst);
        }
        self.prompts.lock().push(prompt.clone());

        let title = requested_title(&prompt);
        let content = match (self.behavior, is_repair) {
            (Behavior::Unreachable, _) => {
                return Err(PipelineError::ProviderRequestFailed(
                    "Connection error: connection refused".to_string(),
                ))
            }
            (Behavior::Good, _) | (Behavior::ShortThenGood, true) => good_article(&title),
            (Behavior::ShortThenGood, false) | (Behavior::AlwaysShort, _) => short_article(&title),
        };

        Ok(CompletionResponse {
            content,
            model: self.model.clone(),
            finish_reason: Some("stop".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>, PipelineError> {
        Ok(vec![self.model.clone()])
    }
}

/// Temporary workspace with a `documents/` source directory
pub struct TestWorkspace {
    pub dir: TempDir,
    pub config: PostsmithConfig,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("documents")).unwrap();
        let mut config = PostsmithConfig::default();
        config.resolve_paths(dir.path());
        config.generator.max_attempts = 2;
        config.generator.backoff_step_ms = 0;
        config.generator.pacing_ms = 0;
        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn source_dir(&self) -> PathBuf {
        self.config.workspace.source_dir.clone()
    }

    pub fn write_document(&self, name: &str, content: &str) -> PathBuf {
        let path = self.source_dir().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn open_store(&self) -> SledPostStore {
        SledPostStore::open(&self.config.workspace.store_path).unwrap()
    }
}

/// Wire a pipeline over the workspace's cache and store with a scripted
/// provider. The store handle is returned so tests can inspect it; sled
/// allows only one open handle per path.
pub fn build_pipeline(
    workspace: &TestWorkspace,
    provider: Arc<ScriptedProvider>,
) -> (Pipeline, Arc<SledPostStore>) {
    let config = &workspace.config;
    let service = GenerationService::new(provider)
        .with_policy(BackoffPolicy::new(
            config.generator.max_attempts,
            Duration::from_millis(config.generator.backoff_step_ms),
        ))
        .with_pacing(Duration::ZERO);
    let cache = FileCacheStore::new(&config.workspace.cache_dir).unwrap();
    let posts = Arc::new(workspace.open_store());

    let orchestrator = GenerationOrchestrator::new(
        Arc::new(service),
        Arc::new(cache),
        posts.clone(),
        config.quality.gate(),
        config.orchestrator_settings(),
        Arc::new(GenerationBudget::new(config.run.limit)),
    );
    (
        Pipeline::new(Arc::new(orchestrator), config.run.workers),
        posts,
    )
}

/// Outline used across tests: two documents' worth of structure in one.
pub const INTRO_OUTLINE: &str = "---
title: \"Intro course\"
---
# Fundamentals
## Basics
### 1. Weights
Weights scale inputs.
### 2) Biases
Biases shift outputs.
## Training
### Lesson 3: Loss functions
Loss measures error.
";

/// Serializes environment variable changes across tests
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Environment variable state to restore after a test
struct EnvState {
    saved: Vec<(String, Option<String>)>,
}

impl EnvState {
    fn capture(names: &[&str]) -> Self {
        Self {
            saved: names
                .iter()
                .map(|name| (name.to_string(), std::env::var(name).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (name, value) in self.saved {
            match value {
                Some(orig) => std::env::set_var(&name, orig),
                None => std::env::remove_var(&name),
            }
        }
    }
}

/// Run `f` with the given variables set, restoring the previous values
/// afterwards. Holds a global lock so parallel tests don't interleave.
pub fn with_env<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let names: Vec<&str> = vars.iter().map(|(name, _)| *name).collect();
    let env_state = EnvState::capture(&names);
    for (name, value) in vars {
        std::env::set_var(name, value);
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    env_state.restore();
    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// Run `f` with `HOME` and `XDG_CONFIG_HOME` pointing into `test_dir`.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    let config_home = test_dir.path().join("xdg-config");
    std::fs::create_dir_all(&config_home).unwrap();
    with_env(
        &[
            ("HOME", home.to_str().unwrap()),
            ("XDG_CONFIG_HOME", config_home.to_str().unwrap()),
        ],
        f,
    )
}
