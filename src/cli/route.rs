//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cache::FileCacheStore;
use crate::cli::output::CommandOutput;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_leaf_items_json, format_leaf_items_text, format_models_json, format_models_text,
    format_posts_json, format_posts_text, format_run_summary_json, format_run_summary_text,
    format_verdict_text,
};
use crate::config::{ConfigLoader, PostsmithConfig};
use crate::document::Document;
use crate::error::PipelineError;
use crate::generation::{GenerationBudget, GenerationOrchestrator};
use crate::outline::extract_leaf_items;
use crate::pipeline::Pipeline;
use crate::provider::{GenerationService, ModelProviderClient, ProviderFactory};
use crate::quality::word_count;
use crate::store::{PostStore, SledPostStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Per-invocation overrides of the `run` command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub dry_run: bool,
    pub limit: Option<usize>,
    pub min_words: Option<usize>,
    pub no_repair: bool,
    pub workers: Option<usize>,
    pub skip_existing: bool,
}

impl RunOverrides {
    /// Apply flags on top of the loaded configuration.
    pub fn apply(&self, config: &mut PostsmithConfig) {
        if let Some(model) = &self.model {
            config.generator.model = model.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.generator.endpoint = Some(endpoint.clone());
        }
        if self.dry_run {
            config.run.dry_run = true;
        }
        if let Some(limit) = self.limit {
            config.run.limit = limit;
        }
        if let Some(min_words) = self.min_words {
            config.quality.min_words = min_words;
        }
        if self.no_repair {
            config.quality.repair = false;
        }
        if let Some(workers) = self.workers {
            config.run.workers = workers;
        }
        if self.skip_existing {
            config.run.skip_existing = true;
        }
    }
}

/// Runtime context for CLI execution: workspace and resolved configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: PostsmithConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, PipelineError> {
        let mut config = match config_path {
            Some(ref cfg_path) => ConfigLoader::load_from_file(cfg_path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        config.resolve_paths(&workspace_root);
        Ok(Self::with_config(workspace_root, config))
    }

    /// Context over an already resolved configuration.
    pub fn with_config(workspace_root: PathBuf, config: PostsmithConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn config(&self) -> &PostsmithConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, PipelineError> {
        let started = Instant::now();
        debug!(command = command.name(), "Executing command");
        let result = self.execute_inner(command);
        debug!(
            command = command.name(),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<CommandOutput, PipelineError> {
        match command {
            Commands::Run {
                model,
                endpoint,
                dry_run,
                limit,
                min_words,
                no_repair,
                workers,
                skip_existing,
                format,
            } => {
                let overrides = RunOverrides {
                    model: model.clone(),
                    endpoint: endpoint.clone(),
                    dry_run: *dry_run,
                    limit: *limit,
                    min_words: *min_words,
                    no_repair: *no_repair,
                    workers: *workers,
                    skip_existing: *skip_existing,
                };
                self.handle_run(&overrides, format)
            }
            Commands::Outline { file, format } => self.handle_outline(file, format),
            Commands::Check {
                file,
                min_words,
                title,
            } => self.handle_check(file, *min_words, title.as_deref()),
            Commands::Posts {
                category,
                limit,
                format,
            } => self.handle_posts(category.as_deref(), *limit, format),
            Commands::Models { format } => self.handle_models(format),
        }
    }

    fn handle_run(&self, overrides: &RunOverrides, format: &str) -> Result<CommandOutput, PipelineError> {
        let mut config = self.config.clone();
        overrides.apply(&mut config);
        config.ensure_valid()?;

        let pipeline = build_pipeline(&config)?;
        let runtime = new_runtime()?;
        let summary = runtime.block_on(pipeline.run(&config.workspace.source_dir))?;

        let text = if format == "json" {
            format_run_summary_json(&summary, config.run.dry_run)?
        } else {
            format_run_summary_text(&summary, config.run.dry_run)
        };
        Ok(CommandOutput::success(text))
    }

    fn handle_outline(&self, file: &Path, format: &str) -> Result<CommandOutput, PipelineError> {
        let document = Document::load(&self.resolve(file))?;
        let items = extract_leaf_items(&document.source_id, &document.body);
        let text = if format == "json" {
            format_leaf_items_json(&items)?
        } else {
            format_leaf_items_text(&document.source_id, &items)
        };
        Ok(CommandOutput::success(text))
    }

    fn handle_check(
        &self,
        file: &Path,
        min_words: Option<usize>,
        title: Option<&str>,
    ) -> Result<CommandOutput, PipelineError> {
        let path = self.resolve(file);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            PipelineError::StorageError(crate::error::StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read {:?}: {}", path, e),
            )))
        })?;

        let mut gate = self.config.quality.gate();
        if let Some(min_words) = min_words {
            gate.min_words = min_words;
        }
        if title.is_some() {
            gate.require_title_match = true;
        }
        let verdict = gate.evaluate_titled(&content, title);
        let text = format_verdict_text(&verdict, word_count(&content));
        Ok(if verdict.accepted {
            CommandOutput::success(text)
        } else {
            CommandOutput::failure(text)
        })
    }

    fn handle_posts(
        &self,
        category: Option<&str>,
        limit: usize,
        format: &str,
    ) -> Result<CommandOutput, PipelineError> {
        let store = open_post_store(&self.config.workspace.store_path)?;
        let posts = match category {
            Some(category) => store.list_by_category(category, limit)?,
            None => store.list_recent(limit)?,
        };
        let text = if format == "json" {
            format_posts_json(&posts)?
        } else {
            format_posts_text(&posts)
        };
        Ok(CommandOutput::success(text))
    }

    fn handle_models(&self, format: &str) -> Result<CommandOutput, PipelineError> {
        self.config.generator.validate().map_err(PipelineError::ConfigError)?;
        let client = build_client(&self.config)?;
        let runtime = new_runtime()?;
        let models = runtime.block_on(client.list_models())?;
        let provider = client.provider_name();
        let text = if format == "json" {
            format_models_json(provider, &models)?
        } else {
            format_models_text(provider, &models)
        };
        Ok(CommandOutput::success(text))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            self.workspace_root.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

fn new_runtime() -> Result<Runtime, PipelineError> {
    Runtime::new().map_err(|e| PipelineError::ConfigError(format!("Failed to create async runtime: {}", e)))
}

fn build_client(config: &PostsmithConfig) -> Result<Arc<dyn ModelProviderClient>, PipelineError> {
    let client = ProviderFactory::create_client(
        &config.generator.to_model_provider(),
        config.generator.request_timeout(),
    )?;
    Ok(Arc::from(client))
}

/// Open the post store; failure is a configuration fault.
fn open_post_store(path: &Path) -> Result<SledPostStore, PipelineError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            PipelineError::ConfigError(format!("Failed to create store directory {:?}: {}", parent, e))
        })?;
    }
    SledPostStore::open(path).map_err(|e| PipelineError::ConfigError(e.to_string()))
}

/// Wire cache, post store, generation service and orchestrator for a run.
pub fn build_pipeline(config: &PostsmithConfig) -> Result<Pipeline, PipelineError> {
    let cache = FileCacheStore::new(&config.workspace.cache_dir)
        .map_err(|e| PipelineError::ConfigError(e.to_string()))?;
    let posts = open_post_store(&config.workspace.store_path)?;

    let service = GenerationService::new(build_client(config)?)
        .with_policy(config.generator.backoff_policy())
        .with_request_timeout(config.generator.request_timeout())
        .with_pacing(config.generator.pacing())
        .with_options(config.generator.completion_options());

    info!(
        model = %config.generator.model,
        provider = service.provider_name(),
        cache_dir = %config.workspace.cache_dir.display(),
        store_path = %config.workspace.store_path.display(),
        dry_run = config.run.dry_run,
        limit = config.run.limit,
        min_words = config.quality.min_words,
        repair = config.quality.repair,
        "Pipeline configured"
    );

    let orchestrator = GenerationOrchestrator::new(
        Arc::new(service),
        Arc::new(cache),
        Arc::new(posts),
        config.quality.gate(),
        config.orchestrator_settings(),
        Arc::new(GenerationBudget::new(config.run.limit)),
    );
    Ok(Pipeline::new(Arc::new(orchestrator), config.run.workers))
}
