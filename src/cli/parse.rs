//! CLI parse: clap types for postsmith. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Postsmith CLI - quality-gated article generation from Markdown outlines
#[derive(Parser, Debug)]
#[command(name = "postsmith")]
#[command(version)]
#[command(about = "Generate one article per ### heading of Markdown outlines, cached and deduplicated")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate articles for every leaf heading in the source directory
    Run {
        /// Model name (generator identity)
        #[arg(long)]
        model: Option<String>,
        /// Provider endpoint URL (Ollama base, /api/chat or /api/generate)
        #[arg(long)]
        endpoint: Option<String>,
        /// Run everything except writes to the post store
        #[arg(long)]
        dry_run: bool,
        /// Maximum items that may call the generator (0 = unlimited)
        #[arg(long)]
        limit: Option<usize>,
        /// Minimum approximate word count for the quality gate
        #[arg(long)]
        min_words: Option<usize>,
        /// Disable the single repair attempt
        #[arg(long)]
        no_repair: bool,
        /// Concurrent items per document
        #[arg(long)]
        workers: Option<usize>,
        /// Skip items already persisted before any cache or generator work
        #[arg(long)]
        skip_existing: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the leaf items extracted from one outline document
    Outline {
        /// Markdown outline file
        file: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Run the quality gate on a Markdown article (exit status 1 on rejection)
    Check {
        /// Markdown article file
        file: PathBuf,
        /// Minimum approximate word count (defaults to the configured value)
        #[arg(long)]
        min_words: Option<usize>,
        /// Expected title; enables the title match check
        #[arg(long)]
        title: Option<String>,
    },
    /// List persisted posts, newest first
    Posts {
        /// Only posts of this exact category
        #[arg(long)]
        category: Option<String>,
        /// Maximum posts to list
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List models reported by the configured provider
    Models {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

impl Commands {
    /// Command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Run { .. } => "run",
            Commands::Outline { .. } => "outline",
            Commands::Check { .. } => "check",
            Commands::Posts { .. } => "posts",
            Commands::Models { .. } => "models",
        }
    }
}
