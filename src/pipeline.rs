//! Run driver: documents in order, leaf items within a document either
//! sequentially or through a bounded worker pool, tallied into a
//! [`RunSummary`].

use crate::document::{discover_sources, Document};
use crate::error::PipelineError;
use crate::generation::{GenerationOrchestrator, ItemOutcome, ItemReport};
use crate::outline::extract_leaf_items;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Run-level counters, reported however many items failed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub documents: usize,
    pub documents_without_leaves: usize,
    pub document_errors: usize,
    pub leaf_items: usize,
    pub cache_hits: usize,
    pub generated: usize,
    pub repair_calls: usize,
    pub persisted: usize,
    pub skipped_duplicate: usize,
    pub rejected: usize,
    pub generation_failures: usize,
    pub persist_failures: usize,
    pub deferred: usize,
    pub anomalies: usize,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn record(&mut self, report: &ItemReport) {
        if report.cache_hit {
            self.cache_hits += 1;
        }
        if report.generated {
            self.generated += 1;
        }
        if report.repair_called {
            self.repair_calls += 1;
        }
        match report.outcome {
            ItemOutcome::Persisted { .. } => self.persisted += 1,
            ItemOutcome::SkippedDuplicate => self.skipped_duplicate += 1,
            ItemOutcome::Rejected { .. } => self.rejected += 1,
            ItemOutcome::GenerationFailed { .. } => self.generation_failures += 1,
            ItemOutcome::PersistFailed { .. } => self.persist_failures += 1,
            ItemOutcome::Deferred => self.deferred += 1,
        }
    }

    /// Items that ended in an error rather than a decision.
    pub fn failures(&self) -> usize {
        self.generation_failures + self.persist_failures + self.document_errors
    }
}

pub struct Pipeline {
    orchestrator: Arc<GenerationOrchestrator>,
    workers: usize,
}

impl Pipeline {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>, workers: usize) -> Self {
        Self {
            orchestrator,
            workers: workers.max(1),
        }
    }

    pub fn orchestrator(&self) -> &Arc<GenerationOrchestrator> {
        &self.orchestrator
    }

    /// Process every Markdown document directly under `source_dir`.
    ///
    /// A missing or empty source directory is a configuration fault and
    /// aborts before any item is processed.
    pub async fn run(&self, source_dir: &Path) -> Result<RunSummary, PipelineError> {
        let started = Instant::now();
        let sources = discover_sources(source_dir)?;
        info!(
            source_dir = %source_dir.display(),
            documents = sources.len(),
            workers = self.workers,
            generator = self.orchestrator.generator_id(),
            "Starting generation run"
        );

        let mut summary = RunSummary::default();
        for path in &sources {
            match Document::load(path) {
                Ok(document) => self.process_document(&document, &mut summary).await,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Failed to read source document");
                    summary.documents += 1;
                    summary.document_errors += 1;
                }
            }
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            persisted = summary.persisted,
            skipped_duplicate = summary.skipped_duplicate,
            rejected = summary.rejected,
            generation_failures = summary.generation_failures,
            deferred = summary.deferred,
            elapsed_ms = summary.elapsed_ms,
            "Generation run finished"
        );
        Ok(summary)
    }

    /// Process the leaf items of one document into `summary`.
    pub async fn process_document(&self, document: &Document, summary: &mut RunSummary) {
        summary.documents += 1;
        let items = extract_leaf_items(&document.source_id, &document.body);
        if items.is_empty() {
            info!(source = %document.source_id, "No leaf headings found; skipping document");
            summary.documents_without_leaves += 1;
            return;
        }

        summary.leaf_items += items.len();
        summary.anomalies += items.iter().map(|item| item.anomalies.len()).sum::<usize>();
        info!(source = %document.source_id, items = items.len(), "Processing document");

        let body = document.body.as_str();
        if self.workers == 1 {
            for item in &items {
                let report = self.orchestrator.process(body, item).await;
                summary.record(&report);
            }
        } else {
            let orchestrator: &GenerationOrchestrator = &self.orchestrator;
            let mut reports = stream::iter(items.iter())
                .map(move |item| orchestrator.process(body, item))
                .buffer_unordered(self.workers);
            while let Some(report) = reports.next().await {
                summary.record(&report);
            }
        }
    }
}
