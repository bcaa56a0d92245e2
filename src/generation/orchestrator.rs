//! Per-leaf generation state machine
//!
//! Cache lookup, generation, quality check, at most one repair, cache
//! write, then the dedupe-and-persist decision. Failures end the item, never
//! the run.

use crate::cache::{CacheKey, CacheRecord, CacheStore};
use crate::concurrency::KeyLockManager;
use crate::error::StorageError;
use crate::generation::{GenerationBudget, ItemOutcome, ItemReport, OrchestratorSettings, Stage};
use crate::outline::LeafItem;
use crate::prompt::{generation_prompt, repair_prompt};
use crate::provider::GenerationService;
use crate::quality::{QualityGate, REASON_OK};
use crate::store::{NewPost, PostStore};
use crate::window::window_for;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Final attempt for an item, as written to the cache
struct Attempt {
    content: String,
    accepted: bool,
    reason: String,
    repaired: bool,
}

pub struct GenerationOrchestrator {
    generator: Arc<GenerationService>,
    cache: Arc<dyn CacheStore>,
    posts: Arc<dyn PostStore>,
    gate: QualityGate,
    settings: OrchestratorSettings,
    budget: Arc<GenerationBudget>,
    locks: KeyLockManager,
}

impl GenerationOrchestrator {
    pub fn new(
        generator: Arc<GenerationService>,
        cache: Arc<dyn CacheStore>,
        posts: Arc<dyn PostStore>,
        gate: QualityGate,
        settings: OrchestratorSettings,
        budget: Arc<GenerationBudget>,
    ) -> Self {
        Self {
            generator,
            cache,
            posts,
            gate,
            settings,
            budget,
            locks: KeyLockManager::new(),
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn gate(&self) -> &QualityGate {
        &self.gate
    }

    pub fn generator_id(&self) -> &str {
        self.generator.generator_id()
    }

    fn enter(item: &LeafItem, stage: Stage) {
        debug!(
            title = %item.title,
            category = %item.category,
            stage = %stage,
            "Orchestrator transition"
        );
    }

    /// Drive one leaf item to a terminal outcome.
    ///
    /// `body` is the document body the item was extracted from; it is only
    /// read to build the context window on a cache miss.
    pub async fn process(&self, body: &str, item: &LeafItem) -> ItemReport {
        let mut report = ItemReport {
            title: item.title.clone(),
            category: item.category.clone(),
            outcome: ItemOutcome::Deferred,
            cache_hit: false,
            generated: false,
            repair_called: false,
        };

        Self::enter(item, Stage::Start);
        if self.settings.skip_existing {
            match self.posts.exists(&item.title, &item.category) {
                Ok(true) => {
                    Self::enter(item, Stage::SkipDuplicate);
                    report.outcome = ItemOutcome::SkippedDuplicate;
                    return report;
                }
                Ok(false) => {}
                Err(err) => {
                    report.outcome = persist_failed(item, err);
                    return report;
                }
            }
        }

        Self::enter(item, Stage::CacheCheck);
        let key = CacheKey::for_item(item, self.generator.generator_id());
        let _guard = self.locks.lock(key).await;

        if let Some(record) = self.lookup_valid(&key, item) {
            Self::enter(item, Stage::CacheHitValid);
            report.cache_hit = true;
            report.outcome = self.persist(item, record.content, true, record.repaired);
            return report;
        }

        Self::enter(item, Stage::CacheMiss);
        if !self.budget.try_reserve() {
            debug!(title = %item.title, "Generation budget exhausted; deferring item");
            report.outcome = ItemOutcome::Deferred;
            return report;
        }

        report.generated = true;
        let attempt = match self.generate(body, item, &key, &mut report).await {
            Ok(attempt) => attempt,
            Err(error) => {
                warn!(
                    source = %item.source_id,
                    title = %item.title,
                    category = %item.category,
                    error = %error,
                    "Generation failed; skipping item"
                );
                report.outcome = ItemOutcome::GenerationFailed { error };
                return report;
            }
        };

        self.write_cache(&key, item, &attempt);

        if !attempt.accepted {
            Self::enter(item, Stage::RejectedFinal);
            info!(
                source = %item.source_id,
                title = %item.title,
                category = %item.category,
                reason = %attempt.reason,
                "Article rejected"
            );
            report.outcome = ItemOutcome::Rejected {
                reason: attempt.reason,
            };
            return report;
        }

        report.outcome = self.persist(item, attempt.content, false, attempt.repaired);
        report
    }

    /// Cached record for `key` if it still passes the gate.
    fn lookup_valid(&self, key: &CacheKey, item: &LeafItem) -> Option<CacheRecord> {
        let record = match self.cache.lookup(key) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %key, title = %item.title, error = %err, "Unusable cache record; treating as miss");
                return None;
            }
        };

        let verdict = self.gate.evaluate_titled(&record.content, Some(&item.title));
        if verdict.accepted {
            Some(record)
        } else {
            debug!(
                title = %item.title,
                reason = %verdict.reason,
                "Cached attempt fails the gate; regenerating"
            );
            None
        }
    }

    /// Generation with at most one repair. `Err` carries the generator
    /// failure message; a failed repair call still caches the first attempt.
    async fn generate(
        &self,
        body: &str,
        item: &LeafItem,
        key: &CacheKey,
        report: &mut ItemReport,
    ) -> Result<Attempt, String> {
        Self::enter(item, Stage::Generating);
        let context = window_for(body, item, self.settings.context_max_chars);
        let prompt = generation_prompt(&context, &item.category, &item.title, &self.gate.required_sections);
        let content = self
            .generator
            .generate(&prompt.system, &prompt.user)
            .await
            .map_err(|e| e.to_string())?;

        Self::enter(item, Stage::QualityCheck);
        let verdict = self.gate.evaluate_titled(&content, Some(&item.title));
        if verdict.accepted {
            Self::enter(item, Stage::Accepted);
            return Ok(Attempt {
                content,
                accepted: true,
                reason: REASON_OK.to_string(),
                repaired: false,
            });
        }

        if !(self.settings.repair && verdict.is_repairable()) {
            Self::enter(item, Stage::Rejected);
            return Ok(Attempt {
                content,
                accepted: false,
                reason: verdict.reason,
                repaired: false,
            });
        }

        Self::enter(item, Stage::NeedsRepair);
        Self::enter(item, Stage::Repairing);
        report.repair_called = true;
        let repair = repair_prompt(&content, &item.title, &verdict.reason, &self.gate.required_sections);
        let repaired = match self.generator.generate(&repair.system, &repair.user).await {
            Ok(text) => text,
            Err(err) => {
                let first = Attempt {
                    content,
                    accepted: false,
                    reason: verdict.reason,
                    repaired: false,
                };
                self.write_cache(key, item, &first);
                return Err(format!("repair failed: {}", err));
            }
        };

        Self::enter(item, Stage::QualityRecheck);
        let second = self.gate.evaluate_titled(&repaired, Some(&item.title));
        if second.accepted {
            Self::enter(item, Stage::Accepted);
            Ok(Attempt {
                content: repaired,
                accepted: true,
                reason: REASON_OK.to_string(),
                repaired: true,
            })
        } else {
            Self::enter(item, Stage::Rejected);
            Ok(Attempt {
                content: repaired,
                accepted: false,
                reason: format!("{} | repair failed: {}", verdict.reason, second.reason),
                repaired: true,
            })
        }
    }

    fn write_cache(&self, key: &CacheKey, item: &LeafItem, attempt: &Attempt) {
        let record = CacheRecord::new(
            item,
            self.generator.generator_id(),
            attempt.content.clone(),
            attempt.accepted,
            attempt.reason.clone(),
            attempt.repaired,
        );
        if let Err(err) = self.cache.write(key, &record) {
            warn!(key = %key, title = %item.title, error = %err, "Failed to write cache record");
        }
    }

    fn persist(&self, item: &LeafItem, content: String, from_cache: bool, repaired: bool) -> ItemOutcome {
        Self::enter(item, Stage::Persist);
        match self.posts.exists(&item.title, &item.category) {
            Ok(true) => {
                Self::enter(item, Stage::SkipDuplicate);
                return ItemOutcome::SkippedDuplicate;
            }
            Ok(false) => {}
            Err(err) => return persist_failed(item, err),
        }

        if self.settings.dry_run {
            info!(title = %item.title, category = %item.category, "Dry run; not persisting");
            return ItemOutcome::Persisted {
                from_cache,
                repaired,
                dry_run: true,
            };
        }

        match self.posts.insert(NewPost::new(&item.title, content, &item.category)) {
            Ok(record) => {
                info!(
                    id = record.id,
                    title = %item.title,
                    category = %item.category,
                    from_cache,
                    repaired,
                    "Post persisted"
                );
                ItemOutcome::Persisted {
                    from_cache,
                    repaired,
                    dry_run: false,
                }
            }
            Err(StorageError::DuplicateKey { .. }) => {
                Self::enter(item, Stage::SkipDuplicate);
                ItemOutcome::SkippedDuplicate
            }
            Err(err) => persist_failed(item, err),
        }
    }
}

fn persist_failed(item: &LeafItem, err: StorageError) -> ItemOutcome {
    warn!(title = %item.title, category = %item.category, error = %err, "Post store failure");
    ItemOutcome::PersistFailed {
        error: err.to_string(),
    }
}
