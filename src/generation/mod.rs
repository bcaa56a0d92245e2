//! Generation orchestration: the per-leaf state machine and its outcomes.

pub mod orchestrator;

pub use orchestrator::GenerationOrchestrator;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// States a leaf item moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    CacheCheck,
    CacheHitValid,
    CacheMiss,
    Generating,
    QualityCheck,
    Accepted,
    NeedsRepair,
    Repairing,
    QualityRecheck,
    Rejected,
    Persist,
    SkipDuplicate,
    RejectedFinal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::CacheCheck => "cache_check",
            Stage::CacheHitValid => "cache_hit_valid",
            Stage::CacheMiss => "cache_miss",
            Stage::Generating => "generating",
            Stage::QualityCheck => "quality_check",
            Stage::Accepted => "accepted",
            Stage::NeedsRepair => "needs_repair",
            Stage::Repairing => "repairing",
            Stage::QualityRecheck => "quality_recheck",
            Stage::Rejected => "rejected",
            Stage::Persist => "persist",
            Stage::SkipDuplicate => "skip_duplicate",
            Stage::RejectedFinal => "rejected_final",
        };
        f.write_str(name)
    }
}

/// Terminal result for one leaf item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Persisted {
        from_cache: bool,
        repaired: bool,
        dry_run: bool,
    },
    SkippedDuplicate,
    Rejected {
        reason: String,
    },
    GenerationFailed {
        error: String,
    },
    /// The post store failed while checking or inserting
    PersistFailed {
        error: String,
    },
    /// Run generation budget exhausted before this item needed a call
    Deferred,
}

impl ItemOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ItemOutcome::Persisted { dry_run: true, .. } => "persisted (dry run)",
            ItemOutcome::Persisted { .. } => "persisted",
            ItemOutcome::SkippedDuplicate => "skipped duplicate",
            ItemOutcome::Rejected { .. } => "rejected",
            ItemOutcome::GenerationFailed { .. } => "generation failed",
            ItemOutcome::PersistFailed { .. } => "persist failed",
            ItemOutcome::Deferred => "deferred",
        }
    }
}

/// What happened to one item, with the work it caused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    pub title: String,
    pub category: String,
    pub outcome: ItemOutcome,
    /// A cached attempt passed the gate and no generation was needed
    pub cache_hit: bool,
    /// The generator was invoked for this item
    pub generated: bool,
    /// The single repair call was issued
    pub repair_called: bool,
}

/// Orchestrator switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub repair: bool,
    pub dry_run: bool,
    pub skip_existing: bool,
    pub context_max_chars: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            repair: true,
            dry_run: false,
            skip_existing: false,
            context_max_chars: crate::window::DEFAULT_MAX_CHARS,
        }
    }
}

/// Run-wide cap on items that may invoke the generator; 0 means unlimited.
#[derive(Debug, Default)]
pub struct GenerationBudget {
    limit: usize,
    reserved: AtomicUsize,
}

impl GenerationBudget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            reserved: AtomicUsize::new(0),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Reserve one unit; false once the limit is reached.
    pub fn try_reserve(&self) -> bool {
        if self.limit == 0 {
            self.reserved.fetch_add(1, Ordering::SeqCst);
            return true;
        }
        self.reserved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .is_ok()
    }

    pub fn reserved(&self) -> usize {
        self.reserved.load(Ordering::SeqCst)
    }
}
