//! Context selection with token budget enforcement
//!
//! Registered sources are ranked against an analyzed task and packed
//! greedily into a fixed token budget; results are cached per task and
//! source roster.

pub mod adaptive_manager;
pub mod advisory_source;
pub mod cache;
pub mod composer;
pub mod lexicon;
pub mod models;
pub mod ranker;
pub mod source;
pub mod task_analysis;
pub mod token_budget;
pub mod tokenizer;
pub mod weights;

pub use adaptive_manager::{AIContextManager, ContextManagerConfig};
pub use advisory_source::AdvisorySource;
pub use cache::ContextCache;
pub use models::{ContextSelectionResult, RankedSource, SelectedSourceSummary, SourceMetrics};
pub use ranker::{RankingOutcome, SourceRanker};
pub use source::{
    ContextSource, FileSource, FnSource, RegisteredSource, SourceDescriptor, SourceError,
    StaticSource,
};
pub use task_analysis::{Complexity, TaskAnalysis, TaskAnalyzer, TaskType};
pub use token_budget::{BudgetError, TokenBudgetConfig, TokenBudgetManager, MIN_SCORE_THRESHOLD};
pub use tokenizer::{Tokenizer, Truncated};
pub use weights::{RankingWeights, WeightError, WeightOverrides};
