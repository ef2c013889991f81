/*!
 * Translation core.
 *
 * This module resolves document texts to translations. It is split into
 * several submodules:
 *
 * - `classifier`: decides which texts are worth translating
 * - `dedup`: collapses repeated texts into unique work items
 * - `cache`: persistent translation cache
 * - `dispatcher`: bounded-concurrency calls to the translation service
 * - `formatting`: whitespace preservation around translated text
 * - `orchestrator`: the per-file pipeline and its statistics
 */

// Re-export main types for easier usage
pub use self::cache::{CacheStats, FlushTask, TranslationCache};
pub use self::classifier::{ClassifierConfig, TextClassifier};
pub use self::dedup::{Collapsed, UniqueWorkItem};
pub use self::dispatcher::{
    DispatchOptions, DispatchOutcome, DispatchStats, Dispatcher, ItemState, ProgressCallback, TranslationResult,
};
pub use self::orchestrator::{FileJob, FileReport, FileState, Orchestrator, Stats};

// Submodules
pub mod cache;
pub mod classifier;
pub mod dedup;
pub mod dispatcher;
pub mod formatting;
pub mod orchestrator;
