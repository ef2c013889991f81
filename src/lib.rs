/*!
 * # officetrans - Office document translation engine
 *
 * A Rust library that translates office documents while keeping their
 * structure intact.
 *
 * ## Features
 *
 * - Spreadsheets, word processing documents, slide decks and PDF text layers
 * - Skips numbers, e-mails, URLs, formulas and other non-prose strings
 * - Translates each distinct text once, with a persistent cache
 * - Bounded concurrency with retry and exponential backoff
 * - Keeps merged regions, images, run structure and fonts; shrinks fonts and
 *   widens columns when the target language needs more room
 * - Google Translate (public endpoint or Cloud v2)
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Document model, rewriters and the JSON document store
 * - `translation`: Translation core:
 *   - `translation::classifier`: Text classification
 *   - `translation::dedup`: Deduplication of repeated texts
 *   - `translation::cache`: Persistent translation cache
 *   - `translation::dispatcher`: Concurrent calls with retry
 *   - `translation::orchestrator`: Per-file pipeline
 * - `storage`: Durable cache backends (JSON lines journal, SQLite)
 * - `providers`: Translation service clients
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod storage;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, CoreSettings};
pub use document::{Document, DocumentFormat, DocumentRewriter, RewriterRegistry, Segment};
pub use errors::{AppError, CacheError, DocumentError, ProviderError, TranslationError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use providers::Translator;
pub use translation::{FileReport, FileState, Orchestrator, Stats, TranslationCache};
