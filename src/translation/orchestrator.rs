/*!
 * Per-file translation pipeline.
 *
 * A file moves through `Loaded → Extracted → Classified → Deduplicated →
 * Dispatched → Applied → Saved`, or ends in `Failed`. The rewrite happens on
 * the loaded in-memory document, never on the input file, and the result is
 * written out only when every stage succeeded unless partial saves are
 * allowed.
 */

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::cache::TranslationCache;
use super::classifier::TextClassifier;
use super::dedup;
use super::dispatcher::{DispatchOptions, Dispatcher, ProgressCallback};
use crate::app_config::CoreSettings;
use crate::document::{
    Document, DocumentStore, JsonDocumentStore, RewriteContext, RewriteReport, RewriterRegistry,
    Segment, SegmentId,
};
use crate::errors::{DocumentError, TranslationError};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::Translator;

/// Progress of one file through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileState {
    Pending,
    Loaded,
    Extracted,
    Classified,
    Deduplicated,
    Dispatched,
    Applied,
    Saved,
    Failed,
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Loaded => "loaded",
            Self::Extracted => "extracted",
            Self::Classified => "classified",
            Self::Deduplicated => "deduplicated",
            Self::Dispatched => "dispatched",
            Self::Applied => "applied",
            Self::Saved => "saved",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Counters of one file, or of a whole run when summed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Segments extracted
    pub segments_total: usize,
    /// Segments the classifier accepted
    pub translatable: usize,
    /// Distinct translatable texts
    pub unique: usize,
    /// Distinct texts translated by the service
    pub translated: usize,
    /// Distinct texts served from the cache
    pub cache_hits: usize,
    /// Distinct texts that kept their original
    pub failed: usize,
    /// Segments rejected as malformed
    pub skipped: usize,
}

impl Stats {
    pub fn add(&mut self, other: &Stats) {
        self.segments_total += other.segments_total;
        self.translatable += other.translatable;
        self.unique += other.unique;
        self.translated += other.translated;
        self.cache_hits += other.cache_hits;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} segments, {} translatable, {} unique, {} translated, {} cached, {} failed, {} skipped",
            self.segments_total,
            self.translatable,
            self.unique,
            self.translated,
            self.cache_hits,
            self.failed,
            self.skipped
        )
    }
}

/// Outcome of one file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub success: bool,
    /// `Saved` on success, `Failed` otherwise
    pub state: FileState,
    /// Last stage completed before a failure
    pub reached: FileState,
    pub stats: Stats,
    pub rewrite: RewriteReport,
    pub error: Option<String>,
    /// Whether an output file was written
    pub saved: bool,
    pub elapsed: Duration,
}

/// Input and output of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl FileJob {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(input: P, output: Q) -> Self {
        Self { input: input.into(), output: output.into() }
    }
}

/// Mutable state of one pass
struct Pass {
    reached: FileState,
    stats: Stats,
    working: Option<Document>,
    rewrite: RewriteReport,
}

impl Pass {
    fn new() -> Self {
        Self { reached: FileState::Pending, stats: Stats::default(), working: None, rewrite: RewriteReport::default() }
    }

    fn advance(&mut self, state: FileState) {
        debug!("File state: {} -> {}", self.reached, state);
        self.reached = state;
    }
}

/// Composes classifier, deduplicator, dispatcher and rewriters
pub struct Orchestrator {
    registry: Arc<RewriterRegistry>,
    store: Arc<dyn DocumentStore>,
    cache: TranslationCache,
    translator: Arc<dyn Translator>,
    settings: CoreSettings,
    classifier: TextClassifier,
    source_language: String,
    max_file_size_mb: u64,
    parallel_files: usize,
    progress: Option<ProgressCallback>,
}

impl Orchestrator {
    pub fn new(translator: Arc<dyn Translator>, cache: TranslationCache, settings: CoreSettings) -> Self {
        Self {
            registry: Arc::new(RewriterRegistry::with_defaults()),
            store: Arc::new(JsonDocumentStore::new()),
            cache,
            translator,
            settings,
            classifier: TextClassifier::default(),
            source_language: language_utils::AUTO_DETECT.to_string(),
            max_file_size_mb: 100,
            parallel_files: 2,
            progress: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_registry(mut self, registry: RewriterRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_classifier(mut self, classifier: TextClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_source_language(mut self, source_language: impl Into<String>) -> Self {
        self.source_language = source_language.into();
        self
    }

    pub fn with_max_file_size_mb(mut self, max_file_size_mb: u64) -> Self {
        self.max_file_size_mb = max_file_size_mb;
        self
    }

    pub fn with_parallel_files(mut self, parallel_files: usize) -> Self {
        self.parallel_files = parallel_files.max(1);
        self
    }

    /// Report dispatch progress as `(done, total)` per file
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.settings
    }

    fn dispatcher(&self) -> Dispatcher {
        let dispatcher = Dispatcher::new(
            self.translator.clone(),
            self.cache.clone(),
            DispatchOptions::from_settings(&self.settings),
        );
        match &self.progress {
            Some(progress) => dispatcher.with_progress(progress.clone()),
            None => dispatcher,
        }
    }

    /// Translate one document.
    ///
    /// Never fails: errors are recorded in the report.
    pub async fn process_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q, target_language: &str) -> FileReport {
        let (input, output) = (input.as_ref(), output.as_ref());
        let started = Instant::now();
        let mut pass = Pass::new();

        info!("Translating {} to {}", input.display(), target_language);
        let result = self.run(input, output, target_language, &mut pass).await;

        let mut saved = result.is_ok();
        let error = match result {
            Ok(()) => None,
            Err(e) => {
                error!("Failed to translate {} after stage '{}': {}", input.display(), pass.reached, e);
                if self.settings.allow_partial_save {
                    saved = self.save_partial(&pass, output);
                }
                Some(e.to_string())
            }
        };

        if let Err(e) = self.cache.flush_async().await {
            warn!("Cache flush after {} failed: {}", input.display(), e);
        }

        let success = error.is_none();
        if success {
            info!("Translated {} ({})", input.display(), pass.stats);
        }
        FileReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            success,
            state: if success { FileState::Saved } else { FileState::Failed },
            reached: pass.reached,
            stats: pass.stats,
            rewrite: pass.rewrite,
            error,
            saved,
            elapsed: started.elapsed(),
        }
    }

    async fn run(&self, input: &Path, output: &Path, target_language: &str, pass: &mut Pass) -> Result<(), TranslationError> {
        let rewriter = self.registry.for_path(input)?;
        FileManager::validate_input(input, self.max_file_size_mb)?;
        let document = self.store.open(input)?;
        pass.advance(FileState::Loaded);

        let segments = rewriter.extract(&document)?;
        pass.working = Some(document);
        pass.stats.segments_total = segments.len();
        pass.advance(FileState::Extracted);

        let translatable = self.classify_segments(&segments, &mut pass.stats);
        pass.advance(FileState::Classified);

        let texts: Vec<&str> = translatable.iter().map(|s| s.text.as_str()).collect();
        let collapsed = dedup::collapse(&texts);
        pass.stats.unique = collapsed.len();
        pass.advance(FileState::Deduplicated);

        let outcome = self
            .dispatcher()
            .resolve(&collapsed.unique_texts(), &self.source_language, target_language)
            .await?;
        pass.stats.translated = outcome.stats.translated;
        pass.stats.cache_hits = outcome.stats.cache_hits;
        pass.stats.failed = outcome.stats.failed;
        pass.advance(FileState::Dispatched);

        let translated_unique: Vec<String> = collapsed
            .items
            .iter()
            .map(|item| outcome.text_for(&item.text).to_string())
            .collect();
        let per_segment = dedup::expand(&translated_unique, &collapsed.index_of);
        let translations: HashMap<SegmentId, String> = translatable
            .iter()
            .zip(per_segment)
            .map(|(segment, text)| (segment.id, text))
            .collect();

        let ctx = RewriteContext::new(&self.settings, target_language);
        if let Some(working) = pass.working.as_mut() {
            pass.rewrite = rewriter.apply(working, &segments, &translations, &ctx)?;
        }
        pass.advance(FileState::Applied);

        if let Some(working) = &pass.working {
            self.save(working, output)?;
        }
        pass.advance(FileState::Saved);
        Ok(())
    }

    /// Segments the classifier accepts; malformed ones are counted as skipped
    fn classify_segments<'a>(&self, segments: &'a [Segment], stats: &mut Stats) -> Vec<&'a Segment> {
        let mut translatable = Vec::with_capacity(segments.len());
        for segment in segments {
            match self.classifier.classify(&segment.text) {
                Ok(true) => translatable.push(segment),
                Ok(false) => {}
                Err(e) => {
                    debug!("Skipping {}: {}", segment.locator, e);
                    stats.skipped += 1;
                }
            }
        }
        stats.translatable = translatable.len();
        translatable
    }

    fn save(&self, document: &Document, output: &Path) -> Result<(), DocumentError> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.store.save(document, output)
    }

    fn save_partial(&self, pass: &Pass, output: &Path) -> bool {
        let Some(working) = pass.working.as_ref() else {
            return false;
        };
        match self.save(working, output) {
            Ok(()) => {
                warn!("Saved partial result to {}", output.display());
                true
            }
            Err(e) => {
                error!("Could not save partial result to {}: {}", output.display(), e);
                false
            }
        }
    }

    /// Translate plain strings in order.
    ///
    /// Texts the classifier rejects come back unchanged.
    pub async fn translate_texts(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, TranslationError> {
        let translatable: Vec<usize> = (0..texts.len())
            .filter(|&i| self.classifier.should_translate(&texts[i]))
            .collect();
        let selected: Vec<&str> = translatable.iter().map(|&i| texts[i].as_str()).collect();
        let collapsed = dedup::collapse(&selected);

        let outcome = self
            .dispatcher()
            .resolve(&collapsed.unique_texts(), source_language, target_language)
            .await?;
        let translated_unique: Vec<String> = collapsed
            .items
            .iter()
            .map(|item| outcome.text_for(&item.text).to_string())
            .collect();

        let mut result = texts.to_vec();
        for (i, text) in translatable.into_iter().zip(dedup::expand(&translated_unique, &collapsed.index_of)) {
            result[i] = text;
        }
        Ok(result)
    }

    /// Run independent files concurrently; reports come back in job order.
    ///
    /// Files share only the cache, and one failure never stops the others.
    pub async fn process_files(&self, jobs: &[FileJob], target_language: &str) -> Vec<FileReport> {
        self.process_files_with(jobs, target_language, |_| {}).await
    }

    /// Like [`Self::process_files`], calling `on_done` as each file finishes
    pub async fn process_files_with<F>(&self, jobs: &[FileJob], target_language: &str, on_done: F) -> Vec<FileReport>
    where
        F: Fn(&FileReport),
    {
        let mut reports: Vec<(usize, FileReport)> = stream::iter(jobs.iter().enumerate())
            .map(|(index, job)| async move {
                (index, self.process_file(&job.input, &job.output, target_language).await)
            })
            .buffer_unordered(self.parallel_files)
            .inspect(|(_, report)| on_done(report))
            .collect()
            .await;
        reports.sort_by_key(|(index, _)| *index);

        let failed = reports.iter().filter(|(_, r)| !r.success).count();
        if failed > 0 {
            warn!("{} of {} files failed", failed, jobs.len());
        }
        reports.into_iter().map(|(_, report)| report).collect()
    }
}
