use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::{self, Translator};
use crate::translation::{FileJob, FileReport, Orchestrator, ProgressCallback, Stats, TranslationCache};

// @module: Application controller for document translation

/// Outcome of a translate command
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<FileReport>,
    /// Sum of every file's counters
    pub stats: Stats,
    pub succeeded: usize,
    pub failed: usize,
    /// Files left alone because the output already existed
    pub skipped: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    fn from_reports(reports: Vec<FileReport>, skipped: usize, elapsed: Duration) -> Self {
        let mut stats = Stats::default();
        for report in &reports {
            stats.add(&report.stats);
        }
        let succeeded = reports.iter().filter(|r| r.success).count();
        Self { failed: reports.len() - succeeded, succeeded, skipped, stats, reports, elapsed }
    }

    /// True when no file failed
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Shared by every file of a run
    cache: TranslationCache,
    translator: Arc<dyn Translator>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let translator = providers::build_translator(&config.translator)
            .context("Failed to create translation service")?;
        let cache = TranslationCache::from_config(&config.cache);
        Ok(Self::with_components(config, translator, cache))
    }

    // @method: Create a controller around an existing translator and cache
    pub fn with_components(config: Config, translator: Arc<dyn Translator>, cache: TranslationCache) -> Self {
        Self { config, cache, translator }
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_language.is_empty()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    fn orchestrator(&self, progress: Option<ProgressCallback>) -> Orchestrator {
        let orchestrator = Orchestrator::new(self.translator.clone(), self.cache.clone(), self.config.core_settings())
            .with_source_language(self.config.source_language.clone())
            .with_max_file_size_mb(self.config.processor.max_file_size_mb)
            .with_parallel_files(self.config.processor.parallel_files);
        match progress {
            Some(progress) => orchestrator.with_progress(progress),
            None => orchestrator,
        }
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    /// Translate a file or every supported document below a folder
    pub async fn translate(&self, input: PathBuf, output: Option<PathBuf>, force_overwrite: bool) -> Result<RunSummary> {
        let flush_task = self
            .cache
            .start_auto_flush(Duration::from_secs(self.config.cache.flush_interval_secs.max(1)));

        let result = if input.is_dir() {
            self.run_folder(input, output, force_overwrite).await
        } else {
            self.run(input, output, force_overwrite).await
        };

        flush_task.stop();
        if let Err(e) = self.cache.shutdown_async().await {
            warn!("Failed to persist translation cache: {}", e);
        }
        result
    }

    /// Translate a single document.
    ///
    /// `output` is the output file; by default it sits next to the input as
    /// `name.<lang>.ext`.
    pub async fn run(&self, input_file: PathBuf, output: Option<PathBuf>, force_overwrite: bool) -> Result<RunSummary> {
        let start_time = Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let target = &self.config.target_language;
        let output_path = output.unwrap_or_else(|| {
            let dir = input_file.parent().unwrap_or_else(|| Path::new("."));
            FileManager::generate_output_path(&input_file, dir, target)
        });
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {}, translation already exists (use -f to force overwrite)", output_path.display());
            return Ok(RunSummary::from_reports(Vec::new(), 1, start_time.elapsed()));
        }

        let progress_bar = ProgressBar::new(0);
        progress_bar.set_style(Self::bar_style("texts"));
        progress_bar.set_message(
            input_file
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        let bar = progress_bar.clone();
        let progress: ProgressCallback = Arc::new(move |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        });

        let report = self
            .orchestrator(Some(progress))
            .process_file(&input_file, &output_path, target)
            .await;
        progress_bar.finish_and_clear();

        Self::log_report(&report);
        let summary = RunSummary::from_reports(vec![report], 0, start_time.elapsed());
        info!("Translation completed in {}. {}", Self::format_duration(summary.elapsed), summary.stats);
        Ok(summary)
    }

    /// Translate every supported document below `input_dir`.
    ///
    /// Outputs go next to each input, or mirror the tree under `output_dir`.
    /// Files that already look like translations are ignored.
    pub async fn run_folder(&self, input_dir: PathBuf, output_dir: Option<PathBuf>, force_overwrite: bool) -> Result<RunSummary> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let target = self.config.target_language.clone();
        let documents: Vec<PathBuf> = FileManager::find_documents(&input_dir)?
            .into_iter()
            .filter(|path| !Self::is_translation_output(path, &target))
            .collect();
        if documents.is_empty() {
            return Err(anyhow!("No supported documents found in directory: {:?}", input_dir));
        }

        let mut jobs = Vec::with_capacity(documents.len());
        let mut skip_count = 0;
        for document in documents {
            let relative_dir = document
                .parent()
                .and_then(|p| p.strip_prefix(&input_dir).ok())
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let dir = match &output_dir {
                Some(out) => out.join(relative_dir),
                None => document.parent().map(Path::to_path_buf).unwrap_or_else(|| input_dir.clone()),
            };
            let output_path = FileManager::generate_output_path(&document, &dir, &target);
            if output_path.exists() && !force_overwrite {
                warn!("Skipping {}, translation already exists (use -f to force overwrite)", document.display());
                skip_count += 1;
                continue;
            }
            jobs.push(FileJob::new(document, output_path));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(jobs.len() as u64));
        folder_pb.set_style(Self::bar_style("files"));
        folder_pb.set_message("Processing files");

        let reports = self
            .orchestrator(None)
            .process_files_with(&jobs, &target, |report| {
                Self::log_report(report);
                folder_pb.inc(1);
            })
            .await;
        folder_pb.finish_with_message("Folder processing complete");

        let summary = RunSummary::from_reports(reports, skip_count, start_time.elapsed());
        info!(
            "Folder processing completed in {}: {} processed, {} skipped, {} errors",
            Self::format_duration(summary.elapsed),
            summary.succeeded,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    /// `report.fr.xlsx` is the output of `report.xlsx` for target `fr`
    fn is_translation_output(path: &Path, target_language: &str) -> bool {
        let name = path.file_name().map(|n| n.to_string_lossy().to_lowercase()).unwrap_or_default();
        let name = name.strip_suffix(".json").unwrap_or(&name);
        let Some((stem, _ext)) = name.rsplit_once('.') else {
            return false;
        };
        stem.rsplit_once('.')
            .is_some_and(|(_, lang)| language_utils::language_codes_match(lang, target_language))
    }

    fn log_report(report: &FileReport) {
        match &report.error {
            None => info!("Success: {} ({})", report.output.display(), report.stats),
            Some(e) => error!("Error processing file {}: {}", report.input.display(), e),
        }
    }

    // Format duration in a human-readable format (HH:MM:SS)
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
