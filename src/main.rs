// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info};
use std::io::Write;
use std::path::PathBuf;

use officetrans::app_config::{Config, LogLevel, TranslatorKind};
use officetrans::app_controller::Controller;
use officetrans::translation::TranslationCache;

/// CLI Wrapper for TranslatorKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslator {
    Google,
    GoogleCloud,
}

impl From<CliTranslator> for TranslatorKind {
    fn from(cli_translator: CliTranslator) -> Self {
        match cli_translator {
            CliTranslator::Google => TranslatorKind::Google,
            CliTranslator::GoogleCloud => TranslatorKind::GoogleCloud,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Translate a document or every document below a folder
    Translate(TranslateArgs),

    /// Inspect or maintain the translation cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,

        /// Configuration file path
        #[arg(short, long, default_value = "officetrans.json")]
        config_path: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Subcommand)]
enum CacheAction {
    /// Show entry count and cache location
    Stats,
    /// Remove every cached translation
    Clear,
    /// Keep only the most recently used entries
    Prune {
        /// Entries to keep, defaults to cache.max_entries
        #[arg(long)]
        max: Option<usize>,
    },
}

#[derive(Debug, Clone, clap::Args)]
struct TranslateArgs {
    /// Input document or directory
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output file, or output directory in folder mode
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translation service to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslator>,

    /// Source language code (e.g., 'en', 'zh', or 'auto')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Concurrent requests to the translation service
    #[arg(short = 'w', long)]
    max_workers: Option<usize>,

    /// Do not read or write the translation cache
    #[arg(long)]
    no_cache: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "officetrans.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
#[command(
    name = "officetrans",
    args_conflicts_with_subcommands = true,
    author,
    version,
    about = "Translate office documents while keeping their layout",
    long_about = "officetrans translates spreadsheets, word processing documents, slide decks and PDF text layers.
Numbers, e-mails, URLs and formulas are left alone, each distinct text is translated once, and
translations are cached between runs. Merged cells, images, run styles and fonts survive the rewrite.

EXAMPLES:
    officetrans report.xlsx.json -t en
    officetrans translate report.xlsx.json -t en
    officetrans translate ./documents -t fr -o ./translated
    officetrans translate deck.pptx.json -p google-cloud -w 8
    officetrans cache stats
    officetrans cache prune --max 10000
    officetrans completions bash > officetrans.bash

CONFIGURATION:
    Settings are read from officetrans.json (created with defaults when missing).
    OFFICETRANS_* environment variables override the file, and command line options override both.
    The Cloud API key is read from OFFICETRANS_API_KEY or GOOGLE_TRANSLATE_API_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    // Without a subcommand the top-level arguments are a translate invocation
    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and marker for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "✖"),
            Level::Warn => ("\x1B[1;33m", "!"),
            Level::Info => ("\x1B[1;32m", " "),
            Level::Debug => ("\x1B[1;36m", "·"),
            Level::Trace => ("\x1B[1;35m", "…"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (color, marker) = Self::style_for_level(record.level());
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, marker, record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();
    let outcome = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "officetrans", &mut std::io::stdout());
            Ok(true)
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        Some(Commands::Cache { action, config_path }) => run_cache(action, config_path),
        None => run_translate(cli.translate).await,
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

fn apply_log_level(level: &LogLevel) {
    log::set_max_level(level.to_level_filter());
}

/// Returns whether every file was translated
async fn run_translate(options: TranslateArgs) -> Result<bool> {
    if let Some(level) = &options.log_level {
        apply_log_level(&level.clone().into());
    }

    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(provider) = &options.provider {
        config.translator.provider = provider.clone().into();
    }
    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(max_workers) = options.max_workers {
        config.translator.max_workers = max_workers;
    }
    if options.no_cache {
        config.cache.enabled = false;
    }
    if let Some(level) = &options.log_level {
        config.log_level = level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    apply_log_level(&config.log_level);

    if !input_path.exists() {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    info!(
        "Translating {} to {} with {}",
        input_path.display(),
        config.target_language,
        config.translator.provider.display_name()
    );

    let controller = Controller::with_config(config)?;
    let summary = controller
        .translate(input_path, options.output, options.force_overwrite)
        .await?;

    Ok(summary.success())
}

fn run_cache(action: CacheAction, config_path: PathBuf) -> Result<bool> {
    let config = Config::load_or_create(&config_path)?;
    apply_log_level(&config.log_level);
    let cache = TranslationCache::from_config(&config.cache);

    match action {
        CacheAction::Stats => {
            let stats = cache.stats();
            println!("Cache file: {}", config.cache.resolved_path().display());
            println!("Backend:    {:?}", config.cache.backend);
            println!("Entries:    {}", stats.entries);
            if stats.degraded {
                println!("Status:     degraded (persistence unavailable)");
            }
        }
        CacheAction::Clear => {
            cache.clear().context("Failed to clear translation cache")?;
            info!("Translation cache cleared");
        }
        CacheAction::Prune { max } => {
            let max_entries = max.unwrap_or(config.cache.max_entries);
            let removed = cache.prune(max_entries).context("Failed to prune translation cache")?;
            info!("Removed {} cache entries, {} remain", removed, cache.len());
        }
    }
    Ok(true)
}
