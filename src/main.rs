// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use wintrans::app_config::{self, Config, EmptyTranslationPolicy};
use wintrans::app_controller::{Controller, InterruptAction, register_interrupt};
use wintrans::errors::{AppError, INTERRUPTED_EXIT_CODE, TranslationError};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for EmptyTranslationPolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEmptyPolicy {
    Retry,
    CommitEmpty,
    Abort,
}

impl From<CliEmptyPolicy> for EmptyTranslationPolicy {
    fn from(cli_policy: CliEmptyPolicy) -> Self {
        match cli_policy {
            CliEmptyPolicy::Retry => EmptyTranslationPolicy::Retry,
            CliEmptyPolicy::CommitEmpty => EmptyTranslationPolicy::CommitEmpty,
            CliEmptyPolicy::Abort => EmptyTranslationPolicy::Abort,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a text file (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for wintrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct TranslateArgs {
    /// Input text file, one unit per line
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Translated pairs output (default: <input stem>.<target label>.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Terms output (default: <input stem>.terms.json)
    #[arg(short = 'T', long)]
    terms: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json")]
    config_path: PathBuf,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// OpenAI-compatible endpoint base URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// API key for the endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Source language name used in the prompt
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language name used in the prompt
    #[arg(short, long)]
    target_language: Option<String>,

    /// Maximum characters translated per request
    #[arg(short, long)]
    window_size: Option<usize>,

    /// Characters of translated text shown before the window
    #[arg(long)]
    context_before: Option<usize>,

    /// Characters of source text shown after the window
    #[arg(long)]
    context_after: Option<usize>,

    /// Handling of replies without a translation
    #[arg(long, value_enum)]
    empty_policy: Option<CliEmptyPolicy>,

    /// Disable the response cache
    #[arg(long)]
    no_cache: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// wintrans - Sliding-window document translation with a language model
///
/// Translates a plain-text file line by line through an OpenAI-compatible
/// chat endpoint, keeping names and terms consistent across the document.
#[derive(Parser, Debug)]
#[command(name = "wintrans")]
#[command(version)]
#[command(about = "Sliding-window document translation with a language model")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "wintrans translates a plain-text file line by line through an OpenAI-compatible endpoint.

EXAMPLES:
    wintrans novel.txt                          # Translate using default config
    wintrans -m gpt-4o novel.txt                # Use a specific model
    wintrans -s English -t 中文 novel.txt        # Translate from English to Chinese
    wintrans -w 1024 --no-cache novel.txt       # Smaller windows, no response cache
    wintrans --log-level debug novel.txt        # Show prompts and replies
    wintrans completions bash > wintrans.bash   # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

RESUMING:
    Progress is saved after every window. Running the same command again
    continues where the previous run stopped.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Records are filtered by the global max level, which is lowered or raised later
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with("wintrans")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let emoji = Self::get_emoji_for_level(record.level());
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    if let Err(e) = run().await {
        if !matches!(e, AppError::Translation(TranslationError::Cancelled(_))) {
            error!("{}", e);
        }
        std::process::exit(e.exit_code());
    }
}

async fn run() -> Result<(), AppError> {
    let cli = CommandLineOptions::parse();

    match (cli.command, cli.translate) {
        (Some(Commands::Completions { shell }), _) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "wintrans", &mut std::io::stdout());
            Ok(())
        }
        (Some(Commands::Translate(args)), _) => Ok(run_translate(args).await?),
        // Default behavior - use top-level args
        (None, args) if args.input_path.is_some() => Ok(run_translate(args).await?),
        (None, _) => {
            CommandLineOptions::command().print_help()?;
            Ok(())
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(log_level.to_level_filter());
    }

    let (mut config, created) = Config::load_or_create(&options.config_path)?;
    if created {
        warn!("Config file not found at {:?}, created a default config.", options.config_path);
    }

    apply_overrides(&mut config, &options);

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let input_path = options
        .input_path
        .ok_or_else(|| anyhow!("INPUT_PATH is required"))?;

    let controller = Controller::with_config(config)?;
    let paths = controller.resolve_paths(input_path, options.output, options.terms);

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_on_signal = Arc::clone(&cancel);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match register_interrupt(&cancel_on_signal) {
                InterruptAction::FinishWindow => {
                    warn!("Interrupt received, stopping after the current window. Press Ctrl-C again to quit now");
                }
                InterruptAction::Exit => {
                    warn!("Second interrupt, exiting. Every finished window is saved");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        }
    });

    match controller.run(&paths, cancel).await {
        Ok(_) => Ok(()),
        Err(e) => match e.downcast_ref::<TranslationError>() {
            Some(TranslationError::Cancelled(line)) => {
                info!(
                    "Stopped before line {}. Progress is saved in {}, run again to resume.",
                    line + 1,
                    paths.output.display()
                );
                Err(e)
            }
            _ => Err(e).context("Translation failed"),
        },
    }
}

// @applies: Command-line values over the loaded configuration
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(model) = &options.model {
        config.provider.model = model.clone();
    }
    if let Some(endpoint) = &options.endpoint {
        config.provider.endpoint = endpoint.clone();
    }
    if let Some(api_key) = &options.api_key {
        config.provider.api_key = api_key.clone();
    }
    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(window_size) = options.window_size {
        config.window.window_size = window_size;
    }
    if let Some(context_before) = options.context_before {
        config.window.context_before = context_before;
    }
    if let Some(context_after) = options.context_after {
        config.window.context_after = context_after;
    }
    if let Some(policy) = &options.empty_policy {
        config.empty_translation_policy = policy.clone().into();
    }
    if options.no_cache {
        config.cache.enabled = false;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}
