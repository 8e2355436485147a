use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::providers::Provider;
use crate::providers::openai::OpenAI;
use crate::translation::{CachedProvider, CheckpointManager, RunSummary, TranslationDriver};

// @module: Application controller for document translation

/// Where a run reads from and writes to
#[derive(Debug, Clone, PartialEq)]
pub struct RunPaths {
    // @field: Plain-text input, one unit per line
    pub input: PathBuf,
    // @field: Translated pairs artifact
    pub output: PathBuf,
    // @field: Term store artifact
    pub terms: PathBuf,
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve artifact paths, deriving missing ones from the input file name
    pub fn resolve_paths(&self, input: PathBuf, output: Option<PathBuf>, terms: Option<PathBuf>) -> RunPaths {
        let output = output
            .unwrap_or_else(|| FileManager::generate_output_path(&input, &format!("{}.json", self.config.target_label)));
        let terms = terms.unwrap_or_else(|| FileManager::generate_output_path(&input, "terms.json"));
        RunPaths { input, output, terms }
    }

    /// Run the main workflow against the configured endpoint
    pub async fn run(&self, paths: &RunPaths, cancel: Arc<AtomicBool>) -> Result<RunSummary> {
        let client = OpenAI::from_config(&self.config.provider);
        info!(
            "Translating {:?} from {} to {} with {}",
            paths.input,
            self.config.source_language,
            self.config.target_language,
            client.model()
        );

        if !self.config.cache.enabled {
            return self.run_with_provider(client, paths, cancel).await;
        }

        FileManager::ensure_dir(&self.config.cache.directory)?;
        let cached = Arc::new(CachedProvider::new(client, &self.config.cache.directory));
        let result = self.run_with_provider(Arc::clone(&cached), paths, cancel).await;

        let stats = cached.stats();
        info!(
            "Cache: {} hit(s), {} miss(es) ({:.0}% hit rate)",
            stats.hits,
            stats.misses,
            stats.hit_rate() * 100.0
        );

        result
    }

    /// Run the workflow with any provider
    pub async fn run_with_provider<P: Provider>(
        &self,
        provider: P,
        paths: &RunPaths,
        cancel: Arc<AtomicBool>,
    ) -> Result<RunSummary> {
        let start_time = std::time::Instant::now();

        if !paths.input.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", paths.input));
        }
        let lines = FileManager::read_lines(&paths.input)?;
        if lines.is_empty() {
            warn!("Input file is empty: {:?}", paths.input);
        }

        for path in [&paths.output, &paths.terms] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                FileManager::ensure_dir(parent)?;
            }
        }

        let checkpoint = CheckpointManager::new(
            &paths.output,
            &paths.terms,
            &self.config.source_label,
            &self.config.target_label,
        );

        let driver = TranslationDriver::new(self.config.translation_config(), provider, checkpoint)
            .with_empty_translation_policy(self.config.empty_translation_policy, self.config.max_window_attempts)
            .with_cancellation(cancel)
            .with_progress(Self::create_progress_bar(lines.len()));

        let summary = driver.run(&lines).await?;

        info!(
            "Translation complete in {}: {} window(s), {} line(s), {} merged window(s), {} new term(s)",
            Self::format_duration(start_time.elapsed()),
            summary.windows,
            summary.lines_translated,
            summary.fallback_merges,
            summary.terms_added
        );
        if summary.empty_windows > 0 {
            warn!(
                "{} window(s) were committed without a translation, check {}",
                summary.empty_windows,
                paths.output.display()
            );
        }
        info!("Success: {}", paths.output.display());

        Ok(summary)
    }

    fn create_progress_bar(total_lines: usize) -> ProgressBar {
        let progress_bar = ProgressBar::new(total_lines as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
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

/// What a Ctrl-C should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Let the in-flight window finish, then stop
    FinishWindow,
    /// Exit at once; the checkpoint holds every finished window
    Exit,
}

/// Record an interrupt on the cancellation flag
pub fn register_interrupt(cancel: &AtomicBool) -> InterruptAction {
    if cancel.swap(true, Ordering::SeqCst) {
        InterruptAction::Exit
    } else {
        InterruptAction::FinishWindow
    }
}
