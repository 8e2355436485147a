use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language name, interpolated into the prompt (e.g. "越南语")
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language name, interpolated into the prompt (e.g. "中文")
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// JSON key holding the source text in the output artifact
    #[serde(default = "default_source_label")]
    pub source_label: String,

    /// JSON key holding the translated text in the output artifact
    #[serde(default = "default_target_label")]
    pub target_label: String,

    /// Window and context budgets
    #[serde(default)]
    pub window: WindowConfig,

    /// Language-model endpoint settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Response cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// What to do when a reply carries no translation
    #[serde(default)]
    pub empty_translation_policy: EmptyTranslationPolicy,

    /// Requests per window before the retry policy gives up
    #[serde(default = "default_max_window_attempts")]
    pub max_window_attempts: u32,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Character budgets for one translation request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WindowConfig {
    /// Maximum characters of source text translated per request
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Characters of already-translated source shown before the window
    #[serde(default = "default_context_before")]
    pub context_before: usize,

    /// Characters of upcoming source shown after the window
    #[serde(default = "default_context_after")]
    pub context_after: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            context_before: default_context_before(),
            context_after: default_context_after(),
        }
    }
}

/// OpenAI-compatible endpoint configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Base URL, `/chat/completions` is appended
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    // @field: API key, may be empty for local servers
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Model name
    #[serde(default = "default_model")]
    pub model: String,

    // @field: Sampling temperature, server default when absent
    #[serde(default)]
    pub temperature: Option<f32>,

    // @field: Timeout seconds for a whole request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Extra attempts on transient failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    // @field: Base backoff, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    // @field: Use server-sent events
    #[serde(default = "default_true")]
    pub stream: bool,

    // @field: Print streamed fragments to stdout as they arrive
    #[serde(default)]
    pub echo_stream: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            model: default_model(),
            temperature: None,
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            stream: true,
            echo_stream: false,
        }
    }
}

/// On-disk response cache configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Whether replies are cached by prompt digest
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding one file per cached reply
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_cache_directory(),
        }
    }
}

/// Handling of a reply whose translation block is missing or empty
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTranslationPolicy {
    /// Drop the cached reply and request the window again
    #[default]
    Retry,
    /// Commit the window with an empty target and move on
    CommitEmpty,
    /// Stop the run without committing the window
    Abort,
}

impl std::fmt::Display for EmptyTranslationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Retry => "retry",
            Self::CommitEmpty => "commit_empty",
            Self::Abort => "abort",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for EmptyTranslationPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "retry" => Ok(Self::Retry),
            "commit_empty" => Ok(Self::CommitEmpty),
            "abort" => Ok(Self::Abort),
            _ => Err(anyhow!("Invalid empty translation policy: {}", s)),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Immutable parameters of one translation run
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationConfig {
    pub window_size: usize,
    pub context_before: usize,
    pub context_after: usize,
    pub source_label: String,
    pub target_label: String,
    pub source_language: String,
    pub target_language: String,
}

fn default_source_language() -> String {
    "越南语".to_string()
}

fn default_target_language() -> String {
    "中文".to_string()
}

fn default_source_label() -> String {
    "vi".to_string()
}

fn default_target_label() -> String {
    "zh".to_string()
}

fn default_window_size() -> usize {
    2048
}

fn default_context_before() -> usize {
    384
}

fn default_context_after() -> usize {
    384
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "DeepSeek-R1-671B".to_string()
}

fn default_timeout_secs() -> u64 {
    // Reasoning models stream for minutes on a 2k-character window
    600
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_max_window_attempts() -> u32 {
    3
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from("cache")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load a configuration file, or write and return the default one if it does not exist.
    ///
    /// Returns the configuration and whether it was freshly created.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok((config, false));
        }

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;
        Ok((config, true))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.window.window_size == 0 {
            return Err(anyhow!("window_size must be a positive number of characters"));
        }
        if self.window.context_before == 0 {
            return Err(anyhow!("context_before must be a positive number of characters"));
        }
        if self.window.context_after == 0 {
            return Err(anyhow!("context_after must be a positive number of characters"));
        }

        if self.source_label.is_empty() || self.target_label.is_empty() {
            return Err(anyhow!("source_label and target_label must not be empty"));
        }
        if self.source_label == self.target_label {
            return Err(anyhow!(
                "source_label and target_label must differ, both are \"{}\"",
                self.source_label
            ));
        }

        if self.source_language.trim().is_empty() || self.target_language.trim().is_empty() {
            return Err(anyhow!("source_language and target_language must not be empty"));
        }

        Url::parse(&self.provider.endpoint)
            .with_context(|| format!("Invalid provider endpoint: {}", self.provider.endpoint))?;

        if self.max_window_attempts == 0 {
            return Err(anyhow!("max_window_attempts must be at least 1"));
        }

        Ok(())
    }

    /// The run parameters the translation engine reads
    pub fn translation_config(&self) -> TranslationConfig {
        TranslationConfig {
            window_size: self.window.window_size,
            context_before: self.window.context_before,
            context_after: self.window.context_after,
            source_label: self.source_label.clone(),
            target_label: self.target_label.clone(),
            source_language: self.source_language.clone(),
            target_language: self.target_language.clone(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            source_label: default_source_label(),
            target_label: default_target_label(),
            window: WindowConfig::default(),
            provider: ProviderConfig::default(),
            cache: CacheConfig::default(),
            empty_translation_policy: EmptyTranslationPolicy::default(),
            max_window_attempts: default_max_window_attempts(),
            log_level: LogLevel::default(),
        }
    }
}
