use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Translation run settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Remote API settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// How the instruction message of each batch pair is tagged
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessagePairingMode {
    /// Instructions are sent as a system-role message
    #[default]
    System,
    /// Instructions are sent as a user-role message, for models without a
    /// system role
    User,
}

/// How translated blocks are split into display sentences
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SentenceFragmenterMode {
    /// Regex tokenization with quotation re-fusion
    #[default]
    Regex,
    /// External segmenter; accepted for backward compatibility and treated
    /// the same as `Preformatted`
    Segmenter,
    /// Trust the model's own line formatting and emit blocks unmodified
    Preformatted,
}

/// How source/translation pairs are kept for bilingual review
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// No review output
    Off,
    /// Interleave raw prompt/translation blocks with separator banners
    #[default]
    Interleaved,
    /// Store both sides verbatim, then pair them line-by-line afterwards
    Paired,
}

/// Translation run settings, fixed for the duration of one run
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Model name (e.g., "gpt-4", "gpt-4-turbo")
    #[serde(default = "default_model")]
    pub model: String,

    /// Instruction text sent with every batch
    #[serde(default = "default_system_message")]
    pub system_message: String,

    /// Role used for the instruction message
    #[serde(default)]
    pub message_pairing: MessagePairingMode,

    /// Maximum number of kept lines per prompt batch
    #[serde(default = "default_lines_per_batch")]
    pub lines_per_batch: usize,

    /// Sentence fragmentation mode for translated output
    #[serde(default)]
    pub sentence_fragmenter: SentenceFragmenterMode,

    /// Review pairing mode for bilingual checking
    #[serde(default)]
    pub review_mode: ReviewMode,

    /// How many times a malformed batch is re-requested before being accepted
    #[serde(default = "default_malformed_retries")]
    pub malformed_retries: u32,

    /// Wall-clock budget for one batch including all backoff retries, in seconds
    #[serde(default = "default_batch_timeout_secs")]
    pub batch_timeout_secs: u64,

    /// Maximum number of batches in flight at once
    #[serde(default = "default_concurrent_batches")]
    pub concurrent_batches: usize,

    /// Base backoff time in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling parameter
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            system_message: default_system_message(),
            message_pairing: MessagePairingMode::default(),
            lines_per_batch: default_lines_per_batch(),
            sentence_fragmenter: SentenceFragmenterMode::default(),
            review_mode: ReviewMode::default(),
            malformed_retries: default_malformed_retries(),
            batch_timeout_secs: default_batch_timeout_secs(),
            concurrent_batches: default_concurrent_batches(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl TranslationConfig {
    /// Whether the configured model family is expected to preserve per-line
    /// structure, making line-count parity validation worthwhile.
    ///
    /// Smaller model families tend not to follow the one-line-per-line format,
    /// so validating their output would retry forever for nothing.
    pub fn expects_line_parity(&self) -> bool {
        self.model.contains("gpt-4")
    }
}

/// Remote API settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Service endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key for the service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Request timeout in seconds for a single API call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of tokens to generate per request (None lets the
    /// service decide)
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            max_tokens: None,
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

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_system_message() -> String {
    "You are a professional Japanese to English translator. Translate the \
     following Japanese text into natural English, producing exactly one \
     output line per input line. Leave scene-break markers and part markers \
     unchanged."
        .to_string()
}

fn default_lines_per_batch() -> usize {
    13
}

fn default_malformed_retries() -> u32 {
    1
}

fn default_batch_timeout_secs() -> u64 {
    300
}

fn default_concurrent_batches() -> usize {
    30
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_top_p() -> f32 {
    1.0
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Config {
    /// Load the configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Write the configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.translation.lines_per_batch == 0 {
            return Err(anyhow!("lines_per_batch must be at least 1"));
        }

        if self.translation.concurrent_batches == 0 {
            return Err(anyhow!("concurrent_batches must be at least 1"));
        }

        if self.translation.batch_timeout_secs == 0 {
            return Err(anyhow!("batch_timeout_secs must be greater than 0"));
        }

        if !(0.0..=2.0).contains(&self.translation.temperature) {
            return Err(anyhow!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.translation.temperature
            ));
        }

        if self.provider.api_key.is_empty() {
            return Err(anyhow!("An API key is required for the translation service"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            translation: TranslationConfig::default(),
            provider: ProviderConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
