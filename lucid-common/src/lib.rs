//! Common types and utilities shared across Lucid crates.
//!
//! This crate defines configuration, the request data model, observability
//! helpers, and the shared error type used throughout the Lucid workspace. It
//! is intentionally lightweight so that every crate can depend on it without
//! introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`LucidConfig`]: Top‑level runtime configuration (one source of truth,
//!   loaded by `lucid-config`)
//! - [`model`]: values that flow through a request (fetch results,
//!   extraction candidates, progress events)
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`LucidError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use lucid_common::{LucidConfig, StealthLevel};
//!
//! let mut cfg = LucidConfig::default();
//! cfg.acquisition.rendered.stealth_level = StealthLevel::Maximum;
//! assert_eq!(cfg.acquisition.static_success_length, 1000);
//! assert_eq!(cfg.acquisition.blocking.min_length, 500);
//! ```
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod model;
pub mod observability;

pub use model::{
    ExtractionCandidate, FetchResult, FinalResult, ProgressEvent, ProgressStatus, Provenance,
    Strategy,
};

/// Configuration for the whole service.
///
/// Every section carries serde defaults so partial YAML or env overlays
/// deserialize cleanly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LucidConfig {
    pub server: ServerConfig,
    pub acquisition: AcquisitionConfig,
    pub extraction: ExtractionConfig,
    pub refinement: RefinementConfig,
    pub logging: LoggingConfig,
}

/// HTTP front door settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the axum server binds to.
    pub bind: String,
    /// Debug mode raises the default log filter.
    pub debug: bool,
    /// Allowed CORS origins. Empty means any origin.
    pub allow_origins: Vec<String>,
    /// Upper bound (in characters) on returned content.
    pub max_content_length: Option<usize>,
    /// Tokio worker threads; `None` uses the runtime default.
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            debug: false,
            allow_origins: Vec::new(),
            max_content_length: None,
            worker_threads: None,
        }
    }
}

/// Knobs for the three acquisition tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub static_timeout_secs: u64,
    pub rendered_timeout_secs: u64,
    pub archive_timeout_secs: u64,
    /// A non-blocked static body must be longer than this (in characters)
    /// to end acquisition at the first tier.
    pub static_success_length: usize,
    pub blocking: BlockingConfig,
    pub rendered: RenderedConfig,
    pub archive: ArchiveConfig,
    pub evasion: EvasionConfig,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            static_timeout_secs: 10,
            rendered_timeout_secs: 20,
            archive_timeout_secs: 15,
            static_success_length: 1000,
            blocking: BlockingConfig::default(),
            rendered: RenderedConfig::default(),
            archive: ArchiveConfig::default(),
            evasion: EvasionConfig::default(),
        }
    }
}

impl AcquisitionConfig {
    pub fn static_timeout(&self) -> Duration {
        Duration::from_secs(self.static_timeout_secs)
    }

    pub fn rendered_timeout(&self) -> Duration {
        Duration::from_secs(self.rendered_timeout_secs)
    }

    pub fn archive_timeout(&self) -> Duration {
        Duration::from_secs(self.archive_timeout_secs)
    }
}

/// Heuristics that classify a response as a block/challenge page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockingConfig {
    pub statuses: Vec<u16>,
    /// Bodies shorter than this (in characters) are treated as challenge pages.
    pub min_length: usize,
    /// Lowercase substrings that mark a body as blocked.
    pub keywords: Vec<String>,
}

/// Keywords matched case-insensitively against response bodies.
pub const DEFAULT_BLOCK_KEYWORDS: &[&str] = &[
    "access denied",
    "403 forbidden",
    "attention required",
    "cloudflare",
    "security check",
    "please verify you are a human",
    "captcha",
    "blocked",
];

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            statuses: vec![403, 429, 503],
            min_length: 500,
            keywords: DEFAULT_BLOCK_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Headless browser tier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderedConfig {
    pub enabled: bool,
    /// WebDriver endpoint (chromedriver by default).
    pub webdriver_url: String,
    pub headless: bool,
    pub stealth_level: StealthLevel,
    /// Post-load idle window, jittered between the two bounds.
    pub settle_min_ms: u64,
    pub settle_max_ms: u64,
}

impl Default for RenderedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webdriver_url: "http://localhost:9515".to_string(),
            headless: true,
            stealth_level: StealthLevel::Balanced,
            settle_min_ms: 1000,
            settle_max_ms: 2000,
        }
    }
}

/// Historical-snapshot tier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub enabled: bool,
    /// Availability endpoint of the snapshot index.
    pub availability_endpoint: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            availability_endpoint: "https://archive.org/wayback/available".to_string(),
        }
    }
}

/// Randomized fingerprint inputs. A fixed `seed` makes every choice
/// reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvasionConfig {
    pub user_agents: Vec<String>,
    pub viewports: Vec<(u32, u32)>,
    pub locales: Vec<String>,
    pub timezones: Vec<String>,
    pub seed: Option<u64>,
}

impl Default for EvasionConfig {
    fn default() -> Self {
        Self {
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36".to_string(),
            ],
            viewports: vec![(1920, 1080), (1536, 864), (1440, 900), (1366, 768)],
            locales: vec!["en-US".to_string(), "en-GB".to_string(), "ko-KR".to_string()],
            timezones: vec![
                "America/New_York".to_string(),
                "America/Los_Angeles".to_string(),
                "Europe/London".to_string(),
                "Asia/Seoul".to_string(),
            ],
            seed: None,
        }
    }
}

/// Extraction chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Language used by the news strategy when the request names none.
    pub default_language: String,
    /// Minimum content length for the first three strategies.
    pub min_content_length: usize,
    /// Minimum content length for the structural selector strategy.
    pub selector_min_length: usize,
    /// Content shorter than this many characters fails the request.
    pub viable_length: usize,
    pub news_timeout_secs: u64,
    /// Parallel CPU-bound extraction jobs across all requests.
    pub blocking_workers: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_language: "ko".to_string(),
            min_content_length: 100,
            selector_min_length: 200,
            viable_length: 100,
            news_timeout_secs: 10,
            blocking_workers: 4,
        }
    }
}

/// LLM noise-removal settings. Refinement is enabled only when a usable
/// `auth_token` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub auth_token: Option<String>,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_input_chars: usize,
    /// Content must be longer than this before refinement is attempted.
    pub min_content_chars: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            auth_token: None,
            endpoint: "https://api.openai.com/v1/".to_string(),
            timeout_secs: 20,
            max_input_chars: 6000,
            min_content_chars: 200,
            max_tokens: 8000,
            temperature: 0.0,
        }
    }
}

impl RefinementConfig {
    /// Token usable for requests, ignoring blanks and unexpanded `${VAR}`
    /// placeholders.
    ///
    /// ```
    /// use lucid_common::RefinementConfig;
    ///
    /// let mut cfg = RefinementConfig::default();
    /// assert!(cfg.usable_token().is_none());
    /// cfg.auth_token = Some("${OPENAI_API_KEY}".into());
    /// assert!(cfg.usable_token().is_none());
    /// cfg.auth_token = Some("sk-test".into());
    /// assert_eq!(cfg.usable_token(), Some("sk-test"));
    /// ```
    pub fn usable_token(&self) -> Option<&str> {
        self.auth_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.contains("${"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Supported refinement providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
}

/// Logging settings consumed by [`observability::LogConfig::from_settings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    pub format: LogFormatSetting,
    pub stderr: bool,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormatSetting::Text,
            stderr: true,
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    Text,
    Json,
}

/// Browser automation stealth level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    Lightweight,
    Balanced,
    Maximum,
}

/// Error types used across the Lucid system.
#[derive(thiserror::Error, Debug)]
pub enum LucidError {
    /// An LLM provider call failed.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`LucidError`].
pub type Result<T> = std::result::Result<T, LucidError>;

/// Truncate `text` to at most `max_chars` characters on a char boundary.
///
/// ```
/// assert_eq!(lucid_common::truncate_chars("héllo", 2), "hé");
/// assert_eq!(lucid_common::truncate_chars("hi", 10), "hi");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
