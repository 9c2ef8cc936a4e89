//! Values that flow through a single extraction request.
//!
//! Acquisition produces a [`FetchResult`], extraction an
//! [`ExtractionCandidate`], and the orchestrator turns both into a
//! [`FinalResult`] (optionally narrated by [`ProgressEvent`]s).
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which acquisition tier supplied the HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    Static,
    Rendered,
    Archived,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provenance::Static => "static",
            Provenance::Rendered => "rendered",
            Provenance::Archived => "archived",
        })
    }
}

/// Raw HTML plus the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub html: String,
    pub provenance: Provenance,
}

impl FetchResult {
    pub fn new(html: String, provenance: Provenance) -> Self {
        Self { html, provenance }
    }

    pub fn is_archived(&self) -> bool {
        self.provenance == Provenance::Archived
    }
}

/// Extraction strategies in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    Trafilatura,
    NewsArticle,
    Readability,
    RawSelector,
    FallbackText,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Trafilatura => "trafilatura",
            Strategy::NewsArticle => "news_article",
            Strategy::Readability => "readability",
            Strategy::RawSelector => "raw_selector",
            Strategy::FallbackText => "fallback_text",
        })
    }
}

/// Title and body produced by one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionCandidate {
    pub title: String,
    pub content: String,
    pub strategy: Strategy,
}

impl ExtractionCandidate {
    pub fn new(title: impl Into<String>, content: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            strategy,
        }
    }

    /// Content length in characters.
    pub fn content_chars(&self) -> usize {
        self.content.chars().count()
    }
}

/// What the caller receives once a request succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalResult {
    pub title: String,
    pub content: String,
    pub source_url: String,
    pub from_archive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
}

/// Stage of a streamed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Crawling,
    ArchiveNotice,
    Parsing,
    AiProcessing,
    Done,
    Error,
}

impl ProgressStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProgressStatus::Done | ProgressStatus::Error)
    }
}

/// One step of the streaming response.
///
/// ```
/// use lucid_common::{ProgressEvent, ProgressStatus};
///
/// let ev = ProgressEvent::crawling();
/// assert_eq!(ev.status, ProgressStatus::Crawling);
/// let json = serde_json::to_string(&ev).unwrap();
/// assert!(json.starts_with(r#"{"status":"crawling","progress":25"#));
/// assert!(!json.contains("data"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    pub progress: u8,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<FinalResult>,
}

impl ProgressEvent {
    pub const CRAWLING: u8 = 25;
    pub const ARCHIVE_NOTICE: u8 = 40;
    pub const PARSING: u8 = 50;
    pub const AI_PROCESSING: u8 = 75;
    pub const DONE: u8 = 100;

    fn step(status: ProgressStatus, progress: u8, message: impl Into<String>) -> Self {
        Self {
            status,
            progress,
            message: message.into(),
            data: None,
        }
    }

    pub fn crawling() -> Self {
        Self::step(ProgressStatus::Crawling, Self::CRAWLING, "Crawling...")
    }

    pub fn archive_notice() -> Self {
        Self::step(
            ProgressStatus::ArchiveNotice,
            Self::ARCHIVE_NOTICE,
            "Source site unavailable; using archived snapshot",
        )
    }

    pub fn parsing() -> Self {
        Self::step(ProgressStatus::Parsing, Self::PARSING, "Extracting...")
    }

    pub fn ai_processing() -> Self {
        Self::step(
            ProgressStatus::AiProcessing,
            Self::AI_PROCESSING,
            "Refining with AI...",
        )
    }

    pub fn done(result: FinalResult) -> Self {
        Self {
            data: Some(result),
            ..Self::step(ProgressStatus::Done, Self::DONE, "Done!")
        }
    }

    /// Error events repeat the last reported progress so the sequence never
    /// goes backwards.
    pub fn error(progress: u8, message: impl Into<String>) -> Self {
        Self::step(ProgressStatus::Error, progress, message)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
