use crate::error::TierFailure;
use async_trait::async_trait;
use lucid_http::{HttpClient, RequestOpts};
use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::LazyLock;
use url::Url;

#[async_trait]
pub trait SnapshotArchive: Send + Sync {
    /// Raw HTML of the closest archived capture of `url`.
    async fn fetch_archived(&self, url: &Url) -> Result<String, TierFailure>;
}

#[derive(Debug, Deserialize)]
struct Availability {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<Snapshot>,
}

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    available: bool,
    url: String,
    #[serde(default)]
    timestamp: String,
}

static SNAPSHOT_PATH: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>.*?/web/)(?P<ts>\d{1,14})(?:[a-z]{2}_)?/(?P<orig>.+)$").ok()
});

/// Rewrite a Wayback snapshot URL to its raw-content form
/// (`/web/<ts>id_/<original>`), which serves the page without the archive
/// toolbar or rewritten links.
///
/// ```
/// use lucid_acquire::archive::raw_snapshot_url;
/// use url::Url;
///
/// let original = Url::parse("https://news.example.com/a/1").unwrap();
/// assert_eq!(
///     raw_snapshot_url("http://web.archive.org/web/20240105123000/https://news.example.com/a/1", "20240105123000", &original),
///     "http://web.archive.org/web/20240105123000id_/https://news.example.com/a/1",
/// );
/// ```
pub fn raw_snapshot_url(snapshot: &str, timestamp: &str, original: &Url) -> String {
    match SNAPSHOT_PATH.as_ref().and_then(|re| re.captures(snapshot)) {
        Some(caps) => format!("{}{}id_/{}", &caps["prefix"], &caps["ts"], &caps["orig"]),
        None => format!("https://web.archive.org/web/{timestamp}id_/{original}"),
    }
}

/// Wayback Machine availability API plus raw snapshot fetch.
pub struct WaybackArchive {
    http: HttpClient,
    availability_endpoint: String,
}

impl WaybackArchive {
    pub fn new(http: HttpClient, availability_endpoint: impl Into<String>) -> Self {
        Self {
            http,
            availability_endpoint: availability_endpoint.into(),
        }
    }

    async fn closest(&self, url: &Url) -> Result<Snapshot, TierFailure> {
        let found: Availability = self
            .http
            .get_json(
                &self.availability_endpoint,
                RequestOpts {
                    allow_absolute: true,
                    query: Some(vec![("url", Cow::Borrowed(url.as_str()))]),
                    ..Default::default()
                },
            )
            .await?;
        found
            .archived_snapshots
            .closest
            .filter(|s| s.available && !s.url.is_empty())
            .ok_or(TierFailure::NoSnapshot)
    }
}

#[async_trait]
impl SnapshotArchive for WaybackArchive {
    async fn fetch_archived(&self, url: &Url) -> Result<String, TierFailure> {
        let snapshot = self.closest(url).await?;
        let raw = raw_snapshot_url(&snapshot.url, &snapshot.timestamp, url);
        tracing::info!(
            target: "acquire.archive",
            timestamp = %snapshot.timestamp,
            snapshot = %raw,
            "snapshot found"
        );

        let page = self.http.fetch_page(&raw, RequestOpts::default()).await?;
        if !page.status.is_success() {
            return Err(TierFailure::Transport(format!(
                "snapshot returned {}",
                page.status
            )));
        }
        if page.body.trim().is_empty() {
            return Err(TierFailure::NoSnapshot);
        }
        Ok(page.body)
    }
}
