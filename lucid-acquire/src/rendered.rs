use crate::error::TierFailure;
use async_trait::async_trait;
use lucid_common::{EvasionConfig, RenderedConfig};
use lucid_drivers::browser::driver::{DriverOptions, LucidDriver};
use lucid_drivers::browser::fingerprint::ProfileSampler;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Implementations own their deadline and honour `cancel`; any browser
/// session they open is released before `render` returns.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Return the document HTML after scripts have run.
    async fn render(&self, url: &Url, cancel: &CancellationToken) -> Result<String, TierFailure>;
}

/// Concrete renderer backed by a fresh chromedriver session per call.
pub struct WebDriverRenderer {
    config: RenderedConfig,
    sampler: Mutex<ProfileSampler>,
    budget: Duration,
}

impl WebDriverRenderer {
    pub fn new(config: &RenderedConfig, evasion: &EvasionConfig, budget: Duration) -> Self {
        Self {
            config: config.clone(),
            sampler: Mutex::new(ProfileSampler::from_config(evasion)),
            budget,
        }
    }

    fn driver_options(&self) -> DriverOptions {
        let profile = self
            .sampler
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .sample();
        DriverOptions {
            webdriver_url: self.config.webdriver_url.clone(),
            headless: self.config.headless,
            stealth_level: self.config.stealth_level,
            profile,
            page_load_timeout: self.budget,
        }
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn render(&self, url: &Url, cancel: &CancellationToken) -> Result<String, TierFailure> {
        let session = RenderSession {
            opts: self.driver_options(),
            url: url.to_string(),
            settle: (self.config.settle_min_ms, self.config.settle_max_ms),
            deadline: Instant::now() + self.budget,
            budget: self.budget,
        };
        // Detached so teardown still completes if this future is dropped.
        let task = tokio::spawn(session.run(cancel.clone()));
        task.await
            .map_err(|e| TierFailure::Unavailable(format!("render task failed: {e}")))?
    }
}

struct RenderSession {
    opts: DriverOptions,
    url: String,
    settle: (u64, u64),
    deadline: Instant,
    budget: Duration,
}

impl RenderSession {
    async fn run(self, cancel: CancellationToken) -> Result<String, TierFailure> {
        // Not raced with `cancel`: a session dropped halfway through
        // creation leaves nothing to delete.
        let mut driver = match timeout_at(self.deadline, LucidDriver::connect(&self.opts)).await {
            Ok(Ok(driver)) => driver,
            Ok(Err(e)) => return Err(TierFailure::Unavailable(format!("{e:#}"))),
            Err(_) => return Err(TierFailure::Timeout(self.budget)),
        };

        let outcome = if cancel.is_cancelled() {
            Err(TierFailure::Cancelled)
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(TierFailure::Cancelled),
                captured = timeout_at(self.deadline, capture(&mut driver, &self.url, self.settle)) => {
                    captured.unwrap_or(Err(TierFailure::Timeout(self.budget)))
                }
            }
        };

        // An abandoned navigation keeps the client busy, so those paths
        // delete the session out of band.
        let released = match &outcome {
            Err(TierFailure::Cancelled | TierFailure::Timeout(_)) => driver.abort().await,
            _ => driver.close().await,
        };
        match released {
            Ok(()) => tracing::debug!(target: "acquire.rendered", "session released"),
            Err(e) => tracing::warn!(target: "acquire.rendered", error = %format!("{e:#}"), "session release failed"),
        }
        outcome
    }
}

async fn capture(
    driver: &mut LucidDriver,
    url: &str,
    (settle_min, settle_max): (u64, u64),
) -> Result<String, TierFailure> {
    let page = driver
        .goto(url)
        .await
        .map_err(|e| TierFailure::Transport(format!("{e:#}")))?;
    page.settle(settle_min, settle_max).await;
    page.content()
        .await
        .map_err(|e| TierFailure::Transport(format!("{e:#}")))
}
