use crate::browser::{
    behavioral::BehavioralEngine, fingerprint::BrowserProfile, page::LucidPage,
    stealth::build_stealth_arguments,
};
use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use lucid_common::StealthLevel;
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use webdriver::capabilities::Capabilities;

/// Upper bound on any session teardown request.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(3);

/// Everything needed to open one browser session.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub webdriver_url: String,
    pub headless: bool,
    pub stealth_level: StealthLevel,
    pub profile: BrowserProfile,
    pub page_load_timeout: Duration,
}

/// Thin wrapper around a `fantoccini` WebDriver client with stealth and
/// behavioral helpers. One instance is one browser session.
pub struct LucidDriver {
    client: Client,
    /// `{webdriver}/session/{id}`, captured at connect time so teardown
    /// never waits on the client's command queue.
    session_url: Option<Url>,
    behavioral_engine: BehavioralEngine,
    stealth_level: StealthLevel,
    profile: BrowserProfile,
}

/// Build the `goog:chromeOptions` capability set for a session.
pub fn session_capabilities(opts: &DriverOptions) -> Capabilities {
    let mut args = build_stealth_arguments(opts.stealth_level, &opts.profile);
    if opts.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    let mut seen = HashSet::new();
    args.retain(|arg| seen.insert(arg.clone()));

    let mut caps = Capabilities::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps.insert("pageLoadStrategy".to_string(), json!("eager"));
    caps.insert(
        "timeouts".to_string(),
        json!({ "pageLoad": opts.page_load_timeout.as_millis() as u64 }),
    );
    caps
}

impl LucidDriver {
    /// Open a session against a running WebDriver service (chromedriver).
    pub async fn connect(opts: &DriverOptions) -> Result<Self> {
        let client = ClientBuilder::native()
            .capabilities(session_capabilities(opts))
            .connect(&opts.webdriver_url)
            .await
            .with_context(|| format!("connecting to webdriver at {}", opts.webdriver_url))?;

        let session_url = client
            .session_creation_response()
            .map(|created| session_endpoint(&opts.webdriver_url, created.session_id()))
            .transpose()?;

        tracing::debug!(
            target: "driver.session",
            webdriver = %opts.webdriver_url,
            session = ?session_url.as_ref().map(Url::path),
            viewport = ?opts.profile.viewport,
            locale = %opts.profile.locale,
            timezone = %opts.profile.timezone,
            "session opened"
        );

        Ok(Self {
            client,
            session_url,
            behavioral_engine: BehavioralEngine::new(),
            stealth_level: opts.stealth_level,
            profile: opts.profile.clone(),
        })
    }

    /// Navigate to `url` and return a [`LucidPage`] with stealth scripts
    /// applied.
    pub async fn goto(&mut self, url: &str) -> Result<LucidPage> {
        let mut page = LucidPage::new(
            self.client.clone(),
            self.stealth_level,
            self.profile.clone(),
            self.behavioral_engine.clone(),
        );
        page.goto(url).await?;
        Ok(page)
    }

    /// Close the session through the WebDriver client. If the client is
    /// still busy after [`CLOSE_TIMEOUT`], fall back to [`Self::abort`].
    pub async fn close(self) -> Result<()> {
        let Self {
            client, session_url, ..
        } = self;
        match tokio::time::timeout(CLOSE_TIMEOUT, client.close()).await {
            Ok(closed) => closed.context("closing webdriver session"),
            Err(_) => {
                tracing::warn!(target: "driver.session", "close stalled; deleting session directly");
                delete_session(session_url).await
            }
        }
    }

    /// Delete the session with a direct HTTP request, bypassing commands the
    /// client may still have in flight (a navigation that has not returned).
    pub async fn abort(self) -> Result<()> {
        delete_session(self.session_url).await
    }
}

fn session_endpoint(webdriver_url: &str, session_id: &str) -> Result<Url> {
    Url::parse(webdriver_url)
        .and_then(|base| base.join(&format!("session/{session_id}")))
        .with_context(|| format!("bad webdriver url {webdriver_url}"))
}

async fn delete_session(session_url: Option<Url>) -> Result<()> {
    let Some(url) = session_url else {
        return Ok(());
    };
    let status = reqwest::Client::builder()
        .timeout(CLOSE_TIMEOUT)
        .build()?
        .delete(url.clone())
        .send()
        .await
        .with_context(|| format!("DELETE {url}"))?
        .status();
    tracing::debug!(target: "driver.session", %status, "session deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(headless: bool) -> DriverOptions {
        DriverOptions {
            webdriver_url: "http://localhost:9515".into(),
            headless,
            stealth_level: StealthLevel::Maximum,
            profile: BrowserProfile {
                user_agent: "UA".into(),
                viewport: (1280, 800),
                platform: "Win32".into(),
                locale: "en-US".into(),
                languages: vec!["en-US".into(), "en".into()],
                timezone: "UTC".into(),
            },
            page_load_timeout: Duration::from_secs(20),
        }
    }

    #[test]
    fn capabilities_include_timeouts_and_headless_flags() {
        let caps = session_capabilities(&opts(true));
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert_eq!(caps["timeouts"]["pageLoad"], 20_000);
    }

    #[test]
    fn repeated_arguments_appear_once() {
        // Maximum stealth already asks for --disable-gpu; headless adds it again.
        let caps = session_capabilities(&opts(true));
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        let gpu = args.iter().filter(|a| *a == "--disable-gpu").count();
        assert_eq!(gpu, 1);
        assert_eq!(args.last().unwrap(), "--headless=new");
    }

    #[test]
    fn session_endpoint_joins_id() {
        let url = session_endpoint("http://localhost:9515", "abc123").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9515/session/abc123");
        assert!(session_endpoint("not a url", "x").is_err());
    }

    #[test]
    fn headed_sessions_skip_headless_flag() {
        let caps = session_capabilities(&opts(false));
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
    }
}
