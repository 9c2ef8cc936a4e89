use crate::browser::{
    behavioral::BehavioralEngine, cdp::AddInitScript, fingerprint::BrowserProfile,
    stealth::StealthScripts,
};
use anyhow::{Context, Result};
use fantoccini::Client;
use lucid_common::StealthLevel;

/// A navigated tab in a [`super::driver::LucidDriver`] session.
pub struct LucidPage {
    pub(crate) client: Client,
    pub(crate) stealth_level: StealthLevel,
    pub(crate) profile: BrowserProfile,
    pub(crate) behavioral_engine: BehavioralEngine,
}

impl LucidPage {
    pub fn new(
        client: Client,
        stealth_level: StealthLevel,
        profile: BrowserProfile,
        behavioral_engine: BehavioralEngine,
    ) -> Self {
        Self {
            client,
            stealth_level,
            profile,
            behavioral_engine,
        }
    }

    /// Register the stealth scripts for new documents, then navigate.
    pub async fn goto(&mut self, url: &str) -> Result<()> {
        self.install_stealth().await?;
        self.behavioral_engine.random_delay(100, 400).await;
        self.client
            .goto(url)
            .await
            .with_context(|| format!("navigating to {url}"))
    }

    async fn install_stealth(&self) -> Result<()> {
        for script in StealthScripts::for_level(self.stealth_level, &self.profile) {
            self.client
                .issue_cmd(AddInitScript::new(&script))
                .await
                .context("registering init script")?;
        }
        Ok(())
    }

    /// Wait a jittered idle window so late scripts can populate the DOM.
    pub async fn settle(&self, min_ms: u64, max_ms: u64) {
        self.behavioral_engine.random_delay(min_ms, max_ms).await;
    }

    /// Return the full page HTML source.
    pub async fn content(&self) -> Result<String> {
        self.client.source().await.map_err(anyhow::Error::msg)
    }
}
