use crate::error::TierFailure;
use crate::headers::browser_headers;
use async_trait::async_trait;
use lucid_common::EvasionConfig;
use lucid_http::{HttpClient, RequestOpts};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Mutex;
use url::Url;

/// Status and body of a direct fetch, before any block classification.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait StaticFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, TierFailure>;
}

/// Plain HTTP GET dressed up as a browser navigation.
pub struct HttpStaticFetcher {
    http: HttpClient,
    user_agents: Vec<String>,
    rng: Mutex<StdRng>,
}

impl HttpStaticFetcher {
    pub fn new(http: HttpClient, evasion: &EvasionConfig) -> Self {
        let rng = match evasion.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            http,
            user_agents: evasion.user_agents.clone(),
            rng: Mutex::new(rng),
        }
    }

    fn pick_user_agent(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        self.user_agents
            .choose(&mut *rng)
            .cloned()
            .unwrap_or_else(|| "Mozilla/5.0".to_string())
    }
}

#[async_trait]
impl StaticFetcher for HttpStaticFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, TierFailure> {
        let user_agent = self.pick_user_agent();
        let page = self
            .http
            .fetch_page(
                url.as_str(),
                RequestOpts {
                    headers: Some(browser_headers(&user_agent)),
                    ..Default::default()
                },
            )
            .await?;
        Ok(FetchedPage {
            status: page.status.as_u16(),
            body: page.body,
        })
    }
}
