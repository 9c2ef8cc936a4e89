use lucid_common::EvasionConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Snapshot of user agent, viewport, and locale characteristics for one
/// browser session.
pub struct BrowserProfile {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub platform: String,
    pub locale: String,
    pub languages: Vec<String>,
    pub timezone: String,
}

/// Draws a fresh [`BrowserProfile`] per session from the configured pools.
///
/// With `seed` set the sequence of profiles is reproducible.
///
/// ```
/// use lucid_common::EvasionConfig;
/// use lucid_drivers::browser::fingerprint::ProfileSampler;
///
/// let cfg = EvasionConfig { seed: Some(7), ..EvasionConfig::default() };
/// let a = ProfileSampler::from_config(&cfg).sample();
/// let b = ProfileSampler::from_config(&cfg).sample();
/// assert_eq!(a, b);
/// ```
pub struct ProfileSampler {
    config: EvasionConfig,
    rng: StdRng,
}

impl ProfileSampler {
    pub fn from_config(config: &EvasionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config: config.clone(),
            rng,
        }
    }

    pub fn sample(&mut self) -> BrowserProfile {
        let user_agent = self
            .config
            .user_agents
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| FALLBACK_USER_AGENT.to_string());
        let viewport = self
            .config
            .viewports
            .choose(&mut self.rng)
            .copied()
            .unwrap_or((1920, 1080));
        let locale = self
            .config
            .locales
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| "en-US".to_string());
        let timezone = self
            .config
            .timezones
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| "UTC".to_string());

        BrowserProfile {
            platform: platform_for(&user_agent).to_string(),
            languages: languages_for(&locale),
            user_agent,
            viewport,
            locale,
            timezone,
        }
    }
}

fn platform_for(user_agent: &str) -> &'static str {
    if user_agent.contains("Windows") {
        "Win32"
    } else if user_agent.contains("Macintosh") {
        "MacIntel"
    } else {
        "Linux x86_64"
    }
}

/// `ko-KR` -> `["ko-KR", "ko"]`
fn languages_for(locale: &str) -> Vec<String> {
    let mut langs = vec![locale.to_string()];
    if let Some((base, _)) = locale.split_once('-') {
        langs.push(base.to_string());
    }
    langs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampled_values_come_from_configured_pools() {
        let cfg = EvasionConfig {
            user_agents: vec!["Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)".into()],
            viewports: vec![(1440, 900)],
            locales: vec!["ko-KR".into()],
            timezones: vec!["Asia/Seoul".into()],
            seed: None,
        };
        let profile = ProfileSampler::from_config(&cfg).sample();
        assert_eq!(profile.platform, "MacIntel");
        assert_eq!(profile.viewport, (1440, 900));
        assert_eq!(profile.languages, vec!["ko-KR", "ko"]);
        assert_eq!(profile.timezone, "Asia/Seoul");
    }

    #[test]
    fn empty_pools_fall_back_to_a_desktop_profile() {
        let cfg = EvasionConfig {
            user_agents: vec![],
            viewports: vec![],
            locales: vec![],
            timezones: vec![],
            seed: Some(1),
        };
        let profile = ProfileSampler::from_config(&cfg).sample();
        assert_eq!(profile.platform, "Win32");
        assert_eq!(profile.languages, vec!["en-US", "en"]);
        assert_eq!(profile.timezone, "UTC");
    }

    #[test]
    fn seeded_sampler_varies_across_sessions() {
        let cfg = EvasionConfig {
            seed: Some(42),
            ..EvasionConfig::default()
        };
        let mut sampler = ProfileSampler::from_config(&cfg);
        let profiles: Vec<_> = (0..20).map(|_| sampler.sample()).collect();
        assert!(profiles.windows(2).any(|w| w[0] != w[1]));
    }
}
