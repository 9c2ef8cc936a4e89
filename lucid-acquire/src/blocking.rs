use lucid_common::BlockingConfig;
use std::fmt;
use std::sync::LazyLock;

/// First rule that classified an exchange as blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    Status(u16),
    TooShort(usize),
    Keyword(String),
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Status(s) => write!(f, "status {s}"),
            BlockReason::TooShort(n) => write!(f, "body only {n} chars"),
            BlockReason::Keyword(k) => write!(f, "matched {k:?}"),
        }
    }
}

/// Decides whether a response is a bot wall rather than the page.
///
/// Rules run in order (status, length, keywords); false positives are
/// accepted since a blocked verdict only means escalating to the next tier.
///
/// ```
/// use lucid_acquire::BlockDetector;
///
/// let detector = BlockDetector::default();
/// assert!(detector.is_blocked(403, &"x".repeat(5000)));
/// assert!(detector.is_blocked(200, "tiny"));
/// assert!(!detector.is_blocked(200, &"article ".repeat(100)));
/// ```
#[derive(Debug, Clone)]
pub struct BlockDetector {
    statuses: Vec<u16>,
    min_length: usize,
    keywords: Vec<String>,
}

impl Default for BlockDetector {
    fn default() -> Self {
        Self::from_config(&BlockingConfig::default())
    }
}

static DEFAULT_DETECTOR: LazyLock<BlockDetector> = LazyLock::new(BlockDetector::default);

/// [`BlockDetector::is_blocked`] with the default rules.
pub fn is_blocked(status: u16, body: &str) -> bool {
    DEFAULT_DETECTOR.is_blocked(status, body)
}

impl BlockDetector {
    pub fn from_config(config: &BlockingConfig) -> Self {
        Self {
            statuses: config.statuses.clone(),
            min_length: config.min_length,
            keywords: config
                .keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn check(&self, status: u16, body: &str) -> Option<BlockReason> {
        if self.statuses.contains(&status) {
            return Some(BlockReason::Status(status));
        }
        let chars = body.chars().count();
        if chars < self.min_length {
            return Some(BlockReason::TooShort(chars));
        }
        let lowered = body.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lowered.contains(k.as_str()))
            .map(|k| BlockReason::Keyword(k.clone()))
    }

    pub fn is_blocked(&self, status: u16, body: &str) -> bool {
        self.check(status, body).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_body() -> String {
        "<p>Plain article text about the weather.</p>".repeat(20)
    }

    #[test]
    fn block_statuses_win_regardless_of_body() {
        for status in [403, 429, 503] {
            assert_eq!(
                BlockDetector::default().check(status, &clean_body()),
                Some(BlockReason::Status(status))
            );
        }
    }

    #[test]
    fn short_bodies_are_blocked_even_on_200() {
        let body = "가".repeat(499);
        assert_eq!(
            BlockDetector::default().check(200, &body),
            Some(BlockReason::TooShort(499))
        );
        // counts characters, not bytes
        assert!(!is_blocked(200, &"가".repeat(500)));
    }

    #[test]
    fn keywords_match_case_insensitively() {
        let body = format!("{}<h1>Attention Required! | Cloudflare</h1>", clean_body());
        assert_eq!(
            BlockDetector::default().check(200, &body),
            Some(BlockReason::Keyword("attention required".into()))
        );
        let body = format!("{}Please complete the CAPTCHA", clean_body());
        assert!(is_blocked(200, &body));
    }

    #[test]
    fn clean_pages_pass() {
        assert!(!is_blocked(200, &clean_body()));
        assert!(!is_blocked(404, &clean_body()));
    }

    #[test]
    fn custom_rules_replace_defaults() {
        let detector = BlockDetector::from_config(&BlockingConfig {
            statuses: vec![418],
            min_length: 10,
            keywords: vec!["Paywall".into()],
        });
        assert!(!detector.is_blocked(403, "long enough text"));
        assert!(detector.is_blocked(418, "long enough text"));
        assert!(detector.is_blocked(200, "this is a PAYWALL page"));
    }
}
