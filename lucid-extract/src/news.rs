//! News-article extraction with its own download of the URL.
//!
//! Paragraph-like nodes (`p`, `pre`, `td`) are scored by how many function
//! words of the request language they contain. Scores bubble up to the
//! parent (in full) and grandparent (half), and the best-scoring container's
//! text becomes the article body.
use crate::metadata::{PageMetadata, shorten_title};
use crate::strategy::ExtractionStrategy;
use crate::text::{element_text_filtered, inline_text};
use crate::PageInput;
use async_trait::async_trait;
use lucid_common::{ExtractionCandidate, Strategy};
use lucid_http::{HttpClient, HttpError, RequestOpts};
use lucid_runtime::BlockingPool;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const NEWS_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Paragraphs need at least this many stopword hits to count.
const MIN_PARAGRAPH_SCORE: usize = 3;

const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "for", "from", "had", "has", "have", "he", "her",
    "his", "if", "in", "into", "is", "it", "its", "more", "no", "not", "of", "on", "one", "or",
    "our", "out", "said", "she", "so", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "to", "up", "was", "we", "were", "what", "when", "which", "who",
    "will", "with", "would", "you",
];

const KOREAN_STOPWORDS: &[&str] = &[
    "그", "이", "저", "것", "수", "등", "및", "또", "또는", "그리고", "그러나", "하지만", "때문에",
    "위해", "대한", "통해", "있는", "있다", "없다", "했다", "한다", "이번", "지난", "오는",
];

/// Korean particles and sentence endings glued onto content words.
const KOREAN_SUFFIXES: &[&str] = &[
    "다", "은", "는", "이", "가", "을", "를", "에", "의", "도", "로", "과", "와", "서",
];

#[derive(Debug, Error)]
pub enum NewsFetchError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("article request returned status {0}")]
    Status(u16),
}

/// Downloads article HTML independently of the acquisition tiers.
#[async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch(&self, url: &str, language: &str) -> Result<String, NewsFetchError>;
}

pub struct HttpArticleFetcher {
    http: HttpClient,
    timeout: Duration,
}

impl HttpArticleFetcher {
    pub fn new(http: HttpClient, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

#[async_trait]
impl ArticleFetcher for HttpArticleFetcher {
    async fn fetch(&self, url: &str, language: &str) -> Result<String, NewsFetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(NEWS_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("text/html,*/*;q=0.8"));
        if let Ok(lang) = HeaderValue::from_str(&format!("{language},en;q=0.5")) {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }
        let page = self
            .http
            .fetch_page(
                url,
                RequestOpts {
                    timeout: Some(self.timeout),
                    headers: Some(headers),
                    ..Default::default()
                },
            )
            .await?;
        if !page.status.is_success() {
            return Err(NewsFetchError::Status(page.status.as_u16()));
        }
        Ok(page.body)
    }
}

pub struct NewsStrategy {
    fetcher: Arc<dyn ArticleFetcher>,
    min_chars: usize,
}

impl NewsStrategy {
    pub fn new(fetcher: Arc<dyn ArticleFetcher>, min_chars: usize) -> Self {
        Self { fetcher, min_chars }
    }
}

#[async_trait]
impl ExtractionStrategy for NewsStrategy {
    fn kind(&self) -> Strategy {
        Strategy::NewsArticle
    }

    fn min_chars(&self) -> usize {
        self.min_chars
    }

    async fn extract(
        &self,
        page: Arc<PageInput>,
        pool: &BlockingPool,
    ) -> Option<ExtractionCandidate> {
        let html = match self.fetcher.fetch(&page.url, &page.language).await {
            Ok(html) => html,
            Err(err) => {
                tracing::debug!(target: "extract.news", error = %err, "news.fetch.failed");
                return None;
            }
        };
        let language = page.language.clone();
        match pool.run(move || parse_article(&html, &language)).await {
            Ok(candidate) => candidate,
            Err(err) => {
                tracing::warn!(target: "extract.news", error = %err, "news.parse.failed");
                None
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Stopwords {
    English,
    Korean,
}

impl Stopwords {
    fn for_language(language: &str) -> Self {
        let primary = language.split(['-', '_']).next().unwrap_or_default();
        if primary.eq_ignore_ascii_case("ko") {
            Stopwords::Korean
        } else {
            Stopwords::English
        }
    }

    fn score(self, text: &str) -> usize {
        match self {
            Stopwords::English => text
                .split(|c: char| !c.is_alphanumeric() && c != '\'')
                .filter(|w| !w.is_empty())
                .filter(|w| ENGLISH_STOPWORDS.contains(&w.to_lowercase().as_str()))
                .count(),
            Stopwords::Korean => text
                .split_whitespace()
                .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
                .filter(|w| {
                    KOREAN_STOPWORDS.contains(w)
                        || (w.chars().count() > 1 && KOREAN_SUFFIXES.iter().any(|s| w.ends_with(s)))
                })
                .count(),
        }
    }
}

/// Best article body and cleaned title of `html`, scored for `language`.
pub fn parse_article(html: &str, language: &str) -> Option<ExtractionCandidate> {
    let doc = Html::parse_document(html);
    let stopwords = Stopwords::for_language(language);
    let paragraphs = Selector::parse("p, pre, td").ok()?;
    let links = Selector::parse("a").ok()?;

    // Document order is kept so ties go to the earlier container.
    let mut scores = Vec::new();
    for node in doc.select(&paragraphs) {
        let text = inline_text(node);
        let score = stopwords.score(&text);
        if score < MIN_PARAGRAPH_SCORE || is_mostly_links(node, &links, &text) {
            continue;
        }
        let Some(parent) = node.parent() else {
            continue;
        };
        add_score(&mut scores, parent.id(), score * 2);
        if let Some(grandparent) = parent.parent() {
            add_score(&mut scores, grandparent.id(), score);
        }
    }

    let (best, _) = scores.into_iter().rev().max_by_key(|(_, score)| *score)?;
    let best = doc.tree.get(best).and_then(ElementRef::wrap)?;
    let content = element_text_filtered(best, |el| {
        matches!(
            el.value().name(),
            "nav" | "aside" | "figure" | "form" | "button" | "footer"
        )
    });
    if content.is_empty() {
        return None;
    }

    let title = PageMetadata::from_document(&doc)
        .title()
        .map(shorten_title)
        .unwrap_or_default();
    Some(ExtractionCandidate::new(title, content, Strategy::NewsArticle))
}

fn add_score<K: PartialEq>(scores: &mut Vec<(K, usize)>, key: K, add: usize) {
    match scores.iter_mut().find(|(k, _)| *k == key) {
        Some((_, score)) => *score += add,
        None => scores.push((key, add)),
    }
}

fn is_mostly_links(node: ElementRef<'_>, links: &Selector, text: &str) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return true;
    }
    let linked: usize = node
        .select(links)
        .map(|a| inline_text(a).chars().count())
        .sum();
    linked * 2 > total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_densest_container() {
        let html = r#"<html><head><title>Rates rise again | Daily Ledger</title></head><body>
            <div id="promo"><p>Subscribe today</p></div>
            <div id="story">
              <p>The central bank said on Thursday that it would raise rates by a quarter point.</p>
              <p>It was the third increase this year, and analysts said more were likely to follow.</p>
            </div>
            <div id="links"><p><a href="/x">Read more about the bank and the rates in this other piece</a></p></div>
            </body></html>"#;
        let candidate = parse_article(html, "en").unwrap();
        assert_eq!(candidate.title, "Rates rise again");
        assert!(candidate.content.starts_with("The central bank said"));
        assert!(candidate.content.contains("third increase"));
        assert!(!candidate.content.contains("Subscribe"));
        assert!(!candidate.content.contains("Read more"));
    }

    #[test]
    fn korean_scoring_uses_particles() {
        let html = r#"<body><section>
            <p>정부는 오늘 새로운 경제 정책을 발표했다. 이번 정책은 중소기업 지원에 초점을 맞췄다.</p>
            </section><div><p>광고 문의</p></div></body>"#;
        let candidate = parse_article(html, "ko").unwrap();
        assert!(candidate.content.starts_with("정부는 오늘"));
        assert_eq!(candidate.strategy, Strategy::NewsArticle);
    }

    #[test]
    fn paragraphs_need_three_stopwords() {
        // "the", "and": two hits
        let two = "<body><div><p>Harbor cranes the cargo and ships</p></div></body>";
        assert!(parse_article(two, "en").is_none());
        // "the", "and", "the": three hits
        let three = "<body><div><p>Harbor cranes the cargo and the ships</p></div></body>";
        assert_eq!(
            parse_article(three, "en").unwrap().content,
            "Harbor cranes the cargo and the ships"
        );
    }

    #[test]
    fn no_scored_paragraph_is_none() {
        assert!(parse_article("<body><p>Hi</p></body>", "en").is_none());
    }

    #[test]
    fn language_tags_map_to_stopword_lists() {
        assert!(matches!(Stopwords::for_language("ko-KR"), Stopwords::Korean));
        assert!(matches!(Stopwords::for_language("en"), Stopwords::English));
        assert!(matches!(Stopwords::for_language(""), Stopwords::English));
    }
}
