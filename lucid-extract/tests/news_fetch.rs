use lucid_common::Strategy;
use lucid_extract::news::NewsStrategy;
use lucid_extract::{ArticleFetcher, ExtractionStrategy, HttpArticleFetcher, NewsFetchError, PageInput};
use lucid_http::HttpClient;
use lucid_runtime::BlockingPool;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STORY: &str = r#"<html><head><meta property="og:title" content="Harbor reopens - Coast News"></head><body>
<div class="story">
<p>The harbor was reopened on Monday after a week of repairs, and the first boats came in at dawn.</p>
<p>Officials said that the work had been finished ahead of schedule and that traffic would return to normal.</p>
</div></body></html>"#;

fn fetcher() -> HttpArticleFetcher {
    HttpArticleFetcher::new(HttpClient::unanchored().unwrap(), Duration::from_secs(5))
}

#[tokio::test]
async fn downloads_the_url_itself() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/harbor"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string(STORY))
        .expect(1)
        .mount(&server)
        .await;

    let strategy = NewsStrategy::new(Arc::new(fetcher()), 100);
    // The acquired HTML is irrelevant to this strategy.
    let page = PageInput::new("<p>acquired</p>", format!("{}/harbor", server.uri()), "en");
    let candidate = strategy
        .extract(Arc::new(page), &BlockingPool::new(1))
        .await
        .expect("candidate");

    assert_eq!(candidate.strategy, Strategy::NewsArticle);
    assert_eq!(candidate.title, "Harbor reopens");
    assert!(candidate.content.starts_with("The harbor was reopened"));
    assert!(candidate.content_chars() > 100);
}

#[tokio::test]
async fn error_status_is_a_failed_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string(STORY))
        .mount(&server)
        .await;

    let err = fetcher()
        .fetch(&format!("{}/gone", server.uri()), "ko")
        .await
        .unwrap_err();
    assert!(matches!(err, NewsFetchError::Status(404)));

    let strategy = NewsStrategy::new(Arc::new(fetcher()), 100);
    let page = PageInput::new(STORY, format!("{}/gone", server.uri()), "en");
    assert!(strategy.extract(Arc::new(page), &BlockingPool::new(1)).await.is_none());
}
