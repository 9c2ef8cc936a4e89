mod common;

use common::{FakeAcquirer, Outcome, article_page, orchestrator, refiner};
use futures::StreamExt;
use lucid_app::{ExtractRequest, OrchestratorSettings, ServiceError};
use lucid_common::{ProgressEvent, ProgressStatus, Provenance};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const URL: &str = "https://news.example.com/2024/story";

fn statuses(events: &[ProgressEvent]) -> Vec<ProgressStatus> {
    events.iter().map(|e| e.status).collect()
}

fn assert_well_formed(events: &[ProgressEvent]) {
    assert!(events.windows(2).all(|w| w[0].progress <= w[1].progress));
    let terminals = events.iter().filter(|e| e.is_terminal()).count();
    assert_eq!(terminals, 1);
    assert!(events.last().unwrap().is_terminal());
}

#[tokio::test]
async fn sync_static_page() {
    let body = "가".repeat(300);
    let orch = orchestrator(
        FakeAcquirer::new(Outcome::Page(article_page(&body), Provenance::Static)),
        None,
        OrchestratorSettings::default(),
    );
    let result = orch
        .handle(ExtractRequest::new(URL), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.title, "기사 제목");
    assert_eq!(result.content, body);
    assert_eq!(result.source_url, URL);
    assert!(!result.from_archive);
    assert_eq!(result.document_type.as_deref(), Some("article"));
}

#[tokio::test]
async fn stream_static_without_refiner() {
    let orch = Arc::new(orchestrator(
        FakeAcquirer::new(Outcome::Page(article_page(&"a".repeat(500)), Provenance::Static)),
        None,
        OrchestratorSettings::default(),
    ));
    let events: Vec<_> = orch
        .stream(ExtractRequest::new(URL), CancellationToken::new())
        .collect()
        .await;
    assert_eq!(
        statuses(&events),
        [ProgressStatus::Crawling, ProgressStatus::Parsing, ProgressStatus::Done]
    );
    assert_well_formed(&events);
    let done = events.last().unwrap().data.as_ref().unwrap();
    assert!(!done.from_archive);
}

#[tokio::test]
async fn stream_archived_and_refined() {
    let orch = Arc::new(orchestrator(
        FakeAcquirer::new(Outcome::Page(article_page(&"b".repeat(400)), Provenance::Archived)),
        Some(refiner("refined body")),
        OrchestratorSettings::default(),
    ));
    let events: Vec<_> = orch
        .stream(ExtractRequest::new(URL), CancellationToken::new())
        .collect()
        .await;
    assert_eq!(
        statuses(&events),
        [
            ProgressStatus::Crawling,
            ProgressStatus::ArchiveNotice,
            ProgressStatus::Parsing,
            ProgressStatus::AiProcessing,
            ProgressStatus::Done,
        ]
    );
    assert_eq!(
        events.iter().map(|e| e.progress).collect::<Vec<_>>(),
        [25, 40, 50, 75, 100]
    );
    let done = events.last().unwrap().data.as_ref().unwrap();
    assert!(done.from_archive);
    assert_eq!(done.content, "refined body");
}

#[tokio::test]
async fn short_content_skips_refinement() {
    let body = "c".repeat(150);
    let orch = Arc::new(orchestrator(
        FakeAcquirer::new(Outcome::Page(article_page(&body), Provenance::Rendered)),
        Some(refiner("should not appear")),
        OrchestratorSettings::default(),
    ));
    let events: Vec<_> = orch
        .stream(ExtractRequest::new(URL), CancellationToken::new())
        .collect()
        .await;
    assert!(!statuses(&events).contains(&ProgressStatus::AiProcessing));
    assert_eq!(events.last().unwrap().data.as_ref().unwrap().content, body);
}

#[tokio::test]
async fn exhausted_acquisition() {
    let orch = Arc::new(orchestrator(
        FakeAcquirer::new(Outcome::Exhausted),
        None,
        OrchestratorSettings::default(),
    ));
    let err = orch
        .handle(ExtractRequest::new(URL), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unreachable(_)));
    assert!(err.to_string().contains("archived copy"));

    let events: Vec<_> = orch
        .stream(ExtractRequest::new(URL), CancellationToken::new())
        .collect()
        .await;
    assert_eq!(statuses(&events), [ProgressStatus::Crawling, ProgressStatus::Error]);
    assert_eq!(events[1].progress, 25);
    assert_well_formed(&events);
}

#[tokio::test]
async fn unparseable_page() {
    let orch = Arc::new(orchestrator(
        FakeAcquirer::new(Outcome::Page("<p>tiny</p>".into(), Provenance::Static)),
        None,
        OrchestratorSettings::default(),
    ));
    let err = orch
        .handle(ExtractRequest::new(URL), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unparseable { chars: 4 }));

    let events: Vec<_> = orch
        .stream(ExtractRequest::new(URL), CancellationToken::new())
        .collect()
        .await;
    assert_eq!(
        statuses(&events),
        [ProgressStatus::Crawling, ProgressStatus::Parsing, ProgressStatus::Error]
    );
    assert_eq!(events[2].progress, 50);
}

#[tokio::test]
async fn content_of_exactly_viable_length_passes() {
    let run = |viable_length| async move {
        let orch = orchestrator(
            FakeAcquirer::new(Outcome::Page("<p>tiny</p>".into(), Provenance::Static)),
            None,
            OrchestratorSettings {
                viable_length,
                ..OrchestratorSettings::default()
            },
        );
        orch.handle(ExtractRequest::new(URL), &CancellationToken::new())
            .await
    };
    assert_eq!(run(4).await.unwrap().content, "tiny");
    assert!(matches!(
        run(5).await.unwrap_err(),
        ServiceError::Unparseable { chars: 4 }
    ));
}

#[tokio::test]
async fn invalid_url_errors_before_crawling() {
    let orch = Arc::new(orchestrator(
        FakeAcquirer::new(Outcome::Exhausted),
        None,
        OrchestratorSettings::default(),
    ));
    let events: Vec<_> = orch
        .stream(ExtractRequest::new("not a url"), CancellationToken::new())
        .collect()
        .await;
    assert_eq!(statuses(&events), [ProgressStatus::Error]);
    assert_eq!(events[0].progress, 0);
}

#[tokio::test]
async fn content_is_capped() {
    let settings = OrchestratorSettings {
        max_content_length: Some(120),
        ..OrchestratorSettings::default()
    };
    let orch = orchestrator(
        FakeAcquirer::new(Outcome::Page(article_page(&"한".repeat(400)), Provenance::Static)),
        None,
        settings,
    );
    let result = orch
        .handle(ExtractRequest::new(URL), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.content.chars().count(), 120);
}

#[tokio::test]
async fn dropping_the_stream_cancels_the_work() {
    let acquirer = FakeAcquirer::new(Outcome::Hang);
    let saw_cancel = Arc::clone(&acquirer.saw_cancel);
    let orch = Arc::new(orchestrator(acquirer, None, OrchestratorSettings::default()));

    let mut stream = Box::pin(orch.stream(ExtractRequest::new(URL), CancellationToken::new()));
    let first = stream.next().await.unwrap();
    assert_eq!(first.status, ProgressStatus::Crawling);
    drop(stream);

    tokio::time::timeout(Duration::from_secs(2), async {
        while !saw_cancel.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("worker observed cancellation");
}
