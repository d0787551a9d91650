use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::*;
use crate::error::ErrorClass;

type CallLog = Arc<Mutex<Vec<(String, SourceKind)>>>;

enum Behavior {
    Ok,
    RateLimited,
    Unavailable,
    FailFor(&'static str),
    CancelAfter(&'static str, CancellationToken),
}

struct FakeClient {
    kind: SourceKind,
    behavior: Behavior,
    calls: CallLog,
}

#[async_trait]
impl SourceClient for FakeClient {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn is_configured(&self) -> bool {
        !matches!(self.behavior, Behavior::Unavailable)
    }

    async fn fetch(&self, competitor: &Competitor) -> Result<Value, SourceError> {
        self.calls
            .lock()
            .unwrap()
            .push((competitor.name.clone(), self.kind));
        let ok = json!({ "competitor": competitor.name, "source": self.kind.as_str() });
        match &self.behavior {
            Behavior::Ok => Ok(ok),
            Behavior::RateLimited => Err(SourceError::RateLimited {
                kind: self.kind,
                retry_after_secs: Some(1),
            }),
            Behavior::Unavailable => Err(SourceError::Unavailable {
                kind: self.kind,
                reason: "credential not configured",
            }),
            Behavior::FailFor(name) if competitor.name == *name => Err(SourceError::Status {
                kind: self.kind,
                status: 404,
                message: "unknown symbol".to_string(),
            }),
            Behavior::FailFor(_) => Ok(ok),
            Behavior::CancelAfter(name, token) => {
                if competitor.name == *name {
                    token.cancel();
                }
                Ok(ok)
            }
        }
    }
}

fn fake(kind: SourceKind, behavior: Behavior, calls: &CallLog) -> Box<dyn SourceClient> {
    Box::new(FakeClient {
        kind,
        behavior,
        calls: Arc::clone(calls),
    })
}

fn roster() -> Vec<Competitor> {
    vec![
        Competitor::new("Apple", "apple", "AAPL", None),
        Competitor::new("Google", "google", "GOOGL", None),
        Competitor::new("Microsoft", "microsoft", "MSFT", None),
    ]
}

fn healthy(calls: &CallLog) -> Vec<Box<dyn SourceClient>> {
    vec![
        fake(SourceKind::Quote, Behavior::Ok, calls),
        fake(SourceKind::News, Behavior::Ok, calls),
        fake(SourceKind::Social, Behavior::Ok, calls),
    ]
}

fn orchestrator(clients: Vec<Box<dyn SourceClient>>) -> CollectionOrchestrator {
    CollectionOrchestrator::new(clients).with_inter_competitor_delay(Duration::ZERO)
}

#[tokio::test]
async fn collects_competitor_major_source_minor() {
    let calls = CallLog::default();
    let report = orchestrator(healthy(&calls))
        .collect(&roster(), &CancellationToken::new())
        .await
        .unwrap();

    let order: Vec<(String, &str)> = report
        .observations
        .iter()
        .map(|o| (o.competitor.clone(), o.source.as_str()))
        .collect();
    let expected: Vec<(String, &str)> = ["Apple", "Google", "Microsoft"]
        .iter()
        .flat_map(|n| ["stock", "news", "twitter"].map(|s| ((*n).to_string(), s)))
        .collect();
    assert_eq!(order, expected);
    assert!(report.failures.is_empty());
    assert!(!report.cancelled);
    assert_eq!(report.observations.degraded_count(), 0);
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.status == OutcomeStatus::Ok));
}

#[tokio::test]
async fn empty_roster_is_fatal_and_makes_no_calls() {
    let calls = CallLog::default();
    let err = orchestrator(healthy(&calls))
        .collect(&[], &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CollectionError::EmptyRoster));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn blank_competitor_name_is_fatal() {
    let calls = CallLog::default();
    let competitors = vec![
        Competitor::new("Apple", "apple", "AAPL", None),
        Competitor::new("  ", "ghost", "GHST", None),
    ];
    let err = orchestrator(healthy(&calls))
        .collect(&competitors, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CollectionError::InvalidCompetitor { index: 1, .. }
    ));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn rate_limited_social_retries_then_degrades() {
    let calls = CallLog::default();
    let clients = vec![
        fake(SourceKind::Quote, Behavior::Ok, &calls),
        fake(SourceKind::News, Behavior::Ok, &calls),
        fake(SourceKind::Social, Behavior::RateLimited, &calls),
    ];
    let competitors = vec![Competitor::new("Apple", "apple", "AAPL", None)];
    let started = tokio::time::Instant::now();

    let report = orchestrator(clients)
        .collect(&competitors, &CancellationToken::new())
        .await
        .unwrap();

    let social_calls = calls
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, k)| *k == SourceKind::Social)
        .count();
    assert_eq!(social_calls, 3);
    assert_eq!(started.elapsed(), Duration::from_secs(15));

    assert_eq!(report.observations.len(), 3);
    let social = &report.observations.as_slice()[2];
    assert!(social.degraded);
    assert_eq!(social.note.as_deref(), Some(SAMPLE_SOCIAL_NOTE));
    assert_eq!(
        social.payload["data"][0]["text"],
        "Apple announces new product innovation"
    );

    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        CollectionError::RetriesExhausted { attempts: 3, .. }
    ));
    assert_eq!(report.outcomes[2].status, OutcomeStatus::Degraded);
}

#[tokio::test]
async fn quote_failure_is_isolated_to_one_competitor() {
    let calls = CallLog::default();
    let clients = vec![
        fake(SourceKind::Quote, Behavior::FailFor("Google"), &calls),
        fake(SourceKind::News, Behavior::Ok, &calls),
        fake(SourceKind::Social, Behavior::Ok, &calls),
    ];

    let report = orchestrator(clients)
        .collect(&roster(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.observations.len(), 8);
    assert!(!report
        .observations
        .iter()
        .any(|o| o.competitor == "Google" && o.source == SourceKind::Quote));
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.competitor, "Google");
    assert_eq!(failure.source, SourceKind::Quote);
    assert!(matches!(
        &failure.error,
        CollectionError::Source(e) if e.class() == ErrorClass::Permanent
    ));
    assert_eq!(
        calls.lock().unwrap().len(),
        9,
        "a 404 is tried exactly once"
    );
}

#[tokio::test]
async fn unconfigured_sources_degrade_without_a_request() {
    let calls = CallLog::default();
    let clients = vec![
        fake(SourceKind::Quote, Behavior::Ok, &calls),
        fake(SourceKind::News, Behavior::Unavailable, &calls),
        fake(SourceKind::Social, Behavior::Unavailable, &calls),
    ];
    let competitors = vec![Competitor::new("Apple", "apple", "AAPL", None)];

    let report = orchestrator(clients)
        .collect(&competitors, &CancellationToken::new())
        .await
        .unwrap();

    let sources: Vec<&str> = report
        .observations
        .iter()
        .map(|o| o.source.as_str())
        .collect();
    assert_eq!(sources, ["stock", "twitter"]);
    assert_eq!(report.observations.degraded_count(), 1);
    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|f| f.error.label() == "unconfigured"));
    assert_eq!(
        *calls.lock().unwrap(),
        [("Apple".to_string(), SourceKind::Quote)],
        "unconfigured clients are never called"
    );

    let statuses: Vec<OutcomeStatus> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        [
            OutcomeStatus::Ok,
            OutcomeStatus::Failed,
            OutcomeStatus::Degraded
        ]
    );
}

#[tokio::test]
async fn missing_client_is_recorded_as_failure() {
    let calls = CallLog::default();
    let clients = vec![fake(SourceKind::Quote, Behavior::Ok, &calls)];
    let competitors = vec![Competitor::new("Apple", "apple", "AAPL", None)];

    let report = orchestrator(clients)
        .collect(&competitors, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 2);
    assert!(matches!(
        report.failures[0].error,
        CollectionError::NoClient(SourceKind::News)
    ));
    assert_eq!(report.observations.len(), 2);
    assert!(report.observations.as_slice()[1].degraded);
}

#[tokio::test]
async fn cancellation_between_competitors_returns_partial_set() {
    let calls = CallLog::default();
    let token = CancellationToken::new();
    let clients = vec![
        fake(
            SourceKind::Quote,
            Behavior::CancelAfter("Google", token.clone()),
            &calls,
        ),
        fake(SourceKind::News, Behavior::Ok, &calls),
        fake(SourceKind::Social, Behavior::Ok, &calls),
    ];

    let report = orchestrator(clients)
        .collect(&roster(), &token)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(
        report.observations.len(),
        6,
        "the in-flight competitor finishes, the next one is skipped"
    );
    assert!(!report
        .observations
        .iter()
        .any(|o| o.competitor == "Microsoft"));
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_inter_competitor_delay() {
    let calls = CallLog::default();
    let token = CancellationToken::new();
    let orchestrator = CollectionOrchestrator::new(healthy(&calls))
        .with_inter_competitor_delay(Duration::from_secs(60));

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();
    });

    let started = tokio::time::Instant::now();
    let report = orchestrator.collect(&roster(), &token).await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.observations.len(), 3);
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn no_delay_after_last_competitor() {
    let calls = CallLog::default();
    let orchestrator = CollectionOrchestrator::new(healthy(&calls))
        .with_inter_competitor_delay(Duration::from_secs(2));

    let started = tokio::time::Instant::now();
    let report = orchestrator
        .collect(&roster(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.observations.len(), 9);
    assert_eq!(started.elapsed(), Duration::from_secs(4));
}
