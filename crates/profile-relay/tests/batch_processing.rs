//! End-to-end pipeline runs against an in-memory store and scripted
//! providers: fallback, quality gating, duplicate handling, and budget
//! accounting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};

use profile_relay::error::{ClassifiedError, ErrorKind};
use profile_relay::pipeline::{
    BatchLimits, BatchResult, BatchRunner, CanonicalProfile, FallbackOrchestrator, Identifier,
    ProcessingError, ProfileProcessor, QualityScore, RetryPolicy, ScoringEngine,
};
use profile_relay::providers::{FetchProfile, ProviderKind};
use profile_relay::store::{ProfileStore, StoreError, StoredProfile};

#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<String, StoredProfile>>,
    duplicates: Mutex<Vec<String>>,
    persisted: Mutex<Vec<(String, u8)>>,
    marked_failed: Mutex<Vec<String>>,
}

impl MemoryStore {
    fn seed(&self, node_id: &str, username: Option<&str>, already_scraped: bool) {
        self.records.lock().expect("store mutex poisoned").insert(
            node_id.to_string(),
            StoredProfile {
                node_id: node_id.to_string(),
                username: username.map(str::to_string),
                already_scraped,
            },
        );
    }

    fn report_duplicate_for(&self, node_id: &str) {
        self.duplicates
            .lock()
            .expect("store mutex poisoned")
            .push(node_id.to_string());
    }

    fn persisted(&self) -> Vec<(String, u8)> {
        self.persisted.lock().expect("store mutex poisoned").clone()
    }

    fn marked_failed(&self) -> Vec<String> {
        self.marked_failed
            .lock()
            .expect("store mutex poisoned")
            .clone()
    }
}

impl ProfileStore for MemoryStore {
    async fn lookup(&self, node_id: &str) -> Result<Option<StoredProfile>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("store mutex poisoned")
            .get(node_id)
            .cloned())
    }

    async fn persist(
        &self,
        node_id: &str,
        _profile: &CanonicalProfile,
        score: &QualityScore,
    ) -> Result<(), StoreError> {
        if self
            .duplicates
            .lock()
            .expect("store mutex poisoned")
            .iter()
            .any(|id| id == node_id)
        {
            return Err(StoreError::Duplicate);
        }
        self.persisted
            .lock()
            .expect("store mutex poisoned")
            .push((node_id.to_string(), score.overall));
        Ok(())
    }

    async fn mark_failed(&self, node_id: &str, _reason: &str) -> Result<(), StoreError> {
        self.marked_failed
            .lock()
            .expect("store mutex poisoned")
            .push(node_id.to_string());
        Ok(())
    }

    async fn candidates(&self, limit: usize) -> Result<Vec<StoredProfile>, StoreError> {
        let records = self.records.lock().expect("store mutex poisoned");
        Ok(records
            .values()
            .filter(|record| !record.already_scraped)
            .take(limit)
            .cloned()
            .collect())
    }
}

enum StubBehavior {
    Rich,
    Sparse,
    Fail(ErrorKind),
    Slow(Duration),
}

struct StubProvider {
    kind: ProviderKind,
    behavior: StubBehavior,
}

impl StubProvider {
    fn rich(kind: ProviderKind) -> Self {
        Self {
            kind,
            behavior: StubBehavior::Rich,
        }
    }

    fn failing(kind: ProviderKind, error: ErrorKind) -> Self {
        Self {
            kind,
            behavior: StubBehavior::Fail(error),
        }
    }
}

impl FetchProfile for StubProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch(&self, username: &str) -> Result<Value, ClassifiedError> {
        match &self.behavior {
            StubBehavior::Rich => Ok(rich_payload(username)),
            StubBehavior::Sparse => Ok(json!({ "username": username, "headline": "Hi" })),
            StubBehavior::Fail(kind) => Err(ClassifiedError::for_provider(
                *kind,
                self.kind,
                "scripted failure",
            )),
            StubBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(rich_payload(username))
            }
        }
    }
}

/// A payload rich enough to clear the default 75-point threshold.
fn rich_payload(username: &str) -> Value {
    json!({
        "username": username,
        "headline": "Staff engineer shipping resilient data platforms at scale",
        "summary": "s".repeat(600),
        "geo": { "full": "Lisbon, Portugal" },
        "profilePicture": "https://cdn.example.test/avatar.jpg",
        "backgroundImage": [
            { "width": 800, "height": 200, "url": "https://cdn.example.test/bg.jpg" }
        ],
        "position": (0..4).map(|index| json!({
            "title": format!("Role {index}"),
            "companyName": "Initech",
            "description": "d".repeat(80),
            "start": { "year": 2018, "month": 1 },
            "end": { "year": 2020, "month": 1 }
        })).collect::<Vec<_>>(),
        "educations": [
            { "schoolName": "Tech University", "degree": "BSc" },
            { "schoolName": "State College", "degree": "MSc" }
        ],
        "skills": (0..12).map(|index| json!({ "name": format!("skill-{index}") })).collect::<Vec<_>>(),
        "certifications": [
            { "name": "Cloud Architect", "authority": "Cloud Org" }
        ]
    })
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        request_timeout: Duration::from_millis(200),
        max_attempts: 2,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
    }
}

fn runner_with(
    store: Arc<MemoryStore>,
    chain: Vec<StubProvider>,
    limits: BatchLimits,
) -> BatchRunner<MemoryStore, StubProvider> {
    let orchestrator = FallbackOrchestrator::new(chain, fast_policy());
    let processor = ProfileProcessor::new(store, orchestrator, ScoringEngine::new(75));
    BatchRunner::new(processor, limits)
}

fn default_limits() -> BatchLimits {
    BatchLimits {
        max_workers: 2,
        budget: Duration::from_secs(5),
    }
}

async fn run_batch(
    store: Arc<MemoryStore>,
    chain: Vec<StubProvider>,
    identifiers: Vec<Identifier>,
) -> BatchResult {
    runner_with(store, chain, default_limits())
        .run(identifiers)
        .await
}

#[tokio::test]
async fn mixed_batch_reports_every_identifier_in_input_order() {
    let store = Arc::new(MemoryStore::default());
    store.seed("node-2", Some("bob456"), true);

    let identifiers = vec![
        Identifier::with_username("node-1", "alice123"),
        Identifier::new("node-2"),
        Identifier::new("node-3"),
    ];
    let result = run_batch(
        Arc::clone(&store),
        vec![StubProvider::rich(ProviderKind::RapidApi)],
        identifiers,
    )
    .await;

    assert_eq!(result.processed, 3);
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.profiles_scraped, 1);

    let ids: Vec<&str> = result
        .outcomes
        .iter()
        .map(|outcome| outcome.identifier.node_id.as_str())
        .collect();
    assert_eq!(ids, vec!["node-1", "node-2", "node-3"]);

    assert!(result.outcomes[0].newly_scraped);
    assert!(result.outcomes[1].already_processed);
    // node-3 has no hint and no stored username.
    assert!(matches!(
        result.outcomes[2].error,
        Some(ProcessingError::Processing(_))
    ));
    assert!(result.retryable_failures.is_empty());
    assert_eq!(store.persisted().len(), 1);
}

#[tokio::test]
async fn fallback_chain_recovers_from_failing_providers() {
    let store = Arc::new(MemoryStore::default());
    let chain = vec![
        StubProvider::failing(ProviderKind::RapidApi, ErrorKind::FetchConnection),
        StubProvider::failing(ProviderKind::Scrapfly, ErrorKind::FetchAuthentication),
        StubProvider::rich(ProviderKind::Proxycurl),
    ];

    let result = run_batch(
        Arc::clone(&store),
        chain,
        vec![Identifier::with_username("node-1", "alice123")],
    )
    .await;

    assert_eq!(result.succeeded, 1);
    let outcome = &result.outcomes[0];
    assert!(outcome.newly_scraped);
    let quality = outcome.quality.as_ref().expect("quality attached");
    assert!(quality.meets_threshold);
    assert_eq!(store.persisted(), vec![("node-1".to_string(), quality.overall)]);
}

#[tokio::test]
async fn proxycurl_payloads_score_through_the_same_rubric() {
    let store = Arc::new(MemoryStore::default());
    struct ProxyStub;
    impl FetchProfile for ProxyStub {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Proxycurl
        }
        async fn fetch(&self, username: &str) -> Result<Value, ClassifiedError> {
            Ok(json!({
                "public_identifier": username,
                "headline": "Data engineer building streaming ingestion for analytics teams",
                "summary": "p".repeat(600),
                "city": "Austin",
                "country_full_name": "United States",
                "profile_pic_url": "https://cdn.example.test/p.jpg",
                "background_cover_image_url": "https://cdn.example.test/bg.jpg",
                "experiences": (0..4).map(|index| json!({
                    "title": format!("Role {index}"),
                    "company": "Pipeline Inc",
                    "description": "d".repeat(80),
                    "starts_at": { "year": 2019, "month": 1 }
                })).collect::<Vec<_>>(),
                "education": [
                    { "school": "River College", "degree_name": "BSc" },
                    { "school": "State University", "degree_name": "MSc" }
                ],
                "skills": (0..12).map(|index| format!("skill-{index}")).collect::<Vec<_>>(),
                "personal_emails": ["dan@example.test"]
            }))
        }
    }

    let orchestrator = FallbackOrchestrator::new(vec![ProxyStub], fast_policy());
    let processor = ProfileProcessor::new(Arc::clone(&store), orchestrator, ScoringEngine::new(75));
    let outcome = processor
        .process(&Identifier::with_username("node-1", "dan-data"))
        .await;

    assert!(outcome.success, "outcome: {outcome:?}");
    assert!(outcome.quality.expect("scored").meets_threshold);
}

#[tokio::test]
async fn transient_chain_failure_is_reported_for_redelivery() {
    let store = Arc::new(MemoryStore::default());
    let chain = vec![
        StubProvider::failing(ProviderKind::RapidApi, ErrorKind::FetchTimeout),
        StubProvider::failing(ProviderKind::Scrapfly, ErrorKind::FetchConnection),
    ];

    let result = run_batch(
        Arc::clone(&store),
        chain,
        vec![Identifier::with_username("node-1", "alice123")],
    )
    .await;

    assert_eq!(result.failed, 1);
    let outcome = &result.outcomes[0];
    assert!(!outcome.success);
    assert!(matches!(outcome.error, Some(ProcessingError::Fetch(_))));
    assert_eq!(result.retryable_failures, vec!["node-1"]);
    // The failure is recorded on the store for operators.
    assert_eq!(store.marked_failed(), vec!["node-1"]);
}

#[tokio::test]
async fn not_found_everywhere_is_a_permanent_failure() {
    let store = Arc::new(MemoryStore::default());
    let chain = vec![
        StubProvider::failing(ProviderKind::RapidApi, ErrorKind::FetchNotFound),
        StubProvider::failing(ProviderKind::Scrapfly, ErrorKind::FetchNotFound),
    ];

    let result = run_batch(
        Arc::clone(&store),
        chain,
        vec![Identifier::with_username("node-1", "ghost")],
    )
    .await;

    assert_eq!(result.failed, 1);
    assert!(result.retryable_failures.is_empty());
}

#[tokio::test]
async fn below_threshold_profile_fails_permanently() {
    let store = Arc::new(MemoryStore::default());
    let chain = vec![StubProvider {
        kind: ProviderKind::RapidApi,
        behavior: StubBehavior::Sparse,
    }];

    let result = run_batch(
        Arc::clone(&store),
        chain,
        vec![Identifier::with_username("node-1", "alice123")],
    )
    .await;

    assert_eq!(result.failed, 1);
    let outcome = &result.outcomes[0];
    assert!(matches!(outcome.error, Some(ProcessingError::Quality(_))));
    assert!(result.retryable_failures.is_empty());
    assert!(store.persisted().is_empty());
    assert_eq!(store.marked_failed(), vec!["node-1"]);
}

#[tokio::test]
async fn duplicate_persistence_is_a_success_no_op() {
    let store = Arc::new(MemoryStore::default());
    store.report_duplicate_for("node-1");

    let result = run_batch(
        Arc::clone(&store),
        vec![StubProvider::rich(ProviderKind::RapidApi)],
        vec![Identifier::with_username("node-1", "alice123")],
    )
    .await;

    assert_eq!(result.succeeded, 1);
    assert_eq!(result.profiles_scraped, 0);
    let outcome = &result.outcomes[0];
    assert!(outcome.success);
    assert!(outcome.already_processed);
    assert!(!outcome.newly_scraped);
}

#[tokio::test]
async fn exhausted_budget_abandons_the_remainder_without_dropping_it() {
    let store = Arc::new(MemoryStore::default());
    let chain = vec![StubProvider {
        kind: ProviderKind::RapidApi,
        behavior: StubBehavior::Slow(Duration::from_millis(100)),
    }];
    let identifiers: Vec<Identifier> = (0..10)
        .map(|index| Identifier::with_username(format!("node-{index}"), format!("user{index}")))
        .collect();

    let runner = runner_with(
        Arc::clone(&store),
        chain,
        BatchLimits {
            max_workers: 1,
            budget: Duration::from_millis(250),
        },
    );
    let result = runner.run(identifiers).await;

    assert_eq!(result.outcomes.len(), 10, "no identifier is dropped");
    assert!(result.processed < 10, "budget cut the batch short");
    let abandoned: Vec<&str> = result
        .outcomes
        .iter()
        .filter(|outcome| outcome.abandoned)
        .map(|outcome| outcome.identifier.node_id.as_str())
        .collect();
    assert!(!abandoned.is_empty());
    for node_id in &abandoned {
        assert!(
            result.retryable_failures.iter().any(|id| id == node_id),
            "abandoned identifier {node_id} must be redeliverable"
        );
    }
    assert_eq!(
        result.processed + abandoned.len(),
        10,
        "every identifier is either processed or abandoned"
    );
}
