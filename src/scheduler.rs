//! Concurrent provider fan-out.
//!
//! Every adapter runs as its own tokio task, bounded by an independent
//! deadline. The scheduler returns one `ProviderReport` per adapter, in
//! registration order, once every task has reached a terminal state.
//!
//! On deadline expiry the adapter future is dropped, which aborts any HTTP
//! request it still has in flight, and the report is filled with
//! `Failure(Timeout)`. Because the report is produced by the same task that
//! owned the future, a late answer has nowhere to go.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::ProviderFailure;
use crate::providers::{ProviderAdapter, ProviderResult};

/// Terminal state of one provider within a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReport {
    pub provider: String,
    pub result: ProviderResult,
    pub elapsed: Duration,
}

impl ProviderReport {
    pub fn new(provider: impl Into<String>, result: ProviderResult, elapsed: Duration) -> Self {
        Self {
            provider: provider.into(),
            result,
            elapsed,
        }
    }
}

/// Runs all adapters concurrently with a per-provider deadline.
#[derive(Debug, Clone)]
pub struct FanOutScheduler {
    per_provider_timeout: Duration,
    cancel: CancellationToken,
}

impl FanOutScheduler {
    pub fn new(per_provider_timeout: Duration) -> Self {
        Self {
            per_provider_timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Observe `token`; when it fires, in-flight providers resolve to `Cancelled`.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn per_provider_timeout(&self) -> Duration {
        self.per_provider_timeout
    }

    /// Query every adapter for `domain` and collect their reports.
    pub async fn run_all(
        &self,
        domain: &str,
        adapters: &[Arc<dyn ProviderAdapter>],
    ) -> Vec<ProviderReport> {
        debug!(
            domain,
            providers = adapters.len(),
            timeout_ms = self.per_provider_timeout.as_millis() as u64,
            "Fanning out provider queries"
        );

        let started = Instant::now();
        let domain: Arc<str> = Arc::from(domain);

        let tasks = adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            let domain = Arc::clone(&domain);
            let cancel = self.cancel.clone();
            let deadline = self.per_provider_timeout;

            tokio::spawn(async move { run_one(adapter.as_ref(), &domain, deadline, &cancel).await })
        });

        join_all(tasks)
            .await
            .into_iter()
            .zip(adapters)
            .map(|(joined, adapter)| match joined {
                Ok(report) => report,
                Err(e) => {
                    warn!(provider = adapter.name(), "Provider task aborted: {}", e);
                    ProviderReport::new(
                        adapter.name(),
                        ProviderResult::Failure(ProviderFailure::internal(format!(
                            "provider task aborted: {e}"
                        ))),
                        started.elapsed(),
                    )
                }
            })
            .collect()
    }
}

async fn run_one(
    adapter: &dyn ProviderAdapter,
    domain: &str,
    deadline: Duration,
    cancel: &CancellationToken,
) -> ProviderReport {
    let started = Instant::now();

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => ProviderResult::Failure(ProviderFailure::cancelled()),
        outcome = tokio::time::timeout(deadline, adapter.fetch(domain, deadline)) => match outcome {
            Ok(result) => result,
            Err(_) => ProviderResult::Failure(ProviderFailure::timeout(deadline)),
        },
    };

    let elapsed = started.elapsed();
    match &result {
        ProviderResult::Success(hosts) => info!(
            provider = adapter.name(),
            hosts = hosts.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Provider completed"
        ),
        ProviderResult::Failure(failure) => warn!(
            provider = adapter.name(),
            kind = %failure.kind,
            elapsed_ms = elapsed.as_millis() as u64,
            "Provider failed: {}",
            failure.message
        ),
    }

    ProviderReport::new(adapter.name(), result, elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use async_trait::async_trait;

    enum Behavior {
        Answer(Vec<&'static str>),
        AnswerAfter(Duration, Vec<&'static str>),
        Fail(FailureKind),
        Hang,
        Panic,
    }

    struct FakeAdapter {
        name: &'static str,
        behavior: Behavior,
    }

    impl FakeAdapter {
        fn arc(name: &'static str, behavior: Behavior) -> Arc<dyn ProviderAdapter> {
            Arc::new(Self { name, behavior })
        }
    }

    #[async_trait]
    impl ProviderAdapter for FakeAdapter {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch(&self, _domain: &str, _deadline: Duration) -> ProviderResult {
            let hosts = |h: &[&str]| -> Vec<String> { h.iter().map(|s| s.to_string()).collect() };
            match &self.behavior {
                Behavior::Answer(h) => ProviderResult::Success(hosts(h)),
                Behavior::AnswerAfter(delay, h) => {
                    tokio::time::sleep(*delay).await;
                    ProviderResult::Success(hosts(h))
                }
                Behavior::Fail(kind) => ProviderResult::Failure(ProviderFailure::new(*kind, "fake")),
                Behavior::Hang => std::future::pending::<ProviderResult>().await,
                Behavior::Panic => panic!("adapter exploded"),
            }
        }
    }

    fn names(reports: &[ProviderReport]) -> Vec<&str> {
        reports.iter().map(|r| r.provider.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn reports_follow_registration_order() {
        let adapters = vec![
            FakeAdapter::arc("slow", Behavior::AnswerAfter(Duration::from_millis(300), vec!["a.example.com"])),
            FakeAdapter::arc("fast", Behavior::Answer(vec!["b.example.com"])),
            FakeAdapter::arc("broken", Behavior::Fail(FailureKind::Transport)),
        ];

        let reports = FanOutScheduler::new(Duration::from_secs(5))
            .run_all("example.com", &adapters)
            .await;

        assert_eq!(names(&reports), vec!["slow", "fast", "broken"]);
        assert_eq!(reports[0].result.hostnames(), ["a.example.com"]);
        assert_eq!(reports[1].result.hostnames(), ["b.example.com"]);
        assert_eq!(
            reports[2].result.failure().map(|f| f.kind),
            Some(FailureKind::Transport)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_provider_is_bounded_by_timeout() {
        let adapters = vec![
            FakeAdapter::arc("hang", Behavior::Hang),
            FakeAdapter::arc("ok", Behavior::Answer(vec!["www.example.com"])),
        ];
        let timeout = Duration::from_secs(5);

        let started = Instant::now();
        let reports = FanOutScheduler::new(timeout)
            .run_all("example.com", &adapters)
            .await;
        let took = started.elapsed();

        assert!(took >= timeout);
        assert!(took < timeout + Duration::from_millis(100));
        assert_eq!(
            reports[0].result.failure().map(|f| f.kind),
            Some(FailureKind::Timeout)
        );
        assert_eq!(reports[1].result.hostnames(), ["www.example.com"]);
    }

    #[tokio::test(start_paused = true)]
    async fn late_answer_is_discarded() {
        let adapters = vec![FakeAdapter::arc(
            "late",
            Behavior::AnswerAfter(Duration::from_secs(10), vec!["late.example.com"]),
        )];

        let reports = FanOutScheduler::new(Duration::from_secs(1))
            .run_all("example.com", &adapters)
            .await;

        assert!(!reports[0].result.is_success());
        assert!(reports[0].elapsed >= Duration::from_secs(1));
        assert!(reports[0].elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn panicking_provider_becomes_internal_failure() {
        let adapters = vec![
            FakeAdapter::arc("boom", Behavior::Panic),
            FakeAdapter::arc("ok", Behavior::Answer(vec!["www.example.com"])),
        ];

        let reports = FanOutScheduler::new(Duration::from_secs(5))
            .run_all("example.com", &adapters)
            .await;

        assert_eq!(names(&reports), vec!["boom", "ok"]);
        assert_eq!(
            reports[0].result.failure().map(|f| f.kind),
            Some(FailureKind::Internal)
        );
        assert!(reports[1].result.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_resolves_in_flight_providers() {
        let token = CancellationToken::new();
        let adapters = vec![
            FakeAdapter::arc("hang", Behavior::Hang),
            FakeAdapter::arc("ok", Behavior::Answer(vec!["www.example.com"])),
        ];

        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let reports = FanOutScheduler::new(Duration::from_secs(30))
            .with_cancellation(token)
            .run_all("example.com", &adapters)
            .await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(
            reports[0].result.failure().map(|f| f.kind),
            Some(FailureKind::Cancelled)
        );
        assert!(reports[1].result.is_success());
    }

    #[tokio::test]
    async fn empty_adapter_set_yields_no_reports() {
        let reports = FanOutScheduler::new(Duration::from_secs(1))
            .run_all("example.com", &[])
            .await;
        assert!(reports.is_empty());
    }
}
