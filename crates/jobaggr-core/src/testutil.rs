//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::SearchContext;
use crate::error::AppError;
use crate::models::Job;
use crate::reporter::{AggregationEvent, AggregationReporter};
use crate::traits::JobSource;

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Mock source that returns a configurable response after an optional
/// delay or gate.
#[derive(Clone)]
pub struct MockSource {
    name: String,
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns no jobs.
    responses: Arc<Mutex<Vec<Result<Vec<Job>, AppError>>>>,
    delay: Duration,
    /// When set, `fetch` waits until this token is cancelled.
    gate: Option<CancellationToken>,
    /// When set, waiting ignores the search context.
    ignore_context: bool,
    panics: bool,
    /// Recorded (query, location) pairs.
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
    /// Set when the source gave up because its context was done.
    pub saw_cancellation: Arc<Mutex<bool>>,
    /// Set once `fetch` has returned.
    pub finished: Arc<Mutex<bool>>,
}

impl MockSource {
    pub fn new(name: &str, jobs: Vec<Job>) -> Self {
        Self::with_response(name, Ok(jobs))
    }

    pub fn with_error(name: &str, error: AppError) -> Self {
        Self::with_response(name, Err(error))
    }

    pub fn panicking(name: &str) -> Self {
        let mut source = Self::new(name, vec![]);
        source.panics = true;
        source
    }

    fn with_response(name: &str, response: Result<Vec<Job>, AppError>) -> Self {
        Self {
            name: name.to_string(),
            responses: Arc::new(Mutex::new(vec![response])),
            delay: Duration::ZERO,
            gate: None,
            ignore_context: false,
            panics: false,
            calls: Arc::new(Mutex::new(Vec::new())),
            saw_cancellation: Arc::new(Mutex::new(false)),
            finished: Arc::new(Mutex::new(false)),
        }
    }

    /// Sleep for `delay` before responding.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Block until `gate` is cancelled before responding.
    pub fn gated(mut self, gate: CancellationToken) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Keep waiting even after the search context is done.
    pub fn ignoring_context(mut self) -> Self {
        self.ignore_context = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_finished(&self) -> bool {
        *self.finished.lock().unwrap()
    }

    pub fn saw_cancellation(&self) -> bool {
        *self.saw_cancellation.lock().unwrap()
    }

    async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(gate) = &self.gate {
            gate.cancelled().await;
        }
    }
}

#[async_trait]
impl JobSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        ctx: &SearchContext,
        query: &str,
        location: &str,
    ) -> Result<Vec<Job>, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), location.to_string()));

        if self.panics {
            panic!("mock source '{}' panicked", self.name);
        }

        if self.ignore_context {
            self.wait().await;
        } else {
            tokio::select! {
                biased;
                () = self.wait() => {}
                err = ctx.done() => {
                    *self.saw_cancellation.lock().unwrap() = true;
                    *self.finished.lock().unwrap() = true;
                    return Err(err);
                }
            }
        }

        let result = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(vec![])
            } else {
                responses.remove(0)
            }
        };
        *self.finished.lock().unwrap() = true;
        result
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock aggregation reporter that records event labels.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl AggregationReporter for MockReporter {
    fn report(&self, event: AggregationEvent<'_>) {
        let label = match &event {
            AggregationEvent::Dispatched { .. } => "Dispatched".to_string(),
            AggregationEvent::SourceCompleted { source, .. } => format!("SourceCompleted:{source}"),
            AggregationEvent::SourceFailed { source, .. } => format!("SourceFailed:{source}"),
            AggregationEvent::Cancelled { .. } => "Cancelled".to_string(),
            AggregationEvent::Completed { records } => format!("Completed:{records}"),
        };
        self.events.lock().unwrap().push(label);
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create one job per id, all labelled with `source`.
pub fn make_jobs(source: &str, ids: &[&str]) -> Vec<Job> {
    ids.iter()
        .map(|id| {
            Job::new(*id, format!("Job {id}"), "Corp")
                .with_location("New York")
                .with_url(format!("https://example.com/job/{id}"))
                .with_source(source)
        })
        .collect()
}

/// Ids of `jobs`, in order.
pub fn ids(jobs: &[Job]) -> Vec<&str> {
    jobs.iter().map(|j| j.id.as_str()).collect()
}
