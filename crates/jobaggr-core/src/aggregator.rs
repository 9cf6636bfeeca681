//! Fan-out/fan-in aggregation across registered job sources.
//!
//! ```text
//! Idle --> Dispatched --+--[all sources Ok]---------> AllSucceeded --+
//!                       +--[first source Err]-------> Failed --------+--> Done
//!                       +--[context cancelled/late]-> Cancelled -----+
//! ```
//!
//! The combined result is all-or-nothing: a single source failure or a done
//! context discards every record collected so far. On success, records are
//! ordered by source registration position, then by each source's own order.

use std::iter;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::config::{AggregatorConfig, DispatchMode};
use crate::context::SearchContext;
use crate::error::AppError;
use crate::models::Job;
use crate::reporter::{AggregationEvent, AggregationReporter, TracingReporter};
use crate::traits::JobSource;

/// Result of one source invocation, tagged with its registration index.
struct SourceOutcome {
    index: usize,
    result: Result<Vec<Job>, AppError>,
}

/// Combines the output of an ordered, immutable list of [`JobSource`]s.
///
/// The aggregator keeps no per-call state, so one instance can serve any
/// number of concurrent `fetch` calls.
#[derive(Clone)]
pub struct Aggregator {
    sources: Arc<[Arc<dyn JobSource>]>,
    config: AggregatorConfig,
}

impl Aggregator {
    /// Create an aggregator with the default (concurrent) configuration.
    pub fn new(sources: Vec<Arc<dyn JobSource>>) -> Self {
        Self::with_config(sources, AggregatorConfig::default())
    }

    pub fn with_config(sources: Vec<Arc<dyn JobSource>>, config: AggregatorConfig) -> Self {
        Self {
            sources: sources.into(),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source names in registration order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Fetch from every source and combine the results, logging progress
    /// through `tracing`.
    pub async fn fetch(
        &self,
        ctx: &SearchContext,
        query: &str,
        location: &str,
    ) -> Result<Vec<Job>, AppError> {
        self.fetch_with_reporter(ctx, query, location, &TracingReporter)
            .await
    }

    /// Fetch from every source and combine the results.
    ///
    /// - No sources: `Ok(vec![])`.
    /// - Any source error: that error, unmodified, and no records.
    /// - Context done first: `Cancelled` or `DeadlineExceeded`. A source
    ///   error that is already available wins over the context.
    pub async fn fetch_with_reporter<R: AggregationReporter>(
        &self,
        ctx: &SearchContext,
        query: &str,
        location: &str,
        reporter: &R,
    ) -> Result<Vec<Job>, AppError> {
        if self.sources.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(err) = ctx.err() {
            reporter.report(AggregationEvent::Cancelled {
                error: &err,
                pending: self.sources.len(),
            });
            return Err(err);
        }

        reporter.report(AggregationEvent::Dispatched {
            sources: self.sources.len(),
            mode: self.config.mode,
        });

        let slots = match self.config.mode {
            DispatchMode::Concurrent => {
                self.collect_concurrent(ctx, query, location, reporter)
                    .await?
            }
            DispatchMode::Sequential => {
                self.collect_sequential(ctx, query, location, reporter)
                    .await?
            }
        };

        // Sources finished, but the caller's context may have fired meanwhile.
        if let Some(err) = ctx.err() {
            reporter.report(AggregationEvent::Cancelled {
                error: &err,
                pending: 0,
            });
            return Err(err);
        }

        let total = slots.iter().map(Vec::len).sum();
        let mut jobs = Vec::with_capacity(total);
        for slot in slots {
            jobs.extend(slot);
        }

        reporter.report(AggregationEvent::Completed {
            records: jobs.len(),
        });
        Ok(jobs)
    }

    /// Run every source as its own task and reassemble results by index.
    async fn collect_concurrent<R: AggregationReporter>(
        &self,
        ctx: &SearchContext,
        query: &str,
        location: &str,
        reporter: &R,
    ) -> Result<Vec<Vec<Job>>, AppError> {
        let n = self.sources.len();

        // Cancelled when this call returns, so stragglers left behind by an
        // early failure can wind down.
        let call_ctx = ctx.child();
        let _stragglers = call_ctx.token().clone().drop_guard();

        // One slot per source: every producer sends exactly once and never waits.
        let (tx, mut rx) = mpsc::channel::<SourceOutcome>(n);

        for (index, source) in self.sources.iter().enumerate() {
            let source = Arc::clone(source);
            let tx = tx.clone();
            let ctx = call_ctx.clone();
            let query = query.to_owned();
            let location = location.to_owned();
            let limit = self.config.source_timeout;

            tokio::spawn(async move {
                let result = invoke(source.as_ref(), &ctx, &query, &location, limit).await;
                // The receiver is gone once the call has returned early.
                if tx.try_send(SourceOutcome { index, result }).is_err() {
                    tracing::debug!(%index, source = %source.name(), "Discarding late result");
                }
            });
        }
        drop(tx);

        let mut slots: Vec<Option<Vec<Job>>> = iter::repeat_with(|| None).take(n).collect();
        let mut pending = n;

        while pending > 0 {
            // Biased towards the channel: a source error that is already
            // queued is reported ahead of a simultaneous cancellation.
            let outcome = tokio::select! {
                biased;
                outcome = rx.recv() => outcome,
                err = ctx.done() => {
                    reporter.report(AggregationEvent::Cancelled { error: &err, pending });
                    return Err(err);
                }
            };

            let Some(SourceOutcome { index, result }) = outcome else {
                // Unreachable while every task sends before dropping its sender.
                return Err(AppError::Generic(format!(
                    "{pending} source(s) ended without reporting a result"
                )));
            };

            let name = self.sources[index].name();
            match result {
                Ok(jobs) => {
                    reporter.report(AggregationEvent::SourceCompleted {
                        index,
                        source: name,
                        records: jobs.len(),
                    });
                    slots[index] = Some(jobs);
                    pending -= 1;
                }
                Err(err) => {
                    reporter.report(AggregationEvent::SourceFailed {
                        index,
                        source: name,
                        error: &err,
                    });
                    return Err(err);
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Run sources one at a time in registration order.
    async fn collect_sequential<R: AggregationReporter>(
        &self,
        ctx: &SearchContext,
        query: &str,
        location: &str,
        reporter: &R,
    ) -> Result<Vec<Vec<Job>>, AppError> {
        let mut slots = Vec::with_capacity(self.sources.len());

        for (index, source) in self.sources.iter().enumerate() {
            let pending = self.sources.len() - index;
            if let Some(err) = ctx.err() {
                reporter.report(AggregationEvent::Cancelled {
                    error: &err,
                    pending,
                });
                return Err(err);
            }

            let result = tokio::select! {
                biased;
                result = invoke(source.as_ref(), ctx, query, location, self.config.source_timeout) => result,
                err = ctx.done() => {
                    reporter.report(AggregationEvent::Cancelled { error: &err, pending });
                    return Err(err);
                }
            };

            match result {
                Ok(jobs) => {
                    reporter.report(AggregationEvent::SourceCompleted {
                        index,
                        source: source.name(),
                        records: jobs.len(),
                    });
                    slots.push(jobs);
                }
                Err(err) => {
                    reporter.report(AggregationEvent::SourceFailed {
                        index,
                        source: source.name(),
                        error: &err,
                    });
                    return Err(err);
                }
            }
        }

        Ok(slots)
    }
}

/// Invoke one source, converting a panic or an exceeded time limit into a
/// source error.
async fn invoke(
    source: &dyn JobSource,
    ctx: &SearchContext,
    query: &str,
    location: &str,
    limit: Option<Duration>,
) -> Result<Vec<Job>, AppError> {
    let call = AssertUnwindSafe(source.fetch(ctx, query, location)).catch_unwind();

    let outcome = match limit {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(AppError::Timeout(limit.as_millis() as u64)),
        },
        None => call.await,
    };

    outcome.unwrap_or_else(|_| {
        Err(AppError::SourcePanicked {
            name: source.name().to_string(),
        })
    })
}
