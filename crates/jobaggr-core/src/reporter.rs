use crate::config::DispatchMode;
use crate::error::AppError;

/// Events emitted by the aggregator during a single fetch.
#[derive(Debug)]
pub enum AggregationEvent<'a> {
    Dispatched {
        sources: usize,
        mode: DispatchMode,
    },
    SourceCompleted {
        index: usize,
        source: &'a str,
        records: usize,
    },
    SourceFailed {
        index: usize,
        source: &'a str,
        error: &'a AppError,
    },
    Cancelled {
        error: &'a AppError,
        pending: usize,
    },
    Completed {
        records: usize,
    },
}

/// Trait for receiving aggregation events (decoupled logging/progress).
///
/// Events are always reported from the task that called `fetch`, never from
/// source tasks.
pub trait AggregationReporter: Send + Sync {
    fn report(&self, event: AggregationEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl AggregationReporter for TracingReporter {
    fn report(&self, event: AggregationEvent<'_>) {
        match event {
            AggregationEvent::Dispatched { sources, mode } => {
                tracing::info!(%sources, %mode, "Dispatching search");
            }
            AggregationEvent::SourceCompleted {
                index,
                source,
                records,
            } => {
                tracing::debug!(%index, %source, %records, "Source completed");
            }
            AggregationEvent::SourceFailed {
                index,
                source,
                error,
            } => {
                tracing::warn!(%index, %source, %error, "Source failed");
            }
            AggregationEvent::Cancelled { error, pending } => {
                tracing::warn!(%error, %pending, "Search cancelled");
            }
            AggregationEvent::Completed { records } => {
                tracing::info!(%records, "Search complete");
            }
        }
    }
}

/// Reporter that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl AggregationReporter for NullReporter {}
