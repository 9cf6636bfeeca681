pub mod aggregator;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod reporter;
pub mod traits;

#[cfg(test)]
pub mod testutil;

pub use aggregator::Aggregator;
pub use config::{AggregatorConfig, DispatchMode};
pub use context::SearchContext;
pub use error::AppError;
pub use models::{Job, JobFeed};
pub use reporter::{AggregationEvent, AggregationReporter, NullReporter, TracingReporter};
pub use traits::JobSource;
