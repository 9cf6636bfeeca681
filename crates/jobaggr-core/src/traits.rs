use async_trait::async_trait;

use crate::context::SearchContext;
use crate::error::AppError;
use crate::models::Job;

/// Retrieves job postings for a query/location pair from one backend.
///
/// Object safe so the aggregator can hold heterogeneous sources behind
/// `Arc<dyn JobSource>`.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Human-readable name, used for logging and reporter events.
    fn name(&self) -> &str;

    /// Fetch jobs matching `query` and `location`.
    ///
    /// Both strings arrive exactly as the caller passed them; escaping and
    /// validation are up to the implementation. Implementations should stop
    /// promptly once `ctx` is done.
    async fn fetch(
        &self,
        ctx: &SearchContext,
        query: &str,
        location: &str,
    ) -> Result<Vec<Job>, AppError>;
}
