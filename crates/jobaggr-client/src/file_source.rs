use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jobaggr_core::error::AppError;
use jobaggr_core::models::{Job, JobFeed};
use jobaggr_core::{JobSource, SearchContext};

/// Job source backed by a local JSON file, re-read on every fetch.
///
/// Accepts the same body shapes as [`super::HttpSource`]. A job matches when
/// its title or company contains every whitespace-separated query term and
/// its location contains `location`, all case-insensitive. An empty query or
/// location matches everything.
#[derive(Debug, Clone)]
pub struct FileSource {
    name: String,
    path: PathBuf,
}

impl FileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Job>, AppError> {
        let raw = tokio::fs::read(&self.path).await?;
        let feed: JobFeed = serde_json::from_slice(&raw)
            .map_err(|e| AppError::ParseError(format!("{}: {e}", self.path.display())))?;
        Ok(feed.into_jobs(&self.name))
    }
}

fn matches(job: &Job, terms: &[String], location: &str) -> bool {
    let title = job.title.to_lowercase();
    let company = job.company.to_lowercase();
    let terms_match = terms
        .iter()
        .all(|term| title.contains(term.as_str()) || company.contains(term.as_str()));

    terms_match && job.location.to_lowercase().contains(location)
}

#[async_trait]
impl JobSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        ctx: &SearchContext,
        query: &str,
        location: &str,
    ) -> Result<Vec<Job>, AppError> {
        let jobs = tokio::select! {
            biased;
            err = ctx.done() => return Err(err),
            jobs = self.load() => jobs?,
        };

        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let location = location.trim().to_lowercase();

        let total = jobs.len();
        let matched: Vec<Job> = jobs
            .into_iter()
            .filter(|job| matches(job, &terms, &location))
            .collect();
        tracing::debug!(source = %self.name, %total, matched = matched.len(), "Filtered job file");

        Ok(matched)
    }
}
