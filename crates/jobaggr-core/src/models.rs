use serde::{Deserialize, Serialize};

/// One job posting retrieved by a source.
///
/// Records are opaque to the aggregator: ids may be empty or repeated and
/// nothing is deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    /// Canonical link to the posting.
    #[serde(alias = "link")]
    pub url: String,
    /// Label of the source that produced this record (e.g. "LinkedIn").
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Job {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            company: company.into(),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_salary(mut self, salary: impl Into<String>) -> Self {
        self.salary = Some(salary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body shapes accepted from JSON job feeds and files: a bare array of
/// jobs, or an object wrapping them under `jobs`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum JobFeed {
    List(Vec<Job>),
    Wrapped { jobs: Vec<Job> },
}

impl JobFeed {
    /// Unwrap the feed, labelling unlabelled records with `source`.
    pub fn into_jobs(self, source: &str) -> Vec<Job> {
        let mut jobs = match self {
            JobFeed::List(jobs) | JobFeed::Wrapped { jobs } => jobs,
        };
        for job in jobs.iter_mut().filter(|j| j.source.is_empty()) {
            job.source = source.to_string();
        }
        jobs
    }
}
