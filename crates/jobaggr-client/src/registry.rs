use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use jobaggr_core::JobSource;
use jobaggr_core::error::AppError;

use crate::file_source::FileSource;
use crate::http_source::HttpSource;

/// Where a registered source reads its jobs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTarget {
    Http(String),
    File(PathBuf),
}

impl SourceTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceTarget::Http(_) => "http",
            SourceTarget::File(_) => "file",
        }
    }
}

/// A `name=target` source registration.
///
/// Targets starting with `http://` or `https://` become an [`HttpSource`];
/// anything else is treated as a path to a JSON file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub name: String,
    pub target: SourceTarget,
}

impl FromStr for SourceSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, target) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected name=target, got: {s}"))?;
        let (name, target) = (name.trim(), target.trim());

        if name.is_empty() {
            return Err(format!("Source name is empty in: {s}"));
        }
        if target.is_empty() {
            return Err(format!("Source target is empty in: {s}"));
        }

        let target = if target.starts_with("http://") || target.starts_with("https://") {
            SourceTarget::Http(target.to_string())
        } else {
            SourceTarget::File(PathBuf::from(target))
        };

        Ok(Self {
            name: name.to_string(),
            target,
        })
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            SourceTarget::Http(url) => write!(f, "{}={}", self.name, url),
            SourceTarget::File(path) => write!(f, "{}={}", self.name, path.display()),
        }
    }
}

/// Build sources in the order given. `request_timeout` applies to HTTP
/// sources only.
pub fn build_sources(
    specs: &[SourceSpec],
    request_timeout: Duration,
) -> Result<Vec<Arc<dyn JobSource>>, AppError> {
    specs
        .iter()
        .map(|spec| -> Result<Arc<dyn JobSource>, AppError> {
            match &spec.target {
                SourceTarget::Http(url) => Ok(Arc::new(HttpSource::with_timeout(
                    spec.name.clone(),
                    url,
                    request_timeout,
                )?)),
                SourceTarget::File(path) => {
                    Ok(Arc::new(FileSource::new(spec.name.clone(), path.clone())))
                }
            }
        })
        .collect()
}
