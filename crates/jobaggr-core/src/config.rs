use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How the aggregator dispatches a query to its sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// Every source runs as its own task; latency tracks the slowest source.
    #[default]
    Concurrent,
    /// Sources run one after another in registration order.
    Sequential,
}

impl DispatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchMode::Concurrent => "concurrent",
            DispatchMode::Sequential => "sequential",
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "concurrent" => Ok(DispatchMode::Concurrent),
            "sequential" => Ok(DispatchMode::Sequential),
            _ => Err(format!("Unknown dispatch mode: {}", s)),
        }
    }
}

/// Aggregator behaviour that is fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct AggregatorConfig {
    pub mode: DispatchMode,
    /// Upper bound for a single source invocation. Exceeding it is a
    /// source failure (`AppError::Timeout`), not a cancellation.
    pub source_timeout: Option<Duration>,
}

impl AggregatorConfig {
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = Some(timeout);
        self
    }
}
