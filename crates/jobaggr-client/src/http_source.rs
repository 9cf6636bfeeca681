use std::time::Duration;

use async_trait::async_trait;
use jobaggr_core::error::AppError;
use jobaggr_core::models::{Job, JobFeed};
use jobaggr_core::{JobSource, SearchContext};
use reqwest::Client;
use url::Url;

/// Job source backed by a JSON feed served over HTTP.
///
/// Each fetch issues `GET <endpoint>?q=<query>&l=<location>` with both
/// values URL-encoded. The response body must be either a JSON array of jobs
/// or an object with a `jobs` array. Records that carry no `source` label are
/// labelled with this source's name.
#[derive(Clone)]
pub struct HttpSource {
    name: String,
    endpoint: Url,
    client: Client,
    timeout_ms: u64,
}

impl HttpSource {
    pub fn new(name: impl Into<String>, endpoint: &str) -> Result<Self, AppError> {
        Self::with_timeout(name, endpoint, Duration::from_secs(30))
    }

    pub fn with_timeout(
        name: impl Into<String>,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| AppError::HttpError(format!("Invalid URL: {e}")))?;

        match endpoint.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::HttpError(format!(
                    "URL scheme '{scheme}' is not allowed (only http/https)"
                )));
            }
        }

        let client = Client::builder()
            .user_agent(concat!("jobaggr/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            endpoint,
            client,
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn search_url(&self, query: &str, location: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("l", location);
        url
    }

    async fn request(&self, url: Url) -> Result<Vec<Job>, AppError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_ms)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_ms)
            } else {
                AppError::HttpError(format!("Failed to read response body: {e}"))
            }
        })?;

        let feed: JobFeed = serde_json::from_slice(&body)
            .map_err(|e| AppError::ParseError(format!("{}: {e}", self.name)))?;

        Ok(feed.into_jobs(&self.name))
    }
}

#[async_trait]
impl JobSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        ctx: &SearchContext,
        query: &str,
        location: &str,
    ) -> Result<Vec<Job>, AppError> {
        let url = self.search_url(query, location);
        tracing::debug!(source = %self.name, %url, "Requesting job feed");

        tokio::select! {
            biased;
            err = ctx.done() => Err(err),
            result = self.request(url) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_rejects_bad_scheme() {
        let err = HttpSource::new("feed", "file:///etc/passwd").err().unwrap();
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_rejects_invalid_url() {
        let err = HttpSource::new("feed", "not a url").err().unwrap();
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_search_url_encodes_parameters() {
        let source = HttpSource::new("feed", "https://jobs.example.com/search?v=2").unwrap();
        assert_eq!(source.endpoint().as_str(), "https://jobs.example.com/search?v=2");
        let url = source.search_url("c++ & rust", "San Francisco, CA");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("v".to_string(), "2".to_string()),
                ("q".to_string(), "c++ & rust".to_string()),
                ("l".to_string(), "San Francisco, CA".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetches_and_labels_jobs() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/jobs")
                    .query_param("q", "golang")
                    .query_param("l", "New York");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!([
                        {"id": "1", "title": "Go Developer", "company": "Tech Corp"},
                        {"id": "2", "title": "Backend Engineer", "company": "StartUp Inc", "source": "Indeed"}
                    ]));
            })
            .await;

        let source = HttpSource::new("feed", &server.url("/jobs")).unwrap();
        let jobs = source
            .fetch(&SearchContext::new(), "golang", "New York")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id, "1");
        assert_eq!(jobs[0].source, "feed");
        assert_eq!(jobs[1].source, "Indeed");
    }

    #[tokio::test]
    async fn test_accepts_wrapped_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(200)
                    .json_body(json!({"jobs": [{"id": "7", "link": "https://example.com/7"}]}));
            })
            .await;

        let source = HttpSource::new("feed", &server.url("/jobs")).unwrap();
        let jobs = source
            .fetch(&SearchContext::new(), "q", "l")
            .await
            .unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].url, "https://example.com/7");
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(503);
            })
            .await;

        let source = HttpSource::new("feed", &server.url("/jobs")).unwrap();
        let err = source
            .fetch(&SearchContext::new(), "q", "l")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::HttpError(ref msg) if msg.contains("HTTP 503")));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let source = HttpSource::new("feed", &server.url("/jobs")).unwrap();
        let err = source
            .fetch(&SearchContext::new(), "q", "l")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_client_timeout_is_timeout_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!([]));
            })
            .await;

        let source =
            HttpSource::with_timeout("feed", &server.url("/jobs"), Duration::from_millis(50))
                .unwrap();
        let err = source
            .fetch(&SearchContext::new(), "q", "l")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Timeout(50)), "{err}");
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(200).json_body(json!([]));
            })
            .await;

        let ctx = SearchContext::new();
        ctx.cancel();

        let source = HttpSource::new("feed", &server.url("/jobs")).unwrap();
        let err = source.fetch(&ctx, "q", "l").await.unwrap_err();

        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_context_deadline_interrupts_slow_feed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/jobs");
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .json_body(json!([]));
            })
            .await;

        let ctx = SearchContext::new().with_timeout(Duration::from_millis(50));
        let source = HttpSource::new("feed", &server.url("/jobs")).unwrap();
        let err = source.fetch(&ctx, "q", "l").await.unwrap_err();

        assert!(matches!(err, AppError::DeadlineExceeded));
    }
}
