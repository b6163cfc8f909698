//! ipapi-compatible country lookup client.
//!
//! `GET {base}/{ip}/country_code/` answers with the bare country code as the
//! response body.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tokio::time::sleep;
use tracing::{debug, trace};
use url::Url;

use super::{CountryResolver, ResolveError};

/// Retry schedule for lookups.
///
/// Transport errors, 429 and 5xx (except 501) are retried up to `max_retries`
/// times after the first attempt. The wait before retry `n` (zero based) is
/// `min_wait * 2^n`, capped at `max_wait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_waits(mut self, min_wait: Duration, max_wait: Duration) -> Self {
        self.min_wait = min_wait;
        self.max_wait = max_wait;
        self
    }

    /// Wait before the retry numbered `retry` (zero based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.min_wait.saturating_mul(factor).min(self.max_wait)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

/// Country resolver for ipapi.co and API-compatible services.
pub struct IpApiResolver {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl IpApiResolver {
    pub fn new(base_url: &str, retry: RetryPolicy, timeout: Duration) -> anyhow::Result<Self> {
        let parsed = Url::parse(base_url)
            .with_context(|| format!("Invalid geolocation base URL '{}'", base_url))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            retry,
        })
    }

    fn lookup_url(&self, ip: IpAddr) -> String {
        format!("{}/{}/country_code/", self.base_url, ip)
    }

    async fn get_with_retry(&self, url: &str) -> anyhow::Result<Response> {
        let attempts = self.retry.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            let outcome = self.client.get(url).send().await;
            let retryable = match &outcome {
                Ok(resp) => is_retryable_status(resp.status()),
                Err(e) => !e.is_builder(),
            };
            if !retryable {
                return outcome.with_context(|| format!("GET {}", url));
            }

            attempt += 1;
            if attempt >= attempts {
                return Err(match outcome {
                    Ok(resp) => anyhow!(
                        "GET {} giving up after {} attempt(s): status {}",
                        url,
                        attempts,
                        resp.status()
                    ),
                    Err(e) => anyhow!(e).context(format!(
                        "GET {} giving up after {} attempt(s)",
                        url, attempts
                    )),
                });
            }

            let wait = self.retry.backoff(attempt - 1);
            match &outcome {
                Ok(resp) => debug!(%url, status = %resp.status(), ?wait, attempt, "retrying lookup"),
                Err(e) => debug!(%url, error = %e, ?wait, attempt, "retrying lookup"),
            }
            sleep(wait).await;
        }
    }
}

#[async_trait]
impl CountryResolver for IpApiResolver {
    async fn resolve(&self, ip: IpAddr) -> Result<String, ResolveError> {
        let url = self.lookup_url(ip);
        let resp = self.get_with_retry(&url).await.map_err(ResolveError)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ResolveError(anyhow!("GET {} returned status {}", url, status)));
        }

        let code = resp
            .text()
            .await
            .map_err(|e| ResolveError(anyhow!(e).context("read response body")))?;
        trace!(%ip, %code, "resolved country code");
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const IP: &str = "1.2.3.4";

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(max_retries)
            .with_waits(Duration::from_millis(1), Duration::from_millis(5))
    }

    fn resolver(server: &MockServer, retry: RetryPolicy) -> IpApiResolver {
        IpApiResolver::new(&server.uri(), retry, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
        assert_eq!(policy.backoff(5), Duration::from_secs(30));
        assert_eq!(policy.backoff(40), Duration::from_secs(30));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_IMPLEMENTED));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::OK));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(IpApiResolver::new("not a url", RetryPolicy::default(), Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_lookup_url_strips_trailing_slash() {
        let resolver =
            IpApiResolver::new("https://ipapi.co/", RetryPolicy::default(), Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            resolver.lookup_url(IP.parse().unwrap()),
            "https://ipapi.co/1.2.3.4/country_code/"
        );
    }

    #[tokio::test]
    async fn test_resolve_returns_body_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.2.3.4/country_code/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ua"))
            .expect(1)
            .mount(&server)
            .await;

        let code = resolver(&server, fast_retry(3))
            .resolve(IP.parse().unwrap())
            .await
            .unwrap();
        assert_eq!(code, "ua");
    }

    #[tokio::test]
    async fn test_resolve_retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.2.3.4/country_code/"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/1.2.3.4/country_code/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("UA"))
            .expect(1)
            .mount(&server)
            .await;

        let code = resolver(&server, fast_retry(3))
            .resolve(IP.parse().unwrap())
            .await
            .unwrap();
        assert_eq!(code, "UA");
    }

    #[tokio::test]
    async fn test_resolve_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = resolver(&server, fast_retry(2))
            .resolve(IP.parse().unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("country resolution failed"));
        assert!(format!("{:#}", err.0).contains("giving up after 3 attempt(s)"));
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(1)
            .mount(&server)
            .await;

        assert!(resolver(&server, fast_retry(0))
            .resolve(IP.parse().unwrap())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .expect(1)
            .mount(&server)
            .await;

        let err = resolver(&server, fast_retry(3))
            .resolve(IP.parse().unwrap())
            .await
            .unwrap_err();
        assert!(format!("{:#}", err.0).contains("404"));
    }

    #[tokio::test]
    async fn test_transport_error_is_reported() {
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };
        let resolver = IpApiResolver::new(&uri, fast_retry(1), Duration::from_secs(2)).unwrap();
        assert!(resolver.resolve(IP.parse().unwrap()).await.is_err());
    }
}
