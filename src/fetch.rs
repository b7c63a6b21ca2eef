use std::time::Duration;

use anyhow::Context as _;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, USER_AGENT};

use crate::error::FetchError;

/// Something that can turn a URL into a document.
///
/// The reconciliation engine only talks to pages through this trait so that a
/// single, explicitly constructed client (and its retry policy) is passed down
/// instead of living in global state.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url)
    }
}

/// Statuses worth retrying: rate limiting and gateway/server hiccups.
pub const DEFAULT_RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

const MAX_BACKOFF: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Upper bound on retries after the first attempt.
    pub total: u32,
    /// Seconds; retry `n` waits `backoff_factor * 2^(n-1)`.
    pub backoff_factor: f64,
    pub retry_statuses: Vec<u16>,
}

impl RetryPolicy {
    pub fn new(total: u32, backoff_factor: f64) -> Self {
        Self {
            total,
            backoff_factor,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }

    pub fn is_retryable(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status.as_u16())
    }

    /// Delay before the `retry`-th retry (1-based), capped at two minutes.
    /// A NaN or non-positive factor disables the wait.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = retry.saturating_sub(1).min(31) as i32;
        let secs = self.backoff_factor * 2f64.powi(exponent);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs.min(MAX_BACKOFF.as_secs_f64())).unwrap_or(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, 2.0)
    }
}

/// Blocking HTTP client issuing idempotent GETs with bounded retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(policy: RetryPolicy, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build http client")?;
        Ok(Self { client, policy })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut retries = 0;
        loop {
            // Network errors are not retried, only the listed statuses are.
            let response = self
                .client
                .get(url)
                .header(USER_AGENT, "ufcstats-scraper/0.1")
                .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
                .send()
                .map_err(|source| FetchError::Request {
                    url: url.to_owned(),
                    source,
                })?;

            let status = response.status();
            if status.is_success() {
                return response.text().map_err(|source| FetchError::Body {
                    url: url.to_owned(),
                    source,
                });
            }

            if !self.policy.is_retryable(status) {
                return Err(FetchError::Status {
                    url: url.to_owned(),
                    status,
                });
            }
            if retries >= self.policy.total {
                return Err(FetchError::RetriesExhausted {
                    url: url.to_owned(),
                    status,
                    retries,
                });
            }

            retries += 1;
            let delay = self.policy.delay_for_retry(retries);
            tracing::warn!(%url, %status, retry = retries, ?delay, "transient status; retrying");
            std::thread::sleep(delay);
        }
    }
}
