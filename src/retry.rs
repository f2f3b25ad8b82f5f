//! Bounded retry with exponential backoff for plain data fetches.
//!
//! Deliberately separate from the coordinator in `client`: refresh-and-replay
//! handles credential expiry, this handles flaky upstreams on calls that do
//! not need auth. The two are never composed — a replayed authenticated
//! request gets no backoff, and the refresh call itself is retried zero
//! times.

use std::time::Duration;

use rand::Rng;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::ApiError;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub jitter_ms: u64,
    /// Statuses worth retrying; everything else returns immediately.
    pub status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 500,
            max_backoff_ms: 10_000,
            jitter_ms: 250,
            status_codes: vec![429, 500, 502, 503, 504],
        }
    }
}

/// Execute an unauthenticated request with bounded retries, exponential
/// backoff, jitter, and Retry-After support. Network errors are always
/// retryable; retryable statuses are listed in the config. The last
/// response is returned even when retries are exhausted so the caller can
/// classify it.
pub async fn fetch_with_retry(
    client: &Client,
    method: Method,
    url: &str,
    headers: HeaderMap,
    config: &RetryConfig,
) -> Result<Response, ApiError> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        let result = client
            .request(method.clone(), url)
            .headers(headers.clone())
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                if !config.status_codes.contains(&status.as_u16()) {
                    return Ok(response);
                }

                if attempt > config.max_retries {
                    debug!(
                        "exhausted {} retries for {} {}; last status {}",
                        config.max_retries, method, url, status
                    );
                    return Ok(response);
                }

                let wait = wait_time(&response, config, attempt);
                warn!(
                    "attempt {}/{} got status {}; retrying in {:?}",
                    attempt,
                    config.max_retries + 1,
                    status,
                    wait
                );
                sleep(wait).await;
            }
            Err(e) => {
                if attempt > config.max_retries {
                    return Err(ApiError::network(e));
                }
                let wait = backoff(config, attempt);
                warn!(
                    "attempt {}/{} failed: {}; retrying in {:?}",
                    attempt,
                    config.max_retries + 1,
                    e,
                    wait
                );
                sleep(wait).await;
            }
        }
    }
}

fn wait_time(response: &Response, config: &RetryConfig, attempt: u32) -> Duration {
    if let Some(retry_after) = response.headers().get(reqwest::header::RETRY_AFTER) {
        if let Ok(seconds) = retry_after.to_str().unwrap_or("").parse::<u64>() {
            return Duration::from_secs(seconds);
        }
    }
    backoff(config, attempt)
}

fn backoff(config: &RetryConfig, attempt: u32) -> Duration {
    let base = config.base_backoff_ms as f64;
    let raw = base * 2_f64.powi(attempt as i32 - 1);
    let capped = raw.min(config.max_backoff_ms as f64);
    let jitter = rand::thread_rng().gen_range(0..=config.jitter_ms);
    Duration::from_millis(capped as u64 + jitter)
}
