//! Shared HTTP plumbing for the provider adapters
//!
//! One retrying client per adapter, a JSON GET helper that times and logs each
//! call, and a transport-level failure type the adapters map onto their own
//! error contracts.

use std::time::{Duration, Instant};

use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::RideError;

const USER_AGENT: &str = concat!("RideCast/", env!("CARGO_PKG_VERSION"));

/// Responses slower than this are logged at warn
const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// Why an HTTP exchange with a provider failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HttpFailure {
    /// Connection, TLS, timeout or retry exhaustion
    #[error("network error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The payload could not be decoded into the expected shape
    #[error("invalid response: {0}")]
    Decode(String),
}

impl HttpFailure {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Build a client with a request timeout and retries on transient failures
pub fn build_client(timeout: Duration, max_retries: u32) -> crate::Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| RideError::api(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Query parameters whose values never reach the logs
const SECRET_PARAMS: &[&str] = &["key"];

/// Strip credentials from a URL before it reaches the logs
#[must_use]
pub fn redact(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let Some(query) = parsed.query() else {
        return url.to_string();
    };

    // Rewrite raw pairs so the rest of the query keeps its original encoding
    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if SECRET_PARAMS.contains(&name) => format!("{name}=***"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");
    parsed.set_query(Some(&query));
    parsed.to_string()
}

/// GET `url` and decode the JSON body
#[instrument(skip(client, url), fields(url = %redact(url)))]
pub async fn get_json<T: DeserializeOwned>(
    client: &ClientWithMiddleware,
    url: &str,
) -> Result<T, HttpFailure> {
    let start_time = Instant::now();

    let response = client.get(url).send().await.map_err(|e| {
        warn!(
            "Network error after {:.3}s: {}",
            start_time.elapsed().as_secs_f64(),
            e
        );
        HttpFailure::Transport(e.to_string())
    })?;

    let status = response.status();
    debug!(
        "HTTP response received: {} in {:.3}s",
        status,
        start_time.elapsed().as_secs_f64()
    );

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!("Provider returned {}: {}", status, body);
        return Err(HttpFailure::Status {
            status: status.as_u16(),
            body,
        });
    }

    let parsed = response
        .json::<T>()
        .await
        .map_err(|e| HttpFailure::Decode(e.to_string()))?;

    let total_duration = start_time.elapsed();
    if total_duration > SLOW_RESPONSE {
        warn!(
            "Slow API response detected: {:.3}s",
            total_duration.as_secs_f64()
        );
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "https://graphhopper.com/api/1/route?point=1,2&key=secret123&profile=car",
        "https://graphhopper.com/api/1/route?point=1,2&key=***&profile=car"
    )]
    #[case("https://x.test/route?key=secret", "https://x.test/route?key=***")]
    #[case("https://x.test/search?name=Lagos", "https://x.test/search?name=Lagos")]
    #[case(
        "https://x.test/route?monkey=banana&key=s3cret",
        "https://x.test/route?monkey=banana&key=***"
    )]
    #[case("https://x.test/route?apikey=visible", "https://x.test/route?apikey=visible")]
    #[case("not a url?key=x", "not a url?key=x")]
    fn test_redact(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(redact(url), expected);
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(5), 2).is_ok());
    }

    #[test]
    fn test_failure_status() {
        let failure = HttpFailure::Status {
            status: 400,
            body: "Cannot find point".to_string(),
        };
        assert_eq!(failure.status(), Some(400));
        assert_eq!(HttpFailure::Transport("reset".into()).status(), None);
    }
}
