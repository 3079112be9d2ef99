use crate::errors::{AttemptError, RequestFailure};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::{future::Future, time::Duration};
use tracing::{debug, error, warn};

/// Something that can GET a JSON document once.
pub trait JsonSource: Send + Sync {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, AttemptError>> + Send;
}

/// Fixed attempt budget with a deterministic `2^i * base` backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

    /// Delay after the failed attempt with the given zero-based index.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt_index))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Self::DEFAULT_BASE_DELAY,
        }
    }
}

/// GET `url` until it yields JSON or the policy's attempts run out.
///
/// There is no wait after the final attempt; the last cause is returned as is.
pub async fn fetch_with_retry<S: JsonSource>(
    source: &S,
    url: &str,
    policy: RetryPolicy,
) -> Result<Value, RequestFailure> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match source.get_json(url).await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("GET {url} succeeded on attempt {}", attempt + 1);
                }
                return Ok(value);
            }
            Err(cause) => {
                let attempts = attempt + 1;
                if attempts >= max_attempts {
                    error!("GET {url} failed after {attempts} attempts: {cause}");
                    return Err(RequestFailure {
                        url: url.to_string(),
                        attempts,
                        cause,
                    });
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    "GET {url} failed (attempt {attempts}/{max_attempts}): {cause}; retrying in {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// [`JsonSource`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl JsonSource for HttpSource {
    fn get_json(&self, url: &str) -> impl Future<Output = Result<Value, AttemptError>> + Send {
        let request = self.client.get(url);
        async move {
            let response = request
                .send()
                .await
                .map_err(|err| AttemptError::Transport(err.to_string()))?;

            let status = response.status();
            if status == StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }

            let body = response
                .bytes()
                .await
                .map_err(|err| AttemptError::Transport(err.to_string()))?;

            if !status.is_success() {
                return Err(AttemptError::Status {
                    status: status.as_u16(),
                    message: error_message(status, &body),
                });
            }

            serde_json::from_slice(&body).map_err(|err| AttemptError::Decode(err.to_string()))
        }
    }
}

// Backend errors look like {"error": "...", "details": "..."}.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) {
        let error = fields.get("error").and_then(Value::as_str);
        let details = fields
            .get("details")
            .and_then(Value::as_str)
            .filter(|details| !details.is_empty());

        match (error, details) {
            (Some(error), Some(details)) => return format!("{error}: {details}"),
            (Some(error), None) => return error.to_string(),
            _ => {}
        }
    }

    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}
