use crate::availability::Endpoints;
use crate::fetcher::RetryPolicy;
use std::{env, str::FromStr, time::Duration};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";
const DEFAULT_APPLICATION_DATES_PATH: &str = "/api/application-dates";
const DEFAULT_OPEN_WINDOWS_PATH: &str = "/api/windows";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub endpoints: Endpoints,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = lookup("BOOKING_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let application_dates = lookup("APPLICATION_DATES_PATH")
            .unwrap_or_else(|| DEFAULT_APPLICATION_DATES_PATH.to_string());
        let open_windows =
            lookup("OPEN_WINDOWS_PATH").unwrap_or_else(|| DEFAULT_OPEN_WINDOWS_PATH.to_string());

        let max_attempts = parsed(&lookup, "RETRY_MAX_ATTEMPTS", RetryPolicy::DEFAULT_MAX_ATTEMPTS);
        let max_attempts = if max_attempts == 0 {
            warn!(
                "RETRY_MAX_ATTEMPTS must be at least 1, using {}",
                RetryPolicy::DEFAULT_MAX_ATTEMPTS
            );
            RetryPolicy::DEFAULT_MAX_ATTEMPTS
        } else {
            max_attempts
        };
        let base_delay_ms = parsed(
            &lookup,
            "RETRY_BASE_DELAY_MS",
            RetryPolicy::DEFAULT_BASE_DELAY.as_millis() as u64,
        );

        Self {
            port: parsed(&lookup, "PORT", DEFAULT_PORT),
            endpoints: Endpoints {
                application_dates: join_url(&base, &application_dates),
                open_windows: join_url(&base, &open_windows),
            },
            retry: RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(base_delay_ms),
            },
            request_timeout: Duration::from_secs(parsed(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {name}={raw:?}");
            default
        }),
        None => default,
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
