//! Chat client configuration

use std::time::Duration;

use crate::error::Result;

/// Client configuration, sourced from the environment with defaults
/// suitable for local development.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL for the REST API, e.g. `https://api.alabastar.com/api`.
    pub api_base_url: String,
    /// WebSocket endpoint for live events.
    pub socket_url: String,
    /// Bound on establishing the live connection.
    pub connect_timeout: Duration,
    /// Per-request bound on REST calls.
    pub request_timeout: Duration,
    /// Retry policy for hydration GETs. Sends are never auto-retried.
    pub retry: RetryPolicy,
    /// Transport-level reconnection attempts after an unexpected drop.
    pub reconnect_attempts: u32,
    /// Fixed delay between reconnection attempts.
    pub reconnect_delay: Duration,
    /// Page size for conversation and message hydration.
    pub page_size: u32,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_base_url: std::env::var("ALABASTAR_API_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api".to_string()),
            socket_url: std::env::var("ALABASTAR_SOCKET_URL")
                .unwrap_or_else(|_| "ws://localhost:8081/ws".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("ALABASTAR_CONNECT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            ),
            request_timeout: Duration::from_secs(
                std::env::var("ALABASTAR_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .unwrap_or(15),
            ),
            retry: RetryPolicy::default(),
            reconnect_attempts: std::env::var("ALABASTAR_RECONNECT_ATTEMPTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            reconnect_delay: Duration::from_secs(
                std::env::var("ALABASTAR_RECONNECT_DELAY_SECS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .unwrap_or(3),
            ),
            page_size: std::env::var("ALABASTAR_PAGE_SIZE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),
        })
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            socket_url: "ws://localhost:8081/ws".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
            reconnect_attempts: 5,
            reconnect_delay: Duration::from_secs(3),
            page_size: 50,
        }
    }
}

/// Retry policy for idempotent REST calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Initial retry interval
    pub initial_interval: Duration,
    /// Backoff coefficient (multiplier for each retry)
    pub backoff_coefficient: f64,
    /// Maximum retry interval
    pub maximum_interval: Duration,
    /// Maximum number of attempts
    pub maximum_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(10),
            maximum_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// No retries - fail immediately
    pub fn no_retry() -> Self {
        Self {
            maximum_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_maximum_attempts(mut self, attempts: u32) -> Self {
        self.maximum_attempts = attempts;
        self
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Delay before the given retry (0-based), capped at
    /// `maximum_interval`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let scaled =
            self.initial_interval.as_secs_f64() * self.backoff_coefficient.powi(retry as i32);
        Duration::from_secs_f64(scaled.min(self.maximum_interval.as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(3),
            maximum_attempts: 5,
        };

        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(3));
        assert_eq!(policy.delay_for(5), Duration::from_secs(3));
    }
}
