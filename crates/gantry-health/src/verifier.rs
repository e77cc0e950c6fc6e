//! HTTP health verification.
//!
//! A deployed application counts as healthy when any probed endpoint
//! answers HTTP 200 — exactly 200, not merely 2xx, since several frameworks
//! serve 3xx redirects and soft-404s from half-booted apps.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub type HealthResult<T> = Result<T, HealthError>;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("failed to build http client: {0}")]
    Client(String),
}

/// Probe paths in priority order. The first 200 wins; later endpoints are
/// never contacted once one matches.
pub const DEFAULT_ENDPOINTS: [&str; 4] = ["/health", "/healthz", "/api/health", "/"];

#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub endpoints: Vec<String>,
    pub attempts_per_endpoint: u32,
    /// Pause between attempts against the same endpoint.
    pub delay: Duration,
    pub request_timeout: Duration,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            attempts_per_endpoint: 3,
            delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Result of one [`HealthVerifier::check`] pass.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub healthy: bool,
    pub matched_endpoint: Option<String>,
    pub status_code: Option<u16>,
    pub response_time: Option<Duration>,
    pub attempts_used: u32,
    /// One line per failed probe, in probe order.
    pub errors: Vec<String>,
}

/// Result of a [`HealthVerifier::wait_for_healthy`] watch.
#[derive(Debug, Clone)]
pub struct WaitReport {
    pub healthy: bool,
    /// Check passes performed, including the final one.
    pub checks: u32,
    /// On timeout this is exactly the `max_wait` that was given.
    pub waited: Duration,
    pub last: HealthReport,
}

impl WaitReport {
    pub fn timed_out(&self) -> bool {
        !self.healthy
    }
}

pub struct HealthVerifier {
    client: reqwest::Client,
}

impl HealthVerifier {
    pub fn new() -> HealthResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| HealthError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Probe the endpoints in priority order and stop at the first 200.
    ///
    /// Never fails: connection errors and bad statuses are accumulated in
    /// the report so a failed health gate can say what it saw.
    pub async fn check(&self, base_url: &str, options: &CheckOptions) -> HealthReport {
        let base = base_url.trim_end_matches('/');
        let mut errors = Vec::new();
        let mut attempts_used = 0;

        for endpoint in &options.endpoints {
            let url = format!("{base}{endpoint}");
            for attempt in 0..options.attempts_per_endpoint {
                attempts_used += 1;
                let started = Instant::now();
                match self
                    .client
                    .get(&url)
                    .timeout(options.request_timeout)
                    .send()
                    .await
                {
                    Ok(response) => {
                        let status = response.status().as_u16();
                        if status == 200 {
                            let response_time = started.elapsed();
                            info!(%url, ms = response_time.as_millis() as u64, "healthy");
                            return HealthReport {
                                healthy: true,
                                matched_endpoint: Some(endpoint.clone()),
                                status_code: Some(status),
                                response_time: Some(response_time),
                                attempts_used,
                                errors,
                            };
                        }
                        debug!(%url, status, "probe got a non-200");
                        errors.push(format!("GET {endpoint} -> HTTP {status}"));
                    }
                    Err(err) => {
                        debug!(%url, error = %err, "probe failed");
                        errors.push(format!("GET {endpoint} -> {err}"));
                    }
                }
                if attempt + 1 < options.attempts_per_endpoint && !options.delay.is_zero() {
                    tokio::time::sleep(options.delay).await;
                }
            }
        }

        HealthReport {
            healthy: false,
            matched_endpoint: None,
            status_code: None,
            response_time: None,
            attempts_used,
            errors,
        }
    }

    /// Re-check until healthy or `max_wait` has passed.
    ///
    /// Each pass probes every endpoint once; the per-endpoint retry budget
    /// stays out of the picture because this loop is already the retry.
    pub async fn wait_for_healthy(
        &self,
        base_url: &str,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> WaitReport {
        let started = Instant::now();
        let deadline = started + max_wait;
        let options = CheckOptions {
            attempts_per_endpoint: 1,
            delay: Duration::ZERO,
            ..CheckOptions::default()
        };

        let mut checks = 0;
        loop {
            checks += 1;
            let report = self.check(base_url, &options).await;
            if report.healthy {
                return WaitReport {
                    healthy: true,
                    checks,
                    waited: started.elapsed(),
                    last: report,
                };
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(
                    base_url,
                    waited_secs = max_wait.as_secs(),
                    checks,
                    "never became healthy before the deadline"
                );
                return WaitReport {
                    healthy: false,
                    checks,
                    waited: max_wait,
                    last: report,
                };
            }
            tokio::time::sleep(poll_interval.min(remaining)).await;
        }
    }
}
