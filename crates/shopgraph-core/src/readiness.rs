//! Readiness gate: wait until a store answers a trivial probe.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::{CoreError, CoreResult};

/// How long and how often to probe a store before giving up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub timeout: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
            max_attempts: None,
        }
    }
}

/// Probe `store` until it succeeds or `policy` is exhausted.
///
/// Every probe error is treated as transient. Each attempt is bounded by the
/// time left before the deadline and sleeps never overshoot it, so a store
/// that never answers fails after roughly `policy.timeout`.
///
/// Returns the number of attempts it took.
pub async fn await_ready<F, Fut, E>(store: &str, policy: &RetryPolicy, mut probe: F) -> CoreResult<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    info!(store, "Waiting for store to accept queries...");

    let start = Instant::now();
    let mut attempts = 0u32;
    let mut last_error = String::new();

    loop {
        let remaining = policy.timeout.saturating_sub(start.elapsed());
        // A probe with no time left cannot answer; keep the last real cause.
        if attempts > 0 && remaining.is_zero() {
            return Err(timed_out(store, attempts, start.elapsed(), last_error));
        }

        attempts += 1;
        last_error = match tokio::time::timeout(remaining, probe()).await {
            Ok(Ok(())) => {
                info!(store, attempts, "Store is ready");
                return Ok(attempts);
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("probe did not answer within {:?}", remaining),
        };

        let elapsed = start.elapsed();
        let out_of_attempts = policy.max_attempts.is_some_and(|max| attempts >= max);
        if elapsed >= policy.timeout || out_of_attempts {
            return Err(timed_out(store, attempts, elapsed, last_error));
        }

        warn!(store, attempt = attempts, error = %last_error, "Store not ready yet");
        let pause = policy.interval.min(policy.timeout - elapsed);
        tokio::time::sleep(pause).await;
    }
}

fn timed_out(store: &str, attempts: u32, elapsed: Duration, last_error: String) -> CoreError {
    warn!(store, attempts, ?elapsed, "Store did not become ready in time");
    CoreError::ReadinessTimeout {
        store: store.to_string(),
        attempts,
        elapsed,
        last_error,
    }
}
