//! # Microservice Call Wrapper
//!
//! Bounded waiting and retries for outbound RPC calls.
//!
//! Given a call with a deadline `D` and a retry budget `R`, [`call_microservice`]
//! produces exactly one of:
//! - the success value of the first attempt that settles in time, or
//! - a normalized [`TypedRpcException`].
//!
//! The caller never waits longer than `D × (R + 1)`: retries are immediate, there is
//! no backoff and no jitter. Transport failures and timeouts consume the budget, while
//! an error reply from the remote service is a business answer and is returned
//! unchanged on the spot.

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn, Instrument};

use crate::rpc::exception::TypedRpcException;
use crate::rpc::transport::TransportError;

/// Largest retry budget accepted from configuration
pub const MAX_RETRIES: u32 = 10;

/// Deadline and retry budget for one logical call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallOptions {
    /// Deadline for each attempt
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Additional attempts after the first one fails
    pub retries: u32,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retries: 2,
        }
    }
}

impl CallOptions {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self { timeout, retries }
    }

    /// Attempts made before giving up, the first one included
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Worst-case wall time of a call made with these options
    pub fn max_wait(&self) -> Duration {
        self.timeout.checked_mul(self.attempts()).unwrap_or(Duration::MAX)
    }
}

enum AttemptFailure {
    TimedOut,
    Transport(TransportError),
}

/// Await an RPC call with a per-attempt deadline and immediate retries
///
/// `call` is invoked once per attempt and must dispatch a fresh message each time,
/// which is why it is a factory rather than a single future.
pub async fn call_microservice<T, F, Fut>(
    mut call: F,
    service: &str,
    options: CallOptions,
) -> Result<T, TypedRpcException>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let span = tracing::info_span!("rpc_call", service = %service);
    let service_label = service.to_string();

    async move {
        let started = Instant::now();
        let attempts = options.attempts();
        let mut last_failure = AttemptFailure::TimedOut;

        for attempt in 1..=attempts {
            match tokio::time::timeout(options.timeout, call()).await {
                Ok(Ok(value)) => {
                    debug!(attempt, "RPC call succeeded");
                    record(&service_label, "success", started);
                    return Ok(value);
                }
                Ok(Err(TransportError::Remote(exception))) => {
                    debug!(attempt, code = %exception.code, message = %exception.message, "RPC call returned a remote error");
                    record(&service_label, "remote_error", started);
                    return Err(exception);
                }
                Ok(Err(err)) => {
                    warn!(attempt, attempts, error = %err, "RPC call failed");
                    last_failure = AttemptFailure::Transport(err);
                }
                Err(_) => {
                    warn!(attempt, attempts, timeout_ms = options.timeout.as_millis() as u64, "RPC call timed out");
                    last_failure = AttemptFailure::TimedOut;
                }
            }
        }

        let exception = match last_failure {
            AttemptFailure::TimedOut => {
                record(&service_label, "timeout", started);
                TypedRpcException::timeout_or_network()
            }
            AttemptFailure::Transport(err) => {
                warn!(error = %err, "RPC retries exhausted");
                record(&service_label, "unavailable", started);
                TypedRpcException::service_unavailable()
            }
        };
        Err(exception)
    }
    .instrument(span)
    .await
}

fn record(service: &str, outcome: &'static str, started: Instant) {
    counter!("rpc_calls_total", "service" => service.to_string(), "outcome" => outcome).increment(1);
    histogram!("rpc_call_duration_seconds", "service" => service.to_string())
        .record(started.elapsed().as_secs_f64());
}
