//! Transport connection with bounded backoff retries
//!
//! Repeatedly invokes the transport connect call, sleeping the delay the
//! backoff generator hands out between failures, until the connection is up
//! or the retry budget is spent. Exhaustion is reported, not decided on:
//! whether it is fatal belongs to the caller.

use crate::engine::JitterSource;
use crate::session::backoff::{RetryPolicy, RetryState};
use crate::transport::{Transport, TransportError, TransportTimeouts};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Terminal outcome of a failed reconnect sequence
#[derive(Debug, Error)]
pub enum RetryError {
    #[error("connection to {endpoint}:{port} failed, all {attempts} attempts exhausted")]
    Exhausted {
        endpoint: String,
        port: u16,
        attempts: u32,
        #[source]
        last_error: TransportError,
    },
}

/// Connect `transport` to `endpoint:port`, retrying with backoff and jitter.
///
/// Performs at most `policy.max_attempts` connect calls and returns on the
/// first successful one. A fresh [`RetryState`] is seeded per call; backoff
/// never spans two reconnect sequences.
pub async fn connect_with_retries(
    transport: &mut (impl Transport + ?Sized),
    endpoint: &str,
    port: u16,
    timeouts: TransportTimeouts,
    policy: RetryPolicy,
    jitter: &mut (impl JitterSource + ?Sized),
) -> Result<(), RetryError> {
    let mut state = RetryState::new(policy);

    loop {
        info!(endpoint, port, "creating a TCP connection to the broker");
        match transport.connect(endpoint, port, timeouts).await {
            Ok(()) => return Ok(()),
            Err(err) => match state.next_backoff(jitter) {
                Ok(delay) => {
                    warn!(
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "connection to the broker failed, retrying with backoff and jitter"
                    );
                    sleep(delay).await;
                }
                Err(exhausted) => {
                    error!(error = %err, "connection to the broker failed, all attempts exhausted");
                    return Err(RetryError::Exhausted {
                        endpoint: endpoint.to_string(),
                        port,
                        attempts: exhausted.attempts,
                        last_error: err,
                    });
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedJitter, FlakyTransport};
    use std::time::Duration;

    fn demo_policy() -> RetryPolicy {
        RetryPolicy {
            base_delay_ms: 500,
            max_delay_ms: 5000,
            max_attempts: 5,
        }
    }

    fn demo_timeouts() -> TransportTimeouts {
        TransportTimeouts::symmetric(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_first_attempt_success_connects_immediately() {
        let mut transport = FlakyTransport::failing_first(0);
        let mut jitter = FixedJitter(0);
        connect_with_retries(
            &mut transport,
            "broker.local",
            1883,
            demo_timeouts(),
            demo_policy(),
            &mut jitter,
        )
        .await
        .unwrap();
        assert_eq!(transport.connect_attempts(), 1);
        assert!(transport.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds_with_windowed_delays() {
        let mut transport = FlakyTransport::failing_first(2);
        let mut jitter = FixedJitter(0);
        let started = tokio::time::Instant::now();
        connect_with_retries(
            &mut transport,
            "broker.local",
            1883,
            demo_timeouts(),
            demo_policy(),
            &mut jitter,
        )
        .await
        .unwrap();
        assert_eq!(transport.connect_attempts(), 3);
        // Zero jitter draw pins the two sleeps to the window bases: 500 + 1000
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_stops_after_max_attempts() {
        let mut transport = FlakyTransport::failing_first(usize::MAX);
        let mut jitter = FixedJitter(0);
        let err = connect_with_retries(
            &mut transport,
            "broker.local",
            1883,
            demo_timeouts(),
            demo_policy(),
            &mut jitter,
        )
        .await
        .unwrap_err();
        assert_eq!(transport.connect_attempts(), 5);
        let RetryError::Exhausted {
            attempts,
            endpoint,
            port,
            ..
        } = err;
        assert_eq!(attempts, 5);
        assert_eq!(endpoint, "broker.local");
        assert_eq!(port, 1883);
        assert!(!transport.is_connected());
    }
}
