//! Collaborator contracts for the MQTT v5 protocol engine
//!
//! The demo core never touches the wire format. It drives an external
//! protocol engine through the [`ProtocolEngine`] trait and interprets the
//! statuses and ack events the engine hands back. Time and jitter are also
//! injected ([`Clock`], [`JitterSource`]) so every timing decision in the
//! core is testable without real sleeps.

use crate::session::negotiator::SessionAttemptSpec;
use crate::session::publisher::PublishJob;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Sizing handed to engine implementations for their QoS bookkeeping tables
/// and packet buffer. Mirrors the record arrays the engine needs to track
/// QoS > 0 acknowledgments for outgoing and incoming publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    /// Capacity of the outgoing QoS > 0 publish record table
    pub outgoing_publish_records: usize,
    /// Capacity of the incoming QoS > 0 publish record table
    pub incoming_publish_records: usize,
    /// Size of the shared packet buffer in bytes
    pub network_buffer_bytes: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            outgoing_publish_records: 15,
            incoming_publish_records: 15,
            network_buffer_bytes: 1024,
        }
    }
}

/// Engine-level failures surfaced to the session core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("CONNACK not received within {timeout_ms} ms")]
    ConnackTimeout { timeout_ms: u64 },

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("transport lost: {0}")]
    TransportLost(String),

    #[error("engine has no active session")]
    NotConnected,
}

/// Result of one engine processing step.
///
/// `NeedMoreData` means a packet is partially received; it is a transient
/// condition the process loop keeps polling through, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    Ok,
    NeedMoreData,
    Failed(EngineError),
}

/// Outcome of a CONNACK exchange. A broker refusal is an ordinary outcome
/// here, not an `EngineError` - the negotiator decides whether a rejection
/// is expected for the attempt at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnackOutcome {
    Accepted { session_present: bool },
    Rejected { reason_code: u8 },
}

/// A single MQTT v5 user property (key/value pair)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProperty {
    pub key: String,
    pub value: String,
}

impl UserProperty {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Reason string and user properties attached to an outgoing ack or
/// DISCONNECT packet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AckInfo {
    pub reason_string: Option<String>,
    pub user_properties: Vec<UserProperty>,
}

/// One incoming acknowledgment event produced by the engine.
///
/// The engine queues these as packets arrive during a processing step; the
/// process loop drains them into the response classifier. Event data is
/// consumed exactly once and not retained afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckEvent {
    Puback { packet_id: u16 },
    Pubrec { packet_id: u16 },
    Pubrel { packet_id: u16 },
    Pubcomp { packet_id: u16 },
    Pingresp,
    Suback { packet_id: u16, reason_codes: Vec<u8> },
    Unsuback { packet_id: u16 },
    Other { raw_type: u8, packet_id: u16 },
}

impl AckEvent {
    /// Packet identifier carried by the event (0 for PINGRESP, which has none)
    pub fn packet_id(&self) -> u16 {
        match self {
            AckEvent::Puback { packet_id }
            | AckEvent::Pubrec { packet_id }
            | AckEvent::Pubrel { packet_id }
            | AckEvent::Pubcomp { packet_id }
            | AckEvent::Suback { packet_id, .. }
            | AckEvent::Unsuback { packet_id }
            | AckEvent::Other { packet_id, .. } => *packet_id,
            AckEvent::Pingresp => 0,
        }
    }
}

/// The external MQTT v5 protocol engine.
///
/// Implementations own wire encoding, keep-alive PINGREQ generation, and the
/// QoS handshake state tables. The session core only sequences calls into
/// this trait and classifies what comes back.
#[async_trait]
pub trait ProtocolEngine: Send {
    /// Send CONNECT over the already-connected transport and wait for CONNACK
    async fn connect(
        &mut self,
        attempt: &SessionAttemptSpec,
        connack_timeout: Duration,
    ) -> Result<ConnackOutcome, EngineError>;

    /// Allocate a packet identifier, unique among in-flight QoS > 0 publishes
    fn next_packet_id(&mut self) -> u16;

    /// Send a PUBLISH packet
    async fn publish(&mut self, job: &PublishJob, packet_id: u16) -> Result<(), EngineError>;

    /// Run one incoming/outgoing processing step
    async fn process_step(&mut self) -> ProcessStatus;

    /// Drain the ack events queued by processing steps since the last call
    fn take_events(&mut self) -> Vec<AckEvent>;

    /// Attach a reason string to the pending ack for `packet_id` before the
    /// engine sends its half of the handshake (used for PUBREC responses)
    fn annotate_pending_ack(&mut self, packet_id: u16, reason_string: &str);

    /// Send a DISCONNECT packet with the given ack info and reason code
    async fn disconnect(&mut self, ack: &AckInfo, reason_code: u8) -> Result<(), EngineError>;
}

/// Monotonic time source referenced to an arbitrary epoch fixed at creation
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since the clock's epoch; never decreases
    fn now_ms(&self) -> u64;
}

/// [`Clock`] backed by [`std::time::Instant`], anchored at construction
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Randomness used to jitter backoff delays. Does not need to be
/// cryptographically secure; it only desynchronizes competing retriers.
pub trait JitterSource: Send {
    fn next_jitter(&mut self) -> u32;
}

/// [`JitterSource`] backed by a seedable PRNG
#[derive(Debug)]
pub struct RandomJitter(StdRng);

impl RandomJitter {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Deterministic source for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl JitterSource for RandomJitter {
    fn next_jitter(&mut self) -> u32 {
        self.0.next_u32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_event_packet_id() {
        assert_eq!(AckEvent::Puback { packet_id: 7 }.packet_id(), 7);
        assert_eq!(AckEvent::Pingresp.packet_id(), 0);
        assert_eq!(
            AckEvent::Suback {
                packet_id: 3,
                reason_codes: vec![0, 1],
            }
            .packet_id(),
            3
        );
        assert_eq!(
            AckEvent::Other {
                raw_type: 0xF0,
                packet_id: 9,
            }
            .packet_id(),
            9
        );
    }

    #[test]
    fn test_monotonic_clock_never_decreases() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }

    #[test]
    fn test_seeded_jitter_is_reproducible() {
        let mut a = RandomJitter::seeded(42);
        let mut b = RandomJitter::seeded(42);
        for _ in 0..8 {
            assert_eq!(a.next_jitter(), b.next_jitter());
        }
    }

    #[test]
    fn test_engine_limits_defaults() {
        let limits = EngineLimits::default();
        assert_eq!(limits.outgoing_publish_records, 15);
        assert_eq!(limits.incoming_publish_records, 15);
        assert_eq!(limits.network_buffer_bytes, 1024);
    }

    #[test]
    fn test_engine_error_display() {
        let errors = vec![
            EngineError::ConnackTimeout { timeout_ms: 1000 },
            EngineError::Protocol("bad remaining length".to_string()),
            EngineError::TransportLost("peer reset".to_string()),
            EngineError::NotConnected,
        ];
        for error in errors {
            assert!(!error.to_string().is_empty());
        }
    }
}
