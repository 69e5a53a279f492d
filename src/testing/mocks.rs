//! Mock transport, engine, clock, and jitter implementations

use crate::engine::{
    AckEvent, AckInfo, Clock, ConnackOutcome, EngineError, EngineLimits, JitterSource,
    ProcessStatus, ProtocolEngine,
};
use crate::session::negotiator::SessionAttemptSpec;
use crate::session::publisher::{PublishJob, Qos};
use crate::transport::{Transport, TransportError, TransportTimeouts};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Jitter source that always returns the same raw draw
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub u32);

impl JitterSource for FixedJitter {
    fn next_jitter(&mut self) -> u32 {
        self.0
    }
}

/// Clock that advances by a fixed step on every query
#[derive(Debug)]
pub struct FakeClock {
    now_ms: AtomicU64,
    step_ms: u64,
}

impl FakeClock {
    /// Starts at zero and moves `step_ms` forward after each `now_ms` call
    pub fn auto_advancing(step_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(0),
            step_ms,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.fetch_add(self.step_ms, Ordering::SeqCst)
    }
}

/// Transport stub that fails a scripted number of connect attempts before
/// succeeding, and can delay its network-up signal
#[derive(Debug, Default)]
pub struct FlakyTransport {
    fail_first: usize,
    connect_attempts: usize,
    closes: usize,
    connected: bool,
    network_up_after: usize,
    network_checks: AtomicUsize,
}

impl FlakyTransport {
    /// Fail the first `fail_first` connect attempts, then succeed
    pub fn failing_first(fail_first: usize) -> Self {
        Self {
            fail_first,
            ..Default::default()
        }
    }

    /// Report the network link down for the first `checks` readiness polls
    pub fn set_network_up_after(&mut self, checks: usize) {
        self.network_up_after = checks;
    }

    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts
    }

    /// Times a live connection was torn down
    pub fn closes(&self) -> usize {
        self.closes
    }
}

#[async_trait]
impl Transport for FlakyTransport {
    async fn connect(
        &mut self,
        endpoint: &str,
        port: u16,
        _timeouts: TransportTimeouts,
    ) -> Result<(), TransportError> {
        self.connect_attempts += 1;
        if self.connect_attempts <= self.fail_first {
            return Err(TransportError::ConnectFailed {
                endpoint: endpoint.to_string(),
                port,
                source: std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "scripted connect failure",
                ),
            });
        }
        self.connected = true;
        Ok(())
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if self.connected {
            Ok(data.len())
        } else {
            Err(TransportError::NotConnected)
        }
    }

    async fn recv(&mut self, _buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.connected {
            Ok(0)
        } else {
            Err(TransportError::NotConnected)
        }
    }

    async fn close(&mut self) {
        if self.connected {
            self.connected = false;
            self.closes += 1;
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_network_up(&self) -> bool {
        let checks = self.network_checks.fetch_add(1, Ordering::SeqCst) + 1;
        checks > self.network_up_after
    }
}

/// In-process protocol engine simulating a broker's ack behavior.
///
/// Connect attempts carrying enhanced auth are rejected (like a broker that
/// does not know the method), QoS 2 publishes produce PUBREC then PUBCOMP
/// events, QoS 1 publishes produce PUBACK. One queued event is delivered per
/// processing step; an empty queue reports `NeedMoreData`.
#[derive(Debug)]
pub struct SimulatedEngine {
    limits: EngineLimits,
    connected: bool,
    next_packet_id: u16,
    connect_attempts: Vec<SessionAttemptSpec>,
    published: Vec<(PublishJob, u16)>,
    pending_events: VecDeque<AckEvent>,
    delivered_events: Vec<AckEvent>,
    annotations: Vec<(u16, String)>,
    disconnect_calls: Vec<(AckInfo, u8)>,
    /// Accept the enhanced-auth connect instead of rejecting it
    pub accept_auth_probe: bool,
    /// Reject every connect attempt
    pub reject_all: bool,
}

impl SimulatedEngine {
    pub fn new(limits: EngineLimits) -> Self {
        Self {
            limits,
            connected: false,
            next_packet_id: 0,
            connect_attempts: Vec::new(),
            published: Vec::new(),
            pending_events: VecDeque::new(),
            delivered_events: Vec::new(),
            annotations: Vec::new(),
            disconnect_calls: Vec::new(),
            accept_auth_probe: false,
            reject_all: false,
        }
    }

    /// Engine with an already-established session, for publish-path tests
    pub fn connected() -> Self {
        let mut engine = Self::new(EngineLimits::default());
        engine.connected = true;
        engine
    }

    pub fn limits(&self) -> EngineLimits {
        self.limits
    }

    pub fn connect_attempts(&self) -> Vec<SessionAttemptSpec> {
        self.connect_attempts.clone()
    }

    pub fn published(&self) -> Vec<(PublishJob, u16)> {
        self.published.clone()
    }

    pub fn annotations(&self) -> Vec<(u16, String)> {
        self.annotations.clone()
    }

    pub fn disconnect_calls(&self) -> Vec<(AckInfo, u8)> {
        self.disconnect_calls.clone()
    }
}

#[async_trait]
impl ProtocolEngine for SimulatedEngine {
    async fn connect(
        &mut self,
        attempt: &SessionAttemptSpec,
        _connack_timeout: Duration,
    ) -> Result<ConnackOutcome, EngineError> {
        self.connect_attempts.push(attempt.clone());

        if self.reject_all {
            // Not authorized
            return Ok(ConnackOutcome::Rejected { reason_code: 0x87 });
        }
        if attempt.auth.is_some() && !self.accept_auth_probe {
            // Bad authentication method
            return Ok(ConnackOutcome::Rejected { reason_code: 0x8C });
        }
        self.connected = true;
        Ok(ConnackOutcome::Accepted {
            session_present: false,
        })
    }

    fn next_packet_id(&mut self) -> u16 {
        self.next_packet_id = self.next_packet_id.wrapping_add(1).max(1);
        self.next_packet_id
    }

    async fn publish(&mut self, job: &PublishJob, packet_id: u16) -> Result<(), EngineError> {
        if !self.connected {
            return Err(EngineError::NotConnected);
        }
        self.published.push((job.clone(), packet_id));
        match job.qos {
            Qos::ExactlyOnce => {
                self.pending_events.push_back(AckEvent::Pubrec { packet_id });
                self.pending_events
                    .push_back(AckEvent::Pubcomp { packet_id });
            }
            Qos::AtLeastOnce => {
                self.pending_events.push_back(AckEvent::Puback { packet_id });
            }
            Qos::AtMostOnce => {}
        }
        Ok(())
    }

    async fn process_step(&mut self) -> ProcessStatus {
        match self.pending_events.pop_front() {
            Some(event) => {
                self.delivered_events.push(event);
                ProcessStatus::Ok
            }
            None => ProcessStatus::NeedMoreData,
        }
    }

    fn take_events(&mut self) -> Vec<AckEvent> {
        std::mem::take(&mut self.delivered_events)
    }

    fn annotate_pending_ack(&mut self, packet_id: u16, reason_string: &str) {
        self.annotations.push((packet_id, reason_string.to_string()));
    }

    async fn disconnect(&mut self, ack: &AckInfo, reason_code: u8) -> Result<(), EngineError> {
        if !self.connected {
            return Err(EngineError::NotConnected);
        }
        self.disconnect_calls.push((ack.clone(), reason_code));
        self.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flaky_transport_honors_failure_budget() {
        let mut transport = FlakyTransport::failing_first(2);
        let timeouts = TransportTimeouts::symmetric(Duration::from_millis(200));
        assert!(transport.connect("host", 1883, timeouts).await.is_err());
        assert!(transport.connect("host", 1883, timeouts).await.is_err());
        assert!(transport.connect("host", 1883, timeouts).await.is_ok());
        assert_eq!(transport.connect_attempts(), 3);
    }

    #[tokio::test]
    async fn test_simulated_engine_acks_by_qos() {
        let mut engine = SimulatedEngine::connected();
        let script = crate::session::publisher::publish_script();

        engine.publish(&script[3], 9).await.unwrap(); // QoS 1
        assert_eq!(engine.process_step().await, ProcessStatus::Ok);
        assert_eq!(engine.take_events(), vec![AckEvent::Puback { packet_id: 9 }]);
        assert_eq!(engine.process_step().await, ProcessStatus::NeedMoreData);

        engine.publish(&script[0], 10).await.unwrap(); // QoS 2
        assert_eq!(engine.process_step().await, ProcessStatus::Ok);
        assert_eq!(engine.process_step().await, ProcessStatus::Ok);
        assert_eq!(
            engine.take_events(),
            vec![
                AckEvent::Pubrec { packet_id: 10 },
                AckEvent::Pubcomp { packet_id: 10 },
            ]
        );
    }

    #[test]
    fn test_fake_clock_auto_advances() {
        let clock = FakeClock::auto_advancing(10);
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.now_ms(), 10);
        clock.advance(100);
        assert_eq!(clock.now_ms(), 120);
    }

    #[test]
    fn test_packet_ids_are_unique_and_nonzero() {
        let mut engine = SimulatedEngine::connected();
        let first = engine.next_packet_id();
        let second = engine.next_packet_id();
        assert_ne!(first, 0);
        assert_ne!(first, second);
    }
}
