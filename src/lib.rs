//! MQTT v5 session demo client
//!
//! A single-task client that drives one MQTT v5 session to completion:
//! backoff-retried transport connects, a scripted three-attempt session
//! negotiation (an auth probe expected to fail, a will-delay verification,
//! and the production session), a fixed publish sequence across QoS 0/1/2
//! and topic-alias variants, a bounded ack-draining process loop, and a
//! clean disconnect.
//!
//! The MQTT wire protocol itself is out of scope: the core drives an
//! external engine through the [`engine::ProtocolEngine`] trait and a raw
//! byte transport through [`transport::Transport`]. Time and jitter are
//! injected the same way, so every timing decision is testable.
//!
//! # Quick start
//!
//! ```rust
//! use mqtt5_session_demo::config::DemoConfig;
//! use mqtt5_session_demo::session::run_demo;
//! use mqtt5_session_demo::testing::{FakeClock, FixedJitter, FlakyTransport, SimulatedEngine};
//!
//! # tokio_test::block_on(async {
//! let config = DemoConfig::default();
//! let mut transport = FlakyTransport::failing_first(0);
//! let mut engine = SimulatedEngine::new(Default::default());
//! let clock = FakeClock::auto_advancing(100);
//! let mut jitter = FixedJitter(0);
//!
//! run_demo(&config, &mut transport, &mut engine, &clock, &mut jitter)
//!     .await
//!     .expect("demo iteration failed");
//! # });
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod session;
pub mod testing;
pub mod transport;

pub use config::{ConfigError, DemoConfig};
pub use engine::{
    AckEvent, AckInfo, Clock, ConnackOutcome, EngineError, EngineLimits, JitterSource,
    MonotonicClock, ProcessStatus, ProtocolEngine, RandomJitter, UserProperty,
};
pub use error::{DemoError, DemoResult};
pub use session::run_demo;
pub use transport::{TcpTransport, Transport, TransportError, TransportTimeouts};
