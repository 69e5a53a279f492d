//! Mock collaborators for testing
//!
//! Scripted implementations of the transport, protocol engine, clock, and
//! jitter traits so the session core can be exercised without a broker.

pub mod mocks;

pub use mocks::{FakeClock, FixedJitter, FlakyTransport, SimulatedEngine};
