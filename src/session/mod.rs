//! Connection, negotiation, and acknowledgment-dispatch core
//!
//! The module is split by responsibility, leaf-first:
//!
//! - [`backoff`] - bounded exponential delay-with-jitter arithmetic
//! - [`retrier`] - transport connection with backoff retries
//! - [`topics`] - the topic filter / SUBACK status table
//! - [`classifier`] - dispatch of incoming ack events
//! - [`process_loop`] - the bounded polling loop driving the engine
//! - [`publisher`] - the fixed QoS 0/1/2 publish script
//! - [`negotiator`] - the three-attempt session negotiation script
//! - [`demo`] - the demo task tying everything together

pub mod backoff;
pub mod classifier;
pub mod demo;
pub mod negotiator;
pub mod process_loop;
pub mod publisher;
pub mod retrier;
pub mod topics;

pub use backoff::{RetryExhausted, RetryPolicy, RetryState};
pub use classifier::{classify, AckDisposition};
pub use demo::run_demo;
pub use negotiator::{
    attempt_script, establish_session, AuthSpec, ConnectExpectation, SessionAttemptSpec,
    SessionError, SessionProperties, WillSpec,
};
pub use process_loop::run_until;
pub use publisher::{publish_all, publish_script, PublishJob, Qos, DEMO_TOPIC_ALIAS};
pub use retrier::{connect_with_retries, RetryError};
pub use topics::{SubAckStatus, TopicError, TopicFilterEntry, TopicFilterTable};
