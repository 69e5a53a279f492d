//! Scripted MQTT session negotiation
//!
//! Runs three session attempts in fixed order, each over its own freshly
//! retried transport connection: an auth probe the broker must reject, a
//! will-delay verification whose transport is dropped without a DISCONNECT,
//! and the production session that must be accepted. The sequence is data
//! (an ordered list of [`SessionAttemptSpec`]) executed by one generic
//! attempt routine.

use crate::config::DemoConfig;
use crate::engine::{ConnackOutcome, EngineError, JitterSource, ProtocolEngine, UserProperty};
use crate::session::retrier::{connect_with_retries, RetryError};
use crate::transport::Transport;
use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

/// Client identifier used by the will-delay verification attempt
const WILL_ATTEMPT_CLIENT_ID: &str = "abcde";

/// Enhanced authentication fields for a connect attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSpec {
    pub method: String,
    pub data: Bytes,
}

/// Last-will message registered with the broker at connect time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WillSpec {
    pub topic: String,
    pub payload: Bytes,
    /// Seconds the broker defers publishing the will after an ungraceful end
    pub delay_secs: u32,
    pub user_properties: Vec<UserProperty>,
}

/// MQTT v5 session properties sent with CONNECT. Zero values mean the
/// property is left unset, matching the engine's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionProperties {
    pub session_expiry_secs: u32,
    pub max_packet_size: u32,
    pub request_response_info: bool,
    pub receive_max: u16,
    pub topic_alias_max: u16,
}

/// What the negotiator requires of a connect attempt's outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectExpectation {
    /// The broker must refuse this attempt; acceptance is an error
    Rejected,
    /// The outcome is observed and logged but not asserted
    Unchecked,
    /// The broker must accept this attempt; anything else is fatal
    Accepted,
}

/// One scripted session attempt, constructed fresh per negotiation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAttemptSpec {
    /// Short name used in logs
    pub label: &'static str,
    pub client_id: String,
    pub clean_session: bool,
    pub keep_alive_secs: u16,
    pub will: Option<WillSpec>,
    /// Placed on both the outgoing and incoming auth slots when present
    pub auth: Option<AuthSpec>,
    pub properties: SessionProperties,
    pub expectation: ConnectExpectation,
    /// Close the socket without a DISCONNECT once the attempt returns, to
    /// exercise the broker's will-delay timer
    pub abort_transport_after: bool,
}

/// Session negotiation failures
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Retry(#[from] RetryError),

    #[error("broker accepted the auth probe; a rejection was expected")]
    AuthProbeAccepted,

    #[error("broker rejected the production connect (reason code {reason_code:#04x})")]
    ProductionRejected { reason_code: u8 },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Build the fixed three-attempt negotiation script
pub fn attempt_script(config: &DemoConfig) -> Vec<SessionAttemptSpec> {
    let keep_alive_secs = config.session.keep_alive_secs;

    let auth_probe = SessionAttemptSpec {
        label: "auth-probe",
        client_id: config.session.client_id.clone(),
        clean_session: false,
        keep_alive_secs,
        will: None,
        auth: Some(AuthSpec {
            method: "test".to_string(),
            data: Bytes::from_static(b"test"),
        }),
        properties: SessionProperties::default(),
        expectation: ConnectExpectation::Rejected,
        abort_transport_after: false,
    };

    let will_delay_verification = SessionAttemptSpec {
        label: "will-delay-verification",
        client_id: WILL_ATTEMPT_CLIENT_ID.to_string(),
        clean_session: true,
        keep_alive_secs,
        will: Some(WillSpec {
            topic: "TestWill1234".to_string(),
            payload: Bytes::from_static(b"TestWillPayload"),
            delay_secs: 30,
            user_properties: vec![UserProperty::new("Key1", "Value1")],
        }),
        auth: None,
        properties: SessionProperties::default(),
        expectation: ConnectExpectation::Unchecked,
        abort_transport_after: true,
    };

    let production = SessionAttemptSpec {
        label: "production",
        client_id: config.session.client_id.clone(),
        clean_session: true,
        keep_alive_secs,
        will: None,
        auth: None,
        properties: SessionProperties {
            session_expiry_secs: 20,
            max_packet_size: 200,
            request_response_info: true,
            receive_max: 20,
            topic_alias_max: 20,
        },
        expectation: ConnectExpectation::Accepted,
        abort_transport_after: false,
    };

    vec![auth_probe, will_delay_verification, production]
}

/// Execute the negotiation script. Returns the production session's
/// `session_present` flag on success.
pub async fn establish_session(
    transport: &mut (impl Transport + ?Sized),
    engine: &mut (impl ProtocolEngine + ?Sized),
    jitter: &mut (impl JitterSource + ?Sized),
    config: &DemoConfig,
) -> Result<bool, SessionError> {
    let mut session_present = false;

    for attempt in attempt_script(config) {
        info!(
            attempt = attempt.label,
            client_id = %attempt.client_id,
            "negotiating an MQTT session with the broker"
        );

        // Every attempt gets its own freshly retried transport connection;
        // the previous attempt's socket is gone by the time we get here.
        connect_with_retries(
            transport,
            &config.broker.endpoint,
            config.broker.port,
            config.transport_timeouts(),
            config.retry_policy(),
            jitter,
        )
        .await?;

        let outcome = engine.connect(&attempt, config.connack_timeout()).await;

        match (attempt.expectation, outcome) {
            (ConnectExpectation::Rejected, Ok(ConnackOutcome::Rejected { reason_code })) => {
                info!(reason_code, "broker rejected the probe connect as expected");
            }
            (ConnectExpectation::Rejected, Err(err)) => {
                // A refused session may also surface as an engine error
                // (e.g. the broker drops the socket instead of replying)
                info!(error = %err, "probe connect failed, counting as the expected rejection");
            }
            (ConnectExpectation::Rejected, Ok(ConnackOutcome::Accepted { .. })) => {
                return Err(SessionError::AuthProbeAccepted);
            }
            (ConnectExpectation::Unchecked, Ok(outcome)) => {
                info!(?outcome, "connect attempt completed; outcome not asserted");
            }
            (ConnectExpectation::Unchecked, Err(err)) => {
                warn!(error = %err, "connect attempt failed; outcome not asserted");
            }
            (
                ConnectExpectation::Accepted,
                Ok(ConnackOutcome::Accepted {
                    session_present: present,
                }),
            ) => {
                session_present = present;
                info!(
                    session_present = present,
                    endpoint = %config.broker.endpoint,
                    "an MQTT connection is established with the broker"
                );
            }
            (ConnectExpectation::Accepted, Ok(ConnackOutcome::Rejected { reason_code })) => {
                return Err(SessionError::ProductionRejected { reason_code });
            }
            (ConnectExpectation::Accepted, Err(err)) => {
                return Err(err.into());
            }
        }

        if attempt.abort_transport_after {
            info!("closing the socket without a DISCONNECT to exercise the broker's will delay");
            transport.close().await;
        }
    }

    Ok(session_present)
}
