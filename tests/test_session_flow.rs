//! End-to-end demo iterations against the simulated engine

use mqtt5_session_demo::config::DemoConfig;
use mqtt5_session_demo::engine::UserProperty;
use mqtt5_session_demo::error::DemoError;
use mqtt5_session_demo::session::negotiator::{ConnectExpectation, SessionError};
use mqtt5_session_demo::session::publisher::DEMO_TOPIC_ALIAS;
use mqtt5_session_demo::session::run_demo;
use mqtt5_session_demo::testing::{FakeClock, FixedJitter, FlakyTransport, SimulatedEngine};
use mqtt5_session_demo::Transport;

fn deps() -> (DemoConfig, FlakyTransport, SimulatedEngine, FakeClock, FixedJitter) {
    (
        DemoConfig::default(),
        FlakyTransport::failing_first(0),
        SimulatedEngine::new(Default::default()),
        FakeClock::auto_advancing(100),
        FixedJitter(0),
    )
}

#[tokio::test]
async fn full_iteration_completes_and_follows_the_scripts() {
    let (config, mut transport, mut engine, clock, mut jitter) = deps();

    run_demo(&config, &mut transport, &mut engine, &clock, &mut jitter)
        .await
        .expect("demo iteration should succeed");

    // Session script: three attempts in fixed order, each over a fresh
    // transport connection
    let connects = engine.connect_attempts();
    assert_eq!(connects.len(), 3);
    assert_eq!(connects[0].expectation, ConnectExpectation::Rejected);
    assert!(connects[0].auth.is_some());
    assert_eq!(connects[1].expectation, ConnectExpectation::Unchecked);
    assert_eq!(connects[1].will.as_ref().unwrap().delay_secs, 30);
    assert_eq!(connects[2].expectation, ConnectExpectation::Accepted);
    assert_eq!(connects[2].properties.session_expiry_secs, 20);
    assert_eq!(transport.connect_attempts(), 3);

    // Publish script: 4 publishes, QoS [2, 2, 0, 1], alias 2 throughout,
    // empty topic name from the second publish on
    let published = engine.published();
    assert_eq!(published.len(), 4);
    let qos_levels: Vec<u8> = published.iter().map(|(job, _)| job.qos.level()).collect();
    assert_eq!(qos_levels, vec![2, 2, 0, 1]);
    assert!(published
        .iter()
        .all(|(job, _)| job.topic_alias == Some(DEMO_TOPIC_ALIAS)));
    assert_eq!(published[0].0.topic_name, "TestUnique1234");
    assert!(published[1].0.topic_name.is_empty());
    assert!(published[2].0.topic_name.is_empty());
    assert!(published[3].0.topic_name.is_empty());
    // The QoS 0 publish reuses the identifier allocated for the one before it
    assert_eq!(published[2].1, published[1].1);
    assert_ne!(published[3].1, published[1].1);

    // The process loop drained the acks; both PUBREC handshakes got the
    // fixed reason string attached
    let annotations = engine.annotations();
    assert_eq!(annotations.len(), 2);
    assert!(annotations.iter().all(|(_, reason)| reason == "test"));
    assert_eq!(annotations[0].0, published[0].1);
    assert_eq!(annotations[1].0, published[1].1);

    // Clean disconnect with reason string and user property
    let disconnects = engine.disconnect_calls();
    assert_eq!(disconnects.len(), 1);
    let (ack, reason_code) = &disconnects[0];
    assert_eq!(*reason_code, 0x00);
    assert_eq!(ack.reason_string.as_deref(), Some("test"));
    assert_eq!(
        ack.user_properties,
        vec![UserProperty::new("Disconnect", "Disconnect")]
    );

    assert!(!transport.is_connected());
}

#[tokio::test(start_paused = true)]
async fn flaky_transport_is_retried_during_negotiation() {
    let (config, _, mut engine, clock, mut jitter) = deps();
    let mut transport = FlakyTransport::failing_first(2);

    run_demo(&config, &mut transport, &mut engine, &clock, &mut jitter)
        .await
        .expect("demo should ride out two connect failures");

    // 2 failures + 3 successful connects, one per session attempt
    assert_eq!(transport.connect_attempts(), 5);
    assert_eq!(engine.connect_attempts().len(), 3);
}

#[tokio::test]
async fn accepted_auth_probe_fails_the_iteration() {
    let (config, mut transport, mut engine, clock, mut jitter) = deps();
    engine.accept_auth_probe = true;

    let err = run_demo(&config, &mut transport, &mut engine, &clock, &mut jitter)
        .await
        .expect_err("an accepted auth probe must be surfaced");
    assert!(matches!(
        err,
        DemoError::Session(SessionError::AuthProbeAccepted)
    ));
    assert!(engine.published().is_empty());
}

#[tokio::test]
async fn rejected_production_session_fails_the_iteration() {
    let (config, mut transport, mut engine, clock, mut jitter) = deps();
    engine.reject_all = true;

    let err = run_demo(&config, &mut transport, &mut engine, &clock, &mut jitter)
        .await
        .expect_err("a rejected production connect must be fatal");
    assert!(matches!(
        err,
        DemoError::Session(SessionError::ProductionRejected { .. })
    ));
    assert!(engine.published().is_empty());
}
