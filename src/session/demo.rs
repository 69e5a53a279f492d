//! The demo task: one full MQTT v5 session from connect to disconnect
//!
//! Sequences the session components over injected collaborators: wait for
//! the network link, initialize the topic buffers, run the negotiation
//! script, publish, drain acks within the process-loop window, then
//! disconnect cleanly. Every failure the original demo asserted on is an
//! `Err` here; the caller decides to halt.

use crate::config::DemoConfig;
use crate::engine::{AckInfo, Clock, JitterSource, ProtocolEngine, UserProperty};
use crate::error::DemoError;
use crate::session::negotiator::establish_session;
use crate::session::process_loop::run_until;
use crate::session::publisher::publish_all;
use crate::session::topics::TopicFilterTable;
use crate::transport::Transport;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// DISCONNECT reason code for a normal disconnection
const DISCONNECT_REASON_NORMAL: u8 = 0x00;

/// Run one demo iteration to completion.
pub async fn run_demo(
    config: &DemoConfig,
    transport: &mut (impl Transport + ?Sized),
    engine: &mut (impl ProtocolEngine + ?Sized),
    clock: &dyn Clock,
    jitter: &mut (impl JitterSource + ?Sized),
) -> Result<(), DemoError> {
    info!("--------- starting demo ---------");

    let mut topic_table = TopicFilterTable::initialize(&config.topic_prefix(), config.topics.count)?;

    wait_for_network(transport, config.network_poll_interval()).await;

    establish_session(transport, engine, jitter, config).await?;

    publish_all(engine).await?;

    info!("attempting to receive publish acks from the broker");
    run_until(engine, clock, &mut topic_table, config.process_loop_timeout()).await?;

    let disconnect_ack = AckInfo {
        reason_string: Some("test".to_string()),
        user_properties: vec![UserProperty::new("Disconnect", "Disconnect")],
    };
    engine
        .disconnect(&disconnect_ack, DISCONNECT_REASON_NORMAL)
        .await?;
    transport.close().await;

    info!("demo task completed an iteration successfully");
    info!("------- demo finished -------");
    Ok(())
}

/// Block until the network link is up, polling at a fixed interval.
///
/// Intentionally unbounded: without a network there is no point proceeding.
/// Cancellation happens only through external task teardown.
async fn wait_for_network(transport: &(impl Transport + ?Sized), poll_interval: Duration) {
    if !transport.is_network_up() {
        info!("waiting for the network link up event...");
        while !transport.is_network_up() {
            sleep(poll_interval).await;
        }
    }
}
