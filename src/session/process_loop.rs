//! Bounded polling loop driving the engine to completion or timeout
//!
//! Repeatedly runs the engine's processing step until a wall-clock deadline
//! elapses or the engine reports a terminal failure. `NeedMoreData` is a
//! transient condition: hitting the deadline while a packet is still partial
//! counts as overall success, because the demo does not require every ack to
//! arrive within one window.

use crate::engine::{Clock, EngineError, ProcessStatus, ProtocolEngine};
use crate::session::classifier::{classify, AckDisposition};
use crate::session::topics::TopicFilterTable;
use std::time::Duration;
use tracing::debug;

/// Drive `engine.process_step()` until `timeout` elapses or a terminal
/// status is returned, dispatching each drained ack event through the
/// response classifier.
pub async fn run_until(
    engine: &mut (impl ProtocolEngine + ?Sized),
    clock: &dyn Clock,
    table: &mut TopicFilterTable,
    timeout: Duration,
) -> Result<(), EngineError> {
    let deadline = clock.now_ms().saturating_add(timeout.as_millis() as u64);
    let mut status = ProcessStatus::Ok;

    while clock.now_ms() < deadline
        && matches!(status, ProcessStatus::Ok | ProcessStatus::NeedMoreData)
    {
        status = engine.process_step().await;
        for event in engine.take_events() {
            let packet_id = event.packet_id();
            if let AckDisposition::AnnotateReason(reason) = classify(&event, table) {
                engine.annotate_pending_ack(packet_id, reason);
            }
        }
    }

    match status {
        ProcessStatus::Ok => Ok(()),
        ProcessStatus::NeedMoreData => {
            debug!("deadline reached with a partial packet pending; treated as success");
            Ok(())
        }
        ProcessStatus::Failed(err) => Err(err),
    }
}
