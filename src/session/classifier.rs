//! Response classification for incoming acknowledgment events
//!
//! Routes each ack event the engine delivers to its bookkeeping action.
//! Purely observational: the only output besides logs is the disposition
//! telling the process loop to annotate a pending PUBREC response, and the
//! SUBACK status update in the topic filter table. Unknown packet types are
//! logged anomalies, never errors.

use crate::engine::AckEvent;
use crate::session::topics::TopicFilterTable;
use tracing::{info, warn};

/// Reason string attached to the outgoing half of every PUBREC handshake
pub const PUBREC_REASON_STRING: &str = "test";

/// Follow-up action the process loop applies to the engine after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckDisposition {
    /// Nothing to feed back to the engine
    None,
    /// Attach this reason string to the pending ack before the engine sends
    /// its response packet
    AnnotateReason(&'static str),
}

/// Classify one incoming ack event and perform its bookkeeping.
///
/// Event data is borrowed for the duration of this call only; nothing is
/// retained afterward.
pub fn classify(event: &AckEvent, table: &mut TopicFilterTable) -> AckDisposition {
    match event {
        AckEvent::Puback { packet_id } => {
            info!(packet_id, "PUBACK received");
            AckDisposition::None
        }
        AckEvent::Pubrec { packet_id } => {
            info!(packet_id, "PUBREC received");
            AckDisposition::AnnotateReason(PUBREC_REASON_STRING)
        }
        AckEvent::Pubrel { packet_id } => {
            // Engine completes the QoS 2 handshake internally
            info!(packet_id, "PUBREL received");
            AckDisposition::None
        }
        AckEvent::Pubcomp { packet_id } => {
            info!(packet_id, "PUBCOMP received");
            AckDisposition::None
        }
        AckEvent::Pingresp => {
            warn!(
                "PINGRESP reached the application callback; the process loop \
                 consumes keep-alive responses internally"
            );
            AckDisposition::None
        }
        AckEvent::Suback {
            packet_id,
            reason_codes,
        } => {
            table.record_suback(reason_codes);
            info!(packet_id, codes = ?reason_codes, "SUBACK received");
            AckDisposition::None
        }
        AckEvent::Unsuback { packet_id } => {
            info!(packet_id, "UNSUBACK received");
            AckDisposition::None
        }
        AckEvent::Other {
            raw_type,
            packet_id,
        } => {
            warn!(
                raw_type = format!("{raw_type:#04x}"),
                packet_id, "ack classifier called with unknown packet type"
            );
            AckDisposition::None
        }
    }
}
