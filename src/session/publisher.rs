//! Scripted publish sequence across QoS 0/1/2 and topic-alias variants
//!
//! The four publishes the demo sends are data, not control flow: the script
//! first registers a topic alias alongside the full topic name, then reuses
//! the bare alias at QoS 2, QoS 0, and QoS 1 with message properties.

use crate::engine::{EngineError, ProtocolEngine, UserProperty};
use bytes::Bytes;
use tracing::info;

/// MQTT Quality of Service level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qos {
    /// At most once (0)
    AtMostOnce,
    /// At least once (1)
    AtLeastOnce,
    /// Exactly once (2)
    ExactlyOnce,
}

impl Qos {
    pub fn level(self) -> u8 {
        match self {
            Qos::AtMostOnce => 0,
            Qos::AtLeastOnce => 1,
            Qos::ExactlyOnce => 2,
        }
    }

    /// QoS > 0 publishes carry a packet identifier for the ack handshake
    pub fn needs_packet_id(self) -> bool {
        !matches!(self, Qos::AtMostOnce)
    }
}

/// One publish operation in the demo script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishJob {
    /// Full topic name; empty when the publish rides on the alias alone
    pub topic_name: String,
    pub topic_alias: Option<u16>,
    pub qos: Qos,
    pub retain: bool,
    pub payload: Bytes,
    pub correlation_data: Option<Bytes>,
    pub content_type: Option<String>,
    pub message_expiry_secs: Option<u32>,
    pub user_properties: Vec<UserProperty>,
}

impl PublishJob {
    fn new(topic_name: &str, qos: Qos, payload: &'static str) -> Self {
        Self {
            topic_name: topic_name.to_string(),
            topic_alias: Some(DEMO_TOPIC_ALIAS),
            qos,
            retain: false,
            payload: Bytes::from_static(payload.as_bytes()),
            correlation_data: None,
            content_type: None,
            message_expiry_secs: None,
            user_properties: Vec::new(),
        }
    }
}

/// Alias registered by the first publish and reused by the rest
pub const DEMO_TOPIC_ALIAS: u16 = 2;

/// The fixed four-publish demo script, in transmission order
pub fn publish_script() -> Vec<PublishJob> {
    let alias_registration = PublishJob {
        user_properties: vec![UserProperty::new("Key1", "Value1")],
        ..PublishJob::new("TestUnique1234", Qos::ExactlyOnce, "Hello World!")
    };

    // Empty topic name: the broker resolves the previously registered alias
    let alias_only = PublishJob::new("", Qos::ExactlyOnce, "OnlyTopicAlias");

    // The topic name is never reattached; these two ride the alias as well
    let qos0 = PublishJob::new("", Qos::AtMostOnce, "UsingQos0");

    let qos1_with_properties = PublishJob {
        correlation_data: Some(Bytes::from_static(b"test")),
        content_type: Some("test".to_string()),
        message_expiry_secs: Some(100),
        ..PublishJob::new("", Qos::AtLeastOnce, "UsingQos1")
    };

    vec![alias_registration, alias_only, qos0, qos1_with_properties]
}

/// Issue the whole publish script through the engine. Fatal on the first
/// publish the engine reports as failed.
///
/// Each QoS > 0 publish draws a fresh packet identifier immediately before
/// transmission. The QoS 0 publish needs none, but the previously allocated
/// identifier rides along for bookkeeping parity.
pub async fn publish_all(
    engine: &mut (impl ProtocolEngine + ?Sized),
) -> Result<(), EngineError> {
    let mut packet_id = 0u16;

    for job in publish_script() {
        if job.qos.needs_packet_id() {
            packet_id = engine.next_packet_id();
        }
        if job.topic_name.is_empty() {
            info!(
                alias = ?job.topic_alias,
                qos = job.qos.level(),
                "publishing to the MQTT topic using only the topic alias"
            );
        } else {
            info!(
                topic = %job.topic_name,
                qos = job.qos.level(),
                "publishing to the MQTT topic"
            );
        }
        engine.publish(&job, packet_id).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SimulatedEngine;

    #[test]
    fn test_script_has_expected_qos_sequence() {
        let script = publish_script();
        let levels: Vec<u8> = script.iter().map(|job| job.qos.level()).collect();
        assert_eq!(levels, vec![2, 2, 0, 1]);
    }

    #[test]
    fn test_script_alias_and_topic_shape() {
        let script = publish_script();
        assert!(script
            .iter()
            .all(|job| job.topic_alias == Some(DEMO_TOPIC_ALIAS)));
        assert_eq!(script[0].topic_name, "TestUnique1234");
        assert!(script[1].topic_name.is_empty());
        assert!(script[2].topic_name.is_empty());
        assert!(script[3].topic_name.is_empty());
        assert!(script.iter().all(|job| !job.retain));
    }

    #[test]
    fn test_script_properties() {
        let script = publish_script();
        assert_eq!(
            script[0].user_properties,
            vec![UserProperty::new("Key1", "Value1")]
        );
        assert!(script[1].user_properties.is_empty());
        assert_eq!(script[3].correlation_data, Some(Bytes::from_static(b"test")));
        assert_eq!(script[3].content_type.as_deref(), Some("test"));
        assert_eq!(script[3].message_expiry_secs, Some(100));
        assert_eq!(script[0].payload, Bytes::from_static(b"Hello World!"));
    }

    #[tokio::test]
    async fn test_publish_all_assigns_identifiers() {
        let mut engine = SimulatedEngine::connected();
        publish_all(&mut engine).await.unwrap();

        let published = engine.published();
        assert_eq!(published.len(), 4);
        let ids: Vec<u16> = published.iter().map(|(_, id)| *id).collect();
        // Fresh ids for the QoS > 0 publishes; the QoS 0 publish reuses the
        // identifier allocated for the publish before it
        assert_ne!(ids[0], ids[1]);
        assert_eq!(ids[2], ids[1]);
        assert_ne!(ids[3], ids[1]);
    }

    #[tokio::test]
    async fn test_publish_all_fails_fast_when_not_connected() {
        let mut engine = SimulatedEngine::new(Default::default());
        let err = publish_all(&mut engine).await.unwrap_err();
        assert_eq!(err, EngineError::NotConnected);
        assert!(engine.published().is_empty());
    }
}
