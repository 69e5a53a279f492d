//! Topic filter table
//!
//! A fixed-size table pairing each topic filter with its SUBACK status,
//! created at task start and updated by the response classifier when a
//! subscription acknowledgment arrives. Nothing downstream reads it in this
//! demo; it is reserved for the future subscribe flow.

use thiserror::Error;

/// Upper bound on a single topic filter string, in bytes
pub const TOPIC_BUFFER_SIZE: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopicError {
    #[error("topic filter '{filter}' exceeds the {limit}-byte buffer limit")]
    FilterTooLong { filter: String, limit: usize },
}

/// SUBACK outcome for one topic filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubAckStatus {
    /// No acknowledgment seen yet
    Pending,
    Success,
    Failure,
}

/// One topic filter and its subscription acknowledgment status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilterEntry {
    filter: String,
    ack_status: SubAckStatus,
}

impl TopicFilterEntry {
    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn ack_status(&self) -> SubAckStatus {
        self.ack_status
    }
}

/// Fixed-size collection of topic filters, sized by the configured count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilterTable {
    entries: Vec<TopicFilterEntry>,
}

impl TopicFilterTable {
    /// Build `count` filters `"{prefix}{index}"`, each starting out
    /// [`SubAckStatus::Pending`]. Calling this twice with the same inputs
    /// yields identical tables. Uniqueness of the resulting filter text is
    /// the caller's concern.
    pub fn initialize(prefix: &str, count: usize) -> Result<Self, TopicError> {
        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let filter = format!("{prefix}{index}");
            if filter.len() >= TOPIC_BUFFER_SIZE {
                return Err(TopicError::FilterTooLong {
                    filter,
                    limit: TOPIC_BUFFER_SIZE,
                });
            }
            entries.push(TopicFilterEntry {
                filter,
                ack_status: SubAckStatus::Pending,
            });
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[TopicFilterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply SUBACK reason codes positionally. Code `0x80` and above marks
    /// the filter as failed; anything below is a granted QoS.
    pub(crate) fn record_suback(&mut self, reason_codes: &[u8]) {
        for (entry, code) in self.entries.iter_mut().zip(reason_codes) {
            entry.ack_status = if *code >= 0x80 {
                SubAckStatus::Failure
            } else {
                SubAckStatus::Success
            };
        }
    }
}
