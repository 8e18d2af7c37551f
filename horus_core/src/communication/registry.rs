//! Process-wide topic registry.
//!
//! Maps topic names to their channel, enforcing the binding rules: one
//! message type per topic for the life of the process, at most one
//! publisher, and a bounded subscriber table. Subscribers may bind before
//! any publisher exists; the first bind of either kind creates the channel.
//!
//! The registry lock is held only during bind and teardown. Handles returned
//! from a bind carry direct references to the channel and never touch the
//! lock again.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::communication::channel::{Channel, ChannelConfig, MAX_MESSAGE_SIZE};
use crate::communication::handles::{Publisher, RawPublisher, RawSubscriber, Subscriber};
use crate::communication::pod::PodMessage;
use crate::core::LogSummary;
use crate::error::{HorusError, HorusResult};

/// Maximum topic name length in bytes.
pub const MAX_TOPIC_NAME_LEN: usize = 63;

/// Identity of the message type bound to a topic.
#[derive(Debug, Clone)]
pub(crate) enum TypeKey {
    /// A Rust `PodMessage` type.
    Typed {
        id: TypeId,
        name: &'static str,
    },
    /// A size-only payload from the C ABI. Never validated for structure.
    Custom {
        size: usize,
    },
}

impl TypeKey {
    pub(crate) fn matches(&self, other: &TypeKey) -> bool {
        match (self, other) {
            (TypeKey::Typed { id: a, .. }, TypeKey::Typed { id: b, .. }) => a == b,
            (TypeKey::Custom { size: a }, TypeKey::Custom { size: b }) => a == b,
            _ => false,
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            TypeKey::Typed { name, .. } => (*name).to_string(),
            TypeKey::Custom { size } => format!("custom({} bytes)", size),
        }
    }
}

/// One registered topic: its type identity plus the backing ring.
pub(crate) struct TopicEntry {
    pub(crate) name: String,
    pub(crate) key: TypeKey,
    pub(crate) channel: Channel,
}

/// Process-scoped topic table.
pub struct TopicRegistry {
    topics: Mutex<HashMap<String, Arc<TopicEntry>>>,
}

lazy_static! {
    static ref REGISTRY: TopicRegistry = TopicRegistry::new();
}

/// The process-wide registry instance.
pub fn registry() -> &'static TopicRegistry {
    &REGISTRY
}

fn validate_topic_name(name: &str) -> HorusResult<()> {
    if name.is_empty() {
        return Err(HorusError::InvalidTopicName {
            name: name.to_string(),
            reason: "empty",
        });
    }
    if name.len() > MAX_TOPIC_NAME_LEN {
        return Err(HorusError::InvalidTopicName {
            name: name.to_string(),
            reason: "longer than 63 bytes",
        });
    }
    if name.bytes().any(|b| b == 0) {
        return Err(HorusError::InvalidTopicName {
            name: name.to_string(),
            reason: "embedded NUL",
        });
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(HorusError::InvalidTopicName {
            name: name.to_string(),
            reason: "control character",
        });
    }
    Ok(())
}

impl TopicRegistry {
    fn new() -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
        }
    }

    /// Look up the entry for `topic`, creating the channel on first bind.
    fn entry(
        &self,
        topic: &str,
        key: TypeKey,
        stride: usize,
        config: ChannelConfig,
    ) -> HorusResult<Arc<TopicEntry>> {
        validate_topic_name(topic)?;
        if stride > MAX_MESSAGE_SIZE {
            return Err(HorusError::MessageTooLarge {
                topic: topic.to_string(),
                size: stride,
                max: MAX_MESSAGE_SIZE,
            });
        }

        let mut topics = self.topics.lock();
        if let Some(entry) = topics.get(topic) {
            if !entry.key.matches(&key) {
                return Err(HorusError::TypeMismatch {
                    topic: topic.to_string(),
                    bound: entry.key.describe(),
                    requested: key.describe(),
                });
            }
            return Ok(entry.clone());
        }

        let entry = Arc::new(TopicEntry {
            name: topic.to_string(),
            key,
            channel: Channel::new(stride, config)?,
        });
        topics.insert(topic.to_string(), entry.clone());
        Ok(entry)
    }

    /// Bind the single publisher for `topic` with default ring configuration.
    pub fn bind_publisher<T: PodMessage + LogSummary>(
        &self,
        topic: &str,
    ) -> HorusResult<Publisher<T>> {
        self.bind_publisher_with(topic, ChannelConfig::default())
    }

    /// Bind the single publisher for `topic`, applying `config` if the
    /// channel does not exist yet.
    pub fn bind_publisher_with<T: PodMessage + LogSummary>(
        &self,
        topic: &str,
        config: ChannelConfig,
    ) -> HorusResult<Publisher<T>> {
        let key = TypeKey::Typed {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        };
        let entry = self.entry(topic, key, T::SIZE, config)?;
        if !entry.channel.try_claim_publisher() {
            return Err(HorusError::DuplicatePublisher(topic.to_string()));
        }
        Ok(Publisher::new(entry))
    }

    /// Bind a subscriber cursor for `topic` with default ring configuration.
    pub fn bind_subscriber<T: PodMessage + LogSummary>(
        &self,
        topic: &str,
    ) -> HorusResult<Subscriber<T>> {
        self.bind_subscriber_with(topic, ChannelConfig::default())
    }

    /// Bind a subscriber cursor for `topic`. If the topic is unknown a
    /// waiting channel is created so subscribers may precede publishers.
    pub fn bind_subscriber_with<T: PodMessage + LogSummary>(
        &self,
        topic: &str,
        config: ChannelConfig,
    ) -> HorusResult<Subscriber<T>> {
        let key = TypeKey::Typed {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        };
        let entry = self.entry(topic, key, T::SIZE, config)?;
        let cursor = entry.channel.attach_reader().ok_or_else(|| {
            HorusError::TooManySubscribers {
                topic: topic.to_string(),
                max: entry.channel.max_subscribers(),
            }
        })?;
        Ok(Subscriber::new(entry, cursor))
    }

    /// Bind an untyped publisher carrying `size`-byte payloads (C ABI custom
    /// messages).
    pub fn bind_publisher_custom(&self, topic: &str, size: usize) -> HorusResult<RawPublisher> {
        let entry = self.entry(
            topic,
            TypeKey::Custom { size },
            size,
            ChannelConfig::default(),
        )?;
        if !entry.channel.try_claim_publisher() {
            return Err(HorusError::DuplicatePublisher(topic.to_string()));
        }
        Ok(RawPublisher::new(entry))
    }

    /// Bind an untyped subscriber carrying `size`-byte payloads.
    pub fn bind_subscriber_custom(&self, topic: &str, size: usize) -> HorusResult<RawSubscriber> {
        let entry = self.entry(
            topic,
            TypeKey::Custom { size },
            size,
            ChannelConfig::default(),
        )?;
        let cursor = entry.channel.attach_reader().ok_or_else(|| {
            HorusError::TooManySubscribers {
                topic: topic.to_string(),
                max: entry.channel.max_subscribers(),
            }
        })?;
        Ok(RawSubscriber::new(entry, cursor))
    }

    /// Number of registered topics.
    pub fn topic_count(&self) -> usize {
        self.topics.lock().len()
    }

    /// Release every channel reference held by the registry. Outstanding
    /// handles keep their channel alive until they drop; new binds start
    /// from an empty table.
    pub fn teardown(&self) {
        self.topics.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::{Pod, Zeroable};

    #[repr(C)]
    #[derive(Clone, Copy, Debug)]
    struct Sample {
        value: f64,
        timestamp: u64,
    }
    unsafe impl Zeroable for Sample {}
    unsafe impl Pod for Sample {}
    unsafe impl PodMessage for Sample {}
    impl LogSummary for Sample {
        fn log_summary(&self) -> String {
            format!("Sample({})", self.value)
        }
    }

    #[repr(C)]
    #[derive(Clone, Copy, Debug)]
    struct Other {
        value: u32,
        _pad0: [u8; 4],
    }
    unsafe impl Zeroable for Other {}
    unsafe impl Pod for Other {}
    unsafe impl PodMessage for Other {}
    impl LogSummary for Other {
        fn log_summary(&self) -> String {
            format!("Other({})", self.value)
        }
    }

    #[test]
    fn test_duplicate_publisher_rejected() {
        let reg = registry();
        let first = reg.bind_publisher::<Sample>("reg_dup_pub");
        assert!(first.is_ok());
        match reg.bind_publisher::<Sample>("reg_dup_pub") {
            Err(HorusError::DuplicatePublisher(topic)) => assert_eq!(topic, "reg_dup_pub"),
            other => panic!("expected DuplicatePublisher, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_publisher_slot_freed_on_drop() {
        let reg = registry();
        {
            let _p = reg.bind_publisher::<Sample>("reg_pub_refree").unwrap();
        }
        assert!(reg.bind_publisher::<Sample>("reg_pub_refree").is_ok());
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let reg = registry();
        let _p = reg.bind_publisher::<Sample>("reg_type_clash").unwrap();
        match reg.bind_subscriber::<Other>("reg_type_clash") {
            Err(HorusError::TypeMismatch { topic, .. }) => assert_eq!(topic, "reg_type_clash"),
            other => panic!("expected TypeMismatch, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_subscriber_before_publisher() {
        let reg = registry();
        let mut sub = reg.bind_subscriber::<Sample>("reg_sub_first").unwrap();
        assert!(sub.recv(&mut None).is_none());

        let mut publ = reg.bind_publisher::<Sample>("reg_sub_first").unwrap();
        publ.send(
            Sample {
                value: 2.5,
                timestamp: 1,
            },
            &mut None,
        );
        let got = sub.recv(&mut None).unwrap();
        assert_eq!(got.value, 2.5);
    }

    #[test]
    fn test_bad_topic_names() {
        let reg = registry();
        assert!(matches!(
            reg.bind_publisher::<Sample>(""),
            Err(HorusError::InvalidTopicName { .. })
        ));
        let long = "x".repeat(64);
        assert!(matches!(
            reg.bind_publisher::<Sample>(&long),
            Err(HorusError::InvalidTopicName { .. })
        ));
        assert!(matches!(
            reg.bind_publisher::<Sample>("bad\u{0}name"),
            Err(HorusError::InvalidTopicName { .. })
        ));
        assert!(matches!(
            reg.bind_publisher::<Sample>("bad\nname"),
            Err(HorusError::InvalidTopicName { .. })
        ));
    }

    #[test]
    fn test_subscriber_table_limit() {
        let reg = registry();
        let cfg = ChannelConfig {
            capacity: 8,
            max_subscribers: 2,
        };
        let _a = reg
            .bind_subscriber_with::<Sample>("reg_sub_limit", cfg)
            .unwrap();
        let _b = reg
            .bind_subscriber_with::<Sample>("reg_sub_limit", cfg)
            .unwrap();
        match reg.bind_subscriber_with::<Sample>("reg_sub_limit", cfg) {
            Err(HorusError::TooManySubscribers { max, .. }) => assert_eq!(max, 2),
            other => panic!("expected TooManySubscribers, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_custom_payload_binding() {
        let reg = registry();
        let mut publ = reg.bind_publisher_custom("reg_custom", 24).unwrap();
        let mut sub = reg.bind_subscriber_custom("reg_custom", 24).unwrap();

        let data = [7u8; 24];
        publ.send(&data);
        let mut out = [0u8; 24];
        assert!(sub.recv(&mut out));
        assert_eq!(out, data);

        // A differently-sized custom bind is a different type.
        assert!(matches!(
            reg.bind_subscriber_custom("reg_custom", 32),
            Err(HorusError::TypeMismatch { .. })
        ));
    }
}
