//! Node contract and per-callback context.
//!
//! A node is anything implementing [`Node`]: three lifecycle methods plus a
//! name. The scheduler drives the lifecycle and passes a [`NodeInfo`]
//! context into every callback; handles created through the context carry
//! the node's logging identity.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::communication::handles::{Publisher, Subscriber};
use crate::communication::pod::PodMessage;
use crate::communication::registry::registry;
use crate::core::log_buffer::{publish_log, LogEntry, LogType};
use crate::error::HorusResult;
use crate::time::timestamp_now;

/// Maximum node name length in bytes.
pub const MAX_NODE_NAME_LEN: usize = 31;

/// Trait for providing lightweight logging summaries of message types.
///
/// Large records (images, point clouds, grids) should summarize metadata
/// only; small records can defer to `Debug` formatting via
/// `#[derive(LogSummary)]`.
pub trait LogSummary {
    /// Return a compact string representation suitable for logging
    fn log_summary(&self) -> String;
}

/// Lifecycle position of a registered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Added to the scheduler, init not yet run.
    Registered,
    /// Init succeeded; first tick pending.
    Initialized,
    /// Being ticked every period.
    Running,
    /// Excluded from further ticks after a tick fault; still gets shutdown.
    Stopping,
    /// Shutdown has run.
    Shutdown,
    /// Removed from the run set (init failed or fully retired).
    Gone,
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeState::Registered => "Registered",
            NodeState::Initialized => "Initialized",
            NodeState::Running => "Running",
            NodeState::Stopping => "Stopping",
            NodeState::Shutdown => "Shutdown",
            NodeState::Gone => "Gone",
        };
        write!(f, "{}", s)
    }
}

/// Topic metadata for monitoring and introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetadata {
    pub topic_name: String,
    pub type_name: String,
}

/// Per-callback context handed to every node lifecycle method.
///
/// Grants the node its identity (name, tick number, time since scheduler
/// start), structured logging, and handle construction. Handles created
/// here are owned by the node; their publish/receive log records carry this
/// node's name and tick.
pub struct NodeInfo {
    name: String,
    tick: u64,
    started: Instant,
    tick_start: Option<Instant>,
    log_enabled: bool,
    publishers: Vec<TopicMetadata>,
    subscribers: Vec<TopicMetadata>,
}

impl NodeInfo {
    pub(crate) fn new(name: String, log_enabled: bool) -> Self {
        Self {
            name,
            tick: 0,
            started: Instant::now(),
            tick_start: None,
            log_enabled,
            publishers: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tick number of the current scheduler period (0 during init).
    pub fn tick_number(&self) -> u64 {
        self.tick
    }

    /// Monotonic time since the scheduler started running.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Monotonic nanoseconds since the scheduler started running.
    pub fn elapsed_ns(&self) -> u64 {
        self.started.elapsed().as_nanos() as u64
    }

    pub(crate) fn mark_started(&mut self) {
        self.started = Instant::now();
    }

    pub(crate) fn set_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    pub(crate) fn begin_tick(&mut self) {
        self.tick_start = Some(Instant::now());
    }

    pub(crate) fn end_tick(&mut self) {
        self.tick_start = None;
    }

    fn tick_us(&self) -> u64 {
        self.tick_start
            .map(|t| t.elapsed().as_micros() as u64)
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Handle construction
    // ------------------------------------------------------------------

    /// Create the publisher for `topic`, owned by this node.
    pub fn create_publisher<T: PodMessage + LogSummary>(
        &mut self,
        topic: &str,
    ) -> HorusResult<Publisher<T>> {
        let publisher = registry().bind_publisher::<T>(topic)?;
        self.register_publisher(topic, std::any::type_name::<T>());
        Ok(publisher)
    }

    /// Create a subscriber cursor on `topic`, owned by this node.
    pub fn create_subscriber<T: PodMessage + LogSummary>(
        &mut self,
        topic: &str,
    ) -> HorusResult<Subscriber<T>> {
        let subscriber = registry().bind_subscriber::<T>(topic)?;
        self.register_subscriber(topic, std::any::type_name::<T>());
        Ok(subscriber)
    }

    /// Topics this node publishes (observed through this context).
    pub fn publishers(&self) -> &[TopicMetadata] {
        &self.publishers
    }

    /// Topics this node subscribes to (observed through this context).
    pub fn subscribers(&self) -> &[TopicMetadata] {
        &self.subscribers
    }

    pub(crate) fn register_publisher(&mut self, topic: &str, type_name: &str) {
        if !self.publishers.iter().any(|m| m.topic_name == topic) {
            self.publishers.push(TopicMetadata {
                topic_name: topic.to_string(),
                type_name: type_name.to_string(),
            });
        }
    }

    pub(crate) fn register_subscriber(&mut self, topic: &str, type_name: &str) {
        if !self.subscribers.iter().any(|m| m.topic_name == topic) {
            self.subscribers.push(TopicMetadata {
                topic_name: topic.to_string(),
                type_name: type_name.to_string(),
            });
        }
    }

    // ------------------------------------------------------------------
    // Logging
    // ------------------------------------------------------------------

    pub fn log_info(&self, msg: &str) {
        self.emit(LogType::Info, None, msg.to_string(), 0);
    }

    pub fn log_warn(&self, msg: &str) {
        self.emit(LogType::Warning, None, msg.to_string(), 0);
    }

    pub fn log_error(&self, msg: &str) {
        self.emit(LogType::Error, None, msg.to_string(), 0);
    }

    pub fn log_debug(&self, msg: &str) {
        self.emit(LogType::Debug, None, msg.to_string(), 0);
    }

    pub(crate) fn log_publish(&self, topic: &str, summary: &str, size: usize, ipc_ns: u64) {
        if !self.log_enabled {
            return;
        }
        self.emit(
            LogType::Publish,
            Some(topic.to_string()),
            format!("{} ({} B)", summary, size),
            ipc_ns,
        );
    }

    pub(crate) fn log_receive(&self, topic: &str, summary: &str, size: usize, ipc_ns: u64) {
        if !self.log_enabled {
            return;
        }
        self.emit(
            LogType::Subscribe,
            Some(topic.to_string()),
            format!("{} ({} B)", summary, size),
            ipc_ns,
        );
    }

    pub(crate) fn log_drops(&self, topic: &str, count: u64) {
        self.emit(
            LogType::Warning,
            Some(topic.to_string()),
            format!("dropped {} message(s) on overflow", count),
            0,
        );
    }

    fn emit(&self, level: LogType, topic: Option<String>, message: String, ipc_ns: u64) {
        publish_log(LogEntry {
            timestamp_ns: timestamp_now(),
            level,
            node: self.name.clone(),
            tick: self.tick,
            topic,
            message,
            tick_us: self.tick_us(),
            ipc_ns,
        });
    }
}

/// The node lifecycle contract.
///
/// `init` runs exactly once before the first tick; returning `Err` removes
/// the node from the run set (its handles are unbound). `tick` runs once
/// per scheduler period in priority order and must not block. `shutdown`
/// runs exactly once per successful init, even on signal-triggered exit.
pub trait Node: Send {
    /// Get the node's name (must be unique within a scheduler).
    ///
    /// Defaults to the struct's type name (e.g. `MotorController`).
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        match full.rfind("::") {
            Some(pos) => &full[pos + 2..],
            None => full,
        }
    }

    /// One-shot initialization. Create handles through `ctx` here.
    fn init(&mut self, _ctx: &mut NodeInfo) -> HorusResult<()> {
        Ok(())
    }

    /// Called every scheduler period. Must not block; suspension happens
    /// only in the scheduler's sleep between ticks.
    fn tick(&mut self, ctx: &mut NodeInfo);

    /// One-shot finalization.
    fn shutdown(&mut self, _ctx: &mut NodeInfo) -> HorusResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_buffer::GLOBAL_LOG_BUFFER;

    struct Passive;
    impl Node for Passive {
        fn tick(&mut self, _ctx: &mut NodeInfo) {}
    }

    #[test]
    fn test_default_name_is_type_name() {
        let node = Passive;
        assert_eq!(node.name(), "Passive");
    }

    #[test]
    fn test_context_identity() {
        let mut ctx = NodeInfo::new("ident_node".to_string(), true);
        assert_eq!(ctx.name(), "ident_node");
        assert_eq!(ctx.tick_number(), 0);
        ctx.set_tick(17);
        assert_eq!(ctx.tick_number(), 17);
    }

    #[test]
    fn test_context_logging_carries_node_and_tick() {
        let mut ctx = NodeInfo::new("log_ident".to_string(), true);
        ctx.set_tick(5);
        ctx.log_info("hello from the tick");

        let entries = GLOBAL_LOG_BUFFER.for_node("log_ident");
        let entry = entries.last().expect("entry recorded");
        assert_eq!(entry.tick, 5);
        assert_eq!(entry.level, LogType::Info);
        assert!(entry.message.contains("hello"));
    }

    #[test]
    fn test_register_dedups_topics() {
        let mut ctx = NodeInfo::new("dedup".to_string(), true);
        ctx.register_publisher("cmd", "Twist");
        ctx.register_publisher("cmd", "Twist");
        ctx.register_subscriber("scan", "LaserScan");
        assert_eq!(ctx.publishers().len(), 1);
        assert_eq!(ctx.subscribers().len(), 1);
    }

    #[test]
    fn test_pub_sub_records_suppressed_when_log_disabled() {
        let ctx = NodeInfo::new("quiet".to_string(), false);
        ctx.log_publish("cmd", "Twist(0,0)", 64, 120);
        assert!(GLOBAL_LOG_BUFFER
            .for_node("quiet")
            .iter()
            .all(|e| e.level != LogType::Publish));

        // Explicit logging still works with pub/sub records disabled.
        ctx.log_warn("still audible");
        assert!(!GLOBAL_LOG_BUFFER.for_node("quiet").is_empty());
    }
}
