//! # HORUS Core
//!
//! The core runtime for the HORUS robotics framework: a fixed-rate
//! scheduler driving independently-authored nodes that exchange POD
//! messages over named topics backed by shared-memory rings.
//!
//! - **Nodes**: independent units with an init/tick/shutdown lifecycle
//! - **Communication**: typed publisher/subscriber handles over
//!   single-producer, multi-consumer channels
//! - **Scheduling**: priority-ordered dispatch at 60 Hz with cooperative
//!   shutdown
//! - **Logging**: a bounded structured log sink tagged with node, tick,
//!   and IPC timing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use horus_core::{Node, NodeInfo, Priority, Scheduler};
//! use horus_core::communication::Publisher;
//! use horus_core::error::HorusResult;
//!
//! struct HeartbeatNode {
//!     beat: Option<Publisher<u64>>,
//! }
//! # impl HeartbeatNode { fn new() -> Self { Self { beat: None } } }
//!
//! impl Node for HeartbeatNode {
//!     fn name(&self) -> &str { "heartbeat" }
//!
//!     fn init(&mut self, ctx: &mut NodeInfo) -> HorusResult<()> {
//!         self.beat = Some(ctx.create_publisher("heartbeat")?);
//!         Ok(())
//!     }
//!
//!     fn tick(&mut self, ctx: &mut NodeInfo) {
//!         let mut ctx = Some(ctx);
//!         if let Some(beat) = self.beat.as_mut() {
//!             beat.send(0u64, &mut ctx);
//!         }
//!     }
//! }
//!
//! fn main() -> HorusResult<()> {
//!     let mut scheduler = Scheduler::new("demo");
//!     scheduler.add(HeartbeatNode::new(), Priority::Normal, true)?;
//!     scheduler.run()
//! }
//! ```

pub mod communication;
pub mod core;
pub mod error;
pub mod scheduling;
pub mod time;

// Re-export commonly used types for easy access
pub use crate::communication::{
    registry, ChannelConfig, HandleMetrics, PodMessage, Publisher, RawPublisher, RawSubscriber,
    Subscriber, TopicRegistry,
};
pub use crate::core::{
    publish_log, LogBuffer, LogEntry, LogSummary, LogType, Node, NodeInfo, NodeState,
    TopicMetadata, GLOBAL_LOG_BUFFER,
};
pub use crate::error::{HorusError, HorusResult};
pub use crate::scheduling::{Priority, Scheduler, SchedulerStopHandle};

// Primitive payloads usable on topics without a wrapper record. Handy in
// tests and diagnostics pipelines.
macro_rules! impl_primitive_pod_message {
    ($($ty:ty),+ $(,)?) => {$(
        unsafe impl crate::communication::PodMessage for $ty {}
        impl crate::core::LogSummary for $ty {
            fn log_summary(&self) -> String {
                format!("{:?}", self)
            }
        }
    )+};
}

impl_primitive_pod_message!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);
