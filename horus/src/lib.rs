//! # HORUS - Hybrid Optimized Robotics Unified System
//!
//! HORUS is a runtime for hard-periodic robotics applications: independent
//! nodes driven at a fixed tick rate, exchanging POD messages over named
//! topics backed by shared-memory rings.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use horus::prelude::*;
//! use horus::library::messages::geometry::Twist;
//!
//! struct TeleopNode {
//!     cmd_vel: Option<Publisher<Twist>>,
//! }
//!
//! impl Node for TeleopNode {
//!     fn name(&self) -> &str { "teleop" }
//!
//!     fn init(&mut self, ctx: &mut NodeInfo) -> HorusResult<()> {
//!         self.cmd_vel = Some(ctx.create_publisher("cmd_vel")?);
//!         Ok(())
//!     }
//!
//!     fn tick(&mut self, ctx: &mut NodeInfo) {
//!         let mut ctx = Some(ctx);
//!         if let Some(cmd_vel) = self.cmd_vel.as_mut() {
//!             cmd_vel.send(Twist::stop(), &mut ctx);
//!         }
//!     }
//! }
//!
//! fn main() -> HorusResult<()> {
//!     let mut scheduler = Scheduler::new("teleop_rig");
//!     scheduler.add(TeleopNode { cmd_vel: None }, Priority::Normal, true)?;
//!     scheduler.run()
//! }
//! ```
//!
//! ## Features
//!
//! - **Zero-copy IPC**: POD records byte-copied through lock-free rings
//! - **Type-safe message passing**: one message type per topic, enforced
//! - **Fixed-rate scheduling**: priority-ordered dispatch at 60 Hz
//! - **Built-in monitoring**: structured log sink with per-tick IPC timing
//! - **Standard message catalog**: geometry to diagnostics in `library`

// Re-export core components
pub use horus_core::{self, *};

// Re-export macros
#[cfg(feature = "macros")]
pub use horus_macros::*;

// Re-export standard library with alias
pub use horus_library as library;

// Re-export serde at crate root for downstream derive use
pub use serde;

/// The HORUS prelude - everything you need to get started
///
/// Just add `use horus::prelude::*;`.
pub mod prelude {
    // ============================================
    // Core Node Types
    // ============================================
    pub use horus_core::core::{LogSummary, Node, NodeInfo, NodeState};

    // ============================================
    // Communication (IPC)
    // ============================================
    pub use horus_core::communication::{
        ChannelConfig, PodMessage, Publisher, Subscriber,
    };

    // ============================================
    // Scheduling
    // ============================================
    pub use horus_core::scheduling::{Priority, Scheduler};

    // ============================================
    // Errors and time
    // ============================================
    pub use horus_core::error::{HorusError, HorusResult};
    pub use horus_core::time::{monotonic_ns, sleep_ms, timestamp_now};

    // ============================================
    // Common message types
    // ============================================
    pub use horus_library::prelude::*;
}
