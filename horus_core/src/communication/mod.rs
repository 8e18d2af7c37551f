//! # Communication layer for HORUS
//!
//! Typed topics over single-producer, multi-consumer shared-memory rings.
//!
//! - [`registry`] maps topic names to channels and enforces the binding
//!   rules (one type per topic, one publisher, bounded subscribers).
//! - [`channel`] is the ring itself: fixed slots, per-slot commit sequence,
//!   per-subscriber cursors, drop-oldest overflow.
//! - [`handles`] are the typed views nodes hold: [`Publisher`] and
//!   [`Subscriber`], plus raw size-only variants for the C ABI.
//! - [`pod`] defines the [`PodMessage`] contract every transported record
//!   satisfies.
//!
//! ```rust,ignore
//! use horus_core::communication::registry;
//! use horus_library::messages::geometry::Twist;
//!
//! let mut publ = registry().bind_publisher::<Twist>("cmd_vel")?;
//! let mut sub = registry().bind_subscriber::<Twist>("cmd_vel")?;
//!
//! publ.send(Twist::stop(), &mut None);
//! let latest = sub.recv(&mut None);
//! ```

pub mod channel;
pub mod handles;
pub mod pod;
pub mod registry;

pub use channel::{ChannelConfig, DEFAULT_CAPACITY, DEFAULT_MAX_SUBSCRIBERS, MAX_MESSAGE_SIZE};
pub use handles::{HandleMetrics, Publisher, RawPublisher, RawSubscriber, Subscriber};
pub use pod::{is_pod, PodMessage};
pub use registry::{registry, TopicRegistry, MAX_TOPIC_NAME_LEN};
