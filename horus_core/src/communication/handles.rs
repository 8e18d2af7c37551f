//! Typed publisher/subscriber handles.
//!
//! A handle is a thin, move-only view onto one channel. Publishers own the
//! channel's single write cursor; each subscriber owns one read cursor.
//! Dropping a handle releases its cursor; the channel itself stays alive
//! until the registry and every handle referencing it are gone.
//!
//! `send`/`recv` work both inside node callbacks and from standalone code.
//! When a [`NodeInfo`] context is supplied, each operation also emits a
//! timed log record (topic, payload size, IPC nanoseconds) to the global
//! sink; without a context no logging happens.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use crate::communication::channel::Recv;
use crate::communication::pod::PodMessage;
use crate::communication::registry::TopicEntry;
use crate::core::log_buffer::{publish_log, LogEntry, LogType};
use crate::core::{LogSummary, NodeInfo};
use crate::time::timestamp_now;

/// Send/receive counters for one handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandleMetrics {
    pub messages_sent: u64,
    pub messages_received: u64,
}

/// Owning view of a topic's write cursor. At most one exists per topic.
pub struct Publisher<T: PodMessage + LogSummary> {
    entry: Arc<TopicEntry>,
    metrics: HandleMetrics,
    _marker: PhantomData<T>,
}

impl<T: PodMessage + LogSummary> Publisher<T> {
    pub(crate) fn new(entry: Arc<TopicEntry>) -> Self {
        Self {
            entry,
            metrics: HandleMetrics::default(),
            _marker: PhantomData,
        }
    }

    /// The topic this handle publishes to.
    pub fn topic(&self) -> &str {
        &self.entry.name
    }

    pub fn metrics(&self) -> HandleMetrics {
        self.metrics
    }

    /// Copy `msg` into the ring. Never blocks, never fails; if the ring is
    /// full the oldest unread message of any lapped subscriber is dropped.
    pub fn send(&mut self, msg: T, ctx: &mut Option<&mut NodeInfo>) {
        self.send_ref(&msg, ctx);
    }

    /// Publish from a reference. Preferred for large records; the payload
    /// is copied straight from `msg` into the ring slot.
    pub fn send_ref(&mut self, msg: &T, ctx: &mut Option<&mut NodeInfo>) {
        if let Some(ctx) = ctx.as_deref_mut() {
            ctx.register_publisher(&self.entry.name, std::any::type_name::<T>());
            let summary = msg.log_summary();

            let ipc_start = Instant::now();
            self.entry.channel.publish(msg.as_bytes());
            let ipc_ns = ipc_start.elapsed().as_nanos() as u64;

            self.metrics.messages_sent += 1;
            ctx.log_publish(&self.entry.name, &summary, T::SIZE, ipc_ns);
        } else {
            self.entry.channel.publish(msg.as_bytes());
            self.metrics.messages_sent += 1;
        }
    }
}

impl<T: PodMessage + LogSummary> Drop for Publisher<T> {
    fn drop(&mut self) {
        self.entry.channel.release_publisher();
    }
}

/// Owning view of one subscriber cursor. Many may coexist per topic.
pub struct Subscriber<T: PodMessage + LogSummary> {
    entry: Arc<TopicEntry>,
    cursor: usize,
    metrics: HandleMetrics,
    _marker: PhantomData<T>,
}

impl<T: PodMessage + LogSummary> Subscriber<T> {
    pub(crate) fn new(entry: Arc<TopicEntry>, cursor: usize) -> Self {
        Self {
            entry,
            cursor,
            metrics: HandleMetrics::default(),
            _marker: PhantomData,
        }
    }

    /// The topic this handle reads from.
    pub fn topic(&self) -> &str {
        &self.entry.name
    }

    pub fn metrics(&self) -> HandleMetrics {
        self.metrics
    }

    /// Total messages this subscriber has missed to drop-oldest overflow.
    pub fn dropped(&self) -> u64 {
        self.entry.channel.dropped(self.cursor)
    }

    /// Non-blocking receive of the next unread message.
    pub fn recv(&mut self, ctx: &mut Option<&mut NodeInfo>) -> Option<T> {
        let mut out = <T as PodMessage>::zeroed();
        if self.recv_into(&mut out, ctx) {
            Some(out)
        } else {
            None
        }
    }

    /// Non-blocking receive into caller-owned storage. Preferred for large
    /// records; no temporary copy of `T` is made.
    pub fn recv_into(&mut self, out: &mut T, ctx: &mut Option<&mut NodeInfo>) -> bool {
        let ipc_start = ctx.is_some().then(Instant::now);

        let result = self
            .entry
            .channel
            .receive(self.cursor, bytemuck::bytes_of_mut(out));

        match result {
            Recv::Msg { newly_dropped, .. } => {
                self.metrics.messages_received += 1;
                if let Some(ctx) = ctx.as_deref_mut() {
                    ctx.register_subscriber(&self.entry.name, std::any::type_name::<T>());
                    if newly_dropped > 0 {
                        ctx.log_drops(&self.entry.name, newly_dropped);
                    }
                    let ipc_ns = ipc_start
                        .map(|t| t.elapsed().as_nanos() as u64)
                        .unwrap_or(0);
                    ctx.log_receive(&self.entry.name, &out.log_summary(), T::SIZE, ipc_ns);
                } else if newly_dropped > 0 {
                    log_unattributed_drops(&self.entry.name, newly_dropped);
                }
                true
            }
            Recv::Empty => false,
        }
    }
}

impl<T: PodMessage + LogSummary> Drop for Subscriber<T> {
    fn drop(&mut self) {
        self.entry.channel.detach_reader(self.cursor);
    }
}

/// Untyped publisher for size-only payloads (C ABI custom messages).
pub struct RawPublisher {
    entry: Arc<TopicEntry>,
    metrics: HandleMetrics,
}

impl RawPublisher {
    pub(crate) fn new(entry: Arc<TopicEntry>) -> Self {
        Self {
            entry,
            metrics: HandleMetrics::default(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.entry.name
    }

    /// Payload size this topic was bound with.
    pub fn payload_size(&self) -> usize {
        self.entry.channel.stride()
    }

    pub fn metrics(&self) -> HandleMetrics {
        self.metrics
    }

    /// Copy `payload` into the ring. `payload` must match the bound size.
    pub fn send(&mut self, payload: &[u8]) -> bool {
        if payload.len() != self.entry.channel.stride() {
            return false;
        }
        self.entry.channel.publish(payload);
        self.metrics.messages_sent += 1;
        true
    }
}

impl Drop for RawPublisher {
    fn drop(&mut self) {
        self.entry.channel.release_publisher();
    }
}

/// Untyped subscriber for size-only payloads.
pub struct RawSubscriber {
    entry: Arc<TopicEntry>,
    cursor: usize,
    metrics: HandleMetrics,
}

impl RawSubscriber {
    pub(crate) fn new(entry: Arc<TopicEntry>, cursor: usize) -> Self {
        Self {
            entry,
            cursor,
            metrics: HandleMetrics::default(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.entry.name
    }

    pub fn payload_size(&self) -> usize {
        self.entry.channel.stride()
    }

    pub fn metrics(&self) -> HandleMetrics {
        self.metrics
    }

    pub fn dropped(&self) -> u64 {
        self.entry.channel.dropped(self.cursor)
    }

    /// Non-blocking receive into `out`. `out` must match the bound size.
    pub fn recv(&mut self, out: &mut [u8]) -> bool {
        if out.len() != self.entry.channel.stride() {
            return false;
        }
        match self.entry.channel.receive(self.cursor, out) {
            Recv::Msg { newly_dropped, .. } => {
                self.metrics.messages_received += 1;
                if newly_dropped > 0 {
                    log_unattributed_drops(&self.entry.name, newly_dropped);
                }
                true
            }
            Recv::Empty => false,
        }
    }
}

impl Drop for RawSubscriber {
    fn drop(&mut self) {
        self.entry.channel.detach_reader(self.cursor);
    }
}

fn log_unattributed_drops(topic: &str, count: u64) {
    publish_log(LogEntry {
        timestamp_ns: timestamp_now(),
        level: LogType::Warning,
        node: "-".to_string(),
        tick: 0,
        topic: Some(topic.to_string()),
        message: format!("dropped {} message(s) on overflow", count),
        tick_us: 0,
        ipc_ns: 0,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::registry::registry;
    use bytemuck::{Pod, Zeroable};

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Reading {
        value: f64,
        timestamp: u64,
    }
    unsafe impl Zeroable for Reading {}
    unsafe impl Pod for Reading {}
    unsafe impl PodMessage for Reading {}
    impl LogSummary for Reading {
        fn log_summary(&self) -> String {
            format!("Reading({:.2})", self.value)
        }
    }

    fn reading(value: f64) -> Reading {
        Reading {
            value,
            timestamp: timestamp_now(),
        }
    }

    #[test]
    fn test_send_recv_round_trip() {
        let mut publ = registry().bind_publisher::<Reading>("hdl_round_trip").unwrap();
        let mut sub = registry()
            .bind_subscriber::<Reading>("hdl_round_trip")
            .unwrap();

        let msg = reading(1.25);
        publ.send(msg, &mut None);

        let got = sub.recv(&mut None).unwrap();
        assert_eq!(got, msg);
        assert!(sub.recv(&mut None).is_none());
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let mut publ = registry().bind_publisher::<Reading>("hdl_bytes").unwrap();
        let mut sub = registry().bind_subscriber::<Reading>("hdl_bytes").unwrap();

        let msg = reading(-3.5);
        publ.send(msg, &mut None);
        let got = sub.recv(&mut None).unwrap();
        assert_eq!(got.as_bytes(), msg.as_bytes());
    }

    #[test]
    fn test_recv_into_avoids_temporary() {
        let mut publ = registry().bind_publisher::<Reading>("hdl_into").unwrap();
        let mut sub = registry().bind_subscriber::<Reading>("hdl_into").unwrap();

        publ.send(reading(9.0), &mut None);
        let mut slot = <Reading as PodMessage>::zeroed();
        assert!(sub.recv_into(&mut slot, &mut None));
        assert_eq!(slot.value, 9.0);
        assert!(!sub.recv_into(&mut slot, &mut None));
    }

    #[test]
    fn test_metrics_count_operations() {
        let mut publ = registry().bind_publisher::<Reading>("hdl_metrics").unwrap();
        let mut sub = registry().bind_subscriber::<Reading>("hdl_metrics").unwrap();

        for i in 0..3 {
            publ.send(reading(i as f64), &mut None);
        }
        while sub.recv(&mut None).is_some() {}

        assert_eq!(publ.metrics().messages_sent, 3);
        assert_eq!(sub.metrics().messages_received, 3);
    }

    #[test]
    fn test_pub_without_sub_then_late_join() {
        // Ten sends with nobody listening all succeed; a subscriber joining
        // afterwards sees the newest message with nine counted as dropped.
        let mut publ = registry().bind_publisher::<Reading>("hdl_late_join").unwrap();
        for i in 0..10 {
            publ.send(reading(i as f64), &mut None);
        }

        let mut sub = registry().bind_subscriber::<Reading>("hdl_late_join").unwrap();
        let got = sub.recv(&mut None).unwrap();
        assert_eq!(got.value, 9.0);
        assert_eq!(sub.dropped(), 9);
        assert!(sub.recv(&mut None).is_none());
    }
}
