//! Single-producer, multi-consumer ring buffer backing one topic.
//!
//! Each channel is one contiguous 64-byte-aligned allocation:
//!
//! ```text
//! ┌────────────────┬──────────────────────┬─────────────────────────────┐
//! │ ChannelHeader  │ CursorSlot × M_max   │ N × (SlotHeader + payload)  │
//! └────────────────┴──────────────────────┴─────────────────────────────┘
//! ```
//!
//! The writer owns `write_seq` and stamps each slot with its message
//! sequence. Every subscriber owns one cursor (its next unread sequence) and
//! advances it independently; a slow subscriber loses the oldest unread
//! messages when the writer laps it (drop-oldest).
//!
//! Slot writes use the version-dance protocol: the slot version is odd while
//! a write is in progress and readers re-check it after copying, so a reader
//! that races a lapping writer discards the torn copy and re-resolves through
//! the lap path. Publish never blocks and never fails.

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use crate::error::{HorusError, HorusResult};

/// Default ring depth per topic.
pub const DEFAULT_CAPACITY: usize = 8;
/// Default subscriber cursor table size per topic.
pub const DEFAULT_MAX_SUBSCRIBERS: usize = 16;
/// Per-record size ceiling, checked at bind time.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

const CACHE_LINE: usize = 64;

/// Per-topic ring configuration. Applied when the channel is first created;
/// later binds on the same topic inherit it.
#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    /// Number of ring slots. Must be a power of two.
    pub capacity: usize,
    /// Size of the subscriber cursor table.
    pub max_subscribers: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_subscribers: DEFAULT_MAX_SUBSCRIBERS,
        }
    }
}

/// Outcome of a non-blocking receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recv {
    /// No unread message is available.
    Empty,
    /// A message was copied out. `newly_dropped` counts the messages skipped
    /// between this delivery and the previous one for this cursor.
    Msg { seq: u64, newly_dropped: u64 },
}

#[repr(C, align(64))]
struct ChannelHeader {
    capacity: u64,
    stride: u64,
    max_subscribers: u64,
    /// Next sequence number to write. Equals the count of published messages.
    write_seq: AtomicU64,
    publisher_claimed: AtomicU8,
    _pad0: [u8; 23],
}

#[repr(C, align(64))]
struct CursorSlot {
    active: AtomicU8,
    _pad0: [u8; 7],
    /// Next sequence this subscriber will read.
    next_seq: AtomicU64,
    /// Total messages this subscriber has missed.
    dropped: AtomicU64,
    _pad1: [u8; 40],
}

#[repr(C, align(64))]
struct SlotHeader {
    /// Odd while the writer is copying into this slot.
    version: AtomicU64,
    /// Committed sequence + 1; 0 means the slot was never written.
    commit: AtomicU64,
    _pad0: [u8; 48],
}

/// Untyped ring storage for one topic. Typed access lives in the
/// publisher/subscriber handles.
pub(crate) struct Channel {
    region: NonNull<u8>,
    layout: Layout,
    capacity: usize,
    stride: usize,
    slot_stride: usize,
    max_subscribers: usize,
}

unsafe impl Send for Channel {}
unsafe impl Sync for Channel {}

impl Channel {
    /// Allocate a channel for payloads of `stride` bytes.
    pub(crate) fn new(stride: usize, config: ChannelConfig) -> HorusResult<Self> {
        if stride == 0 {
            return Err(HorusError::memory(
                "cannot create a channel for zero-sized payloads",
            ));
        }
        if !config.capacity.is_power_of_two() {
            return Err(HorusError::config(format!(
                "channel capacity {} is not a power of two",
                config.capacity
            )));
        }
        if config.max_subscribers == 0 {
            return Err(HorusError::config("channel needs at least one cursor slot"));
        }

        let slot_stride = CACHE_LINE + stride.div_ceil(CACHE_LINE) * CACHE_LINE;
        let total = CACHE_LINE
            + config.max_subscribers * CACHE_LINE
            + config
                .capacity
                .checked_mul(slot_stride)
                .ok_or_else(|| HorusError::memory("channel size overflow"))?;

        let layout = Layout::from_size_align(total, CACHE_LINE)
            .map_err(|e| HorusError::memory(format!("bad channel layout: {}", e)))?;

        // Zeroed memory is the valid initial state for every atomic in the
        // region: versions even, commits empty, cursors inactive.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let region = NonNull::new(raw)
            .ok_or_else(|| HorusError::memory("channel allocation failed"))?;

        unsafe {
            let header = region.as_ptr() as *mut ChannelHeader;
            (*header).capacity = config.capacity as u64;
            (*header).stride = stride as u64;
            (*header).max_subscribers = config.max_subscribers as u64;
        }

        let channel = Self {
            region,
            layout,
            capacity: config.capacity,
            stride,
            slot_stride,
            max_subscribers: config.max_subscribers,
        };
        debug_assert_eq!(channel.header().capacity, config.capacity as u64);
        debug_assert_eq!(channel.header().stride, stride as u64);
        debug_assert_eq!(
            channel.header().max_subscribers,
            config.max_subscribers as u64
        );
        Ok(channel)
    }

    #[inline]
    fn header(&self) -> &ChannelHeader {
        unsafe { &*(self.region.as_ptr() as *const ChannelHeader) }
    }

    #[inline]
    fn cursor(&self, idx: usize) -> &CursorSlot {
        debug_assert!(idx < self.max_subscribers);
        unsafe {
            let base = self.region.as_ptr().add(CACHE_LINE + idx * CACHE_LINE);
            &*(base as *const CursorSlot)
        }
    }

    #[inline]
    fn slot_header(&self, slot: usize) -> &SlotHeader {
        debug_assert!(slot < self.capacity);
        unsafe { &*(self.slot_base(slot) as *const SlotHeader) }
    }

    #[inline]
    fn slot_base(&self, slot: usize) -> *mut u8 {
        unsafe {
            self.region.as_ptr().add(
                CACHE_LINE + self.max_subscribers * CACHE_LINE + slot * self.slot_stride,
            )
        }
    }

    #[inline]
    fn slot_payload(&self, slot: usize) -> *mut u8 {
        unsafe { self.slot_base(slot).add(CACHE_LINE) }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub(crate) fn max_subscribers(&self) -> usize {
        self.max_subscribers
    }

    /// Count of messages published so far.
    #[inline]
    pub(crate) fn write_seq(&self) -> u64 {
        self.header().write_seq.load(Ordering::Acquire)
    }

    // ========================================================================
    // Writer side
    // ========================================================================

    /// Claim the single writer slot. Returns false if already claimed.
    pub(crate) fn try_claim_publisher(&self) -> bool {
        self.header()
            .publisher_claimed
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the writer slot. Idempotent.
    pub(crate) fn release_publisher(&self) {
        self.header().publisher_claimed.swap(0, Ordering::AcqRel);
    }

    pub(crate) fn publisher_present(&self) -> bool {
        self.header().publisher_claimed.load(Ordering::Acquire) != 0
    }

    /// Copy `payload` into the next slot. Single producer only; drops the
    /// oldest unread message of any lapped subscriber, never blocks.
    pub(crate) fn publish(&self, payload: &[u8]) {
        debug_assert_eq!(payload.len(), self.stride);

        let header = self.header();
        // Only the claimed publisher advances write_seq.
        let seq = header.write_seq.load(Ordering::Relaxed);
        let slot_idx = (seq & (self.capacity as u64 - 1)) as usize;
        let slot = self.slot_header(slot_idx);

        slot.version.fetch_add(1, Ordering::AcqRel);
        unsafe {
            std::ptr::copy_nonoverlapping(
                payload.as_ptr(),
                self.slot_payload(slot_idx),
                self.stride,
            );
        }
        slot.commit.store(seq + 1, Ordering::Release);
        slot.version.fetch_add(1, Ordering::Release);

        header.write_seq.store(seq + 1, Ordering::Release);
    }

    // ========================================================================
    // Reader side
    // ========================================================================

    /// Allocate a cursor. A subscriber attaching to a topic with history
    /// starts at the newest retained message; everything before it counts as
    /// dropped. Returns the cursor index.
    pub(crate) fn attach_reader(&self) -> Option<usize> {
        for idx in 0..self.max_subscribers {
            let cursor = self.cursor(idx);
            if cursor
                .active
                .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let published = self.header().write_seq.load(Ordering::Acquire);
                let start = published.saturating_sub(1);
                cursor.next_seq.store(start, Ordering::Release);
                cursor.dropped.store(start, Ordering::Release);
                return Some(idx);
            }
        }
        None
    }

    /// Free a cursor slot. Idempotent.
    pub(crate) fn detach_reader(&self, idx: usize) {
        self.cursor(idx).active.swap(0, Ordering::AcqRel);
    }

    /// Total messages this cursor has missed.
    pub(crate) fn dropped(&self, idx: usize) -> u64 {
        self.cursor(idx).dropped.load(Ordering::Acquire)
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        (0..self.max_subscribers)
            .filter(|&i| self.cursor(i).active.load(Ordering::Acquire) != 0)
            .count()
    }

    /// Non-blocking read of the next unread message into `out`.
    ///
    /// Only the owning subscriber may call this for a given cursor.
    pub(crate) fn receive(&self, idx: usize, out: &mut [u8]) -> Recv {
        debug_assert_eq!(out.len(), self.stride);

        let cursor = self.cursor(idx);
        let mut c = cursor.next_seq.load(Ordering::Relaxed);
        let mut newly_dropped: u64 = 0;
        let mask = self.capacity as u64 - 1;

        loop {
            let slot = self.slot_header((c & mask) as usize);

            let v1 = slot.version.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                // Writer mid-copy; resolves by the next poll.
                return Recv::Empty;
            }

            let commit = slot.commit.load(Ordering::Acquire);
            if commit == 0 || commit - 1 < c {
                // Slot not yet written for this generation.
                return Recv::Empty;
            }
            let s = commit - 1;

            if s == c {
                unsafe {
                    std::ptr::copy_nonoverlapping(
                        self.slot_payload((c & mask) as usize),
                        out.as_mut_ptr(),
                        self.stride,
                    );
                }
                // Orders the payload copy before the version re-check.
                std::sync::atomic::fence(Ordering::Acquire);
                let v2 = slot.version.load(Ordering::Acquire);
                if v1 == v2 {
                    cursor.next_seq.store(c + 1, Ordering::Relaxed);
                    if newly_dropped > 0 {
                        cursor.dropped.fetch_add(newly_dropped, Ordering::Relaxed);
                    }
                    return Recv::Msg {
                        seq: c,
                        newly_dropped,
                    };
                }
                // Writer lapped us mid-copy; re-resolve below.
                continue;
            }

            // s > c: the writer has overtaken this cursor. Jump to the
            // oldest sequence still held by the ring and account the gap.
            let published = self.header().write_seq.load(Ordering::Acquire);
            let oldest = published.saturating_sub(self.capacity as u64);
            debug_assert!(oldest > c);
            newly_dropped += oldest - c;
            c = oldest;
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.region.as_ptr(), self.layout) };
    }
}
