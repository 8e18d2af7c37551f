//! # POD (Plain Old Data) Message System
//!
//! Zero-serialization messaging for real-time robotics control loops.
//!
//! Every type that travels over a HORUS topic is a POD record: a fixed-size,
//! `#[repr(C)]` value whose in-memory layout *is* the wire format. Publishing
//! copies the record byte-for-byte into a ring slot; receiving copies it back
//! out. Nothing is encoded or decoded in between, which is why a send/recv
//! cycle is byte-identical.
//!
//! ## Declaring a message type
//!
//! ```rust,ignore
//! use horus_core::communication::PodMessage;
//! use bytemuck::{Pod, Zeroable};
//!
//! #[repr(C)]
//! #[derive(Clone, Copy)]
//! pub struct MotorCommand {
//!     pub motor_id: u8,
//!     pub _pad0: [u8; 7],
//!     pub velocity: f64,
//!     pub timestamp: u64,
//! }
//!
//! unsafe impl Zeroable for MotorCommand {}
//! unsafe impl Pod for MotorCommand {}
//! unsafe impl PodMessage for MotorCommand {}
//! ```
//!
//! Padding bytes are always spelled out (`_padN`) so the layout is frozen and
//! `Pod` holds without compiler-inserted gaps.

use bytemuck::{Pod, Zeroable};
use std::mem;

/// Check whether a type is structurally safe for byte-copy transport.
///
/// A type qualifies if it has no destructor (`!needs_drop::<T>()`, so no heap
/// pointers) and is not zero-sized. `String`, `Vec`, `Box` and anything
/// containing them are excluded.
#[inline]
pub fn is_pod<T: 'static>() -> bool {
    !mem::needs_drop::<T>() && mem::size_of::<T>() > 0
}

/// Marker trait for messages transferred without serialization.
///
/// # Safety
///
/// Implementing this trait asserts that the type:
/// 1. Has `#[repr(C)]` layout
/// 2. Contains no implicit padding (padding is explicit `_padN` fields)
/// 3. Is safe to transmute to/from `[u8; size_of::<Self>()]`
/// 4. Has the same layout across all compilation targets you support
///
/// The type must also implement `Pod + Zeroable` from bytemuck.
pub unsafe trait PodMessage: Pod + Zeroable + Copy + Clone + Send + Sync + 'static {
    /// Size of this message in bytes (compile-time constant)
    const SIZE: usize = mem::size_of::<Self>();

    /// Alignment requirement for this message
    const ALIGN: usize = mem::align_of::<Self>();

    /// Convert message to bytes (zero-copy reference)
    #[inline(always)]
    fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Convert bytes to message (zero-copy reference)
    ///
    /// Returns `None` unless the slice has exactly `SIZE` bytes and proper
    /// alignment.
    #[inline(always)]
    fn from_bytes(bytes: &[u8]) -> Option<&Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }
        bytemuck::try_from_bytes(bytes).ok()
    }

    /// Create a zeroed instance (all bytes zero)
    #[inline(always)]
    fn zeroed() -> Self {
        Zeroable::zeroed()
    }

    /// Copy this message to a raw destination (fast memcpy).
    ///
    /// # Safety
    /// The destination must have at least `SIZE` writable bytes.
    #[inline(always)]
    unsafe fn write_to_ptr(&self, ptr: *mut u8) {
        std::ptr::copy_nonoverlapping(self.as_bytes().as_ptr(), ptr, Self::SIZE);
    }

    /// Read a message from a raw source (fast memcpy).
    ///
    /// # Safety
    /// The source must have at least `SIZE` readable bytes.
    #[inline(always)]
    unsafe fn read_from_ptr(ptr: *const u8) -> Self {
        let mut result: Self = <Self as PodMessage>::zeroed();
        std::ptr::copy_nonoverlapping(
            ptr,
            bytemuck::bytes_of_mut(&mut result).as_mut_ptr(),
            Self::SIZE,
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq)]
    struct TestMsg {
        timestamp: u64,
        value: f32,
        _pad0: [u8; 4],
    }

    unsafe impl Zeroable for TestMsg {}
    unsafe impl Pod for TestMsg {}
    unsafe impl PodMessage for TestMsg {}

    #[test]
    fn test_pod_message_bytes() {
        let msg = TestMsg {
            timestamp: 12345,
            value: 3.125,
            _pad0: [0; 4],
        };

        let bytes = msg.as_bytes();
        assert_eq!(bytes.len(), TestMsg::SIZE);

        let restored = TestMsg::from_bytes(bytes).unwrap();
        assert_eq!(*restored, msg);
    }

    #[test]
    fn test_pod_message_size() {
        assert_eq!(TestMsg::SIZE, 16); // 8 + 4 + 4
    }

    #[test]
    fn test_pod_message_zeroed() {
        let msg: TestMsg = <TestMsg as PodMessage>::zeroed();
        assert_eq!(msg.timestamp, 0);
        assert_eq!(msg.value, 0.0);
    }

    #[test]
    fn test_is_pod_detection() {
        struct WithHeap {
            _name: String,
        }
        assert!(is_pod::<TestMsg>());
        assert!(is_pod::<[f32; 3]>());
        assert!(!is_pod::<WithHeap>());
        assert!(!is_pod::<Vec<u8>>());
    }

    #[test]
    fn test_raw_round_trip() {
        let msg = TestMsg {
            timestamp: 777,
            value: -1.5,
            _pad0: [0; 4],
        };
        let mut buf = [0u8; 16];
        unsafe { msg.write_to_ptr(buf.as_mut_ptr()) };
        let back = unsafe { TestMsg::read_from_ptr(buf.as_ptr()) };
        assert_eq!(back, msg);
    }
}
