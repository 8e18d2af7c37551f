//! # HORUS Standard Library
//!
//! The official message catalog for the HORUS robotics framework.
//!
//! ## Structure
//!
//! ```text
//! horus_library/
//! ── messages/       # Shared memory-safe POD message types
//! ```
//!
//! Every message is a fixed-layout `#[repr(C)]` record transported over
//! HORUS topics without serialization: inline bounded arrays, inline
//! NUL-terminated strings, explicit `_padN` padding, and a wall-clock
//! `timestamp` field in nanoseconds.
//!
//! ## Usage
//!
//! ```rust,ignore
//! // Message types are re-exported at the root for convenience
//! use horus_library::{LaserScan, Twist, Status, EmergencyStop};
//!
//! let stop = Twist::stop();
//! let alarm = EmergencyStop::engage("bumper pressed");
//! ```
//!
//! The multi-megabyte records ([`Image`], [`PointCloud`], [`DepthImage`],
//! [`OccupancyGrid`], [`CostMap`]) provide `new_boxed`-style constructors
//! and should live on the heap.

pub mod messages;

// Re-export core traits needed for message types
pub use horus_core::core::LogSummary;

// Re-export message types at the crate root for convenience
pub use messages::*;

/// Prelude module for convenient imports
///
/// # Usage
/// ```rust,ignore
/// use horus_library::prelude::*;
/// ```
pub mod prelude {
    // Core traits
    pub use crate::LogSummary;

    // Common message types
    pub use crate::messages::{
        control::{DifferentialDriveCommand, JointCommand, MotorCommand},
        diagnostics::{EmergencyStop, Heartbeat, SafetyStatus, Status},
        geometry::{Point3, Pose2D, Quaternion, Transform, Twist, Vector3},
        navigation::{Goal, OccupancyGrid, Path},
        sensor::{BatteryState, Imu, LaserScan, Odometry},
        vision::{CameraInfo, Detection, Image},
    };
}
