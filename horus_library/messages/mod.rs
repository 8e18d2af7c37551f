// Message types for the HORUS robotics framework
//
// This module contains all standardized message types used for communication
// between HORUS components (nodes, algorithms, and applications).
//
// # Message Organization
//
// Messages are organized by domain:
// - Geometry: Spatial primitives (Twist, Pose2D, Transform, etc.)
// - Sensor: Sensor data formats (LaserScan, Imu, Odometry, etc.)
// - Vision: Camera data (Image, CompressedImage, Detection, etc.)
// - Perception: 3D understanding (PointCloud, DepthImage, planes, boxes)
// - Navigation: Goals, paths, and maps
// - Control: Actuator commands (MotorCommand, ServoCommand, PID, etc.)
// - Diagnostics: System health (Status, Heartbeat, EmergencyStop, etc.)
//
// Every record is a fixed-size `#[repr(C)]` POD: inline arrays with
// compile-time bounds, inline NUL-terminated strings, explicit `_padN`
// padding, and a wall-clock `timestamp` in nanoseconds. The in-memory
// layout is the wire format.
//
// All message types are re-exported at the crate root for convenience.

pub mod control;
pub mod diagnostics;
pub mod geometry;
pub mod navigation;
pub mod perception;
pub mod sensor;
pub mod vision;

// Re-export all message types for convenience
// Geometry
pub use geometry::{Point3, Pose2D, Quaternion, Transform, Twist, Vector3};

// Sensor
pub use sensor::{BatteryState, Imu, LaserScan, Odometry, Range};

// Vision
pub use vision::{
    CameraInfo, CompressedImage, Detection, DetectionArray, Image, RegionOfInterest, StereoInfo,
};

// Perception
pub use perception::{
    BoundingBox3D, BoundingBoxArray3D, DepthImage, PlaneArray, PlaneDetection, PointCloud,
    PointField,
};

// Navigation
pub use navigation::{
    CostMap, Goal, GoalResult, OccupancyGrid, Path, PathPlan, VelocityObstacle, VelocityObstacles,
    Waypoint,
};

// Control
pub use control::{
    DifferentialDriveCommand, JointCommand, MotorCommand, PidConfig, ServoCommand, TrajectoryPoint,
};

// Diagnostics
pub use diagnostics::{EmergencyStop, Heartbeat, ResourceUsage, SafetyStatus, Status};

/// Mark a record as transportable: byte-castable (`Pod` + `Zeroable`) and
/// accepted by publisher/subscriber handles (`PodMessage`).
///
/// Every type listed here is `#[repr(C)]`, `Copy`, and free of implicit
/// padding (padding is explicit `_padN` fields).
macro_rules! impl_pod_message {
    ($($ty:ty),+ $(,)?) => {$(
        unsafe impl ::bytemuck::Zeroable for $ty {}
        unsafe impl ::bytemuck::Pod for $ty {}
        unsafe impl ::horus_core::communication::PodMessage for $ty {}
    )+};
}
pub(crate) use impl_pod_message;

/// Copy `s` into a fixed inline string field, truncating to the capacity
/// minus the trailing NUL.
pub(crate) fn write_fixed_str(dst: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    let mut len = bytes.len().min(dst.len() - 1);
    // Never split a UTF-8 sequence on truncation.
    while len > 0 && !s.is_char_boundary(len) {
        len -= 1;
    }
    dst[..len].copy_from_slice(&bytes[..len]);
    dst[len..].fill(0);
}

/// Read a fixed inline string field up to its first NUL.
pub(crate) fn read_fixed_str(src: &[u8]) -> String {
    let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    String::from_utf8_lossy(&src[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_str_round_trip() {
        let mut buf = [0u8; 16];
        write_fixed_str(&mut buf, "lidar_front");
        assert_eq!(read_fixed_str(&buf), "lidar_front");
    }

    #[test]
    fn test_fixed_str_truncates_with_nul() {
        let mut buf = [0u8; 8];
        write_fixed_str(&mut buf, "a_rather_long_name");
        assert_eq!(buf[7], 0);
        assert_eq!(read_fixed_str(&buf), "a_rathe");
    }

    #[test]
    fn test_fixed_str_never_splits_utf8() {
        let mut buf = [0u8; 6];
        write_fixed_str(&mut buf, "héllo"); // 'é' is two bytes
        let s = read_fixed_str(&buf);
        assert!(s.starts_with('h'));
        assert!(std::str::from_utf8(&buf[..s.len()]).is_ok());
    }
}
