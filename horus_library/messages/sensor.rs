use horus_core::core::LogSummary;
use horus_macros::LogSummary;
// Sensor data message types for robotics
//
// This module provides standard sensor data formats for common
// robotics sensors including lidar, IMU, odometry, rangers, and
// battery monitors.

use horus_core::time::timestamp_now;
use serde::{Deserialize, Serialize};

use crate::messages::geometry::{Pose2D, Quaternion, Twist, Vector3};
use crate::messages::{impl_pod_message, read_fixed_str, write_fixed_str};

/// Laser scan data from a 2D lidar sensor
///
/// Fixed-size array for shared memory safety. Supports up to 360-degree
/// scanning with 1-degree resolution.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LaserScan {
    /// Range measurements in meters (0 = invalid reading)
    #[serde(with = "serde_arrays")]
    pub ranges: [f32; 360],
    /// Start angle of the scan in radians
    pub angle_min: f32,
    /// End angle of the scan in radians
    pub angle_max: f32,
    /// Angular resolution in radians
    pub angle_increment: f32,
    /// Time between measurements in seconds
    pub time_increment: f32,
    /// Time to complete full scan in seconds
    pub scan_time: f32,
    /// Minimum valid range in meters
    pub range_min: f32,
    /// Maximum valid range in meters
    pub range_max: f32,
    pub _pad0: [u8; 4],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for LaserScan {
    fn default() -> Self {
        Self {
            ranges: [0.0; 360],
            angle_min: -std::f32::consts::PI,
            angle_max: std::f32::consts::PI,
            angle_increment: std::f32::consts::PI / 180.0,
            time_increment: 0.0,
            scan_time: 0.1,
            range_min: 0.1,
            range_max: 30.0,
            _pad0: [0; 4],
            timestamp: 0,
        }
    }
}

impl LaserScan {
    /// Create a new laser scan with default parameters
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Get the angle for a specific range index
    pub fn angle_at(&self, index: usize) -> f32 {
        if index >= self.ranges.len() {
            return 0.0;
        }
        self.angle_min + (index as f32) * self.angle_increment
    }

    /// Check if a range reading is valid
    pub fn is_range_valid(&self, index: usize) -> bool {
        if index >= self.ranges.len() {
            return false;
        }
        let range = self.ranges[index];
        range >= self.range_min && range <= self.range_max && range.is_finite()
    }

    /// Count valid range readings
    pub fn valid_count(&self) -> usize {
        self.ranges
            .iter()
            .filter(|&&r| r >= self.range_min && r <= self.range_max && r.is_finite())
            .count()
    }

    /// Get the closest valid reading, ignoring values outside
    /// `[range_min, range_max]`
    pub fn min_range(&self) -> Option<f32> {
        self.ranges
            .iter()
            .filter(|&&r| r >= self.range_min && r <= self.range_max && r.is_finite())
            .min_by(|a, b| a.partial_cmp(b).unwrap())
            .copied()
    }

    /// Check structural validity
    pub fn is_valid(&self) -> bool {
        self.ranges.iter().all(|r| r.is_finite())
            && self.angle_min.is_finite()
            && self.angle_max.is_finite()
            && self.angle_increment.is_finite()
            && self.range_min.is_finite()
            && self.range_max.is_finite()
            && self.range_min <= self.range_max
    }
}

impl LogSummary for LaserScan {
    fn log_summary(&self) -> String {
        format!(
            "LaserScan({} valid, min={:?})",
            self.valid_count(),
            self.min_range()
        )
    }
}

/// IMU (Inertial Measurement Unit) sensor data
///
/// Provides orientation, angular velocity, and linear acceleration
/// measurements from an IMU sensor.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct Imu {
    /// Orientation as quaternion [x, y, z, w]
    pub orientation: [f64; 4],
    /// Orientation covariance matrix (row-major, [0] < 0 = no data)
    pub orientation_covariance: [f64; 9],
    /// Angular velocity [x, y, z] in rad/s
    pub angular_velocity: [f64; 3],
    /// Angular velocity covariance matrix
    pub angular_velocity_covariance: [f64; 9],
    /// Linear acceleration [x, y, z] in m/s²
    pub linear_acceleration: [f64; 3],
    /// Linear acceleration covariance matrix
    pub linear_acceleration_covariance: [f64; 9],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Imu {
    /// Create a new IMU message
    pub fn new() -> Self {
        Self {
            orientation: [0.0, 0.0, 0.0, 1.0],
            orientation_covariance: [-1.0; 9], // No orientation data
            angular_velocity: [0.0; 3],
            angular_velocity_covariance: [0.0; 9],
            linear_acceleration: [0.0; 3],
            linear_acceleration_covariance: [0.0; 9],
            timestamp: timestamp_now(),
        }
    }

    /// Set orientation from Euler angles
    pub fn set_orientation_from_euler(&mut self, roll: f64, pitch: f64, yaw: f64) {
        let q = Quaternion::from_euler(roll, pitch, yaw);
        self.orientation = [q.x, q.y, q.z, q.w];
        self.orientation_covariance[0] = 0.0;
    }

    /// Check if orientation data is available
    pub fn has_orientation(&self) -> bool {
        self.orientation_covariance[0] >= 0.0
    }

    /// Check if all values are finite
    pub fn is_valid(&self) -> bool {
        self.orientation.iter().all(|v| v.is_finite())
            && self.angular_velocity.iter().all(|v| v.is_finite())
            && self.linear_acceleration.iter().all(|v| v.is_finite())
    }

    /// Get angular velocity as Vector3
    pub fn angular_velocity_vec(&self) -> Vector3 {
        Vector3::new(
            self.angular_velocity[0],
            self.angular_velocity[1],
            self.angular_velocity[2],
        )
    }

    /// Get linear acceleration as Vector3
    pub fn linear_acceleration_vec(&self) -> Vector3 {
        Vector3::new(
            self.linear_acceleration[0],
            self.linear_acceleration[1],
            self.linear_acceleration[2],
        )
    }
}

/// Odometry data combining pose and velocity
///
/// Typically computed from wheel encoders or visual odometry,
/// provides the robot's estimated position and velocity.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Odometry {
    /// Current pose estimate
    pub pose: Pose2D,
    /// Current velocity estimate
    pub twist: Twist,
    /// Pose covariance matrix (6x6 row-major)
    #[serde(with = "serde_arrays")]
    pub pose_covariance: [f64; 36],
    /// Twist covariance matrix (6x6 row-major)
    #[serde(with = "serde_arrays")]
    pub twist_covariance: [f64; 36],
    /// Frame ID for the pose (e.g., "odom", "map")
    pub frame_id: [u8; 32],
    /// Frame ID for the twist (e.g., "base_link")
    pub child_frame_id: [u8; 32],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for Odometry {
    fn default() -> Self {
        Self {
            pose: Pose2D::default(),
            twist: Twist::default(),
            pose_covariance: [0.0; 36],
            twist_covariance: [0.0; 36],
            frame_id: [0; 32],
            child_frame_id: [0; 32],
            timestamp: 0,
        }
    }
}

impl Odometry {
    /// Create a new odometry message
    pub fn new() -> Self {
        Self {
            pose: Pose2D::origin(),
            twist: Twist::stop(),
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Set frame IDs from strings
    pub fn set_frames(&mut self, frame: &str, child_frame: &str) {
        write_fixed_str(&mut self.frame_id, frame);
        write_fixed_str(&mut self.child_frame_id, child_frame);
    }

    pub fn frame_id_str(&self) -> String {
        read_fixed_str(&self.frame_id)
    }

    /// Update pose and velocity, refreshing the timestamp
    pub fn update(&mut self, pose: Pose2D, twist: Twist) {
        self.pose = pose;
        self.twist = twist;
        self.timestamp = timestamp_now();
    }

    /// Check if values are valid
    pub fn is_valid(&self) -> bool {
        self.pose.is_valid() && self.twist.is_valid()
    }
}

impl LogSummary for Odometry {
    fn log_summary(&self) -> String {
        format!(
            "Odometry(pose=({:.2}, {:.2}, {:.2}))",
            self.pose.x, self.pose.y, self.pose.theta
        )
    }
}

/// Range sensor data (ultrasonic, infrared, etc.)
///
/// Single-point distance measurement from sensors like
/// ultrasonic or infrared rangers.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct Range {
    /// Range reading in meters
    pub range: f32,
    /// Minimum range in meters
    pub min_range: f32,
    /// Maximum range in meters
    pub max_range: f32,
    /// Field of view in radians
    pub field_of_view: f32,
    /// Sensor type (0=ultrasonic, 1=infrared)
    pub sensor_type: u8,
    pub _pad0: [u8; 7],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Range {
    pub const ULTRASONIC: u8 = 0;
    pub const INFRARED: u8 = 1;

    /// Create a new range message
    pub fn new(sensor_type: u8, range: f32) -> Self {
        Self {
            range,
            min_range: 0.02,
            max_range: 4.0,
            field_of_view: 0.1, // ~6 degrees
            sensor_type,
            _pad0: [0; 7],
            timestamp: timestamp_now(),
        }
    }

    /// Check if the range reading is valid
    pub fn is_valid(&self) -> bool {
        self.range >= self.min_range
            && self.range <= self.max_range
            && self.range.is_finite()
            && self.sensor_type <= Self::INFRARED
    }
}

/// Battery status message
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, LogSummary)]
pub struct BatteryState {
    /// Voltage in volts
    pub voltage: f32,
    /// Current in amperes (negative = discharging)
    pub current: f32,
    /// Charge in amp-hours (NaN if unknown)
    pub charge: f32,
    /// Capacity in amp-hours (NaN if unknown)
    pub capacity: f32,
    /// Percentage charge (0-100)
    pub percentage: f32,
    /// Temperature in celsius
    pub temperature: f32,
    /// Cell voltages if available
    pub cell_voltages: [f32; 16],
    /// Power supply status (0=unknown, 1=charging, 2=discharging, 3=full)
    pub power_supply_status: u8,
    /// Number of valid cell voltage readings
    pub cell_count: u8,
    pub _pad0: [u8; 6],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for BatteryState {
    fn default() -> Self {
        Self {
            voltage: 0.0,
            current: 0.0,
            charge: f32::NAN,
            capacity: f32::NAN,
            percentage: 0.0,
            temperature: 25.0,
            cell_voltages: [0.0; 16],
            power_supply_status: Self::STATUS_UNKNOWN,
            cell_count: 0,
            _pad0: [0; 6],
            timestamp: 0,
        }
    }
}

impl BatteryState {
    pub const STATUS_UNKNOWN: u8 = 0;
    pub const STATUS_CHARGING: u8 = 1;
    pub const STATUS_DISCHARGING: u8 = 2;
    pub const STATUS_FULL: u8 = 3;

    /// Create a new battery state message
    pub fn new(voltage: f32, percentage: f32) -> Self {
        Self {
            voltage,
            percentage,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Check if battery is low (below threshold)
    pub fn is_low(&self, threshold: f32) -> bool {
        self.percentage < threshold
    }

    /// Check if battery is critical (below 10%)
    pub fn is_critical(&self) -> bool {
        self.percentage < 10.0
    }

    /// Estimate remaining time in seconds (negative current only)
    pub fn time_remaining(&self) -> Option<f32> {
        if self.current < 0.0 && !self.charge.is_nan() {
            Some((self.charge / -self.current) * 3600.0)
        } else {
            None
        }
    }

    /// Check structural validity. `charge`/`capacity` may be NaN by
    /// convention (unknown), all other fields must be finite.
    pub fn is_valid(&self) -> bool {
        self.voltage.is_finite()
            && self.current.is_finite()
            && self.percentage.is_finite()
            && (0.0..=100.0).contains(&self.percentage)
            && self.power_supply_status <= Self::STATUS_FULL
            && (self.cell_count as usize) <= self.cell_voltages.len()
    }
}

impl_pod_message!(LaserScan, Imu, Odometry, Range, BatteryState);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laser_scan_min_range_ignores_out_of_band() {
        let mut scan = LaserScan::new();
        scan.ranges[0] = 0.05; // below range_min, ignored
        scan.ranges[1] = 2.0;
        scan.ranges[2] = 1.5;
        scan.ranges[3] = 40.0; // above range_max, ignored
        assert_eq!(scan.min_range(), Some(1.5));
        assert_eq!(scan.valid_count(), 2);
    }

    #[test]
    fn test_laser_scan_empty_has_no_min() {
        let scan = LaserScan::new();
        assert_eq!(scan.min_range(), None);
    }

    #[test]
    fn test_laser_scan_angle_at() {
        let scan = LaserScan::new();
        assert!((scan.angle_at(0) - scan.angle_min).abs() < 1e-6);
        assert!((scan.angle_at(180) - (scan.angle_min + std::f32::consts::PI)).abs() < 1e-4);
        assert_eq!(scan.angle_at(400), 0.0);
    }

    #[test]
    fn test_imu_orientation_sentinel() {
        let mut imu = Imu::new();
        assert!(!imu.has_orientation());
        imu.set_orientation_from_euler(0.0, 0.0, 1.0);
        assert!(imu.has_orientation());
        assert!(imu.is_valid());
    }

    #[test]
    fn test_range_validity() {
        let ok = Range::new(Range::ULTRASONIC, 1.0);
        assert!(ok.is_valid());
        let too_close = Range::new(Range::ULTRASONIC, 0.001);
        assert!(!too_close.is_valid());
    }

    #[test]
    fn test_battery_levels() {
        let full = BatteryState::new(12.6, 95.0);
        assert!(!full.is_low(20.0));
        assert!(!full.is_critical());
        assert!(full.is_valid());

        let low = BatteryState::new(10.8, 8.0);
        assert!(low.is_low(20.0));
        assert!(low.is_critical());
    }

    #[test]
    fn test_odometry_frames() {
        let mut odom = Odometry::new();
        odom.set_frames("odom", "base_link");
        assert_eq!(odom.frame_id_str(), "odom");
        assert!(odom.is_valid());
    }

    #[test]
    fn test_layout_is_frozen() {
        assert_eq!(std::mem::size_of::<LaserScan>(), 1480);
        assert_eq!(std::mem::size_of::<Imu>(), 304);
        assert_eq!(std::mem::size_of::<Odometry>(), 736);
        assert_eq!(std::mem::size_of::<Range>(), 32);
        assert_eq!(std::mem::size_of::<BatteryState>(), 104);
    }
}
