use horus_core::core::LogSummary;
use horus_macros::LogSummary;
// Control message types for robotics
//
// This module provides messages for controlling actuators,
// motors, servos, and other controllable components.

use horus_core::time::timestamp_now;
use serde::{Deserialize, Serialize};

use crate::messages::{impl_pod_message, read_fixed_str, write_fixed_str};

/// Motor command for direct motor control
///
/// Supports velocity, position, torque, and voltage control modes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct MotorCommand {
    /// Target value (units depend on mode)
    pub target: f64,
    /// Maximum velocity (for position mode)
    pub max_velocity: f64,
    /// Maximum acceleration
    pub max_acceleration: f64,
    /// Feed-forward term
    pub feed_forward: f64,
    /// Motor ID (for multi-motor systems)
    pub motor_id: u8,
    /// Control mode (0=velocity, 1=position, 2=torque, 3=voltage)
    pub mode: u8,
    /// Enable motor (0 = brake/coast depending on config)
    pub enable: u8,
    pub _pad0: [u8; 5],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl MotorCommand {
    pub const MODE_VELOCITY: u8 = 0;
    pub const MODE_POSITION: u8 = 1;
    pub const MODE_TORQUE: u8 = 2;
    pub const MODE_VOLTAGE: u8 = 3;

    /// Create a velocity command
    pub fn velocity(motor_id: u8, velocity: f64) -> Self {
        Self {
            target: velocity,
            max_velocity: f64::INFINITY,
            max_acceleration: f64::INFINITY,
            motor_id,
            mode: Self::MODE_VELOCITY,
            enable: 1,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Create a position command
    pub fn position(motor_id: u8, position: f64, max_velocity: f64) -> Self {
        Self {
            target: position,
            max_velocity,
            max_acceleration: f64::INFINITY,
            motor_id,
            mode: Self::MODE_POSITION,
            enable: 1,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Create a stop command
    pub fn stop(motor_id: u8) -> Self {
        Self {
            max_velocity: f64::INFINITY,
            max_acceleration: f64::INFINITY,
            motor_id,
            mode: Self::MODE_VELOCITY,
            enable: 0,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Check if values are valid
    pub fn is_valid(&self) -> bool {
        self.target.is_finite() && self.feed_forward.is_finite() && self.mode <= Self::MODE_VOLTAGE
    }
}

/// Differential drive motor commands
///
/// Commands for a two-wheeled differential drive robot.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct DifferentialDriveCommand {
    /// Left wheel velocity in rad/s
    pub left_velocity: f64,
    /// Right wheel velocity in rad/s
    pub right_velocity: f64,
    /// Maximum acceleration in rad/s²
    pub max_acceleration: f64,
    /// Enable motors (0/1)
    pub enable: u8,
    pub _pad0: [u8; 7],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl DifferentialDriveCommand {
    /// Create a new differential drive command
    pub fn new(left: f64, right: f64) -> Self {
        Self {
            left_velocity: left,
            right_velocity: right,
            max_acceleration: f64::INFINITY,
            enable: 1,
            _pad0: [0; 7],
            timestamp: timestamp_now(),
        }
    }

    /// Create a stop command
    pub fn stop() -> Self {
        Self {
            left_velocity: 0.0,
            right_velocity: 0.0,
            max_acceleration: f64::INFINITY,
            enable: 0,
            _pad0: [0; 7],
            timestamp: timestamp_now(),
        }
    }

    /// Create from linear and angular velocities:
    /// `left = (linear − angular·wheel_base/2) / wheel_radius`,
    /// `right = (linear + angular·wheel_base/2) / wheel_radius`.
    pub fn from_twist(linear: f64, angular: f64, wheel_base: f64, wheel_radius: f64) -> Self {
        let left = (linear - angular * wheel_base / 2.0) / wheel_radius;
        let right = (linear + angular * wheel_base / 2.0) / wheel_radius;
        Self::new(left, right)
    }

    /// Check if values are valid
    pub fn is_valid(&self) -> bool {
        self.left_velocity.is_finite() && self.right_velocity.is_finite()
    }
}

/// Servo command for position-controlled servos
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct ServoCommand {
    /// Target position in radians
    pub position: f32,
    /// Movement speed (0-1, 0=max speed)
    pub speed: f32,
    /// Servo ID (for multi-servo systems)
    pub servo_id: u8,
    /// Torque enable (0/1)
    pub enable: u8,
    pub _pad0: [u8; 6],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl ServoCommand {
    /// Create a new servo command
    pub fn new(servo_id: u8, position: f32) -> Self {
        Self {
            position,
            speed: 0.5,
            servo_id,
            enable: 1,
            _pad0: [0; 6],
            timestamp: timestamp_now(),
        }
    }

    /// Create a command with specific speed
    pub fn with_speed(servo_id: u8, position: f32, speed: f32) -> Self {
        Self {
            speed: speed.clamp(0.0, 1.0),
            ..Self::new(servo_id, position)
        }
    }

    /// Disable servo (remove torque)
    pub fn disable(servo_id: u8) -> Self {
        Self {
            servo_id,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Convert position from degrees to radians
    pub fn from_degrees(servo_id: u8, degrees: f32) -> Self {
        Self::new(servo_id, degrees.to_radians())
    }

    pub fn is_valid(&self) -> bool {
        self.position.is_finite() && (0.0..=1.0).contains(&self.speed)
    }
}

/// PID gains configuration message
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct PidConfig {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
    /// Integral windup limit
    pub integral_limit: f64,
    /// Output limit
    pub output_limit: f64,
    /// Controller ID
    pub controller_id: u8,
    /// Enable anti-windup (0/1)
    pub anti_windup: u8,
    pub _pad0: [u8; 6],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl PidConfig {
    /// Create a new PID configuration
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral_limit: f64::INFINITY,
            output_limit: f64::INFINITY,
            anti_windup: 1,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Create a P-only controller
    pub fn proportional(kp: f64) -> Self {
        Self::new(kp, 0.0, 0.0)
    }

    /// Create a PI controller
    pub fn pi(kp: f64, ki: f64) -> Self {
        Self::new(kp, ki, 0.0)
    }

    /// Create a PD controller
    pub fn pd(kp: f64, kd: f64) -> Self {
        Self::new(kp, 0.0, kd)
    }

    /// Set windup and output limits
    pub fn with_limits(mut self, integral_limit: f64, output_limit: f64) -> Self {
        self.integral_limit = integral_limit;
        self.output_limit = output_limit;
        self
    }

    /// Check if gains are valid
    pub fn is_valid(&self) -> bool {
        self.kp.is_finite()
            && self.ki.is_finite()
            && self.kd.is_finite()
            && self.kp >= 0.0
            && self.ki >= 0.0
            && self.kd >= 0.0
    }
}

/// Trajectory point for path following
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct TrajectoryPoint {
    /// Position [x, y, z]
    pub position: [f64; 3],
    /// Velocity [vx, vy, vz]
    pub velocity: [f64; 3],
    /// Acceleration [ax, ay, az]
    pub acceleration: [f64; 3],
    /// Orientation as quaternion [x, y, z, w]
    pub orientation: [f64; 4],
    /// Angular velocity [wx, wy, wz]
    pub angular_velocity: [f64; 3],
    /// Time from trajectory start in seconds
    pub time_from_start: f64,
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl TrajectoryPoint {
    /// Create a simple 2D trajectory point
    pub fn new_2d(x: f64, y: f64, vx: f64, vy: f64, time: f64) -> Self {
        Self {
            position: [x, y, 0.0],
            velocity: [vx, vy, 0.0],
            orientation: [0.0, 0.0, 0.0, 1.0],
            time_from_start: time,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Create a stationary point
    pub fn stationary(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: [x, y, z],
            orientation: [0.0, 0.0, 0.0, 1.0],
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.velocity.iter().all(|v| v.is_finite())
            && self.acceleration.iter().all(|v| v.is_finite())
            && self.orientation.iter().all(|v| v.is_finite())
            && self.time_from_start.is_finite()
            && self.time_from_start >= 0.0
    }
}

/// Joint command for multi-DOF systems
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JointCommand {
    /// Joint names (max 16 joints, 32 bytes each, null-terminated)
    #[serde(with = "serde_arrays")]
    pub joint_names: [[u8; 32]; 16],
    /// Position commands in radians
    pub positions: [f64; 16],
    /// Velocity commands in rad/s
    pub velocities: [f64; 16],
    /// Effort/torque commands in Nm
    pub efforts: [f64; 16],
    /// Control mode per joint (0=position, 1=velocity, 2=effort)
    pub modes: [u8; 16],
    /// Number of active joints
    pub joint_count: u8,
    pub _pad0: [u8; 7],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for JointCommand {
    fn default() -> Self {
        Self {
            joint_names: [[0; 32]; 16],
            positions: [0.0; 16],
            velocities: [0.0; 16],
            efforts: [0.0; 16],
            modes: [0; 16],
            joint_count: 0,
            _pad0: [0; 7],
            timestamp: 0,
        }
    }
}

impl JointCommand {
    pub const MODE_POSITION: u8 = 0;
    pub const MODE_VELOCITY: u8 = 1;
    pub const MODE_EFFORT: u8 = 2;
    pub const MAX_JOINTS: usize = 16;

    /// Create a new joint command
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Add a joint position command
    pub fn add_position(&mut self, name: &str, position: f64) -> Result<(), &'static str> {
        let idx = self.claim_joint(name)?;
        self.positions[idx] = position;
        self.modes[idx] = Self::MODE_POSITION;
        Ok(())
    }

    /// Add a joint velocity command
    pub fn add_velocity(&mut self, name: &str, velocity: f64) -> Result<(), &'static str> {
        let idx = self.claim_joint(name)?;
        self.velocities[idx] = velocity;
        self.modes[idx] = Self::MODE_VELOCITY;
        Ok(())
    }

    /// Add a joint effort command
    pub fn add_effort(&mut self, name: &str, effort: f64) -> Result<(), &'static str> {
        let idx = self.claim_joint(name)?;
        self.efforts[idx] = effort;
        self.modes[idx] = Self::MODE_EFFORT;
        Ok(())
    }

    fn claim_joint(&mut self, name: &str) -> Result<usize, &'static str> {
        if (self.joint_count as usize) >= Self::MAX_JOINTS {
            return Err("maximum 16 joints supported");
        }
        let idx = self.joint_count as usize;
        write_fixed_str(&mut self.joint_names[idx], name);
        self.joint_count += 1;
        Ok(idx)
    }

    /// Get a joint name by index
    pub fn joint_name(&self, index: usize) -> Option<String> {
        if index < self.joint_count as usize {
            Some(read_fixed_str(&self.joint_names[index]))
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        (self.joint_count as usize) <= Self::MAX_JOINTS
            && self.positions.iter().all(|v| v.is_finite())
            && self.velocities.iter().all(|v| v.is_finite())
            && self.efforts.iter().all(|v| v.is_finite())
            && self.modes.iter().all(|&m| m <= Self::MODE_EFFORT)
    }
}

impl LogSummary for JointCommand {
    fn log_summary(&self) -> String {
        format!("JointCommand({} joints)", self.joint_count)
    }
}

impl_pod_message!(
    MotorCommand,
    DifferentialDriveCommand,
    ServoCommand,
    PidConfig,
    TrajectoryPoint,
    JointCommand,
);
