use horus_macros::LogSummary;
// Diagnostic and system health message types
//
// This module provides messages for system monitoring, health checks,
// error reporting, and emergency stop signaling.

use horus_core::time::timestamp_now;
use serde::{Deserialize, Serialize};

use crate::messages::{impl_pod_message, read_fixed_str, write_fixed_str};

/// System heartbeat message
///
/// Periodic signal indicating a node is alive and operational.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, LogSummary)]
pub struct Heartbeat {
    /// Node name (null-terminated)
    pub node_name: [u8; 32],
    /// Node ID
    pub node_id: u32,
    /// Node is alive and responding (0/1)
    pub alive: u8,
    pub _pad0: [u8; 3],
    /// Sequence number (increments each heartbeat)
    pub sequence: u64,
    /// Time since startup in seconds
    pub uptime: f64,
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            node_name: [0; 32],
            node_id: 0,
            alive: 1,
            _pad0: [0; 3],
            sequence: 0,
            uptime: 0.0,
            timestamp: 0,
        }
    }
}

impl Heartbeat {
    /// Create a new heartbeat message
    pub fn new(node_name: &str, node_id: u32) -> Self {
        let mut hb = Self {
            node_id,
            timestamp: timestamp_now(),
            ..Self::default()
        };
        write_fixed_str(&mut hb.node_name, node_name);
        hb
    }

    /// Advance to the next heartbeat
    pub fn update(&mut self, uptime: f64) {
        self.sequence += 1;
        self.uptime = uptime;
        self.timestamp = timestamp_now();
    }

    /// Get node name as string
    pub fn name(&self) -> String {
        read_fixed_str(&self.node_name)
    }

    pub fn is_valid(&self) -> bool {
        self.alive <= 1 && self.uptime.is_finite() && self.uptime >= 0.0
    }
}

/// System status message
///
/// General-purpose status reporting for any component.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, LogSummary)]
pub struct Status {
    /// Severity level (see `LEVEL_*`)
    pub level: u8,
    pub _pad0: [u8; 3],
    /// Error/status code (component-specific)
    pub code: u32,
    /// Human-readable message (null-terminated)
    #[serde(with = "serde_arrays")]
    pub message: [u8; 128],
    /// Component name reporting the status
    pub component: [u8; 32],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            level: Self::LEVEL_OK,
            _pad0: [0; 3],
            code: 0,
            message: [0; 128],
            component: [0; 32],
            timestamp: 0,
        }
    }
}

impl Status {
    pub const LEVEL_OK: u8 = 0;
    pub const LEVEL_WARN: u8 = 1;
    pub const LEVEL_ERROR: u8 = 2;
    pub const LEVEL_FATAL: u8 = 3;

    /// Create a new status message
    pub fn new(level: u8, code: u32, message: &str) -> Self {
        let mut status = Self {
            level,
            code,
            timestamp: timestamp_now(),
            ..Self::default()
        };
        write_fixed_str(&mut status.message, message);
        status
    }

    /// Create an OK status
    pub fn ok(message: &str) -> Self {
        Self::new(Self::LEVEL_OK, 0, message)
    }

    /// Create a warning status
    pub fn warn(code: u32, message: &str) -> Self {
        Self::new(Self::LEVEL_WARN, code, message)
    }

    /// Create an error status
    pub fn error(code: u32, message: &str) -> Self {
        Self::new(Self::LEVEL_ERROR, code, message)
    }

    /// Create a fatal status
    pub fn fatal(code: u32, message: &str) -> Self {
        Self::new(Self::LEVEL_FATAL, code, message)
    }

    /// Set the component name
    pub fn with_component(mut self, component: &str) -> Self {
        write_fixed_str(&mut self.component, component);
        self
    }

    /// Get message as string
    pub fn message_str(&self) -> String {
        read_fixed_str(&self.message)
    }

    /// Get component as string
    pub fn component_str(&self) -> String {
        read_fixed_str(&self.component)
    }

    pub fn is_valid(&self) -> bool {
        self.level <= Self::LEVEL_FATAL
    }
}

/// Emergency stop message
///
/// Critical safety message to immediately stop all robot motion.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, LogSummary)]
pub struct EmergencyStop {
    /// Emergency stop is active (0/1)
    pub engaged: u8,
    /// Auto-reset allowed after clearing (0/1)
    pub auto_reset: u8,
    pub _pad0: [u8; 6],
    /// Reason for emergency stop (null-terminated)
    #[serde(with = "serde_arrays")]
    pub reason: [u8; 64],
    /// Source that triggered the stop
    pub source: [u8; 32],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for EmergencyStop {
    fn default() -> Self {
        Self {
            engaged: 0,
            auto_reset: 0,
            _pad0: [0; 6],
            reason: [0; 64],
            source: [0; 32],
            timestamp: 0,
        }
    }
}

impl EmergencyStop {
    /// Create an emergency stop signal
    pub fn engage(reason: &str) -> Self {
        let mut estop = Self {
            engaged: 1,
            timestamp: timestamp_now(),
            ..Self::default()
        };
        write_fixed_str(&mut estop.reason, reason);
        estop
    }

    /// Create a release signal
    pub fn release() -> Self {
        Self {
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Set the source of the emergency stop
    pub fn with_source(mut self, source: &str) -> Self {
        write_fixed_str(&mut self.source, source);
        self
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged != 0
    }

    /// Get reason as string
    pub fn reason_str(&self) -> String {
        read_fixed_str(&self.reason)
    }

    pub fn is_valid(&self) -> bool {
        self.engaged <= 1 && self.auto_reset <= 1
    }
}

/// System resource usage
///
/// Reports CPU, memory, and other resource utilization.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct ResourceUsage {
    /// CPU usage percentage (0-100)
    pub cpu_percent: f32,
    /// Memory usage percentage (0-100)
    pub memory_percent: f32,
    /// Memory usage in bytes
    pub memory_bytes: u64,
    /// Disk usage in bytes
    pub disk_bytes: u64,
    /// Disk usage percentage (0-100)
    pub disk_percent: f32,
    pub _pad0: [u8; 4],
    /// Network bytes sent
    pub network_tx_bytes: u64,
    /// Network bytes received
    pub network_rx_bytes: u64,
    /// Board temperature in celsius
    pub temperature: f32,
    pub _pad1: [u8; 4],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl ResourceUsage {
    /// Create a new resource usage report
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    pub fn is_cpu_high(&self, threshold: f32) -> bool {
        self.cpu_percent > threshold
    }

    pub fn is_memory_high(&self, threshold: f32) -> bool {
        self.memory_percent > threshold
    }

    pub fn is_temperature_high(&self, threshold: f32) -> bool {
        self.temperature > threshold
    }

    pub fn is_valid(&self) -> bool {
        self.cpu_percent.is_finite()
            && self.memory_percent.is_finite()
            && self.disk_percent.is_finite()
            && self.temperature.is_finite()
            && (0.0..=100.0).contains(&self.cpu_percent)
            && (0.0..=100.0).contains(&self.memory_percent)
    }
}

/// Aggregated safety system state
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, LogSummary)]
pub struct SafetyStatus {
    /// Safety system is active (0/1)
    pub enabled: u8,
    /// Emergency stop is engaged (0/1)
    pub estop_engaged: u8,
    /// Watchdog timer is OK (0/1)
    pub watchdog_ok: u8,
    /// All limits are within bounds (0/1)
    pub limits_ok: u8,
    /// Communication is healthy (0/1)
    pub comms_ok: u8,
    /// Safety mode (see `MODE_*`)
    pub mode: u8,
    pub _pad0: [u8; 2],
    /// Fault code if any
    pub fault_code: u32,
    pub _pad1: [u8; 4],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for SafetyStatus {
    fn default() -> Self {
        Self {
            enabled: 1,
            estop_engaged: 0,
            watchdog_ok: 1,
            limits_ok: 1,
            comms_ok: 1,
            mode: Self::MODE_NORMAL,
            _pad0: [0; 2],
            fault_code: 0,
            _pad1: [0; 4],
            timestamp: 0,
        }
    }
}

impl SafetyStatus {
    pub const MODE_NORMAL: u8 = 0;
    pub const MODE_REDUCED: u8 = 1;
    pub const MODE_SAFE_STOP: u8 = 2;

    /// Create a new safety status
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Check if system is safe to operate
    pub fn is_safe(&self) -> bool {
        self.enabled != 0
            && self.estop_engaged == 0
            && self.watchdog_ok != 0
            && self.limits_ok != 0
            && self.comms_ok != 0
    }

    pub fn is_valid(&self) -> bool {
        self.mode <= Self::MODE_SAFE_STOP
    }
}

impl_pod_message!(Heartbeat, Status, EmergencyStop, ResourceUsage, SafetyStatus);
