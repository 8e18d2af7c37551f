//! Catalog records crossing a real topic must come back byte-identical:
//! the in-memory layout is the wire format, nothing is rewritten in
//! flight.

use horus_core::{registry, LogSummary, PodMessage};

use horus_library::messages::control::{DifferentialDriveCommand, MotorCommand};
use horus_library::messages::diagnostics::{EmergencyStop, Status};
use horus_library::messages::geometry::{Pose2D, Twist};
use horus_library::messages::navigation::Goal;
use horus_library::messages::sensor::{Imu, LaserScan};

fn assert_round_trip<T>(topic: &str, msg: T)
where
    T: PodMessage + LogSummary,
{
    let mut publ = registry().bind_publisher::<T>(topic).unwrap();
    let mut sub = registry().bind_subscriber::<T>(topic).unwrap();

    publ.send_ref(&msg, &mut None);
    let mut out = <T as PodMessage>::zeroed();
    assert!(sub.recv_into(&mut out, &mut None), "message lost on {}", topic);
    assert_eq!(
        msg.as_bytes(),
        out.as_bytes(),
        "byte layout changed in flight on {}",
        topic
    );
}

#[test]
fn test_twist_round_trip() {
    assert_round_trip("rt_twist", Twist::new_2d(0.8, -0.25));
}

#[test]
fn test_pose2d_round_trip() {
    assert_round_trip("rt_pose2d", Pose2D::new(4.5, -1.25, 1.57));
}

#[test]
fn test_laser_scan_round_trip() {
    let mut scan = LaserScan::new();
    scan.ranges[0] = 1.25;
    scan.ranges[180] = 3.5;
    scan.ranges[359] = 0.5;
    assert_round_trip("rt_scan", scan);
}

#[test]
fn test_imu_round_trip() {
    let mut imu = Imu::new();
    imu.set_orientation_from_euler(0.1, -0.2, 0.75);
    imu.angular_velocity = [0.5, 0.0, -0.5];
    assert_round_trip("rt_imu", imu);
}

#[test]
fn test_motor_command_round_trip() {
    assert_round_trip("rt_motor", MotorCommand::velocity(3, 2.5));
}

#[test]
fn test_diff_drive_round_trip() {
    assert_round_trip(
        "rt_diff_drive",
        DifferentialDriveCommand::from_twist(1.0, 0.5, 0.3, 0.05),
    );
}

#[test]
fn test_status_round_trip() {
    assert_round_trip(
        "rt_status",
        Status::error(42, "imu timeout").with_component("imu_node"),
    );
}

#[test]
fn test_emergency_stop_round_trip() {
    assert_round_trip(
        "rt_estop",
        EmergencyStop::engage("bumper pressed").with_source("safety"),
    );
}

#[test]
fn test_goal_round_trip() {
    assert_round_trip(
        "rt_goal",
        Goal::new(Pose2D::new(2.0, 3.0, 0.0), 0.1, 0.05).with_priority(2),
    );
}
