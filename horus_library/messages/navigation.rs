use horus_core::core::LogSummary;
use horus_macros::LogSummary;
// Navigation and path planning message types for robotics
//
// This module provides messages for autonomous navigation, path planning,
// mapping, and obstacle avoidance. The map records (OccupancyGrid,
// CostMap) carry their cells inline and are constructed on the heap.

use horus_core::time::timestamp_now;
use serde::{Deserialize, Serialize};

use crate::messages::geometry::{Pose2D, Twist};
use crate::messages::{impl_pod_message, read_fixed_str, write_fixed_str};

/// Maximum grid dimension (cells per side) of an [`OccupancyGrid`].
pub const GRID_MAX_DIM: usize = 2000;
const GRID_MAX_CELLS: usize = GRID_MAX_DIM * GRID_MAX_DIM;

/// Navigation goal specification
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct Goal {
    /// Target pose to reach
    pub target_pose: Pose2D,
    /// Position tolerance in meters
    pub tolerance_position: f64,
    /// Orientation tolerance in radians
    pub tolerance_angle: f64,
    /// Maximum time to reach goal (0 = no limit)
    pub timeout_seconds: f64,
    /// Goal priority (0 = highest)
    pub priority: u8,
    pub _pad0: [u8; 3],
    /// Unique goal identifier
    pub goal_id: u32,
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Goal {
    /// Create a new navigation goal
    pub fn new(target_pose: Pose2D, position_tolerance: f64, angle_tolerance: f64) -> Self {
        Self {
            target_pose,
            tolerance_position: position_tolerance,
            tolerance_angle: angle_tolerance,
            priority: 1,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout_seconds: f64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Check if position is within tolerance
    pub fn is_position_reached(&self, current_pose: &Pose2D) -> bool {
        self.target_pose.distance_to(current_pose) <= self.tolerance_position
    }

    /// Check if orientation is within tolerance
    pub fn is_orientation_reached(&self, current_pose: &Pose2D) -> bool {
        let angle_diff = (self.target_pose.theta - current_pose.theta).abs();
        let normalized_diff = if angle_diff > std::f64::consts::PI {
            2.0 * std::f64::consts::PI - angle_diff
        } else {
            angle_diff
        };
        normalized_diff <= self.tolerance_angle
    }

    /// Check if goal is fully reached
    pub fn is_reached(&self, current_pose: &Pose2D) -> bool {
        self.is_position_reached(current_pose) && self.is_orientation_reached(current_pose)
    }

    pub fn is_valid(&self) -> bool {
        self.target_pose.is_valid()
            && self.tolerance_position.is_finite()
            && self.tolerance_angle.is_finite()
            && self.tolerance_position >= 0.0
    }
}

/// Goal status feedback
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, LogSummary)]
pub struct GoalResult {
    /// Goal identifier
    pub goal_id: u32,
    /// Current status (see `STATUS_*`)
    pub status: u8,
    pub _pad0: [u8; 3],
    /// Distance to goal in meters
    pub distance_to_goal: f64,
    /// Estimated time to reach goal in seconds
    pub eta_seconds: f64,
    /// Progress percentage (0.0 to 1.0)
    pub progress: f32,
    pub _pad1: [u8; 4],
    /// Error message if failed (null-terminated)
    #[serde(with = "serde_arrays")]
    pub error_message: [u8; 64],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for GoalResult {
    fn default() -> Self {
        Self {
            goal_id: 0,
            status: Self::STATUS_PENDING,
            _pad0: [0; 3],
            distance_to_goal: 0.0,
            eta_seconds: 0.0,
            progress: 0.0,
            _pad1: [0; 4],
            error_message: [0; 64],
            timestamp: 0,
        }
    }
}

impl GoalResult {
    pub const STATUS_PENDING: u8 = 0;
    pub const STATUS_ACTIVE: u8 = 1;
    pub const STATUS_SUCCEEDED: u8 = 2;
    pub const STATUS_ABORTED: u8 = 3;
    pub const STATUS_CANCELLED: u8 = 4;
    pub const STATUS_PREEMPTED: u8 = 5;
    pub const STATUS_TIMED_OUT: u8 = 6;

    /// Create a new goal result
    pub fn new(goal_id: u32, status: u8) -> Self {
        Self {
            goal_id,
            status,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Attach an error message
    pub fn with_error(mut self, message: &str) -> Self {
        write_fixed_str(&mut self.error_message, message);
        self
    }

    pub fn error_str(&self) -> String {
        read_fixed_str(&self.error_message)
    }

    pub fn is_terminal(&self) -> bool {
        self.status >= Self::STATUS_SUCCEEDED
    }

    pub fn is_valid(&self) -> bool {
        self.status <= Self::STATUS_TIMED_OUT
            && self.progress.is_finite()
            && (0.0..=1.0).contains(&self.progress)
    }
}

/// Waypoint in a path
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct Waypoint {
    /// Pose at this waypoint
    pub pose: Pose2D,
    /// Desired velocity at this point
    pub velocity: Twist,
    /// Time to reach this waypoint from start
    pub time_from_start: f64,
    /// Curvature at this point (1/radius)
    pub curvature: f32,
    /// Whether to stop at this waypoint (0/1)
    pub stop_required: u8,
    pub _pad0: [u8; 3],
}

impl Waypoint {
    /// Create a new waypoint
    pub fn new(pose: Pose2D) -> Self {
        Self {
            pose,
            ..Self::default()
        }
    }

    /// Create waypoint with velocity
    pub fn with_velocity(mut self, velocity: Twist) -> Self {
        self.velocity = velocity;
        self
    }

    /// Create waypoint requiring stop
    pub fn with_stop(mut self) -> Self {
        self.stop_required = 1;
        self.velocity = Twist::stop();
        self
    }

    pub fn is_valid(&self) -> bool {
        self.pose.is_valid() && self.velocity.is_valid() && self.time_from_start.is_finite()
    }
}

/// Navigation path message
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Path {
    /// Waypoints (max 256)
    #[serde(with = "serde_arrays")]
    pub waypoints: [Waypoint; 256],
    /// Number of valid waypoints
    pub waypoint_count: u16,
    pub _pad0: [u8; 6],
    /// Total path length in meters
    pub total_length: f64,
    /// Estimated time to complete path
    pub duration_seconds: f64,
    /// Path coordinate frame
    pub frame_id: [u8; 32],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for Path {
    fn default() -> Self {
        Self {
            waypoints: [Waypoint::default(); 256],
            waypoint_count: 0,
            _pad0: [0; 6],
            total_length: 0.0,
            duration_seconds: 0.0,
            frame_id: [0; 32],
            timestamp: 0,
        }
    }
}

impl Path {
    /// Create a new empty path
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Add a waypoint to the path
    pub fn add_waypoint(&mut self, waypoint: Waypoint) -> Result<(), &'static str> {
        if (self.waypoint_count as usize) >= self.waypoints.len() {
            return Err("path is full");
        }

        self.waypoints[self.waypoint_count as usize] = waypoint;
        self.waypoint_count += 1;

        if self.waypoint_count > 1 {
            let prev = &self.waypoints[(self.waypoint_count - 2) as usize];
            let current = &self.waypoints[(self.waypoint_count - 1) as usize];
            self.total_length += prev.pose.distance_to(&current.pose);
        }

        Ok(())
    }

    /// Get valid waypoints
    pub fn get_waypoints(&self) -> &[Waypoint] {
        &self.waypoints[..self.waypoint_count as usize]
    }

    /// Find closest waypoint to current position
    pub fn closest_waypoint_index(&self, current_pose: &Pose2D) -> Option<usize> {
        if self.waypoint_count == 0 {
            return None;
        }

        let mut min_distance = f64::INFINITY;
        let mut closest_index = 0;
        for (i, waypoint) in self.get_waypoints().iter().enumerate() {
            let distance = current_pose.distance_to(&waypoint.pose);
            if distance < min_distance {
                min_distance = distance;
                closest_index = i;
            }
        }
        Some(closest_index)
    }

    /// Calculate progress along path (0.0 to 1.0)
    pub fn calculate_progress(&self, current_pose: &Pose2D) -> f32 {
        if let Some(index) = self.closest_waypoint_index(current_pose) {
            (index as f32) / (self.waypoint_count as f32).max(1.0)
        } else {
            0.0
        }
    }

    /// Set frame ID
    pub fn with_frame_id(mut self, frame_id: &str) -> Self {
        write_fixed_str(&mut self.frame_id, frame_id);
        self
    }

    pub fn is_valid(&self) -> bool {
        (self.waypoint_count as usize) <= self.waypoints.len()
            && self.total_length.is_finite()
            && self.get_waypoints().iter().all(|w| w.is_valid())
    }
}

impl LogSummary for Path {
    fn log_summary(&self) -> String {
        format!(
            "Path({} waypoints, {:.2} m)",
            self.waypoint_count, self.total_length
        )
    }
}

/// Occupancy grid map
///
/// Cell values: -1 = unknown, 0 = free, 100 = occupied. Construct on the
/// heap with [`OccupancyGrid::new_boxed`].
#[repr(C)]
#[derive(Clone, Copy)]
pub struct OccupancyGrid {
    /// Map resolution (meters per cell)
    pub resolution: f32,
    pub _pad0: [u8; 4],
    /// Map origin pose (bottom-left corner)
    pub origin: Pose2D,
    /// Map width in cells
    pub width: u32,
    /// Map height in cells
    pub height: u32,
    /// Cell data, row-major
    pub data: [i8; GRID_MAX_CELLS],
    /// Frame ID for map coordinates
    pub frame_id: [u8; 32],
    /// Timestamp when map was created
    pub timestamp: u64,
}

impl OccupancyGrid {
    /// Floating point slack at cell boundaries so that boundary
    /// coordinates land in the intended cell.
    const EPSILON: f64 = 1e-6;

    /// Allocate a grid on the heap with every in-range cell unknown (-1).
    /// Dimensions are clamped to [`GRID_MAX_DIM`].
    pub fn new_boxed(width: u32, height: u32, resolution: f32, origin: Pose2D) -> Box<Self> {
        let mut grid: Box<Self> = bytemuck::zeroed_box();
        grid.width = width.min(GRID_MAX_DIM as u32);
        grid.height = height.min(GRID_MAX_DIM as u32);
        grid.resolution = resolution;
        grid.origin = origin;
        let cells = (grid.width as usize) * (grid.height as usize);
        grid.data[..cells].fill(-1);
        grid.timestamp = timestamp_now();
        grid
    }

    /// Convert world coordinates to grid indices
    pub fn world_to_grid(&self, x: f64, y: f64) -> Option<(u32, u32)> {
        let grid_x = ((x - self.origin.x) / self.resolution as f64 + Self::EPSILON).floor() as i32;
        let grid_y = ((y - self.origin.y) / self.resolution as f64 + Self::EPSILON).floor() as i32;

        if grid_x >= 0 && grid_x < self.width as i32 && grid_y >= 0 && grid_y < self.height as i32 {
            Some((grid_x as u32, grid_y as u32))
        } else {
            None
        }
    }

    /// Convert grid indices to world coordinates (cell center)
    pub fn grid_to_world(&self, grid_x: u32, grid_y: u32) -> Option<(f64, f64)> {
        if grid_x < self.width && grid_y < self.height {
            let x = self.origin.x + (grid_x as f64 + 0.5) * self.resolution as f64;
            let y = self.origin.y + (grid_y as f64 + 0.5) * self.resolution as f64;
            Some((x, y))
        } else {
            None
        }
    }

    /// Get occupancy value at grid coordinates
    pub fn get_occupancy(&self, grid_x: u32, grid_y: u32) -> Option<i8> {
        if grid_x < self.width && grid_y < self.height {
            let index = (grid_y * self.width + grid_x) as usize;
            self.data.get(index).copied()
        } else {
            None
        }
    }

    /// Set occupancy value at grid coordinates, clamped to [-1, 100]
    pub fn set_occupancy(&mut self, grid_x: u32, grid_y: u32, value: i8) -> bool {
        if grid_x < self.width && grid_y < self.height {
            let index = (grid_y * self.width + grid_x) as usize;
            self.data[index] = value.clamp(-1, 100);
            return true;
        }
        false
    }

    /// Check if a world point is free (< 50% occupancy)
    pub fn is_free(&self, x: f64, y: f64) -> bool {
        if let Some((gx, gy)) = self.world_to_grid(x, y) {
            if let Some(occupancy) = self.get_occupancy(gx, gy) {
                return (0..50).contains(&occupancy);
            }
        }
        false
    }

    /// Check if a world point is occupied (>= 50% occupancy)
    pub fn is_occupied(&self, x: f64, y: f64) -> bool {
        if let Some((gx, gy)) = self.world_to_grid(x, y) {
            if let Some(occupancy) = self.get_occupancy(gx, gy) {
                return occupancy >= 50;
            }
        }
        false
    }

    pub fn set_frame_id(&mut self, frame: &str) {
        write_fixed_str(&mut self.frame_id, frame);
    }

    pub fn is_valid(&self) -> bool {
        (self.width as usize) <= GRID_MAX_DIM
            && (self.height as usize) <= GRID_MAX_DIM
            && self.resolution.is_finite()
            && self.resolution > 0.0
            && self.origin.is_valid()
    }
}

impl LogSummary for OccupancyGrid {
    fn log_summary(&self) -> String {
        format!(
            "OccupancyGrid({}x{} @ {:.3} m/cell)",
            self.width, self.height, self.resolution
        )
    }
}

/// Cost map for navigation planning
///
/// Cost values: 0 = free, 253 = lethal by default, 255 = unknown.
/// Construct on the heap via [`CostMap::from_occupancy_grid`].
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CostMap {
    /// Base occupancy grid
    pub occupancy_grid: OccupancyGrid,
    /// Cost per cell, row-major
    pub costs: [u8; GRID_MAX_CELLS],
    /// Inflation radius in meters
    pub inflation_radius: f32,
    /// Cost scaling factor for inflation decay
    pub cost_scaling_factor: f32,
    /// Lethal cost threshold
    pub lethal_cost: u8,
    pub _pad0: [u8; 7],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl CostMap {
    /// Build a costmap from an occupancy grid, inflating obstacles by
    /// `inflation_radius` meters.
    pub fn from_occupancy_grid(grid: &OccupancyGrid, inflation_radius: f32) -> Box<Self> {
        let mut costmap: Box<Self> = bytemuck::zeroed_box();
        // Avoid `costmap.occupancy_grid = *grid`, which would materialize a
        // multi-megabyte `OccupancyGrid` rvalue on the stack before the move.
        unsafe {
            std::ptr::copy_nonoverlapping(grid, &mut costmap.occupancy_grid, 1);
        }
        costmap.inflation_radius = inflation_radius;
        costmap.cost_scaling_factor = 10.0;
        costmap.lethal_cost = 253;
        costmap.timestamp = timestamp_now();
        costmap.compute_costs();
        costmap
    }

    /// Recompute cost values from the occupancy data
    pub fn compute_costs(&mut self) {
        let cells =
            (self.occupancy_grid.width as usize) * (self.occupancy_grid.height as usize);
        for i in 0..cells {
            self.costs[i] = match self.occupancy_grid.data[i] {
                -1 => 255,                            // Unknown = lethal
                occ if occ >= 65 => self.lethal_cost, // Occupied = lethal
                occ => (occ.max(0) as u8).saturating_mul(2),
            };
        }
        self.inflate_obstacles();
    }

    /// Propagate decaying costs around obstacles within the inflation
    /// radius.
    fn inflate_obstacles(&mut self) {
        if self.inflation_radius <= 0.0 {
            return;
        }

        let width = self.occupancy_grid.width as usize;
        let height = self.occupancy_grid.height as usize;
        let resolution = self.occupancy_grid.resolution;
        let inflation_cells = (self.inflation_radius / resolution).ceil() as i32;

        let original: Vec<u8> = self.costs[..width * height].to_vec();

        for y in 0..height {
            for x in 0..width {
                let center_idx = y * width + x;
                if original[center_idx] >= self.lethal_cost {
                    continue;
                }

                let mut min_distance = f32::MAX;
                let mut found_obstacle = false;

                for dy in -inflation_cells..=inflation_cells {
                    for dx in -inflation_cells..=inflation_cells {
                        let nx = x as i32 + dx;
                        let ny = y as i32 + dy;
                        if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                            continue;
                        }
                        let neighbor_idx = (ny as usize) * width + (nx as usize);
                        if original[neighbor_idx] >= self.lethal_cost {
                            let dist = ((dx * dx + dy * dy) as f32).sqrt() * resolution;
                            if dist < min_distance {
                                min_distance = dist;
                                found_obstacle = true;
                            }
                        }
                    }
                }

                if found_obstacle && min_distance <= self.inflation_radius {
                    let factor = 1.0 - (min_distance / self.inflation_radius);
                    let inflation_cost = ((self.lethal_cost as f32 - 1.0)
                        * factor.powf(self.cost_scaling_factor))
                    .min(self.lethal_cost as f32 - 1.0);
                    self.costs[center_idx] = self.costs[center_idx].max(inflation_cost as u8);
                }
            }
        }
    }

    /// Get cost at world coordinates. Outside the map is lethal.
    pub fn get_cost(&self, x: f64, y: f64) -> Option<u8> {
        if let Some((gx, gy)) = self.occupancy_grid.world_to_grid(x, y) {
            let index = (gy * self.occupancy_grid.width + gx) as usize;
            self.costs.get(index).copied()
        } else {
            Some(self.lethal_cost)
        }
    }

    pub fn is_valid(&self) -> bool {
        self.occupancy_grid.is_valid()
            && self.inflation_radius.is_finite()
            && self.inflation_radius >= 0.0
    }
}

impl LogSummary for CostMap {
    fn log_summary(&self) -> String {
        format!(
            "CostMap({}x{}, inflation={:.2} m)",
            self.occupancy_grid.width, self.occupancy_grid.height, self.inflation_radius
        )
    }
}

/// Velocity obstacle for dynamic obstacle avoidance
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct VelocityObstacle {
    /// Obstacle position [x, y]
    pub position: [f64; 2],
    /// Obstacle velocity [vx, vy]
    pub velocity: [f64; 2],
    /// Obstacle radius in meters
    pub radius: f32,
    /// Time horizon for collision prediction in seconds
    pub time_horizon: f32,
    /// Obstacle ID for tracking
    pub obstacle_id: u32,
    pub _pad0: [u8; 4],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl VelocityObstacle {
    pub fn new(position: [f64; 2], velocity: [f64; 2], radius: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
            time_horizon: 5.0,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.velocity.iter().all(|v| v.is_finite())
            && self.radius.is_finite()
            && self.radius >= 0.0
    }
}

/// Array of velocity obstacles
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VelocityObstacles {
    /// Obstacles (max 32)
    #[serde(with = "serde_arrays")]
    pub obstacles: [VelocityObstacle; 32],
    /// Number of valid obstacles
    pub count: u8,
    pub _pad0: [u8; 7],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for VelocityObstacles {
    fn default() -> Self {
        Self {
            obstacles: [VelocityObstacle::default(); 32],
            count: 0,
            _pad0: [0; 7],
            timestamp: 0,
        }
    }
}

impl VelocityObstacles {
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    pub fn add(&mut self, obstacle: VelocityObstacle) -> Result<(), &'static str> {
        if (self.count as usize) >= self.obstacles.len() {
            return Err("velocity obstacle array full");
        }
        self.obstacles[self.count as usize] = obstacle;
        self.count += 1;
        Ok(())
    }

    pub fn get(&self) -> &[VelocityObstacle] {
        &self.obstacles[..self.count as usize]
    }

    pub fn is_valid(&self) -> bool {
        (self.count as usize) <= self.obstacles.len() && self.get().iter().all(|o| o.is_valid())
    }
}

impl LogSummary for VelocityObstacles {
    fn log_summary(&self) -> String {
        format!("VelocityObstacles({})", self.count)
    }
}

/// Simplified path plan for basic navigation
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PathPlan {
    /// Waypoints as [x, y, theta] (max 256)
    #[serde(with = "serde_arrays")]
    pub waypoints: [[f32; 3]; 256],
    /// Goal pose [x, y, theta]
    pub goal_pose: [f32; 3],
    /// Number of waypoints in path
    pub path_length: u32,
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for PathPlan {
    fn default() -> Self {
        Self {
            waypoints: [[0.0; 3]; 256],
            goal_pose: [0.0; 3],
            path_length: 0,
            timestamp: 0,
        }
    }
}

impl PathPlan {
    /// Create a new path plan
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Create path plan towards a goal
    pub fn to_goal(goal: [f32; 3]) -> Self {
        Self {
            goal_pose: goal,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Add waypoint to path
    pub fn add_waypoint(&mut self, x: f32, y: f32, theta: f32) -> Result<(), &'static str> {
        if (self.path_length as usize) >= self.waypoints.len() {
            return Err("path plan is full");
        }
        self.waypoints[self.path_length as usize] = [x, y, theta];
        self.path_length += 1;
        Ok(())
    }

    pub fn get_waypoints(&self) -> &[[f32; 3]] {
        &self.waypoints[..self.path_length as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.path_length == 0
    }

    pub fn is_valid(&self) -> bool {
        (self.path_length as usize) <= self.waypoints.len()
            && self.goal_pose.iter().all(|v| v.is_finite())
    }
}

impl LogSummary for PathPlan {
    fn log_summary(&self) -> String {
        format!("PathPlan({} waypoints)", self.path_length)
    }
}

impl_pod_message!(
    Goal,
    GoalResult,
    Waypoint,
    Path,
    OccupancyGrid,
    CostMap,
    VelocityObstacle,
    VelocityObstacles,
    PathPlan,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_reached() {
        let target = Pose2D::new(5.0, 3.0, 0.0);
        let goal = Goal::new(target, 0.2, 0.1);

        let close_pose = Pose2D::new(5.1, 3.05, 0.05);
        assert!(goal.is_reached(&close_pose));

        let far_pose = Pose2D::new(6.0, 3.0, 0.0);
        assert!(!goal.is_reached(&far_pose));
    }

    #[test]
    fn test_goal_result_terminal_states() {
        let active = GoalResult::new(1, GoalResult::STATUS_ACTIVE);
        assert!(!active.is_terminal());
        let done = GoalResult::new(1, GoalResult::STATUS_SUCCEEDED).with_error("");
        assert!(done.is_terminal());

        let failed = GoalResult::new(2, GoalResult::STATUS_ABORTED).with_error("blocked");
        assert_eq!(failed.error_str(), "blocked");
    }

    #[test]
    fn test_path_accumulates_length() {
        let mut path = Path::new();
        path.add_waypoint(Waypoint::new(Pose2D::new(0.0, 0.0, 0.0)))
            .unwrap();
        path.add_waypoint(Waypoint::new(Pose2D::new(1.0, 0.0, 0.0)))
            .unwrap();
        path.add_waypoint(Waypoint::new(Pose2D::new(1.0, 1.0, 0.0)))
            .unwrap();

        assert_eq!(path.waypoint_count, 3);
        assert!((path.total_length - 2.0).abs() < 1e-10);
        assert_eq!(
            path.closest_waypoint_index(&Pose2D::new(0.9, 0.9, 0.0)),
            Some(2)
        );
    }

    #[test]
    fn test_occupancy_grid_coordinate_conversion() {
        let mut grid = OccupancyGrid::new_boxed(100, 100, 0.1, Pose2D::origin());

        let (gx, gy) = grid.world_to_grid(0.5, 0.5).unwrap();
        assert_eq!((gx, gy), (5, 5));

        assert!(grid.set_occupancy(10, 10, 100));
        assert_eq!(grid.get_occupancy(10, 10), Some(100));

        let (x, y) = grid.grid_to_world(10, 10).unwrap();
        assert!(grid.is_occupied(x, y));
        assert!(grid.world_to_grid(-1.0, 0.0).is_none());
    }

    #[test]
    fn test_grid_world_round_trip_is_identity() {
        let grid = OccupancyGrid::new_boxed(50, 50, 0.25, Pose2D::new(-2.0, 3.0, 0.0));
        for &(gx, gy) in &[(0u32, 0u32), (7, 42), (49, 49)] {
            let (x, y) = grid.grid_to_world(gx, gy).unwrap();
            assert_eq!(grid.world_to_grid(x, y), Some((gx, gy)));
        }
    }

    #[test]
    fn test_unknown_cells_after_creation() {
        let grid = OccupancyGrid::new_boxed(10, 10, 0.1, Pose2D::origin());
        assert_eq!(grid.get_occupancy(5, 5), Some(-1));
        assert!(!grid.is_free(0.55, 0.55));
        assert!(!grid.is_occupied(0.55, 0.55));
    }

    #[test]
    fn test_costmap_inflation() {
        let mut grid = OccupancyGrid::new_boxed(20, 20, 0.1, Pose2D::origin());
        for y in 0..20 {
            for x in 0..20 {
                grid.set_occupancy(x, y, 0);
            }
        }
        grid.set_occupancy(10, 10, 100);

        let costmap = CostMap::from_occupancy_grid(&grid, 0.3);
        // The obstacle cell itself is lethal.
        let (ox, oy) = grid.grid_to_world(10, 10).unwrap();
        assert_eq!(costmap.get_cost(ox, oy), Some(253));
        // A neighbor within the inflation radius picked up cost.
        let (nx, ny) = grid.grid_to_world(11, 10).unwrap();
        assert!(costmap.get_cost(nx, ny).unwrap() > 0);
        // Far corner stays free.
        let (fx, fy) = grid.grid_to_world(0, 0).unwrap();
        assert_eq!(costmap.get_cost(fx, fy), Some(0));
        // Outside the map is lethal.
        assert_eq!(costmap.get_cost(-10.0, -10.0), Some(253));
    }

    #[test]
    fn test_velocity_obstacles_capacity() {
        let mut obstacles = VelocityObstacles::new();
        for i in 0..32 {
            obstacles
                .add(VelocityObstacle::new([i as f64, 0.0], [0.0, 0.0], 0.5))
                .unwrap();
        }
        assert!(obstacles.add(VelocityObstacle::default()).is_err());
        assert!(obstacles.is_valid());
    }

    #[test]
    fn test_path_plan() {
        let mut plan = PathPlan::to_goal([5.0, 5.0, 0.0]);
        assert!(plan.is_empty());
        plan.add_waypoint(1.0, 1.0, 0.0).unwrap();
        plan.add_waypoint(2.0, 2.0, 0.5).unwrap();
        assert_eq!(plan.get_waypoints().len(), 2);
        assert!(plan.is_valid());
    }

    #[test]
    fn test_layout_is_frozen() {
        assert_eq!(std::mem::size_of::<Goal>(), 72);
        assert_eq!(std::mem::size_of::<GoalResult>(), 104);
        assert_eq!(std::mem::size_of::<Waypoint>(), 104);
        assert_eq!(std::mem::size_of::<Path>(), 26_688);
        assert_eq!(std::mem::size_of::<OccupancyGrid>(), 4_000_088);
        assert_eq!(std::mem::size_of::<CostMap>(), 8_000_112);
        assert_eq!(std::mem::size_of::<VelocityObstacle>(), 56);
        assert_eq!(std::mem::size_of::<VelocityObstacles>(), 1808);
        assert_eq!(std::mem::size_of::<PathPlan>(), 3096);
    }
}
