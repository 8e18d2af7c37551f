use horus_core::core::LogSummary;
use horus_macros::LogSummary;
// 3D perception message types
//
// Point clouds, depth images, oriented boxes, and plane detections. The
// blob-carrying records (PointCloud, DepthImage) keep their payload inline
// and should be constructed on the heap via their `new_boxed` helpers.

use horus_core::time::timestamp_now;
use serde::{Deserialize, Serialize};

use crate::messages::geometry::{Point3, Vector3};
use crate::messages::{impl_pod_message, read_fixed_str, write_fixed_str};

/// Maximum inline payload of a [`PointCloud`].
pub const POINT_CLOUD_MAX_DATA: usize = 2 * 1024 * 1024;
/// Maximum pixel count of a [`DepthImage`] (1280 × 960).
pub const DEPTH_IMAGE_MAX_PIXELS: usize = 1280 * 960;

/// Description of one field within a point record
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct PointField {
    /// Field name ("x", "y", "z", "rgb", "intensity", ...)
    pub name: [u8; 16],
    /// Byte offset within the point record
    pub offset: u32,
    /// Element type (see `TYPE_*`)
    pub datatype: u8,
    pub _pad0: [u8; 3],
    /// Number of elements (1 for scalar)
    pub count: u32,
}

impl PointField {
    pub const TYPE_INT8: u8 = 1;
    pub const TYPE_UINT8: u8 = 2;
    pub const TYPE_INT16: u8 = 3;
    pub const TYPE_UINT16: u8 = 4;
    pub const TYPE_INT32: u8 = 5;
    pub const TYPE_UINT32: u8 = 6;
    pub const TYPE_FLOAT32: u8 = 7;
    pub const TYPE_FLOAT64: u8 = 8;

    pub fn new(name: &str, offset: u32, datatype: u8, count: u32) -> Self {
        let mut field = Self {
            offset,
            datatype,
            count,
            ..Self::default()
        };
        write_fixed_str(&mut field.name, name);
        field
    }

    /// Byte size of one element of this field, 0 for unknown types.
    pub fn element_size(&self) -> u32 {
        match self.datatype {
            Self::TYPE_INT8 | Self::TYPE_UINT8 => 1,
            Self::TYPE_INT16 | Self::TYPE_UINT16 => 2,
            Self::TYPE_INT32 | Self::TYPE_UINT32 | Self::TYPE_FLOAT32 => 4,
            Self::TYPE_FLOAT64 => 8,
            _ => 0,
        }
    }

    pub fn name_str(&self) -> String {
        read_fixed_str(&self.name)
    }
}

/// Point cloud with inline binary point data
///
/// Construct on the heap with [`PointCloud::new_boxed`] or
/// [`PointCloud::create_xyz`].
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PointCloud {
    /// Width (points per row for organized clouds)
    pub width: u32,
    /// Height (1 for unorganized clouds)
    pub height: u32,
    /// Field descriptions
    pub fields: [PointField; 16],
    /// Number of valid fields
    pub field_count: u8,
    pub _pad0: [u8; 3],
    /// Size of one point record in bytes
    pub point_step: u32,
    /// Size of one row in bytes
    pub row_step: u32,
    /// Actual data length in bytes
    pub data_len: u32,
    /// Point data blob
    pub data: [u8; POINT_CLOUD_MAX_DATA],
    /// Coordinate frame reference
    pub frame_id: [u8; 32],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl PointCloud {
    /// Allocate a zeroed cloud on the heap with the current timestamp.
    pub fn new_boxed() -> Box<Self> {
        let mut cloud: Box<Self> = bytemuck::zeroed_box();
        cloud.timestamp = timestamp_now();
        cloud
    }

    /// Build an unorganized XYZ (3 × f32) cloud from 3D points. Points
    /// beyond the inline capacity are truncated.
    pub fn create_xyz(points: &[Point3]) -> Box<Self> {
        let mut cloud = Self::new_boxed();
        cloud.fields[0] = PointField::new("x", 0, PointField::TYPE_FLOAT32, 1);
        cloud.fields[1] = PointField::new("y", 4, PointField::TYPE_FLOAT32, 1);
        cloud.fields[2] = PointField::new("z", 8, PointField::TYPE_FLOAT32, 1);
        cloud.field_count = 3;
        cloud.point_step = 12;

        let max_points = POINT_CLOUD_MAX_DATA / 12;
        let count = points.len().min(max_points);
        for (i, p) in points[..count].iter().enumerate() {
            let base = i * 12;
            cloud.data[base..base + 4].copy_from_slice(&(p.x as f32).to_le_bytes());
            cloud.data[base + 4..base + 8].copy_from_slice(&(p.y as f32).to_le_bytes());
            cloud.data[base + 8..base + 12].copy_from_slice(&(p.z as f32).to_le_bytes());
        }
        cloud.width = count as u32;
        cloud.height = 1;
        cloud.row_step = (count * 12) as u32;
        cloud.data_len = (count * 12) as u32;
        cloud
    }

    /// Append a field description, failing when the table is full.
    pub fn add_field(&mut self, field: PointField) -> Result<(), &'static str> {
        if (self.field_count as usize) >= self.fields.len() {
            return Err("point cloud field table full");
        }
        self.fields[self.field_count as usize] = field;
        self.field_count += 1;
        Ok(())
    }

    /// Number of points held.
    pub fn point_count(&self) -> u32 {
        if self.point_step == 0 {
            return 0;
        }
        self.data_len / self.point_step
    }

    fn field(&self, name: &str) -> Option<&PointField> {
        self.fields[..self.field_count as usize]
            .iter()
            .find(|f| f.name_str() == name)
    }

    /// Extract XYZ coordinates, reading the "x"/"y"/"z" float fields.
    /// Returns an empty vector when the cloud has no XYZ layout.
    pub fn xyz_points(&self) -> Vec<Point3> {
        let (x, y, z) = match (self.field("x"), self.field("y"), self.field("z")) {
            (Some(x), Some(y), Some(z)) => (x.offset as usize, y.offset as usize, z.offset as usize),
            _ => return Vec::new(),
        };

        let step = self.point_step as usize;
        let mut out = Vec::with_capacity(self.point_count() as usize);
        for i in 0..self.point_count() as usize {
            let base = i * step;
            let read = |off: usize| {
                let bytes: [u8; 4] = self.data[base + off..base + off + 4].try_into().unwrap();
                f32::from_le_bytes(bytes) as f64
            };
            out.push(Point3::new(read(x), read(y), read(z)));
        }
        out
    }

    pub fn set_frame_id(&mut self, frame: &str) {
        write_fixed_str(&mut self.frame_id, frame);
    }

    pub fn is_valid(&self) -> bool {
        (self.field_count as usize) <= self.fields.len()
            && (self.data_len as usize) <= POINT_CLOUD_MAX_DATA
            && (self.point_step == 0 || self.data_len % self.point_step == 0)
    }
}

impl LogSummary for PointCloud {
    fn log_summary(&self) -> String {
        format!(
            "PointCloud({} pts, {} fields, {} B)",
            self.point_count(),
            self.field_count,
            self.data_len
        )
    }
}

/// Depth image with inline millimeter depth values
///
/// Construct on the heap with [`DepthImage::new_boxed`].
#[repr(C)]
#[derive(Clone, Copy)]
pub struct DepthImage {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Depth values in millimeters (0 = invalid)
    pub depths: [u16; DEPTH_IMAGE_MAX_PIXELS],
    /// Minimum reliable depth value
    pub min_depth: u16,
    /// Maximum reliable depth value
    pub max_depth: u16,
    /// Depth scale (mm per unit)
    pub depth_scale: f32,
    /// Camera frame reference
    pub frame_id: [u8; 32],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl DepthImage {
    /// Allocate a zeroed depth image on the heap with sensor defaults
    /// (20 cm to 10 m reliable band) and the current timestamp.
    pub fn new_boxed() -> Box<Self> {
        let mut img: Box<Self> = bytemuck::zeroed_box();
        img.min_depth = 200;
        img.max_depth = 10_000;
        img.depth_scale = 1.0;
        img.timestamp = timestamp_now();
        img
    }

    /// Fill in dimensions and depth data. Fails when `w × h` exceeds the
    /// pixel capacity or does not match the slice length.
    pub fn set_data(&mut self, w: u32, h: u32, depths: &[u16]) -> bool {
        let pixels = (w as usize) * (h as usize);
        if pixels > DEPTH_IMAGE_MAX_PIXELS || pixels != depths.len() {
            return false;
        }
        self.width = w;
        self.height = h;
        self.depths[..pixels].copy_from_slice(depths);
        self.timestamp = timestamp_now();
        true
    }

    /// Depth at pixel coordinates, 0 when out of bounds.
    pub fn depth_at(&self, x: u32, y: u32) -> u16 {
        if x < self.width && y < self.height {
            self.depths[(y * self.width + x) as usize]
        } else {
            0
        }
    }

    /// Set depth at pixel coordinates.
    pub fn set_depth(&mut self, x: u32, y: u32, depth: u16) -> bool {
        if x < self.width && y < self.height {
            self.depths[(y * self.width + x) as usize] = depth;
            return true;
        }
        false
    }

    /// Whether a raw depth value falls in the reliable band.
    pub fn is_valid_depth(&self, depth: u16) -> bool {
        depth > 0 && depth >= self.min_depth && depth <= self.max_depth
    }

    pub fn is_valid(&self) -> bool {
        (self.width as usize) * (self.height as usize) <= DEPTH_IMAGE_MAX_PIXELS
            && self.depth_scale.is_finite()
            && self.depth_scale > 0.0
            && self.min_depth <= self.max_depth
    }

    /// Back-project valid pixels to a 3D cloud in meters using pinhole
    /// intrinsics: `x = (u − cx) · z / fx`, `y = (v − cy) · z / fy`.
    /// At most 10 000 points are produced.
    pub fn to_point_cloud(&self, fx: f64, fy: f64, cx: f64, cy: f64) -> Box<PointCloud> {
        const MAX_POINTS: usize = 10_000;
        let mut points = Vec::with_capacity(MAX_POINTS);

        'rows: for v in 0..self.height {
            for u in 0..self.width {
                let depth = self.depth_at(u, v);
                if !self.is_valid_depth(depth) {
                    continue;
                }
                let z = (depth as f64 * self.depth_scale as f64) / 1000.0;
                points.push(Point3::new(
                    (u as f64 - cx) * z / fx,
                    (v as f64 - cy) * z / fy,
                    z,
                ));
                if points.len() >= MAX_POINTS {
                    break 'rows;
                }
            }
        }

        PointCloud::create_xyz(&points)
    }
}

impl LogSummary for DepthImage {
    fn log_summary(&self) -> String {
        format!(
            "DepthImage({}x{}, scale={}mm)",
            self.width, self.height, self.depth_scale
        )
    }
}

/// Oriented 3D bounding box
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct BoundingBox3D {
    /// Box center in meters
    pub center: Point3,
    /// Size [width, height, depth] in meters
    pub size: Vector3,
    /// Object class label (null-terminated)
    pub label: [u8; 32],
    /// Detection confidence (0.0 to 1.0)
    pub confidence: f32,
    /// Tracking ID
    pub track_id: u32,
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl BoundingBox3D {
    pub fn new(center: Point3, size: Vector3, label: &str, confidence: f32) -> Self {
        let mut bbox = Self {
            center,
            size,
            confidence,
            timestamp: timestamp_now(),
            ..Self::default()
        };
        write_fixed_str(&mut bbox.label, label);
        bbox
    }

    pub fn label_str(&self) -> String {
        read_fixed_str(&self.label)
    }

    /// Whether an axis-aligned interpretation of the box contains `point`.
    pub fn contains(&self, point: &Point3) -> bool {
        (point.x - self.center.x).abs() <= self.size.x / 2.0
            && (point.y - self.center.y).abs() <= self.size.y / 2.0
            && (point.z - self.center.z).abs() <= self.size.z / 2.0
    }

    pub fn volume(&self) -> f64 {
        self.size.x * self.size.y * self.size.z
    }

    /// The eight corner points of the box.
    pub fn corners(&self) -> [Point3; 8] {
        let hx = self.size.x / 2.0;
        let hy = self.size.y / 2.0;
        let hz = self.size.z / 2.0;
        let c = &self.center;
        [
            Point3::new(c.x - hx, c.y - hy, c.z - hz),
            Point3::new(c.x + hx, c.y - hy, c.z - hz),
            Point3::new(c.x - hx, c.y + hy, c.z - hz),
            Point3::new(c.x + hx, c.y + hy, c.z - hz),
            Point3::new(c.x - hx, c.y - hy, c.z + hz),
            Point3::new(c.x + hx, c.y - hy, c.z + hz),
            Point3::new(c.x - hx, c.y + hy, c.z + hz),
            Point3::new(c.x + hx, c.y + hy, c.z + hz),
        ]
    }

    pub fn is_valid(&self) -> bool {
        self.center.is_valid()
            && self.size.is_valid()
            && self.size.x >= 0.0
            && self.size.y >= 0.0
            && self.size.z >= 0.0
            && self.confidence.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Batch of 3D bounding boxes
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBoxArray3D {
    /// Boxes (max 32)
    #[serde(with = "serde_arrays")]
    pub boxes: [BoundingBox3D; 32],
    /// Number of valid boxes
    pub count: u8,
    pub _pad0: [u8; 7],
    /// Source sensor frame
    pub frame_id: [u8; 32],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for BoundingBoxArray3D {
    fn default() -> Self {
        Self {
            boxes: [BoundingBox3D::default(); 32],
            count: 0,
            _pad0: [0; 7],
            frame_id: [0; 32],
            timestamp: 0,
        }
    }
}

impl BoundingBoxArray3D {
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    pub fn add(&mut self, bbox: BoundingBox3D) -> Result<(), &'static str> {
        if (self.count as usize) >= self.boxes.len() {
            return Err("bounding box array full");
        }
        self.boxes[self.count as usize] = bbox;
        self.count += 1;
        Ok(())
    }

    pub fn get(&self) -> &[BoundingBox3D] {
        &self.boxes[..self.count as usize]
    }

    /// Boxes at or above a confidence threshold.
    pub fn filter_by_confidence(&self, threshold: f32) -> Vec<BoundingBox3D> {
        self.get()
            .iter()
            .filter(|b| b.confidence >= threshold)
            .copied()
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        (self.count as usize) <= self.boxes.len() && self.get().iter().all(|b| b.is_valid())
    }
}

impl LogSummary for BoundingBoxArray3D {
    fn log_summary(&self) -> String {
        format!("BoundingBoxArray3D({} boxes)", self.count)
    }
}

/// Planar surface detection result
///
/// Plane equation `ax + by + cz + d = 0` plus extent and classification.
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct PlaneDetection {
    /// Plane equation coefficients [a, b, c, d]
    pub coefficients: [f64; 4],
    /// Center of the detected patch
    pub center: Point3,
    /// Unit normal of the plane
    pub normal: Vector3,
    /// Patch extent [width, height] in meters
    pub size: [f64; 2],
    /// Number of inlier points supporting the detection
    pub inlier_count: u32,
    /// Detection confidence (0.0 to 1.0)
    pub confidence: f32,
    /// Classification ("floor", "wall", "table", ...)
    pub plane_type: [u8; 16],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl PlaneDetection {
    pub fn new(coefficients: [f64; 4], center: Point3, normal: Vector3) -> Self {
        Self {
            coefficients,
            center,
            normal,
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    pub fn set_plane_type(&mut self, plane_type: &str) {
        write_fixed_str(&mut self.plane_type, plane_type);
    }

    pub fn plane_type_str(&self) -> String {
        read_fixed_str(&self.plane_type)
    }

    /// Unsigned distance from `point` to the plane.
    pub fn distance_to(&self, point: &Point3) -> f64 {
        let [a, b, c, d] = self.coefficients;
        let norm = (a * a + b * b + c * c).sqrt();
        if norm == 0.0 {
            return f64::INFINITY;
        }
        (a * point.x + b * point.y + c * point.z + d).abs() / norm
    }

    /// Whether the plane is roughly horizontal (floor/table-like).
    pub fn is_horizontal(&self) -> bool {
        self.normal.z.abs() > 0.9
    }

    pub fn is_valid(&self) -> bool {
        self.coefficients.iter().all(|v| v.is_finite())
            && self.center.is_valid()
            && self.normal.is_valid()
            && self.confidence.is_finite()
    }
}

/// Batch of plane detections
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlaneArray {
    /// Planes (max 16)
    #[serde(with = "serde_arrays")]
    pub planes: [PlaneDetection; 16],
    /// Number of valid planes
    pub count: u8,
    pub _pad0: [u8; 7],
    /// Source sensor frame
    pub frame_id: [u8; 32],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for PlaneArray {
    fn default() -> Self {
        Self {
            planes: [PlaneDetection::default(); 16],
            count: 0,
            _pad0: [0; 7],
            frame_id: [0; 32],
            timestamp: 0,
        }
    }
}

impl PlaneArray {
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    pub fn add(&mut self, plane: PlaneDetection) -> Result<(), &'static str> {
        if (self.count as usize) >= self.planes.len() {
            return Err("plane array full");
        }
        self.planes[self.count as usize] = plane;
        self.count += 1;
        Ok(())
    }

    pub fn get(&self) -> &[PlaneDetection] {
        &self.planes[..self.count as usize]
    }

    pub fn is_valid(&self) -> bool {
        (self.count as usize) <= self.planes.len() && self.get().iter().all(|p| p.is_valid())
    }
}

impl LogSummary for PlaneArray {
    fn log_summary(&self) -> String {
        format!("PlaneArray({} planes)", self.count)
    }
}

impl_pod_message!(
    PointField,
    PointCloud,
    DepthImage,
    BoundingBox3D,
    BoundingBoxArray3D,
    PlaneDetection,
    PlaneArray,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_xyz_round_trip() {
        let points = vec![
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(-1.0, 0.5, 2.25),
        ];
        let cloud = PointCloud::create_xyz(&points);
        assert_eq!(cloud.point_count(), 2);

        let back = cloud.xyz_points();
        assert_eq!(back.len(), 2);
        assert!((back[0].x - 1.0).abs() < 1e-6);
        assert!((back[1].z - 2.25).abs() < 1e-6);
        assert!(cloud.is_valid());
    }

    #[test]
    fn test_depth_image_valid_band() {
        let mut img = DepthImage::new_boxed();
        assert!(img.set_data(4, 4, &[500u16; 16]));
        assert!(img.is_valid_depth(500));
        assert!(!img.is_valid_depth(0));
        assert!(!img.is_valid_depth(100)); // below 20 cm default
        assert!(!img.is_valid_depth(20_000)); // beyond 10 m default
    }

    #[test]
    fn test_depth_back_projection() {
        let mut img = DepthImage::new_boxed();
        assert!(img.set_data(2, 2, &[1000u16; 4]));

        // fx = fy = 1000, principal point at the origin pixel.
        let cloud = img.to_point_cloud(1000.0, 1000.0, 0.0, 0.0);
        let points = cloud.xyz_points();
        assert_eq!(points.len(), 4);
        // Pixel (0,0) back-projects straight down the optical axis at 1 m.
        assert!((points[0].x - 0.0).abs() < 1e-6);
        assert!((points[0].z - 1.0).abs() < 1e-6);
        // Pixel (1,0): x = (1 − 0) · 1.0 / 1000.
        assert!((points[1].x - 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_bbox3d_contains_and_volume() {
        let bbox = BoundingBox3D::new(
            Point3::new(0.0, 0.0, 1.0),
            Vector3::new(2.0, 2.0, 2.0),
            "crate",
            0.9,
        );
        assert!(bbox.contains(&Point3::new(0.5, -0.5, 1.5)));
        assert!(!bbox.contains(&Point3::new(2.0, 0.0, 1.0)));
        assert!((bbox.volume() - 8.0).abs() < 1e-9);
        assert_eq!(bbox.corners().len(), 8);
        assert_eq!(bbox.label_str(), "crate");
    }

    #[test]
    fn test_bbox_array_confidence_filter() {
        let mut arr = BoundingBoxArray3D::new();
        for conf in [0.3f32, 0.6, 0.9] {
            arr.add(BoundingBox3D::new(
                Point3::origin(),
                Vector3::new(1.0, 1.0, 1.0),
                "obj",
                conf,
            ))
            .unwrap();
        }
        assert_eq!(arr.filter_by_confidence(0.5).len(), 2);
    }

    #[test]
    fn test_plane_distance() {
        // z = 0 plane.
        let plane = PlaneDetection::new(
            [0.0, 0.0, 1.0, 0.0],
            Point3::origin(),
            Vector3::new(0.0, 0.0, 1.0),
        );
        assert!((plane.distance_to(&Point3::new(5.0, 5.0, 2.0)) - 2.0).abs() < 1e-9);
        assert!(plane.is_horizontal());
    }

    #[test]
    fn test_plane_array_capacity() {
        let mut arr = PlaneArray::new();
        for _ in 0..16 {
            arr.add(PlaneDetection::default()).unwrap();
        }
        assert!(arr.add(PlaneDetection::default()).is_err());
    }

    #[test]
    fn test_layout_is_frozen() {
        assert_eq!(std::mem::size_of::<PointField>(), 28);
        assert_eq!(std::mem::size_of::<PointCloud>(), 2_097_664);
        assert_eq!(std::mem::size_of::<DepthImage>(), 2_457_656);
        assert_eq!(std::mem::size_of::<BoundingBox3D>(), 96);
        assert_eq!(std::mem::size_of::<BoundingBoxArray3D>(), 3120);
        assert_eq!(std::mem::size_of::<PlaneDetection>(), 128);
        assert_eq!(std::mem::size_of::<PlaneArray>(), 2096);
    }
}
