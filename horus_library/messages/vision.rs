use horus_core::core::LogSummary;
use horus_macros::LogSummary;
// Vision message types for robotics
//
// Camera images, calibration data, and 2D detections. The image records
// carry their pixel payload inline (fixed capacity) so a whole frame is a
// single POD record.

use horus_core::time::timestamp_now;
use serde::{Deserialize, Serialize};

use crate::messages::{impl_pod_message, read_fixed_str, write_fixed_str};

/// Maximum inline pixel payload of an [`Image`].
pub const IMAGE_MAX_DATA: usize = 2 * 1024 * 1024;
/// Maximum inline payload of a [`CompressedImage`].
pub const COMPRESSED_IMAGE_MAX_DATA: usize = 512 * 1024;

/// Raw camera image with inline pixel data
///
/// Construct on the heap with [`Image::new_boxed`]; at two mebibytes of
/// inline payload a stack temporary is a stack overflow waiting to happen.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Image {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Pixel encoding (see `ENCODING_*`)
    pub encoding: u8,
    pub _pad0: [u8; 3],
    /// Bytes per row (may include row padding)
    pub step: u32,
    /// Actual data length in bytes
    pub data_len: u32,
    /// Pixel data, row-major
    pub data: [u8; IMAGE_MAX_DATA],
    /// Camera identifier
    pub frame_id: [u8; 32],
    pub _pad1: [u8; 4],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Image {
    pub const ENCODING_MONO8: u8 = 0;
    pub const ENCODING_RGB8: u8 = 1;
    pub const ENCODING_BGR8: u8 = 2;
    pub const ENCODING_RGBA8: u8 = 3;
    pub const ENCODING_BGRA8: u8 = 4;
    pub const ENCODING_MONO16: u8 = 5;
    pub const ENCODING_YUYV: u8 = 6;
    pub const ENCODING_MONO32F: u8 = 7;
    pub const ENCODING_RGB32F: u8 = 8;

    /// Bytes per pixel for an encoding, 0 if the encoding is unknown.
    pub fn bytes_per_pixel(encoding: u8) -> u32 {
        match encoding {
            Self::ENCODING_MONO8 => 1,
            Self::ENCODING_RGB8 | Self::ENCODING_BGR8 => 3,
            Self::ENCODING_RGBA8 | Self::ENCODING_BGRA8 => 4,
            Self::ENCODING_MONO16 | Self::ENCODING_YUYV => 2,
            Self::ENCODING_MONO32F => 4,
            Self::ENCODING_RGB32F => 12,
            _ => 0,
        }
    }

    /// Allocate a zeroed image on the heap with the current timestamp.
    pub fn new_boxed() -> Box<Self> {
        let mut img: Box<Self> = bytemuck::zeroed_box();
        img.timestamp = timestamp_now();
        img
    }

    /// Fill in dimensions and pixel data. Fails if `pixels` exceeds the
    /// inline capacity or does not match `w × h` at the encoding's depth.
    pub fn set_data(&mut self, w: u32, h: u32, encoding: u8, pixels: &[u8]) -> bool {
        let bpp = Self::bytes_per_pixel(encoding);
        if bpp == 0 || pixels.len() > IMAGE_MAX_DATA {
            return false;
        }
        if (w as usize) * (h as usize) * (bpp as usize) != pixels.len() {
            return false;
        }
        self.width = w;
        self.height = h;
        self.encoding = encoding;
        self.step = w * bpp;
        self.data_len = pixels.len() as u32;
        self.data[..pixels.len()].copy_from_slice(pixels);
        self.timestamp = timestamp_now();
        true
    }

    /// The valid portion of the pixel payload.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.data_len.min(IMAGE_MAX_DATA as u32) as usize]
    }

    /// Pixel bytes at `(x, y)`, `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = Self::bytes_per_pixel(self.encoding) as usize;
        let offset = (y as usize) * (self.step as usize) + (x as usize) * bpp;
        self.data.get(offset..offset + bpp)
    }

    pub fn set_frame_id(&mut self, frame: &str) {
        write_fixed_str(&mut self.frame_id, frame);
    }

    pub fn frame_id_str(&self) -> String {
        read_fixed_str(&self.frame_id)
    }

    pub fn is_valid(&self) -> bool {
        let bpp = Self::bytes_per_pixel(self.encoding);
        bpp != 0
            && (self.data_len as usize) <= IMAGE_MAX_DATA
            && (self.width as u64) * (self.height as u64) * (bpp as u64) == self.data_len as u64
    }
}

impl LogSummary for Image {
    fn log_summary(&self) -> String {
        format!(
            "Image({}x{}, enc={}, {} B)",
            self.width, self.height, self.encoding, self.data_len
        )
    }
}

/// Compressed camera image (JPEG/PNG/WebP payload)
///
/// Construct on the heap with [`CompressedImage::new_boxed`].
#[repr(C)]
#[derive(Clone, Copy)]
pub struct CompressedImage {
    /// Compression format ("jpeg", "png", "webp")
    pub format: [u8; 8],
    /// Original image width (if known)
    pub width: u32,
    /// Original image height (if known)
    pub height: u32,
    /// Actual compressed data length
    pub data_len: u32,
    /// Compressed payload
    pub data: [u8; COMPRESSED_IMAGE_MAX_DATA],
    /// Camera identifier
    pub frame_id: [u8; 32],
    pub _pad0: [u8; 4],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl CompressedImage {
    /// Allocate a zeroed record on the heap with the current timestamp.
    pub fn new_boxed() -> Box<Self> {
        let mut img: Box<Self> = bytemuck::zeroed_box();
        img.timestamp = timestamp_now();
        img
    }

    /// Store a compressed payload. Fails when it exceeds capacity.
    pub fn set_data(&mut self, format: &str, payload: &[u8]) -> bool {
        if payload.len() > COMPRESSED_IMAGE_MAX_DATA {
            return false;
        }
        write_fixed_str(&mut self.format, format);
        self.data_len = payload.len() as u32;
        self.data[..payload.len()].copy_from_slice(payload);
        self.timestamp = timestamp_now();
        true
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.data_len.min(COMPRESSED_IMAGE_MAX_DATA as u32) as usize]
    }

    pub fn format_str(&self) -> String {
        read_fixed_str(&self.format)
    }

    pub fn is_valid(&self) -> bool {
        (self.data_len as usize) <= COMPRESSED_IMAGE_MAX_DATA
    }
}

impl LogSummary for CompressedImage {
    fn log_summary(&self) -> String {
        format!("CompressedImage({}, {} B)", self.format_str(), self.data_len)
    }
}

/// Camera intrinsic calibration
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, LogSummary)]
pub struct CameraInfo {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Distortion model ("plumb_bob", "rational_polynomial")
    pub distortion_model: [u8; 16],
    /// Distortion coefficients [k1, k2, p1, p2, k3, k4, k5, k6]
    pub distortion_coefficients: [f64; 8],
    /// 3x3 intrinsic matrix (row-major)
    pub camera_matrix: [f64; 9],
    /// 3x3 rectification matrix
    pub rectification_matrix: [f64; 9],
    /// 3x4 projection matrix
    #[serde(with = "serde_arrays")]
    pub projection_matrix: [f64; 12],
    /// Camera identifier
    pub frame_id: [u8; 32],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for CameraInfo {
    fn default() -> Self {
        let mut info = Self {
            width: 0,
            height: 0,
            distortion_model: [0; 16],
            distortion_coefficients: [0.0; 8],
            camera_matrix: [0.0; 9],
            rectification_matrix: [0.0; 9],
            projection_matrix: [0.0; 12],
            frame_id: [0; 32],
            timestamp: 0,
        };
        // Identity rectification.
        info.rectification_matrix[0] = 1.0;
        info.rectification_matrix[4] = 1.0;
        info.rectification_matrix[8] = 1.0;
        info
    }
}

impl CameraInfo {
    /// Build a pinhole calibration from focal lengths and principal point.
    pub fn with_intrinsics(w: u32, h: u32, fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        let mut info = Self {
            width: w,
            height: h,
            timestamp: timestamp_now(),
            ..Self::default()
        };
        write_fixed_str(&mut info.distortion_model, "plumb_bob");
        info.camera_matrix[0] = fx;
        info.camera_matrix[2] = cx;
        info.camera_matrix[4] = fy;
        info.camera_matrix[5] = cy;
        info.camera_matrix[8] = 1.0;
        info.projection_matrix[0] = fx;
        info.projection_matrix[2] = cx;
        info.projection_matrix[5] = fy;
        info.projection_matrix[6] = cy;
        info.projection_matrix[10] = 1.0;
        info
    }

    pub fn fx(&self) -> f64 {
        self.camera_matrix[0]
    }

    pub fn fy(&self) -> f64 {
        self.camera_matrix[4]
    }

    pub fn cx(&self) -> f64 {
        self.camera_matrix[2]
    }

    pub fn cy(&self) -> f64 {
        self.camera_matrix[5]
    }

    pub fn is_valid(&self) -> bool {
        self.camera_matrix.iter().all(|v| v.is_finite())
            && self.distortion_coefficients.iter().all(|v| v.is_finite())
            && self.projection_matrix.iter().all(|v| v.is_finite())
    }
}

/// Rectangular region of interest within an image
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, LogSummary)]
pub struct RegionOfInterest {
    pub x_offset: u32,
    pub y_offset: u32,
    pub width: u32,
    pub height: u32,
    /// Whether the region should be rectified (0/1)
    pub do_rectify: u8,
    pub _pad0: [u8; 3],
}

impl RegionOfInterest {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x_offset: x,
            y_offset: y,
            width,
            height,
            do_rectify: 0,
            _pad0: [0; 3],
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether this region fits inside a `width × height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x_offset.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y_offset.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Stereo camera pair calibration
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct StereoInfo {
    /// Left camera calibration
    pub left_camera: CameraInfo,
    /// Right camera calibration
    pub right_camera: CameraInfo,
    /// Distance between cameras in meters
    pub baseline: f64,
    /// Depth scale factor
    pub depth_scale: f64,
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl StereoInfo {
    pub fn new(left: CameraInfo, right: CameraInfo, baseline: f64) -> Self {
        Self {
            left_camera: left,
            right_camera: right,
            baseline,
            depth_scale: 1.0,
            timestamp: timestamp_now(),
        }
    }

    /// Disparity-to-depth conversion: `depth = fx · baseline / disparity`.
    pub fn depth_from_disparity(&self, disparity: f64) -> Option<f64> {
        if disparity <= 0.0 {
            return None;
        }
        Some(self.left_camera.fx() * self.baseline / disparity)
    }

    pub fn is_valid(&self) -> bool {
        self.left_camera.is_valid()
            && self.right_camera.is_valid()
            && self.baseline.is_finite()
            && self.baseline > 0.0
    }
}

/// Axis-aligned 2D bounding box in pixel coordinates
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default, LogSummary)]
pub struct BoundingBox2D {
    /// Top-left x in pixels
    pub x: f32,
    /// Top-left y in pixels
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox2D {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Intersection-over-union with another box.
    pub fn iou(&self, other: &BoundingBox2D) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);
        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }
        let inter = (x2 - x1) * (y2 - y1);
        inter / (self.area() + other.area() - inter)
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// Single 2D object detection
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, LogSummary)]
pub struct Detection {
    /// Bounding box in pixel coordinates
    pub bbox: BoundingBox2D,
    /// Detection confidence (0.0 to 1.0)
    pub confidence: f32,
    /// Class ID from the detector
    pub class_id: u32,
    /// Class label (null-terminated)
    pub class_name: [u8; 32],
    /// Tracking instance ID
    pub instance_id: u32,
    pub _pad0: [u8; 4],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Detection {
    pub fn new(bbox: BoundingBox2D, class_name: &str, confidence: f32) -> Self {
        let mut det = Self {
            bbox,
            confidence,
            timestamp: timestamp_now(),
            ..Self::default()
        };
        write_fixed_str(&mut det.class_name, class_name);
        det
    }

    pub fn class_name_str(&self) -> String {
        read_fixed_str(&self.class_name)
    }

    pub fn is_valid(&self) -> bool {
        self.bbox.is_valid() && self.confidence.is_finite() && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Batch of detections from one frame
#[repr(C)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionArray {
    /// Detections (max 32)
    #[serde(with = "serde_arrays")]
    pub detections: [Detection; 32],
    /// Number of valid detections
    pub count: u8,
    pub _pad0: [u8; 7],
    /// Source camera frame
    pub frame_id: [u8; 32],
    /// Timestamp in nanoseconds since epoch
    pub timestamp: u64,
}

impl Default for DetectionArray {
    fn default() -> Self {
        Self {
            detections: [Detection::default(); 32],
            count: 0,
            _pad0: [0; 7],
            frame_id: [0; 32],
            timestamp: 0,
        }
    }
}

impl DetectionArray {
    pub fn new() -> Self {
        Self {
            timestamp: timestamp_now(),
            ..Self::default()
        }
    }

    /// Append a detection, failing when the array is full.
    pub fn add(&mut self, detection: Detection) -> Result<(), &'static str> {
        if (self.count as usize) >= self.detections.len() {
            return Err("detection array full");
        }
        self.detections[self.count as usize] = detection;
        self.count += 1;
        Ok(())
    }

    /// The valid detections.
    pub fn get(&self) -> &[Detection] {
        &self.detections[..self.count as usize]
    }

    /// Best detection by confidence, if any.
    pub fn best(&self) -> Option<&Detection> {
        self.get()
            .iter()
            .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap())
    }

    pub fn is_valid(&self) -> bool {
        (self.count as usize) <= self.detections.len()
            && self.get().iter().all(|d| d.is_valid())
    }
}

impl LogSummary for DetectionArray {
    fn log_summary(&self) -> String {
        format!("DetectionArray({} detections)", self.count)
    }
}

impl_pod_message!(
    Image,
    CompressedImage,
    CameraInfo,
    RegionOfInterest,
    StereoInfo,
    BoundingBox2D,
    Detection,
    DetectionArray,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_set_data_checks_dimensions() {
        let mut img = Image::new_boxed();
        let pixels = vec![128u8; 4 * 4 * 3];
        assert!(img.set_data(4, 4, Image::ENCODING_RGB8, &pixels));
        assert!(img.is_valid());
        assert_eq!(img.bytes().len(), 48);
        assert_eq!(img.pixel(0, 0), Some(&[128u8, 128, 128][..]));
        assert_eq!(img.pixel(4, 0), None);

        // Mismatched length is rejected.
        assert!(!img.set_data(4, 4, Image::ENCODING_RGB8, &pixels[..10]));
    }

    #[test]
    fn test_compressed_image_capacity() {
        let mut img = CompressedImage::new_boxed();
        assert!(img.set_data("jpeg", &[0xFF, 0xD8, 0xFF]));
        assert_eq!(img.format_str(), "jpeg");
        assert_eq!(img.bytes(), &[0xFF, 0xD8, 0xFF]);

        let oversized = vec![0u8; COMPRESSED_IMAGE_MAX_DATA + 1];
        assert!(!img.set_data("png", &oversized));
    }

    #[test]
    fn test_camera_info_intrinsics() {
        let info = CameraInfo::with_intrinsics(640, 480, 525.0, 525.0, 320.0, 240.0);
        assert_eq!(info.fx(), 525.0);
        assert_eq!(info.cy(), 240.0);
        assert!(info.is_valid());
    }

    #[test]
    fn test_roi_fits_within() {
        let roi = RegionOfInterest::new(600, 400, 100, 100);
        assert!(roi.fits_within(700, 500));
        assert!(!roi.fits_within(640, 480));
    }

    #[test]
    fn test_stereo_depth_from_disparity() {
        let cam = CameraInfo::with_intrinsics(640, 480, 500.0, 500.0, 320.0, 240.0);
        let stereo = StereoInfo::new(cam, cam, 0.1);
        let depth = stereo.depth_from_disparity(10.0).unwrap();
        assert!((depth - 5.0).abs() < 1e-9);
        assert_eq!(stereo.depth_from_disparity(0.0), None);
    }

    #[test]
    fn test_bbox_iou() {
        let a = BoundingBox2D::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox2D::new(5.0, 5.0, 10.0, 10.0);
        let iou = a.iou(&b);
        assert!((iou - 25.0 / 175.0).abs() < 1e-6);

        let disjoint = BoundingBox2D::new(100.0, 100.0, 5.0, 5.0);
        assert_eq!(a.iou(&disjoint), 0.0);
    }

    #[test]
    fn test_detection_array_fills_up() {
        let mut arr = DetectionArray::new();
        for i in 0..32 {
            let det = Detection::new(
                BoundingBox2D::new(i as f32, 0.0, 1.0, 1.0),
                "person",
                0.5 + (i as f32) * 0.01,
            );
            arr.add(det).unwrap();
        }
        assert!(arr.add(Detection::default()).is_err());
        assert_eq!(arr.get().len(), 32);
        assert!((arr.best().unwrap().confidence - 0.81).abs() < 1e-6);
    }

    #[test]
    fn test_layout_is_frozen() {
        assert_eq!(std::mem::size_of::<Image>(), 2_097_216);
        assert_eq!(std::mem::size_of::<CompressedImage>(), 524_352);
        assert_eq!(std::mem::size_of::<CameraInfo>(), 368);
        assert_eq!(std::mem::size_of::<RegionOfInterest>(), 20);
        assert_eq!(std::mem::size_of::<StereoInfo>(), 760);
        assert_eq!(std::mem::size_of::<Detection>(), 72);
        assert_eq!(std::mem::size_of::<DetectionArray>(), 2352);
    }
}
