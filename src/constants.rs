//! Application constants
//!
//! The pipeline numbers are tuned values carried over from the trained
//! detector's deployment; treat them as knobs, not derived quantities.

/// Confidence threshold for model detections
pub const MODEL_CONF_THRESHOLD: f32 = 0.25;

/// Square input edge length the detection model expects
pub const MODEL_INPUT_SIZE: u32 = 640;

/// IoU threshold for non-maximum suppression over model detections
pub const MODEL_NMS_IOU: f32 = 0.45;

/// Gaussian blur sigma for the contour fallback (the sigma of a 5x5 kernel)
pub const FALLBACK_BLUR_SIGMA: f32 = 1.1;

/// Canny hysteresis thresholds for the frame-detection fallback
pub const FALLBACK_CANNY_LOW: f32 = 50.0;
pub const FALLBACK_CANNY_HIGH: f32 = 150.0;

/// Canny hysteresis thresholds for photo content detection
pub const PHOTO_CANNY_LOW: f32 = 30.0;
pub const PHOTO_CANNY_HIGH: f32 = 100.0;

/// Candidate frame rectangles must be strictly wider and taller than this,
/// and strictly smaller than the image in both dimensions
pub const MIN_FRAME_EDGE: i32 = 100;

/// Frame edge length used when the client omits w or h
pub const DEFAULT_FRAME_SIZE: i32 = 500;

/// Maximum upload size for preview images and photos (50 MB)
pub const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;
