//! Wire types for the detection and placement endpoints.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FRAME_SIZE;

/// Axis-aligned rectangle in pixel coordinates: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Dimensions of the decoded image. Zero only when decoding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Response body for `/detect_frames`. Box order is whatever the model or
/// contour scan produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub boxes: Vec<BoundingBox>,
    pub image_size: ImageSize,
}

impl DetectionResult {
    /// The response shape for an upload that could not be decoded.
    pub fn empty() -> Self {
        Self {
            boxes: Vec::new(),
            image_size: ImageSize {
                width: 0,
                height: 0,
            },
        }
    }
}

/// Absolute pixel rectangle where the photo should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Success body for `/fit_photo`. Rotation is reserved and always 0.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementResponse {
    pub target_box: TargetBox,
    pub rotation: i32,
}

/// Failure body for `/fit_photo`, returned with HTTP 200.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// The `frame_box` form field as sent by the plugin. Fields the client
/// omits (or sends as null) take defaults at `resolve()`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FrameSpec {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub w: Option<i32>,
    pub h: Option<i32>,
}

impl FrameSpec {
    /// Apply defaults: origin 0,0 and a 500x500 frame.
    pub fn resolve(&self) -> BoundingBox {
        BoundingBox {
            x: self.x.unwrap_or(0),
            y: self.y.unwrap_or(0),
            w: self.w.unwrap_or(DEFAULT_FRAME_SIZE),
            h: self.h.unwrap_or(DEFAULT_FRAME_SIZE),
        }
    }
}
