//! Photo placement: find the photo's dominant content region and fit it
//! inside the chosen frame, preserving aspect ratio.

use std::cmp::Ordering;

use image::DynamicImage;
use imageproc::edges::canny;

use crate::constants::{PHOTO_CANNY_HIGH, PHOTO_CANNY_LOW};
use crate::models::{BoundingBox, PlacementResponse, TargetBox};
use crate::services::vision;
use crate::storage::TempUpload;

/// Failures of the placement computation. Each maps to the message the
/// plugin shows the user; none of them maps to a non-2xx status.
#[derive(Debug)]
pub enum PlacementError {
    UnreadablePhoto,
    MissingPhoto,
    InvalidFrameBox(String),
    Upload(String),
}

impl std::fmt::Display for PlacementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementError::UnreadablePhoto => write!(f, "Failed to read uploaded photo."),
            PlacementError::MissingPhoto => write!(f, "No photo field in request"),
            PlacementError::InvalidFrameBox(s) => write!(f, "Invalid frame_box: {}", s),
            PlacementError::Upload(s) => write!(f, "Upload error: {}", s),
        }
    }
}

impl std::error::Error for PlacementError {}

/// Compute where `photo` should be drawn inside `frame`.
pub async fn place(
    frame: BoundingBox,
    photo: &[u8],
) -> Result<PlacementResponse, PlacementError> {
    let upload = TempUpload::write("photo", "png", photo)
        .await
        .map_err(|e| PlacementError::Upload(e.to_string()))?;
    let img = vision::decode_image(upload.path()).map_err(|_| PlacementError::UnreadablePhoto)?;

    let content = content_box(&img);
    let target_box = compute_target(&frame, content.as_ref());

    println!(
        "[placement] left:{} top:{} right:{} bottom:{}",
        target_box.left, target_box.top, target_box.right, target_box.bottom
    );
    Ok(PlacementResponse {
        target_box,
        rotation: 0,
    })
}

/// Bounding rect of the photo's dominant content: the external contour with
/// the largest enclosed area. No blur here; faint detail is the signal.
fn content_box(img: &DynamicImage) -> Option<BoundingBox> {
    let gray = img.to_luma8();
    let edges = canny(&gray, PHOTO_CANNY_LOW, PHOTO_CANNY_HIGH);
    let contours = vision::external_contours(&edges);
    let largest = contours.iter().max_by(|a, b| {
        vision::contour_area(&a.points)
            .partial_cmp(&vision::contour_area(&b.points))
            .unwrap_or(Ordering::Equal)
    })?;
    vision::bounding_rect(&largest.points)
}

/// Aspect-fit `content` into `frame` and center it. With no content box the
/// frame itself is the target.
pub fn compute_target(frame: &BoundingBox, content: Option<&BoundingBox>) -> TargetBox {
    let Some(content) = content else {
        return TargetBox {
            left: frame.x,
            top: frame.y,
            right: frame.x + frame.w,
            bottom: frame.y + frame.h,
        };
    };

    let photo_aspect = if content.h != 0 {
        content.w as f64 / content.h as f64
    } else {
        1.0
    };
    let frame_aspect = if frame.h != 0 {
        frame.w as f64 / frame.h as f64
    } else {
        1.0
    };

    let (new_w, new_h) = if photo_aspect > frame_aspect {
        (frame.w, (frame.w as f64 / photo_aspect).floor() as i32)
    } else {
        ((frame.h as f64 * photo_aspect).floor() as i32, frame.h)
    };

    let left = frame.x + (frame.w - new_w) / 2;
    let top = frame.y + (frame.h - new_h) / 2;
    TargetBox {
        left,
        top,
        right: left + new_w,
        bottom: top + new_h,
    }
}
