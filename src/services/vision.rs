//! Classical image primitives shared by frame detection and photo placement.

use image::{DynamicImage, GrayImage, ImageReader};
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::point::Point;
use std::path::Path;

use crate::models::BoundingBox;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Decode a staged upload, sniffing the format from the file contents
/// rather than trusting the extension.
pub fn decode_image(path: &Path) -> Result<DynamicImage, BoxedError> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(img)
}

/// Outer-border contours of a binary edge map. Holes are skipped; a frame
/// candidate is the outline itself, not its interior structure.
pub fn external_contours(edges: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer))
        .collect()
}

/// Axis-aligned bounding rectangle of a contour, with inclusive pixel
/// extents (a single point has w = h = 1).
pub fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut max_x) = (first.x, first.x);
    let (mut min_y, mut max_y) = (first.y, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox {
        x: min_x,
        y: min_y,
        w: max_x - min_x + 1,
        h: max_y - min_y + 1,
    })
}

/// Enclosed area of a contour polygon via the shoelace formula. Contours
/// with fewer than three points enclose nothing.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice_area.abs() as f64 / 2.0
}
