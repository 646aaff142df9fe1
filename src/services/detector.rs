//! Frame-region detection: a pretrained ONNX detector when one is
//! available, with a classical contour heuristic as fallback.
//!
//! The model is loaded once at startup. A missing file or a failed load is
//! reported and leaves the detector running on the fallback alone; the API
//! contract is identical either way.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use image::imageops::FilterType;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use crate::constants::{
    FALLBACK_BLUR_SIGMA, FALLBACK_CANNY_HIGH, FALLBACK_CANNY_LOW, MIN_FRAME_EDGE,
    MODEL_CONF_THRESHOLD, MODEL_INPUT_SIZE, MODEL_NMS_IOU,
};
use crate::models::{BoundingBox, DetectionResult, ImageSize};
use crate::services::vision;
use crate::storage::TempUpload;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

pub struct FrameDetector {
    // Inference is serialized through the mutex; all other request state is
    // local, so this is the only synchronization in the service.
    session: Option<Mutex<Session>>,
}

impl FrameDetector {
    /// Try to load the ONNX model at `model_path`. Absence or a load
    /// failure is not fatal: the detector degrades to contours only.
    pub fn load(model_path: &str) -> Self {
        if !Path::new(model_path).exists() {
            println!(
                "[detector] No model at {}, running contour fallback only",
                model_path
            );
            return Self { session: None };
        }
        match build_session(model_path) {
            Ok(session) => {
                println!("[detector] Loaded ONNX model from {}", model_path);
                Self {
                    session: Some(Mutex::new(session)),
                }
            }
            Err(e) => {
                eprintln!("[detector] Failed to load model {}: {}", model_path, e);
                Self { session: None }
            }
        }
    }

    pub fn has_model(&self) -> bool {
        self.session.is_some()
    }

    /// Detect frame regions in raw image bytes. Never fails: an upload that
    /// cannot be decoded yields an empty box list and a zero image size.
    pub async fn detect(&self, bytes: &[u8]) -> DetectionResult {
        let upload = match TempUpload::write("detect", "png", bytes).await {
            Ok(upload) => upload,
            Err(e) => {
                eprintln!("[detector] Failed to stage upload: {}", e);
                return DetectionResult::empty();
            }
        };
        let img = match vision::decode_image(upload.path()) {
            Ok(img) => img,
            Err(e) => {
                eprintln!("[detector] Could not read uploaded image: {}", e);
                return DetectionResult::empty();
            }
        };
        let image_size = ImageSize {
            width: img.width(),
            height: img.height(),
        };

        let mut boxes = Vec::new();
        if let Some(session) = &self.session {
            match run_model(session, &img) {
                Ok(found) => {
                    boxes = found;
                    if !boxes.is_empty() {
                        println!("[detector] Model detected {} frames", boxes.len());
                    }
                }
                Err(e) => eprintln!("[detector] Model inference failed: {}", e),
            }
        }

        // The model path and the fallback never both contribute boxes.
        if boxes.is_empty() {
            boxes = contour_fallback(&img);
            println!(
                "[detector] Contour fallback found {} candidate frames",
                boxes.len()
            );
        }

        DetectionResult { boxes, image_size }
    }
}

fn build_session(model_path: &str) -> Result<Session, BoxedError> {
    Ok(Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(model_path)?)
}

/// Candidate detection in float pixel coordinates of the original image,
/// pre-NMS.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
}

impl Candidate {
    fn iou(&self, other: &Candidate) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        let area = |c: &Candidate| (c.x2 - c.x1) * (c.y2 - c.y1);
        inter / (area(self) + area(other) - inter)
    }
}

fn run_model(session: &Mutex<Session>, img: &DynamicImage) -> Result<Vec<BoundingBox>, BoxedError> {
    let input = preprocess(img)?;

    let mut session = session
        .lock()
        .map_err(|_| "detector session lock poisoned")?;
    let outputs = session.run(ort::inputs![input])?;

    let value = outputs
        .get("output0")
        .or_else(|| outputs.get("output"))
        .or_else(|| outputs.iter().next().map(|(_, v)| v))
        .ok_or("model produced no outputs")?;
    let (shape, data) = value.try_extract_tensor::<f32>()?;

    decode_output(shape, data, img.width(), img.height())
}

/// Resize to the model's square input, normalize to [0, 1], emit an NCHW
/// f32 tensor.
fn preprocess(img: &DynamicImage) -> Result<ort::value::DynValue, BoxedError> {
    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(
        &rgb,
        MODEL_INPUT_SIZE,
        MODEL_INPUT_SIZE,
        FilterType::Triangle,
    );
    let raw = resized.as_raw();

    let size = (MODEL_INPUT_SIZE * MODEL_INPUT_SIZE) as usize;
    let mut tensor_data = vec![0f32; 3 * size];
    for idx in 0..size {
        tensor_data[idx] = raw[idx * 3] as f32 / 255.0;
        tensor_data[size + idx] = raw[idx * 3 + 1] as f32 / 255.0;
        tensor_data[2 * size + idx] = raw[idx * 3 + 2] as f32 / 255.0;
    }

    let shape = [1usize, 3, MODEL_INPUT_SIZE as usize, MODEL_INPUT_SIZE as usize];
    Ok(Tensor::from_array((shape, tensor_data.into_boxed_slice()))?.into_dyn())
}

/// Walk a YOLO-style `[1, 4 + classes, proposals]` output: keep proposals
/// whose best class score clears the confidence threshold, map the
/// center-format boxes back to original pixels, suppress overlaps, and
/// truncate corners to integers.
fn decode_output(
    shape: &[i64],
    data: &[f32],
    width: u32,
    height: u32,
) -> Result<Vec<BoundingBox>, BoxedError> {
    if shape.len() != 3 || shape[1] < 5 {
        return Err(format!("unexpected model output shape {:?}", shape).into());
    }
    let attrs = shape[1] as usize;
    let proposals = shape[2] as usize;
    let classes = attrs - 4;
    if data.len() < attrs * proposals {
        return Err(format!(
            "model output carries {} values, expected {}",
            data.len(),
            attrs * proposals
        )
        .into());
    }

    let scale_x = width as f32 / MODEL_INPUT_SIZE as f32;
    let scale_y = height as f32 / MODEL_INPUT_SIZE as f32;

    let mut candidates = Vec::new();
    for i in 0..proposals {
        // Layout: rows 0..4 are cx, cy, w, h; the rest are class scores.
        let cx = data[i];
        let cy = data[proposals + i];
        let w = data[2 * proposals + i];
        let h = data[3 * proposals + i];

        let mut score = 0f32;
        for c in 0..classes {
            score = score.max(data[(4 + c) * proposals + i]);
        }
        if score < MODEL_CONF_THRESHOLD {
            continue;
        }

        candidates.push(Candidate {
            x1: ((cx - w / 2.0) * scale_x).max(0.0),
            y1: ((cy - h / 2.0) * scale_y).max(0.0),
            x2: ((cx + w / 2.0) * scale_x).min(width as f32),
            y2: ((cy + h / 2.0) * scale_y).min(height as f32),
            score,
        });
    }

    let boxes = nms(candidates, MODEL_NMS_IOU)
        .into_iter()
        .map(|c| BoundingBox {
            x: c.x1 as i32,
            y: c.y1 as i32,
            w: (c.x2 - c.x1) as i32,
            h: (c.y2 - c.y1) as i32,
        })
        .filter(|b| b.w > 0 && b.h > 0)
        .collect();
    Ok(boxes)
}

/// Greedy NMS: sort by score descending, suppress overlapping boxes.
fn nms(mut candidates: Vec<Candidate>, iou_thresh: f32) -> Vec<Candidate> {
    candidates.sort_unstable_by(|a, b| {
        b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    let mut suppressed = vec![false; candidates.len()];
    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        kept.push(candidates[i]);
        for j in (i + 1)..candidates.len() {
            if candidates[i].iou(&candidates[j]) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    kept
}

/// Classical detection: blur, Canny, external contours, then keep bounding
/// rects that are plausibly frames rather than noise or the page itself.
fn contour_fallback(img: &DynamicImage) -> Vec<BoundingBox> {
    let gray = img.to_luma8();
    let blurred = gaussian_blur_f32(&gray, FALLBACK_BLUR_SIGMA);
    let edges = canny(&blurred, FALLBACK_CANNY_LOW, FALLBACK_CANNY_HIGH);

    vision::external_contours(&edges)
        .iter()
        .filter_map(|contour| vision::bounding_rect(&contour.points))
        .filter(|rect| is_candidate_frame(rect, img.width(), img.height()))
        .collect()
}

fn is_candidate_frame(rect: &BoundingBox, image_width: u32, image_height: u32) -> bool {
    rect.w > MIN_FRAME_EDGE
        && rect.h > MIN_FRAME_EDGE
        && (rect.w as i64) < image_width as i64
        && (rect.h as i64) < image_height as i64
}
