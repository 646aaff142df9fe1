//! POST /detect_frames - locate frame regions in an uploaded preview image.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    routing::post,
};
use std::sync::Arc;

use crate::AppState;
use crate::models::DetectionResult;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/detect_frames", post(detect_frames))
}

async fn detect_frames(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Json<DetectionResult> {
    let Some(bytes) = read_file_field(multipart).await else {
        eprintln!("[detect_frames] No readable file field in request");
        return Json(DetectionResult::empty());
    };
    Json(state.detector.detect(&bytes).await)
}

/// Pull the `file` field's bytes out of the multipart body. A missing field
/// or a multipart read error both surface as "no file"; the caller reports
/// the empty result either way.
async fn read_file_field(mut multipart: Multipart) -> Option<bytes::Bytes> {
    while let Some(field) = multipart.next_field().await.ok()? {
        if field.name() == Some("file") {
            return field.bytes().await.ok();
        }
    }
    None
}
