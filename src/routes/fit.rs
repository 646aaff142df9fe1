//! POST /fit_photo - compute photo placement inside a chosen frame.

use axum::{
    Json, Router,
    extract::Multipart,
    response::{IntoResponse, Response},
    routing::post,
};
use std::sync::Arc;

use crate::AppState;
use crate::models::{BoundingBox, ErrorResponse, FrameSpec, PlacementResponse};
use crate::services::placement::{self, PlacementError};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/fit_photo", post(fit_photo))
}

/// Failures are reported as a 200 `{"error": ...}` payload; the plugin
/// keys off the error field, not the status code.
async fn fit_photo(multipart: Multipart) -> Response {
    match run(multipart).await {
        Ok(placement) => Json(placement).into_response(),
        Err(e) => {
            eprintln!("[fit_photo] {}", e);
            Json(ErrorResponse {
                error: e.to_string(),
            })
            .into_response()
        }
    }
}

async fn run(mut multipart: Multipart) -> Result<PlacementResponse, PlacementError> {
    let mut frame_box_raw: Option<String> = None;
    let mut photo: Option<bytes::Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PlacementError::Upload(e.to_string()))?
    {
        match field.name() {
            Some("frame_box") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| PlacementError::Upload(e.to_string()))?;
                frame_box_raw = Some(text);
            }
            Some("photo") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| PlacementError::Upload(e.to_string()))?;
                photo = Some(bytes);
            }
            _ => {}
        }
    }

    let frame = parse_frame_box(frame_box_raw.as_deref())?;
    let photo = photo.ok_or(PlacementError::MissingPhoto)?;
    placement::place(frame, &photo).await
}

/// An absent or empty frame_box means "use the defaults"; JSON that fails
/// to parse is an error surfaced to the caller.
fn parse_frame_box(raw: Option<&str>) -> Result<BoundingBox, PlacementError> {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Ok(FrameSpec::default().resolve());
    }
    let spec: FrameSpec =
        serde_json::from_str(raw).map_err(|e| PlacementError::InvalidFrameBox(e.to_string()))?;
    Ok(spec.resolve())
}
