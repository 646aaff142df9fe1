//! Endpoint-level tests: drive the router directly with multipart bodies
//! and check the wire contract of both endpoints.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use std::sync::Arc;
use tower::ServiceExt;

use frame_server::services::detector::FrameDetector;
use frame_server::{AppState, routes};

const BOUNDARY: &str = "test-boundary-7f83a9c2";

/// Router with no model available, the same shape `main` builds.
fn app() -> Router {
    let state = Arc::new(AppState {
        detector: FrameDetector::load("does-not-exist.onnx"),
    });
    routes::build_routes().with_state(state)
}

/// Hand-rolled multipart encoding: (field name, optional filename, data).
fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn post_multipart(uri: &str, parts: &[(&str, Option<&str>, &[u8])]) -> serde_json::Value {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A single-color PNG: decodes fine but has no edges, so neither pipeline
/// finds anything in it.
fn solid_png(width: u32, height: u32, luma: u8) -> Vec<u8> {
    let img = image::GrayImage::from_pixel(width, height, image::Luma([luma]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[tokio::test]
async fn health_is_ok() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn detect_frames_reports_true_image_size() {
    let png = solid_png(320, 240, 180);
    let json = post_multipart("/detect_frames", &[("file", Some("preview.png"), &png)]).await;

    assert_eq!(json["image_size"]["width"], 320);
    assert_eq!(json["image_size"]["height"], 240);
    assert_eq!(json["boxes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn detect_frames_fallback_finds_a_drawn_rectangle() {
    // A dark canvas with one bright rectangle. The contour fallback should
    // report the rectangle, and every box it emits must clear the size
    // filter: strictly larger than 100 px and strictly inside the image.
    let mut img = image::GrayImage::new(400, 300);
    imageproc::drawing::draw_filled_rect_mut(
        &mut img,
        imageproc::rect::Rect::at(60, 50).of_size(200, 150),
        image::Luma([255u8]),
    );
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    let png = out.into_inner();

    let json = post_multipart("/detect_frames", &[("file", Some("preview.png"), &png)]).await;

    assert_eq!(json["image_size"]["width"], 400);
    assert_eq!(json["image_size"]["height"], 300);
    let boxes = json["boxes"].as_array().unwrap();
    assert!(!boxes.is_empty());
    for b in boxes {
        let w = b["w"].as_i64().unwrap();
        let h = b["h"].as_i64().unwrap();
        assert!(w > 100 && w < 400, "w = {}", w);
        assert!(h > 100 && h < 300, "h = {}", h);
    }
}

#[tokio::test]
async fn detect_frames_handles_undecodable_upload() {
    let json = post_multipart(
        "/detect_frames",
        &[("file", Some("broken.png"), b"definitely not an image" as &[u8])],
    )
    .await;

    assert_eq!(json["boxes"].as_array().unwrap().len(), 0);
    assert_eq!(json["image_size"]["width"], 0);
    assert_eq!(json["image_size"]["height"], 0);
}

#[tokio::test]
async fn detect_frames_handles_missing_file_field() {
    let json = post_multipart("/detect_frames", &[("other", None, b"x" as &[u8])]).await;

    assert_eq!(json["boxes"].as_array().unwrap().len(), 0);
    assert_eq!(json["image_size"]["width"], 0);
}

#[tokio::test]
async fn fit_photo_returns_frame_for_featureless_photo() {
    let photo = solid_png(400, 300, 128);
    let json = post_multipart(
        "/fit_photo",
        &[
            ("frame_box", None, br#"{"x":10,"y":20,"w":200,"h":100}"# as &[u8]),
            ("photo", Some("photo.png"), &photo),
        ],
    )
    .await;

    assert_eq!(json["target_box"]["left"], 10);
    assert_eq!(json["target_box"]["top"], 20);
    assert_eq!(json["target_box"]["right"], 210);
    assert_eq!(json["target_box"]["bottom"], 120);
    assert_eq!(json["rotation"], 0);
}

#[tokio::test]
async fn fit_photo_defaults_frame_box_when_absent() {
    let photo = solid_png(100, 100, 90);
    let json = post_multipart("/fit_photo", &[("photo", Some("photo.png"), &photo)]).await;

    assert_eq!(json["target_box"]["left"], 0);
    assert_eq!(json["target_box"]["top"], 0);
    assert_eq!(json["target_box"]["right"], 500);
    assert_eq!(json["target_box"]["bottom"], 500);
    assert_eq!(json["rotation"], 0);
}

#[tokio::test]
async fn fit_photo_reports_malformed_frame_box() {
    let photo = solid_png(100, 100, 90);
    let json = post_multipart(
        "/fit_photo",
        &[
            ("frame_box", None, b"{" as &[u8]),
            ("photo", Some("photo.png"), &photo),
        ],
    )
    .await;

    assert!(json.get("error").is_some());
    assert!(json.get("target_box").is_none());
}

#[tokio::test]
async fn fit_photo_reports_unreadable_photo() {
    let json = post_multipart(
        "/fit_photo",
        &[
            ("frame_box", None, br#"{"x":0,"y":0,"w":100,"h":100}"# as &[u8]),
            ("photo", Some("photo.png"), b"not an image" as &[u8]),
        ],
    )
    .await;

    assert_eq!(json["error"], "Failed to read uploaded photo.");
}

#[tokio::test]
async fn fit_photo_reports_missing_photo() {
    let json = post_multipart(
        "/fit_photo",
        &[("frame_box", None, br#"{"x":0,"y":0,"w":100,"h":100}"# as &[u8])],
    )
    .await;

    assert!(json.get("error").is_some());
}
