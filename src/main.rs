use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use frame_server::constants::MAX_UPLOAD_SIZE;
use frame_server::services::detector::FrameDetector;
use frame_server::{AppState, routes};

#[tokio::main]
async fn main() {
    let model_path = std::env::var("FRAME_MODEL_PATH")
        .unwrap_or_else(|_| "models/frame_detector.onnx".to_string());
    let detector = FrameDetector::load(&model_path);

    let state = Arc::new(AppState { detector });

    // The plugin panel runs in an embedded browser context, so requests
    // arrive cross-origin with credentials.
    let app = routes::build_routes()
        .layer(CorsLayer::very_permissive())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", addr, e));

    println!("[server] Listening on http://{}", addr);
    axum::serve(listener, app).await.expect("Server failed");
}
