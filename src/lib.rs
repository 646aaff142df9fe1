//! HTTP service backing the design-tool plugin: locates rectangular frame
//! regions in uploaded preview images and computes where a photo should be
//! placed inside a chosen frame.

pub mod constants;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;

use services::detector::FrameDetector;

/// Shared application state. The detector is built once at startup and only
/// read afterwards; everything else is request-local.
pub struct AppState {
    pub detector: FrameDetector,
}
