// Camera configuration endpoint (overlay text setter).

pub mod client;

pub use client::{CameraClient, Delivery, OVERLAY_TEXT_PATH};
