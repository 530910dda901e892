//! Full-screen capture using the `xcap` crate.
//!
//! This is the infrastructure layer. It talks to the OS.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use xcap::Monitor;

/// Captures the primary monitor and returns it encoded as PNG.
///
/// Falls back to the first monitor when none reports itself as primary.
/// Fails with [`CaptureError::Unavailable`] on headless machines.
pub fn capture_primary_monitor_png() -> Result<Vec<u8>, CaptureError> {
    let start = std::time::Instant::now();

    let monitors = Monitor::all().map_err(|e| CaptureError::Unavailable(e.to_string()))?;

    let primary = monitors
        .iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .or_else(|| monitors.first())
        .ok_or_else(|| CaptureError::Unavailable("no monitor found".to_string()))?;

    let rgba = primary
        .capture_image()
        .map_err(|e| CaptureError::Unavailable(e.to_string()))?;
    let (width, height) = (rgba.width(), rgba.height());

    let mut png_bytes: Vec<u8> = Vec::new();
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;

    log::debug!(
        "[CAPTURE] {}x{} screen captured in {}ms ({} bytes)",
        width,
        height,
        start.elapsed().as_millis(),
        png_bytes.len()
    );

    Ok(png_bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Screen capture unavailable: {0}")]
    Unavailable(String),

    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}
