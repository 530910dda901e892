//! Screen capture domain, public API.
//!
//! This module owns turning "the screen right now" into PNG bytes.
//! The session only talks to the [`ScreenSource`] trait, so tests can
//! swap the OS capture for a canned image.

mod archive;
mod screenshot;

pub use archive::archive_png;
pub use screenshot::{capture_primary_monitor_png, CaptureError};

/// Produces one PNG-encoded screen image per call.
pub trait ScreenSource: Send + Sync {
    fn capture(&self) -> Result<Vec<u8>, CaptureError>;
}

/// The real display, captured through `xcap`.
pub struct PrimaryMonitor;

impl ScreenSource for PrimaryMonitor {
    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        capture_primary_monitor_png()
    }
}
