//! Keeps a copy of every capture on disk, next to the documents.

use chrono::Local;
use std::path::{Path, PathBuf};

/// Writes `png` to `dir/screenshot_<timestamp>.png` and returns the path.
///
/// The timestamp carries microseconds so two captures inside one
/// debounce window still get distinct names.
pub fn archive_png(dir: &Path, png: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S_%6f");
    let path = dir.join(format!("screenshot_{}.png", stamp));
    std::fs::write(&path, png)?;
    Ok(path)
}
