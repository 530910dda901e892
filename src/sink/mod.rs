//! Document sinks: where captured images end up.
//!
//! A [`Sink`] is exactly one of two destinations: a paginated workbook
//! ([`SpreadsheetSink`]) or a flowing Word document ([`DocumentSink`]).
//! Both are created on disk immediately and accept one image at a time.

mod document;
mod spreadsheet;

pub use document::{DocumentSink, DISPLAY_WIDTH_EMU};
pub use spreadsheet::{SpreadsheetSink, FIRST_PAGE_NAME, ROW_STEP};

use serde::Serialize;
use std::path::{Path, PathBuf};

/// The two supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SinkKind {
    Spreadsheet,
    Document,
}

impl SinkKind {
    /// Parse the form value used by the web page ("Excel" / "Word").
    pub fn from_form_value(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "excel" | "xlsx" | "spreadsheet" => Some(SinkKind::Spreadsheet),
            "word" | "docx" | "document" => Some(SinkKind::Document),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SinkKind::Spreadsheet => "xlsx",
            SinkKind::Document => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            SinkKind::Spreadsheet => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            SinkKind::Document => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// The active destination for captures.
pub enum Sink {
    Spreadsheet(SpreadsheetSink),
    Document(DocumentSink),
}

impl Sink {
    /// Create (or truncate) the file at `path` and wrap it in a sink.
    pub fn create(kind: SinkKind, path: PathBuf) -> Result<Self, SinkError> {
        let sink = match kind {
            SinkKind::Spreadsheet => Sink::Spreadsheet(SpreadsheetSink::create(path)?),
            SinkKind::Document => Sink::Document(DocumentSink::create(path)?),
        };
        log::info!("[SINK] Created {:?} file: {}", kind, sink.path().display());
        Ok(sink)
    }

    pub fn kind(&self) -> SinkKind {
        match self {
            Sink::Spreadsheet(_) => SinkKind::Spreadsheet,
            Sink::Document(_) => SinkKind::Document,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Sink::Spreadsheet(s) => s.path(),
            Sink::Document(d) => d.path(),
        }
    }

    /// Append one PNG image.
    pub fn append_image(&mut self, png: &[u8]) -> Result<(), SinkError> {
        match self {
            Sink::Spreadsheet(s) => s.append_image(png),
            Sink::Document(d) => d.append_image(png),
        }
    }

    /// Start a new page. Documents flow, so this is a no-op for them.
    pub fn new_page(&mut self) -> Result<(), SinkError> {
        match self {
            Sink::Spreadsheet(s) => s.new_page(),
            Sink::Document(_) => Ok(()),
        }
    }

    /// Flush to storage. Safe to call more than once.
    pub fn finalize(&mut self) -> Result<(), SinkError> {
        match self {
            Sink::Spreadsheet(s) => s.finalize(),
            // Every append already wrote the whole document.
            Sink::Document(_) => Ok(()),
        }
    }

    /// Whether the sink can still accept images.
    pub fn is_open(&self) -> bool {
        match self {
            Sink::Spreadsheet(s) => !s.is_closed(),
            Sink::Document(_) => true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("The workbook has already been finalized")]
    Closed,

    #[error("Could not read image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Spreadsheet encoder failed: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("Document encoder failed: {0}")]
    Document(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Width and height of an encoded image, without decoding the pixels.
pub(crate) fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), SinkError> {
    let reader = image::ImageReader::new(std::io::Cursor::new(bytes)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}
