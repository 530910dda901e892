//! Excel workbook sink.
//!
//! Images are stacked in column 0 of the current worksheet, a fixed
//! number of rows apart. The workbook lives in memory and is only
//! written out on creation and on `finalize`.

use super::SinkError;
use rust_xlsxwriter::{Image, Workbook};
use std::path::{Path, PathBuf};

/// Rows between the tops of two consecutive images.
///
/// Image height in rows is not known up front, so this is a fixed
/// margin. Captures taller than this overlap the next one.
pub const ROW_STEP: u32 = 65;

pub const FIRST_PAGE_NAME: &str = "Screenshots";

pub struct SpreadsheetSink {
    path: PathBuf,
    /// `None` once finalized.
    workbook: Option<Workbook>,
    current_page_index: usize,
    cursor_row: u32,
}

impl SpreadsheetSink {
    pub fn create(path: PathBuf) -> Result<Self, SinkError> {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name(FIRST_PAGE_NAME)?;
        // Put a valid (empty) workbook on disk right away.
        workbook.save(&path)?;

        Ok(Self {
            path,
            workbook: Some(workbook),
            current_page_index: 0,
            cursor_row: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page_index
    }

    pub fn cursor_row(&self) -> u32 {
        self.cursor_row
    }

    pub fn is_closed(&self) -> bool {
        self.workbook.is_none()
    }

    pub fn append_image(&mut self, png: &[u8]) -> Result<(), SinkError> {
        let workbook = self.workbook.as_mut().ok_or(SinkError::Closed)?;
        let image = Image::new_from_buffer(png)?;
        let worksheet = workbook.worksheet_from_index(self.current_page_index)?;
        worksheet.insert_image(self.cursor_row, 0, &image)?;

        log::debug!(
            "[SINK] Inserted image on page {} at row {}",
            self.current_page_index,
            self.cursor_row
        );
        self.cursor_row += ROW_STEP;
        Ok(())
    }

    pub fn new_page(&mut self) -> Result<(), SinkError> {
        let workbook = self.workbook.as_mut().ok_or(SinkError::Closed)?;
        let next_index = self.current_page_index + 1;
        workbook
            .add_worksheet()
            .set_name(format!("Sheet_{}", next_index + 1))?;

        self.current_page_index = next_index;
        self.cursor_row = 0;
        log::info!("[SINK] New worksheet Sheet_{} added", next_index + 1);
        Ok(())
    }

    /// Write the workbook to disk and close it. A second call does nothing.
    pub fn finalize(&mut self) -> Result<(), SinkError> {
        if let Some(mut workbook) = self.workbook.take() {
            workbook.save(&self.path)?;
            log::info!("[SINK] Workbook finalized: {}", self.path.display());
        }
        Ok(())
    }
}
