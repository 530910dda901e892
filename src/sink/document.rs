//! Word document sink.
//!
//! Unlike the workbook, the document is rewritten to disk after every
//! append, so progress survives a crash before the file is downloaded.

use super::{image_dimensions, SinkError};
use docx_rs::{Docx, Paragraph, Pic, Run};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Display width of every picture: 6 inches in EMU (914400 per inch).
pub const DISPLAY_WIDTH_EMU: u32 = 6 * 914_400;

struct Picture {
    png: Vec<u8>,
    width_emu: u32,
    height_emu: u32,
}

pub struct DocumentSink {
    path: PathBuf,
    pictures: Vec<Picture>,
}

impl DocumentSink {
    pub fn create(path: PathBuf) -> Result<Self, SinkError> {
        let sink = Self {
            path,
            pictures: Vec::new(),
        };
        sink.save()?;
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn image_count(&self) -> usize {
        self.pictures.len()
    }

    pub fn append_image(&mut self, png: &[u8]) -> Result<(), SinkError> {
        let (width, height) = image_dimensions(png)?;
        let height_emu = scaled_height_emu(width, height);

        self.pictures.push(Picture {
            png: png.to_vec(),
            width_emu: DISPLAY_WIDTH_EMU,
            height_emu,
        });

        if let Err(e) = self.save() {
            self.pictures.pop();
            return Err(e);
        }

        log::debug!(
            "[SINK] Appended image {} to {}",
            self.pictures.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Rebuild the document from all pictures so far and write it out.
    fn save(&self) -> Result<(), SinkError> {
        let mut docx = Docx::new();
        for picture in &self.pictures {
            let pic = Pic::new(&picture.png).size(picture.width_emu, picture.height_emu);
            docx = docx
                .add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic)))
                .add_paragraph(Paragraph::new());
        }

        let file = File::create(&self.path)?;
        docx.build()
            .pack(file)
            .map_err(|e| SinkError::Document(e.to_string()))
    }
}

/// Height that keeps the aspect ratio at the fixed display width.
fn scaled_height_emu(width: u32, height: u32) -> u32 {
    if width == 0 {
        return 0;
    }
    let scaled = u64::from(DISPLAY_WIDTH_EMU) * u64::from(height) / u64::from(width);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
