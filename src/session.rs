//! The screenshot session, one per process.
//!
//! [`SessionController`] owns the active sink and the poller, and is the
//! only thing the web handlers talk to. All state sits behind one mutex
//! that is shared with the poller thread for the append step.
//!
//! Transitions:
//!   - `create_file`:     replace the sink (old one finalized first)
//!   - `enable_capture`:  ensure a sink, start the poller, add a page
//!   - `disable_capture`: clear the flag, join the poller
//!   - `download`:        finalize a workbook, hand back the file bytes

use crate::capture::{self, CaptureError, ScreenSource};
use crate::settings::Settings;
use crate::sink::{Sink, SinkError, SinkKind};
use crate::trigger::{KeyboardBackend, PollerHandle, TriggerError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Name used when capture is enabled before any file exists.
pub const DEFAULT_FILE_NAME: &str = "default_file";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid file name.")]
    InvalidName,

    #[error("No file available for download.")]
    NoFileAvailable,

    #[error("{0}")]
    CaptureUnavailable(String),

    #[error("An error occurred: {0}")]
    OperationFailed(String),
}

impl From<SinkError> for SessionError {
    fn from(e: SinkError) -> Self {
        SessionError::OperationFailed(e.to_string())
    }
}

impl From<TriggerError> for SessionError {
    fn from(e: TriggerError) -> Self {
        SessionError::OperationFailed(e.to_string())
    }
}

impl From<CaptureError> for SessionError {
    fn from(e: CaptureError) -> Self {
        SessionError::CaptureUnavailable(e.to_string())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::OperationFailed(e.to_string())
    }
}

/// A finished file, ready to be sent to the browser.
#[derive(Debug)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Read-only view of the session for the page and `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub capture_enabled: bool,
    pub sink_kind: Option<SinkKind>,
    pub file_name: Option<String>,
    pub page_index: Option<usize>,
    pub cursor_row: Option<u32>,
    pub captures: usize,
}

#[derive(Default)]
struct SessionState {
    capture_enabled: bool,
    sink: Option<Sink>,
    /// Recorded separately from the sink so a download can still find
    /// the file of a finalized workbook.
    file_path: Option<PathBuf>,
    poller: Option<PollerHandle>,
    captures: usize,
}

pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    /// Held for a whole enable or disable, including the poller join, so
    /// at most one poller is ever alive. The poller never takes it.
    transition: Mutex<()>,
    settings: Settings,
    screen: Arc<dyn ScreenSource>,
    keyboard: Arc<dyn KeyboardBackend>,
}

impl SessionController {
    pub fn new(
        settings: Settings,
        screen: Arc<dyn ScreenSource>,
        keyboard: Arc<dyn KeyboardBackend>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            transition: Mutex::new(()),
            settings,
            screen,
            keyboard,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionState>, SessionError> {
        self.state
            .lock()
            .map_err(|e| SessionError::OperationFailed(e.to_string()))
    }

    fn begin_transition(&self) -> Result<MutexGuard<'_, ()>, SessionError> {
        self.transition
            .lock()
            .map_err(|e| SessionError::OperationFailed(e.to_string()))
    }

    /// Start a fresh file, replacing whatever was open.
    pub fn create_file(&self, name: &str, kind: SinkKind) -> Result<String, SessionError> {
        let name = validate_name(name)?;
        let mut state = self.lock()?;
        self.create_file_locked(&mut state, name, kind)
    }

    fn create_file_locked(
        &self,
        state: &mut SessionState,
        name: &str,
        kind: SinkKind,
    ) -> Result<String, SessionError> {
        if let Some(mut old) = state.sink.take() {
            if let Err(e) = old.finalize() {
                log::warn!(
                    "[SESSION] Failed to finalize {}: {}",
                    old.path().display(),
                    e
                );
            }
        }
        state.file_path = None;
        state.captures = 0;

        std::fs::create_dir_all(&self.settings.storage_dir)?;
        let file_name = format!("{}.{}", name, kind.extension());
        let path = self.settings.storage_dir.join(&file_name);

        let sink = Sink::create(kind, path.clone())?;
        state.sink = Some(sink);
        state.file_path = Some(path);

        let message = format!("New file \"{}\" created.", file_name);
        log::info!("[SESSION] {}", message);
        Ok(message)
    }

    /// Turn screenshot mode on.
    ///
    /// With no usable file, a workbook named after `fallback_name` is
    /// created first. With an existing workbook, a new worksheet is added
    /// so every capture session gets its own page.
    pub fn enable_capture(&self, fallback_name: &str) -> Result<String, SessionError> {
        let _transition = self.begin_transition()?;
        let mut state = self.lock()?;
        if state.capture_enabled {
            return Ok("Screenshot mode is already ON.".to_string());
        }

        let usable = state.sink.as_ref().is_some_and(Sink::is_open);
        if !usable {
            let trimmed = fallback_name.trim();
            let name = if trimmed.is_empty() {
                DEFAULT_FILE_NAME
            } else {
                validate_name(trimmed)?
            };
            self.create_file_locked(&mut state, name, SinkKind::Spreadsheet)?;
        }

        let handle = PollerHandle::spawn(
            self.settings.poller,
            Arc::clone(&self.keyboard),
            capture_cycle(
                Arc::clone(&self.state),
                Arc::clone(&self.screen),
                self.settings.archive_dir(),
            ),
        )?;

        // The page is added only once the poller runs, so a failed start
        // leaves the workbook untouched. The poller cannot append until
        // the state lock is released.
        let paged = if usable {
            state.sink.as_mut().map_or(Ok(()), Sink::new_page)
        } else {
            Ok(())
        };
        if let Err(e) = paged {
            drop(state);
            handle.stop();
            return Err(e.into());
        }

        state.poller = Some(handle);
        state.capture_enabled = true;

        let message = format!(
            "Screenshot mode ON. Press \"{:?}\" to take screenshots one by one.",
            self.settings.trigger_key()
        );
        log::info!("[SESSION] {}", message);
        Ok(message)
    }

    /// Turn screenshot mode off. Returns after the poller thread exits.
    pub fn disable_capture(&self) -> Result<String, SessionError> {
        let _transition = self.begin_transition()?;
        let handle = {
            let mut state = self.lock()?;
            if !state.capture_enabled {
                return Ok("Screenshot mode is already OFF.".to_string());
            }
            state.capture_enabled = false;
            state.poller.take()
        };

        // Joined outside the state lock: the poller may be waiting on it to
        // append. The transition lock stays held until the thread is gone.
        if let Some(handle) = handle {
            handle.stop();
        }

        log::info!("[SESSION] Screenshot mode OFF");
        Ok("Screenshot mode OFF".to_string())
    }

    /// Finalize (for workbooks) and read back the current file.
    pub fn download(&self) -> Result<Download, SessionError> {
        let mut state = self.lock()?;

        if let Some(sink) = state.sink.as_mut() {
            if sink.kind() == SinkKind::Spreadsheet {
                sink.finalize()?;
            }
        }

        let path = match &state.file_path {
            Some(path) if path.exists() => path.clone(),
            _ => {
                log::warn!("[SESSION] No file available for download");
                return Err(SessionError::NoFileAvailable);
            }
        };

        let content_type = state
            .sink
            .as_ref()
            .map(Sink::kind)
            .or_else(|| kind_from_path(&path))
            .unwrap_or(SinkKind::Spreadsheet)
            .content_type();

        let bytes = std::fs::read(&path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        log::info!("[SESSION] Serving {} ({} bytes)", filename, bytes.len());
        Ok(Download {
            bytes,
            content_type,
            filename,
        })
    }

    pub fn status(&self) -> Result<SessionStatus, SessionError> {
        let state = self.lock()?;
        let (page_index, cursor_row) = match &state.sink {
            Some(Sink::Spreadsheet(s)) => (Some(s.current_page_index()), Some(s.cursor_row())),
            _ => (None, None),
        };
        Ok(SessionStatus {
            capture_enabled: state.capture_enabled,
            sink_kind: state.sink.as_ref().map(Sink::kind),
            file_name: state
                .file_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string()),
            page_index,
            cursor_row,
            captures: state.captures,
        })
    }

    /// Stop capturing and flush the open file. Called on process exit.
    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.disable_capture()?;
        let mut state = self.lock()?;
        if let Some(sink) = state.sink.as_mut() {
            sink.finalize()?;
        }
        log::info!("[SESSION] Shut down");
        Ok(())
    }
}

/// One capture-and-append cycle, run on the poller thread per key press.
///
/// Capture and archiving happen outside the lock; only the append holds
/// it. Every failure is logged and swallowed so polling continues.
fn capture_cycle(
    state: Arc<Mutex<SessionState>>,
    screen: Arc<dyn ScreenSource>,
    archive_dir: Option<PathBuf>,
) -> impl FnMut() + Send + 'static {
    move || {
        let png = match screen.capture() {
            Ok(png) => png,
            Err(e) => {
                log::error!("[CAPTURE] {}", e);
                return;
            }
        };

        if let Some(dir) = archive_dir.as_deref() {
            match capture::archive_png(dir, &png) {
                Ok(path) => log::debug!("[CAPTURE] Archived to {}", path.display()),
                Err(e) => log::warn!("[CAPTURE] Failed to archive screenshot: {}", e),
            }
        }

        let mut guard = match state.lock() {
            Ok(guard) => guard,
            Err(e) => {
                log::error!("[POLLER] Session lock poisoned: {}", e);
                return;
            }
        };
        let session = &mut *guard;
        match session.sink.as_mut() {
            Some(sink) => match sink.append_image(&png) {
                Ok(()) => {
                    session.captures += 1;
                    log::info!("[POLLER] Capture {} appended", session.captures);
                }
                Err(e) => log::error!("[POLLER] Failed to append capture: {}", e),
            },
            None => log::warn!("[POLLER] Capture dropped: no open file"),
        }
    }
}

/// Trim and check a requested file name.
///
/// The name becomes a file directly under the storage directory, so
/// separators and `..` are refused.
fn validate_name(name: &str) -> Result<&str, SessionError> {
    let name = name.trim();
    if name.is_empty()
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        log::warn!("[SESSION] Rejected file name {:?}", name);
        return Err(SessionError::InvalidName);
    }
    Ok(name)
}

fn kind_from_path(path: &Path) -> Option<SinkKind> {
    match path.extension()?.to_str()? {
        "xlsx" => Some(SinkKind::Spreadsheet),
        "docx" => Some(SinkKind::Document),
        _ => None,
    }
}
