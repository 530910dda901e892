//! Shared test doubles for the session and web tests.

#![allow(dead_code)]

use autoscreen_lib::capture::{CaptureError, ScreenSource};
use autoscreen_lib::session::SessionController;
use autoscreen_lib::settings::Settings;
use autoscreen_lib::trigger::{KeyProbe, KeyboardBackend, TriggerError};
use device_query::Keycode;
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A small solid PNG.
pub fn tiny_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([200, 40, 40, 255]),
    ));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Screen that always returns the same image.
pub struct StaticScreen {
    png: Vec<u8>,
    pub calls: AtomicUsize,
}

impl StaticScreen {
    pub fn new() -> Self {
        Self {
            png: tiny_png(16, 9),
            calls: AtomicUsize::new(0),
        }
    }
}

impl ScreenSource for StaticScreen {
    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.png.clone())
    }
}

/// Screen that takes `delay` per capture, to hold a poller mid-cycle.
pub struct SlowScreen {
    png: Vec<u8>,
    delay: Duration,
}

impl SlowScreen {
    pub fn new(delay: Duration) -> Self {
        Self {
            png: tiny_png(16, 9),
            delay,
        }
    }
}

impl ScreenSource for SlowScreen {
    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        std::thread::sleep(self.delay);
        Ok(self.png.clone())
    }
}

/// Screen of a headless machine.
pub struct NoScreen;

impl ScreenSource for NoScreen {
    fn capture(&self) -> Result<Vec<u8>, CaptureError> {
        Err(CaptureError::Unavailable("no display in tests".to_string()))
    }
}

/// Keyboard whose trigger key is down while `down` is set.
pub struct TestKeyboard {
    pub down: Arc<AtomicBool>,
    pub connects: AtomicUsize,
}

impl TestKeyboard {
    pub fn new(held: bool) -> Self {
        Self {
            down: Arc::new(AtomicBool::new(held)),
            connects: AtomicUsize::new(0),
        }
    }

    pub fn press(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.down.store(false, Ordering::SeqCst);
    }
}

struct TestProbe(Arc<AtomicBool>);

impl KeyProbe for TestProbe {
    fn is_down(&mut self, _key: Keycode) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl KeyboardBackend for TestKeyboard {
    fn connect(&self) -> Result<Box<dyn KeyProbe>, TriggerError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TestProbe(Arc::clone(&self.down))))
    }
}

/// Keyboard that is always held and tracks how many probes (one per
/// poller thread) are alive at once.
#[derive(Default)]
pub struct CountingKeyboard {
    live: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
}

impl CountingKeyboard {
    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }
}

struct CountingProbe {
    live: Arc<AtomicUsize>,
}

impl KeyProbe for CountingProbe {
    fn is_down(&mut self, _key: Keycode) -> bool {
        true
    }
}

impl Drop for CountingProbe {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl KeyboardBackend for CountingKeyboard {
    fn connect(&self) -> Result<Box<dyn KeyProbe>, TriggerError> {
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(CountingProbe {
            live: Arc::clone(&self.live),
        }))
    }
}

/// Keyboard of a headless machine.
pub struct NoKeyboard;

impl KeyboardBackend for NoKeyboard {
    fn connect(&self) -> Result<Box<dyn KeyProbe>, TriggerError> {
        Err(TriggerError::InputUnavailable)
    }
}

/// Settings rooted at `dir` with fast polling and no archive.
pub fn fast_settings(dir: &Path) -> Settings {
    let mut settings = Settings::with_storage_dir(dir);
    settings.poller.poll_interval = Duration::from_millis(1);
    settings.poller.debounce = Duration::from_millis(15);
    settings.archive_screenshots = false;
    settings
}

/// A controller over a static screen and a test keyboard.
pub fn controller(dir: &Path, held: bool) -> (SessionController, Arc<TestKeyboard>) {
    let keyboard = Arc::new(TestKeyboard::new(held));
    let session = SessionController::new(
        fast_settings(dir),
        Arc::new(StaticScreen::new()),
        keyboard.clone(),
    );
    (session, keyboard)
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
