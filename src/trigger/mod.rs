//! Trigger key domain: "is the key down right now?" plus the poller
//! thread that turns key presses into capture cycles.

mod poller;

pub use poller::{PollerConfig, PollerHandle};

use device_query::{DeviceQuery, DeviceState, Keycode};

/// Opens key-state probes. Shared across threads; the probe itself is
/// created on (and stays on) the poller thread.
pub trait KeyboardBackend: Send + Sync {
    fn connect(&self) -> Result<Box<dyn KeyProbe>, TriggerError>;
}

/// Samples whether one key is currently held down.
pub trait KeyProbe {
    fn is_down(&mut self, key: Keycode) -> bool;
}

/// The system keyboard via `device_query`.
pub struct SystemKeyboard;

impl KeyboardBackend for SystemKeyboard {
    fn connect(&self) -> Result<Box<dyn KeyProbe>, TriggerError> {
        let state = DeviceState::checked_new().ok_or(TriggerError::InputUnavailable)?;
        Ok(Box::new(SystemProbe { state }))
    }
}

struct SystemProbe {
    state: DeviceState,
}

impl KeyProbe for SystemProbe {
    fn is_down(&mut self, key: Keycode) -> bool {
        self.state.get_keys().contains(&key)
    }
}

/// Parse a trigger key name as written in configuration.
///
/// Only keys that make sense as a single-press trigger are accepted.
pub fn parse_key(name: &str) -> Option<Keycode> {
    let key = match name.trim().to_lowercase().as_str() {
        "right" => Keycode::Right,
        "left" => Keycode::Left,
        "up" => Keycode::Up,
        "down" => Keycode::Down,
        "space" => Keycode::Space,
        "enter" => Keycode::Enter,
        "pageup" => Keycode::PageUp,
        "pagedown" => Keycode::PageDown,
        "home" => Keycode::Home,
        "end" => Keycode::End,
        "f1" => Keycode::F1,
        "f2" => Keycode::F2,
        "f3" => Keycode::F3,
        "f4" => Keycode::F4,
        "f5" => Keycode::F5,
        "f6" => Keycode::F6,
        "f7" => Keycode::F7,
        "f8" => Keycode::F8,
        "f9" => Keycode::F9,
        "f10" => Keycode::F10,
        "f11" => Keycode::F11,
        "f12" => Keycode::F12,
        _ => return None,
    };
    Some(key)
}

#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("Keyboard state is unavailable (no display?)")]
    InputUnavailable,

    #[error("Failed to start poller thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Poller thread exited before reporting readiness")]
    Disconnected,
}
