//! The capture poller thread.
//!
//! Polling, not interrupts: sample the key every `poll_interval`; when
//! it is down run one capture cycle, then sleep `debounce` so a single
//! physical press yields a single capture. The running flag is checked
//! at the top of every iteration; `stop` clears it and joins.

use super::{KeyProbe, KeyboardBackend, TriggerError};
use device_query::Keycode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub key: Keycode,
    pub poll_interval: Duration,
    pub debounce: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            key: Keycode::Right,
            poll_interval: Duration::from_millis(100),
            debounce: Duration::from_millis(500),
        }
    }
}

/// Owned handle to the running poller thread.
pub struct PollerHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Start polling. Returns once the key probe is connected on the new
    /// thread, or with the connection error if it could not be opened.
    pub fn spawn<F>(
        config: PollerConfig,
        keyboard: Arc<dyn KeyboardBackend>,
        mut on_trigger: F,
    ) -> Result<Self, TriggerError>
    where
        F: FnMut() + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), TriggerError>>();

        let thread = std::thread::Builder::new()
            .name("capture-poller".to_string())
            .spawn(move || {
                let mut probe = match keyboard.connect() {
                    Ok(probe) => {
                        let _ = ready_tx.send(Ok(()));
                        probe
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                poll_loop(&flag, probe.as_mut(), &config, &mut on_trigger);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::info!("[POLLER] Started listening for {:?}", config.key);
                Ok(Self {
                    running,
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(TriggerError::Disconnected)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clear the running flag and block until the thread has exited.
    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("[POLLER] Poller thread panicked");
            }
        }
        log::info!("[POLLER] Stopped");
    }
}

impl Drop for PollerHandle {
    // A handle dropped without `stop` still lets its thread wind down.
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn poll_loop(
    running: &AtomicBool,
    probe: &mut dyn KeyProbe,
    config: &PollerConfig,
    on_trigger: &mut dyn FnMut(),
) {
    while running.load(Ordering::SeqCst) {
        if probe.is_down(config.key) {
            on_trigger();
            std::thread::sleep(config.debounce);
        }
        std::thread::sleep(config.poll_interval);
    }
}
