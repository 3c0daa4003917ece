//! Gamepad hotkey service - the host-facing handle around the listener thread

use super::listener::Listener;
use crate::core::config::ListenerTiming;
use crate::core::control::{RunControl, RunState};
use crate::core::dispatch::{ActionDispatcher, ExecutionContext, HotkeyCallbacks};
use crate::hid::{Acquisition, DeviceBackend, HidApiBackend, TargetDevice};
use anyhow::{bail, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Listens to one gamepad on a background thread and fires hotkey callbacks
/// on the host's execution context when bound buttons are released.
///
/// To change the device or bindings, dispose this instance and build a new one.
pub struct GamepadHotkeyService {
    target: TargetDevice,
    timing: ListenerTiming,
    control: Arc<RunControl>,
    connected: Arc<AtomicBool>,
    /// Handed to the listener on `start()`
    pending: Option<(Box<dyn DeviceBackend>, ActionDispatcher)>,
    handle: Option<JoinHandle<()>>,
}

impl GamepadHotkeyService {
    /// Create a service backed by the platform HID layer
    pub fn new(
        target: TargetDevice,
        timing: ListenerTiming,
        context: Arc<dyn ExecutionContext>,
        callbacks: HotkeyCallbacks,
    ) -> Self {
        Self::with_backend(
            target,
            timing,
            Box::new(HidApiBackend::new()),
            ActionDispatcher::new(context, callbacks),
        )
    }

    /// Create a service with a custom device backend
    pub fn with_backend(
        target: TargetDevice,
        timing: ListenerTiming,
        backend: Box<dyn DeviceBackend>,
        dispatcher: ActionDispatcher,
    ) -> Self {
        Self {
            target,
            timing,
            control: Arc::new(RunControl::new()),
            connected: Arc::new(AtomicBool::new(false)),
            pending: Some((backend, dispatcher)),
            handle: None,
        }
    }

    /// Spawn the listener thread. Calling it again while running is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            debug!("Gamepad hotkey service already started");
            return Ok(());
        }
        if self.control.is_stopping() {
            bail!("Gamepad hotkey service was stopped; create a new instance");
        }
        let Some((backend, dispatcher)) = self.pending.take() else {
            bail!("Gamepad hotkey service has no backend");
        };

        let acquisition = Acquisition::new(
            backend,
            &self.target,
            self.timing.device_poll(),
            self.timing.open_retry(),
        );
        let listener = Listener::new(
            self.target.clone(),
            self.timing.clone(),
            acquisition,
            Arc::clone(&self.control),
            dispatcher,
            Arc::clone(&self.connected),
        );

        let handle = thread::Builder::new()
            .name("gamepad-hotkeys".to_string())
            .spawn(move || listener.run())
            .context("Failed to spawn gamepad listener thread")?;
        self.handle = Some(handle);

        info!(
            "Gamepad hotkey service started (toggle: {}, menu: {})",
            binding_name(self.target.toggle),
            binding_name(self.target.menu)
        );
        Ok(())
    }

    /// Request shutdown without waiting for it
    pub fn stop(&self) {
        self.control.stop();
    }

    /// Suspend dispatch. The device stays open.
    pub fn pause(&self) {
        if self.control.pause() {
            info!("Gamepad hotkeys paused");
        }
    }

    /// Resume dispatch. Buttons held during the pause do not fire on release.
    pub fn resume(&self) {
        if self.control.resume() {
            info!("Gamepad hotkeys resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.control.state() == RunState::Paused
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && !self.control.is_stopping()
    }

    /// Whether a controller is currently open
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Stop the listener and wait briefly for it to release the device.
    ///
    /// Returns false if the thread did not finish within the shutdown grace
    /// period; it is then detached and exits after its current read.
    pub fn dispose(&mut self) -> bool {
        self.control.stop();
        self.pending = None;

        let Some(handle) = self.handle.take() else {
            return true;
        };

        if self.control.wait_stopped(self.timing.shutdown_grace()) {
            if handle.join().is_err() {
                warn!("Gamepad listener thread panicked during shutdown");
            }
            true
        } else {
            warn!(
                "Gamepad listener did not stop within {:?}, detaching",
                self.timing.shutdown_grace()
            );
            false
        }
    }
}

impl Drop for GamepadHotkeyService {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn binding_name(button: Option<crate::hid::Button>) -> &'static str {
    button.map(|b| b.code()).unwrap_or("none")
}
