//! The gamepad read loop
//!
//! One thread owns the device for its whole life: it acquires the controller,
//! reads reports in arrival order, turns release edges into dispatched
//! actions and falls back to acquisition whenever the device goes away.

use super::edge::EdgeState;
use crate::core::config::ListenerTiming;
use crate::core::control::{RunControl, RunState};
use crate::core::dispatch::ActionDispatcher;
use crate::hid::{is_button_pressed, Acquisition, ControllerProfile, OpenDevice, ReadOutcome, TargetDevice};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What the loop should do after one read cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cycle {
    /// Keep reading from the open device
    Continue,
    /// Device is gone; release it and search again
    Lost,
    /// Cancellation observed
    Stopped,
}

pub struct Listener {
    target: TargetDevice,
    timing: ListenerTiming,
    acquisition: Acquisition,
    control: Arc<RunControl>,
    dispatcher: ActionDispatcher,
    connected: Arc<AtomicBool>,
    edges: EdgeState,
}

impl Listener {
    pub fn new(
        target: TargetDevice,
        timing: ListenerTiming,
        acquisition: Acquisition,
        control: Arc<RunControl>,
        dispatcher: ActionDispatcher,
        connected: Arc<AtomicBool>,
    ) -> Self {
        Self {
            target,
            timing,
            acquisition,
            control,
            dispatcher,
            connected,
            edges: EdgeState::new(),
        }
    }

    /// Run until cancellation. Never panics past this boundary.
    pub fn run(mut self) {
        info!(
            "Gamepad listener started for 0x{:04X}:0x{:04X}",
            self.target.vendor_id, self.target.product_id
        );

        let _stopped = StopGuard {
            control: Arc::clone(&self.control),
            connected: Arc::clone(&self.connected),
        };
        let mut device: Option<OpenDevice> = None;

        loop {
            if !self.control.wait_while_paused() {
                break;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.step(&mut device)));
            match outcome {
                Ok(Cycle::Continue) => {}
                Ok(Cycle::Stopped) => break,
                Ok(Cycle::Lost) => self.release(&mut device),
                Err(_) => {
                    error!(
                        "Unexpected fault in gamepad listener, backing off {:?}",
                        self.timing.fault_backoff()
                    );
                    self.release(&mut device);
                    if !self.control.sleep(self.timing.fault_backoff()) {
                        break;
                    }
                }
            }
        }

        self.release(&mut device);
    }

    /// Acquire a device if none is open, then run one read cycle on it
    fn step(&mut self, device: &mut Option<OpenDevice>) -> Cycle {
        if device.is_none() {
            match self.acquisition.acquire(&self.control) {
                Some(opened) => {
                    self.connected.store(true, Ordering::SeqCst);
                    *device = Some(opened);
                }
                None => return Cycle::Stopped,
            }
        }
        match device.as_mut() {
            Some(open) => self.read_cycle(open),
            None => Cycle::Continue,
        }
    }

    /// One bounded read plus processing of whatever arrived
    fn read_cycle(&mut self, open: &mut OpenDevice) -> Cycle {
        let outcome = open
            .stream
            .read_report(&mut open.buffer, self.timing.read_poll());

        match outcome {
            Ok(ReadOutcome::Idle) => {
                if self.control.is_stopping() {
                    Cycle::Stopped
                } else {
                    Cycle::Continue
                }
            }
            Ok(ReadOutcome::Data(0)) | Ok(ReadOutcome::Closed) => {
                info!("Gamepad disconnected: {}", open.descriptor.display_name());
                Cycle::Lost
            }
            Ok(ReadOutcome::Data(len)) => {
                let len = len.min(open.buffer.len());
                self.on_report(open.profile, &open.buffer[..len])
            }
            Err(e) => {
                warn!("Gamepad read failed: {}", e);
                Cycle::Lost
            }
        }
    }

    /// Decode one report and dispatch any release edges
    fn on_report(&mut self, profile: ControllerProfile, report: &[u8]) -> Cycle {
        match self.control.state() {
            RunState::Running => {}
            // Read raced a pause; drop the report, the gate blocks next cycle
            RunState::Paused => return Cycle::Continue,
            RunState::Stopping | RunState::Stopped => return Cycle::Stopped,
        }

        if self.control.take_resumed() {
            debug!("Resumed, clearing held-button state");
            self.edges.reset();
        }

        let toggle = is_button_pressed(profile, report, self.target.toggle);
        let menu = is_button_pressed(profile, report, self.target.menu);

        for action in self.edges.update(toggle, menu).actions() {
            debug!("Gamepad {} hotkey released", action);
            self.dispatcher.dispatch(action);
        }
        Cycle::Continue
    }

    /// Close the device, if open. Safe to call repeatedly.
    fn release(&mut self, device: &mut Option<OpenDevice>) {
        if let Some(open) = device.take() {
            debug!("Releasing gamepad {}", open.descriptor.display_name());
            drop(open);
            self.connected.store(false, Ordering::SeqCst);
        }
    }
}

/// Marks the listener stopped however `run` exits
struct StopGuard {
    control: Arc<RunControl>,
    connected: Arc<AtomicBool>,
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.connected.store(false, Ordering::SeqCst);
        self.control.mark_stopped();
        info!("Gamepad listener stopped");
    }
}
