//! Run state shared between the service handle and its listener thread
//!
//! Pause and cancellation are one state machine behind one lock, so a resume
//! racing a stop can never reopen a loop that is shutting down.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Lifecycle of a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Reading and dispatching
    Running,
    /// Gate closed; the listener blocks before its next read
    Paused,
    /// Cancellation requested
    Stopping,
    /// Listener thread has exited and released the device
    Stopped,
}

/// Pause gate + cancellation signal
#[derive(Debug)]
pub struct RunControl {
    state: Mutex<RunState>,
    changed: Condvar,
    /// Set by `resume()`, consumed by the listener to clear its edge state
    resumed: AtomicBool,
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunControl {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RunState::Running),
            changed: Condvar::new(),
            resumed: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// Close the gate. Returns false if the listener was not running.
    pub fn pause(&self) -> bool {
        let mut state = self.state.lock();
        if *state != RunState::Running {
            return false;
        }
        *state = RunState::Paused;
        self.changed.notify_all();
        true
    }

    /// Reopen the gate. Has no effect once a stop has been requested.
    pub fn resume(&self) -> bool {
        let mut state = self.state.lock();
        if *state != RunState::Paused {
            return false;
        }
        *state = RunState::Running;
        self.resumed.store(true, Ordering::SeqCst);
        self.changed.notify_all();
        true
    }

    /// Request cancellation. Wakes every waiter, including a paused gate.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if matches!(*state, RunState::Running | RunState::Paused) {
            *state = RunState::Stopping;
            self.changed.notify_all();
        }
    }

    /// Called by the listener once it has exited and cleaned up
    pub fn mark_stopped(&self) {
        let mut state = self.state.lock();
        *state = RunState::Stopped;
        self.changed.notify_all();
    }

    pub fn is_stopping(&self) -> bool {
        matches!(self.state(), RunState::Stopping | RunState::Stopped)
    }

    /// Returns true (once) if `resume()` has been called since the last check
    pub fn take_resumed(&self) -> bool {
        self.resumed.swap(false, Ordering::SeqCst)
    }

    /// Block while paused. Returns false if cancellation was requested.
    pub fn wait_while_paused(&self) -> bool {
        let mut state = self.state.lock();
        loop {
            match *state {
                RunState::Running => return true,
                RunState::Paused => self.changed.wait(&mut state),
                RunState::Stopping | RunState::Stopped => return false,
            }
        }
    }

    /// Cancellable sleep. Returns false if cancellation was requested.
    ///
    /// Pausing does not cut a sleep short; the gate is checked afterwards.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut state = self.state.lock();
        loop {
            if matches!(*state, RunState::Stopping | RunState::Stopped) {
                return false;
            }
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return !matches!(*state, RunState::Stopping | RunState::Stopped);
            }
        }
    }

    /// Wait for the listener to reach `Stopped`. Returns false on timeout.
    pub fn wait_stopped(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while *state != RunState::Stopped {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return *state == RunState::Stopped;
            }
        }
        true
    }
}
