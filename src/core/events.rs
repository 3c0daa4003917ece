//! Host event-loop integration

use super::dispatch::{ExecutionContext, Task};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use winit::event_loop::EventLoopProxy;

/// Wrapper around `mpsc::UnboundedSender<Task>` that also wakes the winit
/// event loop via `EventLoopProxy::send_event()` after every send. The loop
/// can then sit in `ControlFlow::Wait` and still run hotkey actions promptly.
pub struct EventSender {
    tx: mpsc::UnboundedSender<Task>,
    proxy: Mutex<EventLoopProxy<()>>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<Task>, proxy: EventLoopProxy<()>) -> Self {
        Self {
            tx,
            proxy: Mutex::new(proxy),
        }
    }
}

impl ExecutionContext for EventSender {
    fn try_enqueue(&self, task: Task) -> bool {
        if self.tx.send(task).is_err() {
            return false;
        }
        // Loop already exiting; the task stays queued and is harmless
        let _ = self.proxy.lock().send_event(());
        true
    }
}
