//! Hand-off of hotkey actions to the host's execution context
//!
//! Detection runs on background threads; the actions themselves belong to
//! the host (usually its UI event loop). The dispatcher only ever enqueues.

use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A unit of work to run on the host's execution context
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Zero-argument action supplied by the host
pub type Callback = Arc<dyn Fn() + Send + Sync + 'static>;

/// The two actions a hotkey can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    Toggle,
    Menu,
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyAction::Toggle => f.write_str("toggle"),
            HotkeyAction::Menu => f.write_str("menu"),
        }
    }
}

/// Queue owned by the host's execution context
pub trait ExecutionContext: Send + Sync {
    /// Enqueue `task`. Returns false if the queue is gone.
    fn try_enqueue(&self, task: Task) -> bool;
}

impl ExecutionContext for mpsc::UnboundedSender<Task> {
    fn try_enqueue(&self, task: Task) -> bool {
        self.send(task).is_ok()
    }
}

/// Callbacks bound to each hotkey action
#[derive(Clone, Default)]
pub struct HotkeyCallbacks {
    pub on_toggle: Option<Callback>,
    pub on_menu: Option<Callback>,
}

impl HotkeyCallbacks {
    pub fn new(
        on_toggle: impl Fn() + Send + Sync + 'static,
        on_menu: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_toggle: Some(Arc::new(on_toggle)),
            on_menu: Some(Arc::new(on_menu)),
        }
    }

    fn get(&self, action: HotkeyAction) -> Option<&Callback> {
        match action {
            HotkeyAction::Toggle => self.on_toggle.as_ref(),
            HotkeyAction::Menu => self.on_menu.as_ref(),
        }
    }
}

impl fmt::Debug for HotkeyCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyCallbacks")
            .field("on_toggle", &self.on_toggle.is_some())
            .field("on_menu", &self.on_menu.is_some())
            .finish()
    }
}

/// Posts hotkey callbacks onto the host's execution context
#[derive(Clone)]
pub struct ActionDispatcher {
    context: Arc<dyn ExecutionContext>,
    callbacks: HotkeyCallbacks,
}

impl ActionDispatcher {
    pub fn new(context: Arc<dyn ExecutionContext>, callbacks: HotkeyCallbacks) -> Self {
        Self { context, callbacks }
    }

    /// Queue the callback bound to `action`.
    ///
    /// Never runs the callback on the calling thread. A failed enqueue drops
    /// the fire; the caller is never blocked or retried.
    pub fn dispatch(&self, action: HotkeyAction) -> bool {
        let Some(callback) = self.callbacks.get(action) else {
            debug!("No callback bound for {} hotkey", action);
            return false;
        };

        let callback = Arc::clone(callback);
        if self.context.try_enqueue(Box::new(move || callback())) {
            debug!("Dispatched {} hotkey", action);
            true
        } else {
            warn!("Failed to enqueue {} hotkey action, dropping it", action);
            false
        }
    }
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}
