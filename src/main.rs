// Hide console window on Windows release builds
#![cfg_attr(
    all(target_os = "windows", not(debug_assertions)),
    windows_subsystem = "windows"
)]

//! Gamepad Hotkeys - Entry Point
//!
//! Hosts the gamepad and keyboard hotkey listeners on a winit event loop and
//! runs their actions on the main thread.

use anyhow::Result;
use gamepad_hotkeys::{
    core::{
        config::Config,
        dispatch::{ActionDispatcher, ExecutionContext, HotkeyCallbacks, Task},
        events::EventSender,
    },
    GamepadHotkeyService, KeyboardHotkeys,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::WindowId,
};

/// How often keyboard hotkey events are polled
const KEYBOARD_POLL: Duration = Duration::from_millis(50);

/// Main application handler for winit event loop
struct App {
    /// Execution context handed to the listeners
    context: Arc<EventSender>,
    /// Queued hotkey actions
    task_rx: mpsc::UnboundedReceiver<Task>,
    config: Config,
    gamepad: Option<GamepadHotkeyService>,
    keyboard: Option<KeyboardHotkeys>,
    /// Shown state toggled by the toggle hotkey
    visible: Arc<AtomicBool>,
    started: bool,
}

impl App {
    fn new(context: Arc<EventSender>, task_rx: mpsc::UnboundedReceiver<Task>, config: Config) -> Self {
        Self {
            context,
            task_rx,
            config,
            gamepad: None,
            keyboard: None,
            visible: Arc::new(AtomicBool::new(false)),
            started: false,
        }
    }

    fn callbacks(&self) -> HotkeyCallbacks {
        let visible = Arc::clone(&self.visible);
        HotkeyCallbacks::new(
            move || {
                let now_visible = !visible.fetch_xor(true, Ordering::SeqCst);
                info!("Toggle hotkey: overlay {}", if now_visible { "shown" } else { "hidden" });
            },
            || info!("Menu hotkey: opening menu"),
        )
    }

    fn start_listeners(&mut self) {
        let context: Arc<dyn ExecutionContext> = self.context.clone();
        let callbacks = self.callbacks();

        let mut gamepad = GamepadHotkeyService::new(
            self.config.gamepad.target(),
            self.config.gamepad.timing.clone(),
            Arc::clone(&context),
            callbacks.clone(),
        );
        match gamepad.start() {
            Ok(()) => self.gamepad = Some(gamepad),
            Err(e) => error!("Failed to start gamepad hotkeys: {:#}", e),
        }

        if self.config.keyboard.enabled {
            let dispatcher = ActionDispatcher::new(context, callbacks);
            match KeyboardHotkeys::new(&self.config.keyboard, dispatcher) {
                Ok(keyboard) => {
                    info!("Keyboard hotkeys registered: {}", keyboard.registered_count());
                    self.keyboard = Some(keyboard);
                }
                Err(e) => error!("Failed to initialize keyboard hotkeys: {:#}", e),
            }
        }
    }

    /// Run every queued action on this (the main) thread
    fn run_pending_tasks(&mut self) {
        while let Ok(task) = self.task_rx.try_recv() {
            task();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        if !self.started {
            self.started = true;
            self.start_listeners();
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, _event: ()) {
        self.run_pending_tasks();
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, _event: WindowEvent) {
        // No windows of our own
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(ref keyboard) = self.keyboard {
            keyboard.process_events();
            event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + KEYBOARD_POLL));
        }
        self.run_pending_tasks();
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut gamepad) = self.gamepad.take() {
            gamepad.dispose();
        }
        self.keyboard = None;
        info!("Gamepad Hotkeys exiting");
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gamepad Hotkeys");

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded");

    // Create task channel
    let (task_tx, task_rx) = mpsc::unbounded_channel::<Task>();

    // Create event loop
    let event_loop = EventLoop::new()?;

    // Wrap the channel + event loop proxy so queued actions wake the loop
    let proxy = event_loop.create_proxy();
    let context = Arc::new(EventSender::new(task_tx, proxy));

    let mut app = App::new(context, task_rx, config);

    // Run event loop
    event_loop.run_app(&mut app)?;

    Ok(())
}
