//! Hotkey module - gamepad listener service and keyboard hotkeys

mod edge;
mod keyboard;
mod listener;
mod service;

pub use edge::{EdgeState, Releases};
pub use keyboard::{parse_hotkey, KeyboardHotkeys};
pub use service::GamepadHotkeyService;
