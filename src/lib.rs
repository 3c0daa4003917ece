//! Gamepad Hotkeys
//!
//! Turns button releases on a USB/Bluetooth gamepad into global application
//! hotkeys that fire even when the host application has no input focus.
//!
//! # Features
//! - Finds and reopens a controller by VID/PID, surviving unplug and busy devices
//! - Decodes Switch Pro (0x30 / 0x3F) and DualSense (USB 0x01 / BT 0x31) reports
//! - Fires on button release, so a held button never repeats
//! - Pause, resume and stop from any thread without blocking the host
//! - Keyboard combinations bound to the same actions

pub mod core;
pub mod hid;
pub mod hotkey;

pub use crate::core::config::Config;
pub use crate::core::dispatch::{ActionDispatcher, ExecutionContext, HotkeyAction, HotkeyCallbacks, Task};
pub use hid::{Button, ControllerProfile, TargetDevice};
pub use hotkey::{GamepadHotkeyService, KeyboardHotkeys};
