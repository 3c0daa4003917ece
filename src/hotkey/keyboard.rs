//! Global keyboard hotkey registration and handling
//!
//! Keyboard combinations are bound to the same two actions as the gamepad
//! buttons and go through the same dispatcher.

use crate::core::config::KeyboardConfig;
use crate::core::dispatch::{ActionDispatcher, HotkeyAction};
use anyhow::{Context, Result};
use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Global keyboard hotkeys for the toggle and menu actions
pub struct KeyboardHotkeys {
    /// Global hotkey manager from the crate (kept alive for hotkey registration)
    manager: GlobalHotKeyManager,
    /// Registered hotkeys by id
    registered: HashMap<u32, (HotKey, HotkeyAction)>,
    dispatcher: ActionDispatcher,
}

impl KeyboardHotkeys {
    /// Register the configured combinations. Unparseable or taken
    /// combinations are logged and skipped.
    pub fn new(config: &KeyboardConfig, dispatcher: ActionDispatcher) -> Result<Self> {
        let manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;
        let mut registered = HashMap::new();

        let bindings = [
            (config.toggle_key.as_str(), HotkeyAction::Toggle),
            (config.menu_key.as_str(), HotkeyAction::Menu),
        ];

        for (key_str, action) in bindings {
            if key_str.trim().is_empty() {
                continue;
            }
            let Some(hotkey) = parse_hotkey(key_str) else {
                continue;
            };
            match manager.register(hotkey) {
                Ok(()) => {
                    registered.insert(hotkey.id(), (hotkey, action));
                    info!("Registered {} key: {}", action, key_str);
                }
                Err(e) => {
                    warn!("Failed to register {} key {}: {}", action, key_str, e);
                }
            }
        }

        Ok(Self {
            manager,
            registered,
            dispatcher,
        })
    }

    /// Drain pending hotkey events (call from the host event loop).
    ///
    /// Fires on key release, matching the gamepad edge rule.
    pub fn process_events(&self) {
        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            if event.state != HotKeyState::Released {
                continue;
            }
            if let Some((_, action)) = self.registered.get(&event.id) {
                debug!("Keyboard {} hotkey released", action);
                self.dispatcher.dispatch(*action);
            }
        }
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }
}

impl Drop for KeyboardHotkeys {
    fn drop(&mut self) {
        for (hotkey, _) in self.registered.values() {
            if let Err(e) = self.manager.unregister(*hotkey) {
                debug!("Failed to unregister hotkey {}: {}", hotkey.id(), e);
            }
        }
    }
}

/// Parse a combination such as "Ctrl+Shift+F9" into a HotKey
pub fn parse_hotkey(key_str: &str) -> Option<HotKey> {
    let mut modifiers = Modifiers::empty();
    let mut code = None;

    for part in key_str.split('+').map(str::trim) {
        match part.to_uppercase().as_str() {
            "CTRL" | "CONTROL" => modifiers |= Modifiers::CONTROL,
            "SHIFT" => modifiers |= Modifiers::SHIFT,
            "ALT" | "OPTION" => modifiers |= Modifiers::ALT,
            "SUPER" | "CMD" | "COMMAND" | "META" | "WIN" => modifiers |= Modifiers::SUPER,
            key => {
                if code.is_some() {
                    warn!("Hotkey {} has more than one key", key_str);
                    return None;
                }
                match parse_code(key) {
                    Some(c) => code = Some(c),
                    None => {
                        warn!("Unknown hotkey: {}", key_str);
                        return None;
                    }
                }
            }
        }
    }

    let Some(code) = code else {
        warn!("Hotkey {} has no key", key_str);
        return None;
    };
    let modifiers = (!modifiers.is_empty()).then_some(modifiers);
    Some(HotKey::new(modifiers, code))
}

/// Map an upper-cased key name to its code
fn parse_code(key: &str) -> Option<Code> {
    let code = match key {
        "A" => Code::KeyA,
        "B" => Code::KeyB,
        "C" => Code::KeyC,
        "D" => Code::KeyD,
        "E" => Code::KeyE,
        "F" => Code::KeyF,
        "G" => Code::KeyG,
        "H" => Code::KeyH,
        "I" => Code::KeyI,
        "J" => Code::KeyJ,
        "K" => Code::KeyK,
        "L" => Code::KeyL,
        "M" => Code::KeyM,
        "N" => Code::KeyN,
        "O" => Code::KeyO,
        "P" => Code::KeyP,
        "Q" => Code::KeyQ,
        "R" => Code::KeyR,
        "S" => Code::KeyS,
        "T" => Code::KeyT,
        "U" => Code::KeyU,
        "V" => Code::KeyV,
        "W" => Code::KeyW,
        "X" => Code::KeyX,
        "Y" => Code::KeyY,
        "Z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        "F1" => Code::F1,
        "F2" => Code::F2,
        "F3" => Code::F3,
        "F4" => Code::F4,
        "F5" => Code::F5,
        "F6" => Code::F6,
        "F7" => Code::F7,
        "F8" => Code::F8,
        "F9" => Code::F9,
        "F10" => Code::F10,
        "F11" => Code::F11,
        "F12" => Code::F12,
        "F13" => Code::F13,
        "F14" => Code::F14,
        "F15" => Code::F15,
        "F16" => Code::F16,
        "F17" => Code::F17,
        "F18" => Code::F18,
        "F19" => Code::F19,
        "F20" => Code::F20,
        "F21" => Code::F21,
        "F22" => Code::F22,
        "F23" => Code::F23,
        "F24" => Code::F24,
        "SPACE" => Code::Space,
        "ENTER" | "RETURN" => Code::Enter,
        "ESC" | "ESCAPE" => Code::Escape,
        "TAB" => Code::Tab,
        "BACKSPACE" => Code::Backspace,
        "DELETE" | "DEL" => Code::Delete,
        "INSERT" | "INS" => Code::Insert,
        "HOME" => Code::Home,
        "END" => Code::End,
        "PAGEUP" => Code::PageUp,
        "PAGEDOWN" => Code::PageDown,
        "UP" => Code::ArrowUp,
        "DOWN" => Code::ArrowDown,
        "LEFT" => Code::ArrowLeft,
        "RIGHT" => Code::ArrowRight,
        _ => return None,
    };
    Some(code)
}
