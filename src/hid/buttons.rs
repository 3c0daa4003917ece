//! Logical gamepad button codes
//!
//! Hotkeys are configured with controller-neutral codes such as `BTN_A` or
//! `DPAD_UP`. Names follow the Nintendo layout; PlayStation names are accepted
//! as aliases for the button in the same physical role.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A logical controller button that can be bound to a hotkey action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    L,
    R,
    ZL,
    ZR,
    Minus,
    Plus,
    Home,
    Capture,
    LStick,
    RStick,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

/// Returned when a configured button code is not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown button code: {0}")]
pub struct UnknownButton(pub String);

impl Button {
    /// Canonical configuration code for this button
    pub fn code(&self) -> &'static str {
        match self {
            Button::A => "BTN_A",
            Button::B => "BTN_B",
            Button::X => "BTN_X",
            Button::Y => "BTN_Y",
            Button::L => "BTN_L",
            Button::R => "BTN_R",
            Button::ZL => "BTN_ZL",
            Button::ZR => "BTN_ZR",
            Button::Minus => "BTN_MINUS",
            Button::Plus => "BTN_PLUS",
            Button::Home => "BTN_HOME",
            Button::Capture => "BTN_CAPTURE",
            Button::LStick => "BTN_LSTICK",
            Button::RStick => "BTN_RSTICK",
            Button::DpadUp => "DPAD_UP",
            Button::DpadDown => "DPAD_DOWN",
            Button::DpadLeft => "DPAD_LEFT",
            Button::DpadRight => "DPAD_RIGHT",
        }
    }

    /// Whether this is one of the four D-pad directions
    pub fn is_dpad(&self) -> bool {
        matches!(
            self,
            Button::DpadUp | Button::DpadDown | Button::DpadLeft | Button::DpadRight
        )
    }

    /// Parse an optional configuration code.
    ///
    /// Empty strings mean "unbound". Unknown codes are logged and also
    /// treated as unbound so a typo never prevents the service from starting.
    pub fn parse_binding(code: Option<&str>) -> Option<Button> {
        let code = code?.trim();
        if code.is_empty() {
            return None;
        }
        match code.parse() {
            Ok(button) => Some(button),
            Err(e) => {
                tracing::warn!("Ignoring gamepad binding: {}", e);
                None
            }
        }
    }
}

impl FromStr for Button {
    type Err = UnknownButton;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let button = match s.trim().to_uppercase().as_str() {
            "BTN_A" | "BTN_CROSS" => Button::A,
            "BTN_B" | "BTN_CIRCLE" => Button::B,
            "BTN_X" | "BTN_SQUARE" => Button::X,
            "BTN_Y" | "BTN_TRIANGLE" => Button::Y,
            "BTN_L" | "BTN_L1" => Button::L,
            "BTN_R" | "BTN_R1" => Button::R,
            "BTN_ZL" | "BTN_L2" => Button::ZL,
            "BTN_ZR" | "BTN_R2" => Button::ZR,
            "BTN_MINUS" | "BTN_SHARE" | "BTN_CREATE" => Button::Minus,
            "BTN_PLUS" | "BTN_OPTIONS" | "BTN_START" => Button::Plus,
            "BTN_HOME" | "BTN_PS" => Button::Home,
            "BTN_CAPTURE" | "BTN_TOUCHPAD" => Button::Capture,
            "BTN_LSTICK" | "BTN_L3" => Button::LStick,
            "BTN_RSTICK" | "BTN_R3" => Button::RStick,
            "DPAD_UP" => Button::DpadUp,
            "DPAD_DOWN" => Button::DpadDown,
            "DPAD_LEFT" => Button::DpadLeft,
            "DPAD_RIGHT" => Button::DpadRight,
            _ => return Err(UnknownButton(s.trim().to_string())),
        };
        Ok(button)
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
