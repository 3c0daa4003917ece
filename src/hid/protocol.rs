//! Controller report layouts
//!
//! Each supported controller emits one of two input report formats depending
//! on how it is connected or which mode its firmware is in. The first byte of
//! every report is the report id, which selects the layout:
//! - Switch Pro: 0x30 (full mode) and 0x3F (simple HID mode)
//! - DualSense: 0x01 (USB) and 0x31 (Bluetooth, fields shifted by one byte)
//!
//! Offsets and masks are fixed protocol constants, captured from real devices.

use super::buttons::Button;

pub const NINTENDO_VID: u16 = 0x057E;
pub const SWITCH_PRO_PID: u16 = 0x2009;

pub const SONY_VID: u16 = 0x054C;
pub const DUALSENSE_PID: u16 = 0x0CE6;
pub const DUALSENSE_EDGE_PID: u16 = 0x0DF2;

/// Switch Pro standard full input report
pub const SWITCH_FULL_REPORT: u8 = 0x30;
/// Switch Pro simple HID input report
pub const SWITCH_SIMPLE_REPORT: u8 = 0x3F;
/// DualSense input report over USB
pub const DUALSENSE_USB_REPORT: u8 = 0x01;
/// DualSense extended input report over Bluetooth
pub const DUALSENSE_BT_REPORT: u8 = 0x31;

/// Neutral value of a hat-switch D-pad
pub const HAT_NEUTRAL: u8 = 0x08;

/// Controller family, resolved from the device's VID/PID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerProfile {
    Unknown,
    SwitchPro,
    DualSense,
}

impl ControllerProfile {
    /// Map a vendor/product pair to a known profile
    pub fn from_ids(vendor_id: u16, product_id: u16) -> Self {
        match (vendor_id, product_id) {
            (NINTENDO_VID, SWITCH_PRO_PID) => ControllerProfile::SwitchPro,
            (SONY_VID, DUALSENSE_PID) | (SONY_VID, DUALSENSE_EDGE_PID) => {
                ControllerProfile::DualSense
            }
            _ => ControllerProfile::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        *self != ControllerProfile::Unknown
    }

    /// Largest input report the controller sends, report id included
    pub fn max_report_len(&self) -> usize {
        match self {
            ControllerProfile::SwitchPro => 64,
            ControllerProfile::DualSense => 78,
            ControllerProfile::Unknown => 64,
        }
    }

    /// Look up the layout for a report id emitted by this controller
    pub fn layout(&self, report_id: u8) -> Option<&'static ReportLayout> {
        LAYOUTS
            .iter()
            .find(|layout| layout.profile == *self && layout.report_id == report_id)
    }
}

impl std::fmt::Display for ControllerProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ControllerProfile::Unknown => "unknown",
            ControllerProfile::SwitchPro => "Switch Pro",
            ControllerProfile::DualSense => "DualSense",
        };
        f.write_str(name)
    }
}

/// Where a button lives inside a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Pressed when `report[index] & mask != 0`
    Bit { index: usize, mask: u8 },
    /// Hat switch: pressed when `report[index] & mask == value`
    Hat { index: usize, mask: u8, value: u8 },
}

impl Binding {
    /// Test the binding against a report. Out-of-range offsets read as released.
    pub fn is_active(&self, report: &[u8]) -> bool {
        match *self {
            Binding::Bit { index, mask } => report
                .get(index)
                .is_some_and(|byte| byte & mask != 0),
            Binding::Hat { index, mask, value } => report
                .get(index)
                .is_some_and(|byte| byte & mask == value),
        }
    }
}

/// Button layout of one report id for one controller
#[derive(Debug)]
pub struct ReportLayout {
    pub profile: ControllerProfile,
    pub report_id: u8,
    /// Shorter reports carry no button data (e.g. truncated BT reports)
    pub min_len: usize,
    pub bindings: &'static [(Button, Binding)],
}

impl ReportLayout {
    pub fn binding(&self, button: Button) -> Option<Binding> {
        self.bindings
            .iter()
            .find(|(b, _)| *b == button)
            .map(|(_, binding)| *binding)
    }
}

const fn bit(index: usize, mask: u8) -> Binding {
    Binding::Bit { index, mask }
}

const fn hat(index: usize, value: u8) -> Binding {
    Binding::Hat {
        index,
        mask: 0x0F,
        value,
    }
}

const SWITCH_FULL_BINDINGS: &[(Button, Binding)] = &[
    (Button::Y, bit(3, 0x01)),
    (Button::X, bit(3, 0x02)),
    (Button::B, bit(3, 0x04)),
    (Button::A, bit(3, 0x08)),
    (Button::R, bit(3, 0x40)),
    (Button::ZR, bit(3, 0x80)),
    (Button::Minus, bit(4, 0x01)),
    (Button::Plus, bit(4, 0x02)),
    (Button::RStick, bit(4, 0x04)),
    (Button::LStick, bit(4, 0x08)),
    (Button::Home, bit(4, 0x10)),
    (Button::Capture, bit(4, 0x20)),
    (Button::DpadDown, bit(5, 0x01)),
    (Button::DpadUp, bit(5, 0x02)),
    (Button::DpadRight, bit(5, 0x04)),
    (Button::DpadLeft, bit(5, 0x08)),
    (Button::L, bit(5, 0x40)),
    (Button::ZL, bit(5, 0x80)),
];

const SWITCH_SIMPLE_BINDINGS: &[(Button, Binding)] = &[
    (Button::B, bit(1, 0x01)),
    (Button::A, bit(1, 0x02)),
    (Button::Y, bit(1, 0x04)),
    (Button::X, bit(1, 0x08)),
    (Button::L, bit(1, 0x10)),
    (Button::R, bit(1, 0x20)),
    (Button::ZL, bit(1, 0x40)),
    (Button::ZR, bit(1, 0x80)),
    (Button::Minus, bit(2, 0x01)),
    (Button::Plus, bit(2, 0x02)),
    (Button::LStick, bit(2, 0x04)),
    (Button::RStick, bit(2, 0x08)),
    (Button::Home, bit(2, 0x10)),
    (Button::Capture, bit(2, 0x20)),
    (Button::DpadUp, hat(3, 0)),
    (Button::DpadRight, hat(3, 2)),
    (Button::DpadDown, hat(3, 4)),
    (Button::DpadLeft, hat(3, 6)),
];

const DUALSENSE_USB_BINDINGS: &[(Button, Binding)] = &[
    (Button::DpadUp, hat(8, 0)),
    (Button::DpadRight, hat(8, 2)),
    (Button::DpadDown, hat(8, 4)),
    (Button::DpadLeft, hat(8, 6)),
    (Button::X, bit(8, 0x10)),
    (Button::A, bit(8, 0x20)),
    (Button::B, bit(8, 0x40)),
    (Button::Y, bit(8, 0x80)),
    (Button::L, bit(9, 0x01)),
    (Button::R, bit(9, 0x02)),
    (Button::ZL, bit(9, 0x04)),
    (Button::ZR, bit(9, 0x08)),
    (Button::Minus, bit(9, 0x10)),
    (Button::Plus, bit(9, 0x20)),
    (Button::LStick, bit(9, 0x40)),
    (Button::RStick, bit(9, 0x80)),
    (Button::Home, bit(10, 0x01)),
    (Button::Capture, bit(10, 0x02)),
];

const DUALSENSE_BT_BINDINGS: &[(Button, Binding)] = &[
    (Button::DpadUp, hat(9, 0)),
    (Button::DpadRight, hat(9, 2)),
    (Button::DpadDown, hat(9, 4)),
    (Button::DpadLeft, hat(9, 6)),
    (Button::X, bit(9, 0x10)),
    (Button::A, bit(9, 0x20)),
    (Button::B, bit(9, 0x40)),
    (Button::Y, bit(9, 0x80)),
    (Button::L, bit(10, 0x01)),
    (Button::R, bit(10, 0x02)),
    (Button::ZL, bit(10, 0x04)),
    (Button::ZR, bit(10, 0x08)),
    (Button::Minus, bit(10, 0x10)),
    (Button::Plus, bit(10, 0x20)),
    (Button::LStick, bit(10, 0x40)),
    (Button::RStick, bit(10, 0x80)),
    (Button::Home, bit(11, 0x01)),
    (Button::Capture, bit(11, 0x02)),
];

/// All known layouts, keyed by (profile, report id)
static LAYOUTS: &[ReportLayout] = &[
    ReportLayout {
        profile: ControllerProfile::SwitchPro,
        report_id: SWITCH_FULL_REPORT,
        min_len: 6,
        bindings: SWITCH_FULL_BINDINGS,
    },
    ReportLayout {
        profile: ControllerProfile::SwitchPro,
        report_id: SWITCH_SIMPLE_REPORT,
        min_len: 4,
        bindings: SWITCH_SIMPLE_BINDINGS,
    },
    ReportLayout {
        profile: ControllerProfile::DualSense,
        report_id: DUALSENSE_USB_REPORT,
        min_len: 11,
        bindings: DUALSENSE_USB_BINDINGS,
    },
    ReportLayout {
        profile: ControllerProfile::DualSense,
        report_id: DUALSENSE_BT_REPORT,
        min_len: 12,
        bindings: DUALSENSE_BT_BINDINGS,
    },
];

/// Whether `button` is held in `report` for a controller of `profile`.
///
/// Unbound buttons, unknown profiles, empty or truncated reports and report
/// ids without a layout all read as "not pressed".
pub fn is_button_pressed(profile: ControllerProfile, report: &[u8], button: Option<Button>) -> bool {
    let Some(button) = button else {
        return false;
    };
    let Some(&report_id) = report.first() else {
        return false;
    };
    let Some(layout) = profile.layout(report_id) else {
        return false;
    };
    if report.len() < layout.min_len {
        return false;
    }
    layout
        .binding(button)
        .is_some_and(|binding| binding.is_active(report))
}
