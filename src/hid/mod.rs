//! HID module - gamepad discovery, report layouts and button decoding

mod buttons;
mod device;
mod protocol;

pub use buttons::{Button, UnknownButton};
pub use device::{
    determine_profile, Acquisition, DeviceBackend, DeviceDescriptor, DeviceError, HidApiBackend,
    OpenDevice, ReadOutcome, ReportStream, TargetDevice,
};
pub use protocol::{
    is_button_pressed, Binding, ControllerProfile, ReportLayout, DUALSENSE_BT_REPORT,
    DUALSENSE_USB_REPORT, HAT_NEUTRAL, SWITCH_FULL_REPORT, SWITCH_SIMPLE_REPORT,
};
