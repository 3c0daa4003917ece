//! HID device discovery and connection management

use super::buttons::Button;
use super::protocol::ControllerProfile;
use crate::core::control::RunControl;
use hidapi::{HidApi, HidDevice};
use std::collections::HashSet;
use std::ffi::CString;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The controller a listener is bound to. Immutable for the listener's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub toggle: Option<Button>,
    pub menu: Option<Button>,
}

impl TargetDevice {
    /// Unknown or empty button codes leave that action unbound
    pub fn new(vendor_id: u16, product_id: u16, toggle: Option<&str>, menu: Option<&str>) -> Self {
        let target = Self {
            vendor_id,
            product_id,
            toggle: Button::parse_binding(toggle),
            menu: Button::parse_binding(menu),
        };
        for button in [target.toggle, target.menu].into_iter().flatten().filter(Button::is_dpad) {
            debug!("{} is a D-pad direction; diagonals do not trigger it", button);
        }
        target
    }
}

/// Errors raised by a device backend or an open stream
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HID API not initialized")]
    NotInitialized,
}

/// A device seen during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Platform path used to open the device
    pub path: CString,
    pub product_name: Option<String>,
}

impl DeviceDescriptor {
    pub fn display_name(&self) -> &str {
        self.product_name.as_deref().unwrap_or("Unknown")
    }
}

/// Result of one bounded read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A report of this many bytes was written to the buffer
    Data(usize),
    /// Nothing arrived within the timeout
    Idle,
    /// The device is gone
    Closed,
}

/// An open, readable device
pub trait ReportStream: Send {
    /// Read one input report, waiting at most `timeout`
    fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ReadOutcome, DeviceError>;
}

/// Platform access to HID enumeration and open
pub trait DeviceBackend: Send {
    /// First attached device matching the vendor/product pair
    fn find(&mut self, vendor_id: u16, product_id: u16) -> Result<Option<DeviceDescriptor>, DeviceError>;

    /// Open a previously found device for reading
    fn open(&mut self, device: &DeviceDescriptor) -> Result<Box<dyn ReportStream>, DeviceError>;
}

/// `hidapi`-backed device access.
///
/// The `HidApi` context is created on first use so that it lives on the
/// listener thread along with every other device call.
#[derive(Default)]
pub struct HidApiBackend {
    api: Option<HidApi>,
}

impl HidApiBackend {
    pub fn new() -> Self {
        Self { api: None }
    }

    fn api(&mut self) -> Result<&mut HidApi, DeviceError> {
        if self.api.is_none() {
            let api = HidApi::new()?;
            // Share the device with the OS gamepad driver and other apps
            #[cfg(target_os = "macos")]
            {
                api.set_open_exclusive(false);
            }
            self.api = Some(api);
        }
        self.api.as_mut().ok_or(DeviceError::NotInitialized)
    }
}

impl DeviceBackend for HidApiBackend {
    fn find(&mut self, vendor_id: u16, product_id: u16) -> Result<Option<DeviceDescriptor>, DeviceError> {
        let api = self.api()?;
        // Refresh device list to see newly connected devices
        api.refresh_devices()?;

        let found = api
            .device_list()
            .find(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .map(|d| DeviceDescriptor {
                vendor_id: d.vendor_id(),
                product_id: d.product_id(),
                path: d.path().to_owned(),
                product_name: d.product_string().map(str::to_string),
            });
        Ok(found)
    }

    fn open(&mut self, device: &DeviceDescriptor) -> Result<Box<dyn ReportStream>, DeviceError> {
        let api = self.api()?;
        let handle = api.open_path(&device.path)?;
        handle.set_blocking_mode(true)?;
        Ok(Box::new(HidStream { device: handle }))
    }
}

/// Input stream over an open `HidDevice`
pub struct HidStream {
    device: HidDevice,
}

impl ReportStream for HidStream {
    fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ReadOutcome, DeviceError> {
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        match self.device.read_timeout(buf, timeout_ms)? {
            // hidapi reports a timeout as a zero-length read; removal is an error
            0 => Ok(ReadOutcome::Idle),
            n => Ok(ReadOutcome::Data(n)),
        }
    }
}

/// A device that has been found, profiled and opened
pub struct OpenDevice {
    pub descriptor: DeviceDescriptor,
    pub profile: ControllerProfile,
    pub stream: Box<dyn ReportStream>,
    /// Read buffer sized to the profile's largest report
    pub buffer: Vec<u8>,
}

/// Device acquisition state machine: find → profile → open, with backoff
pub struct Acquisition {
    backend: Box<dyn DeviceBackend>,
    vendor_id: u16,
    product_id: u16,
    device_poll: Duration,
    open_retry: Duration,
    /// Paths already reported as unsupported, to keep the log quiet
    unsupported: HashSet<CString>,
    /// Set while enumeration keeps failing; only the first failure warns
    enumeration_failing: bool,
}

impl Acquisition {
    pub fn new(
        backend: Box<dyn DeviceBackend>,
        target: &TargetDevice,
        device_poll: Duration,
        open_retry: Duration,
    ) -> Self {
        Self {
            backend,
            vendor_id: target.vendor_id,
            product_id: target.product_id,
            device_poll,
            open_retry,
            unsupported: HashSet::new(),
            enumeration_failing: false,
        }
    }

    /// Retry until a device is open. Returns `None` once cancellation is requested.
    pub fn acquire(&mut self, control: &RunControl) -> Option<OpenDevice> {
        loop {
            // Paused listeners stop searching too
            if !control.wait_while_paused() {
                return None;
            }

            let Some(descriptor) = self.find_device() else {
                debug!(
                    "Gamepad 0x{:04X}:0x{:04X} not found, retrying in {:?}",
                    self.vendor_id, self.product_id, self.device_poll
                );
                if !control.sleep(self.device_poll) {
                    return None;
                }
                continue;
            };

            let profile = determine_profile(descriptor.vendor_id, descriptor.product_id);
            if !profile.is_known() {
                if self.unsupported.insert(descriptor.path.clone()) {
                    warn!(
                        "Found {} (0x{:04X}:0x{:04X}) but its report format is not supported",
                        descriptor.display_name(),
                        descriptor.vendor_id,
                        descriptor.product_id
                    );
                }
                if !control.sleep(self.device_poll) {
                    return None;
                }
                continue;
            }

            match self.open_stream(&descriptor) {
                Some(stream) => {
                    info!(
                        "Gamepad connected: {} ({} profile)",
                        descriptor.display_name(),
                        profile
                    );
                    return Some(OpenDevice {
                        buffer: vec![0u8; profile.max_report_len()],
                        descriptor,
                        profile,
                        stream,
                    });
                }
                None => {
                    if !control.sleep(self.open_retry) {
                        return None;
                    }
                }
            }
        }
    }

    /// Query the device list for the target VID/PID
    pub fn find_device(&mut self) -> Option<DeviceDescriptor> {
        match self.backend.find(self.vendor_id, self.product_id) {
            Ok(found) => {
                if self.enumeration_failing {
                    info!("HID enumeration recovered");
                    self.enumeration_failing = false;
                }
                found
            }
            Err(e) => {
                if self.enumeration_failing {
                    debug!("Failed to enumerate HID devices: {}", e);
                } else {
                    warn!("Failed to enumerate HID devices: {}", e);
                    self.enumeration_failing = true;
                }
                None
            }
        }
    }

    /// Open `device` for reading; failures are logged and yield `None`
    pub fn open_stream(&mut self, device: &DeviceDescriptor) -> Option<Box<dyn ReportStream>> {
        match self.backend.open(device) {
            Ok(stream) => Some(stream),
            Err(e) => {
                debug!(
                    "Failed to open gamepad {}: {}, retrying in {:?}",
                    device.display_name(),
                    e,
                    self.open_retry
                );
                None
            }
        }
    }
}

/// Resolve the decode profile for a device
pub fn determine_profile(vendor_id: u16, product_id: u16) -> ControllerProfile {
    ControllerProfile::from_ids(vendor_id, product_id)
}
