//! Scripted HID backend and helpers shared by the integration tests

use gamepad_hotkeys::core::config::ListenerTiming;
use gamepad_hotkeys::core::dispatch::{ActionDispatcher, HotkeyAction, HotkeyCallbacks, Task};
use gamepad_hotkeys::hid::{DeviceBackend, DeviceDescriptor, DeviceError, ReadOutcome, ReportStream};
use gamepad_hotkeys::{GamepadHotkeyService, TargetDevice};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::ffi::CString;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// One scripted result of `read_report`
#[derive(Debug, Clone)]
pub enum Step {
    Report(Vec<u8>),
    /// Zero-length read
    Empty,
    /// Device removed
    Disconnect,
    /// I/O failure
    Fail,
    /// Bug inside the read path
    Panic,
}

/// Counters observed by the tests
#[derive(Default)]
pub struct Probe {
    pub opens: AtomicUsize,
    pub finds: AtomicUsize,
    /// Reads served after a stream ran out of steps
    pub idle_reads: AtomicUsize,
    pub streams_dropped: AtomicUsize,
}

/// Steps not yet served by a stream. Tests may push more while it is open.
pub type Feed = Arc<Mutex<VecDeque<Step>>>;

pub struct ScriptedStream {
    steps: Feed,
    probe: Arc<Probe>,
}

impl ReportStream for ScriptedStream {
    fn read_report(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ReadOutcome, DeviceError> {
        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Report(bytes)) => {
                let len = bytes.len().min(buf.len());
                buf[..len].copy_from_slice(&bytes[..len]);
                Ok(ReadOutcome::Data(len))
            }
            Some(Step::Empty) => Ok(ReadOutcome::Data(0)),
            Some(Step::Disconnect) => Ok(ReadOutcome::Closed),
            Some(Step::Fail) => Err(DeviceError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device unplugged",
            ))),
            Some(Step::Panic) => panic!("scripted fault"),
            None => {
                self.probe.idle_reads.fetch_add(1, Ordering::SeqCst);
                thread::sleep(timeout.min(Duration::from_millis(5)));
                Ok(ReadOutcome::Idle)
            }
        }
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.probe.streams_dropped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Presents one device; each successful open consumes the next script
pub struct ScriptedBackend {
    vendor_id: u16,
    product_id: u16,
    present: Arc<AtomicBool>,
    streams: VecDeque<Feed>,
    probe: Arc<Probe>,
}

impl ScriptedBackend {
    pub fn new(vendor_id: u16, product_id: u16, streams: Vec<Vec<Step>>) -> (Self, Arc<Probe>) {
        let probe = Arc::new(Probe::default());
        let backend = Self {
            vendor_id,
            product_id,
            present: Arc::new(AtomicBool::new(true)),
            streams: streams
                .into_iter()
                .map(|steps| Arc::new(Mutex::new(VecDeque::from(steps))))
                .collect(),
            probe: Arc::clone(&probe),
        };
        (backend, probe)
    }

    /// One device whose single stream is fed by the test
    pub fn live() -> (Self, Arc<Probe>, Feed) {
        let (backend, probe) = Self::new(0x057E, 0x2009, vec![Vec::new()]);
        let feed = backend.streams.front().map(Arc::clone).unwrap_or_default();
        (backend, probe, feed)
    }

    /// A backend whose device never shows up
    pub fn absent() -> (Self, Arc<Probe>) {
        let (backend, probe) = Self::new(0x057E, 0x2009, Vec::new());
        backend.present.store(false, Ordering::SeqCst);
        (backend, probe)
    }
}

impl DeviceBackend for ScriptedBackend {
    fn find(&mut self, vendor_id: u16, product_id: u16) -> Result<Option<DeviceDescriptor>, DeviceError> {
        self.probe.finds.fetch_add(1, Ordering::SeqCst);
        if !self.present.load(Ordering::SeqCst)
            || vendor_id != self.vendor_id
            || product_id != self.product_id
        {
            return Ok(None);
        }
        Ok(Some(DeviceDescriptor {
            vendor_id,
            product_id,
            path: CString::new("scripted").unwrap(),
            product_name: Some("Scripted Pad".to_string()),
        }))
    }

    fn open(&mut self, _device: &DeviceDescriptor) -> Result<Box<dyn ReportStream>, DeviceError> {
        match self.streams.pop_front() {
            Some(steps) => {
                self.probe.opens.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(ScriptedStream {
                    steps,
                    probe: Arc::clone(&self.probe),
                }))
            }
            None => Err(DeviceError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "device busy",
            ))),
        }
    }
}

/// Panics on the first open, then behaves like the wrapped backend
pub struct PanicOnFirstOpen {
    inner: ScriptedBackend,
    panicked: bool,
}

impl PanicOnFirstOpen {
    pub fn new(inner: ScriptedBackend) -> Self {
        Self {
            inner,
            panicked: false,
        }
    }
}

impl DeviceBackend for PanicOnFirstOpen {
    fn find(&mut self, vendor_id: u16, product_id: u16) -> Result<Option<DeviceDescriptor>, DeviceError> {
        self.inner.find(vendor_id, product_id)
    }

    fn open(&mut self, device: &DeviceDescriptor) -> Result<Box<dyn ReportStream>, DeviceError> {
        if !self.panicked {
            self.panicked = true;
            panic!("open fault");
        }
        self.inner.open(device)
    }
}

pub fn fast_timing() -> ListenerTiming {
    ListenerTiming {
        device_poll_ms: 5,
        open_retry_ms: 5,
        fault_backoff_ms: 5,
        read_poll_ms: 10,
        shutdown_grace_ms: 2000,
    }
}

/// Service wired to a channel the test drains by hand
pub struct Harness {
    pub service: GamepadHotkeyService,
    pub probe: Arc<Probe>,
    rx: mpsc::UnboundedReceiver<Task>,
    fired: Arc<Mutex<Vec<HotkeyAction>>>,
}

impl Harness {
    pub fn new(target: TargetDevice, backend: impl DeviceBackend + 'static, probe: Arc<Probe>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Task>();
        let fired = Arc::new(Mutex::new(Vec::new()));
        let callbacks = {
            let on_toggle = Arc::clone(&fired);
            let on_menu = Arc::clone(&fired);
            HotkeyCallbacks::new(
                move || on_toggle.lock().push(HotkeyAction::Toggle),
                move || on_menu.lock().push(HotkeyAction::Menu),
            )
        };
        let service = GamepadHotkeyService::with_backend(
            target,
            fast_timing(),
            Box::new(backend),
            ActionDispatcher::new(Arc::new(tx), callbacks),
        );
        Self {
            service,
            probe,
            rx,
            fired,
        }
    }

    /// Run queued actions on the test thread and return what fired
    pub fn drain(&mut self) -> Vec<HotkeyAction> {
        while let Ok(task) = self.rx.try_recv() {
            task();
        }
        std::mem::take(&mut *self.fired.lock())
    }

    /// Run queued actions until at least one fires or the timeout passes
    pub fn wait_fired(&mut self, timeout: Duration) -> Vec<HotkeyAction> {
        let mut fired = Vec::new();
        wait_for(timeout, || {
            fired.extend(self.drain());
            !fired.is_empty()
        });
        fired
    }

    /// Wait until the listener stops reading, i.e. it is parked at the pause gate
    pub fn wait_parked(&self) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            let before = self.probe.idle_reads.load(Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            if self.probe.idle_reads.load(Ordering::SeqCst) == before {
                return true;
            }
        }
        false
    }

    /// Wait until the final stream has served every scripted step
    pub fn wait_idle(&self) {
        assert!(
            wait_for(Duration::from_secs(5), || self.probe.idle_reads.load(Ordering::SeqCst) > 0),
            "listener never finished the script"
        );
    }
}

pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Switch Pro 0x30 report with the given right/shared button bytes
pub fn switch_report(right: u8, shared: u8) -> Step {
    let mut report = vec![0u8; 64];
    report[0] = 0x30;
    report[3] = right;
    report[4] = shared;
    Step::Report(report)
}
