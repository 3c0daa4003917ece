//! End-to-end behaviour of GamepadHotkeyService

use crate::support::{switch_report, wait_for, Harness, PanicOnFirstOpen, ScriptedBackend, Step};
use gamepad_hotkeys::{HotkeyAction, TargetDevice};
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

const A: u8 = 0x08;
const HOME: u8 = 0x10;

fn switch_target(toggle: Option<&str>, menu: Option<&str>) -> TargetDevice {
    TargetDevice::new(0x057E, 0x2009, toggle, menu)
}

fn run_script(target: TargetDevice, streams: Vec<Vec<Step>>) -> Harness {
    let (backend, probe) = ScriptedBackend::new(target.vendor_id, target.product_id, streams);
    let mut harness = Harness::new(target, backend, probe);
    harness.service.start().unwrap();
    harness.wait_idle();
    assert!(harness.service.dispose());
    harness
}

#[test]
fn test_switch_pro_a_press_release_fires_toggle_only() {
    let mut h = run_script(
        switch_target(Some("BTN_A"), None),
        vec![vec![switch_report(A, 0), switch_report(0, 0)]],
    );
    assert_eq!(h.drain(), vec![HotkeyAction::Toggle]);
}

#[test]
fn test_held_button_fires_once() {
    let mut h = run_script(
        switch_target(Some("BTN_A"), None),
        vec![vec![
            switch_report(A, 0),
            switch_report(A, 0),
            switch_report(A, 0),
            switch_report(0, 0),
        ]],
    );
    assert_eq!(h.drain(), vec![HotkeyAction::Toggle]);
}

#[test]
fn test_two_presses_fire_twice() {
    let mut h = run_script(
        switch_target(Some("BTN_A"), None),
        vec![vec![
            switch_report(A, 0),
            switch_report(0, 0),
            switch_report(A, 0),
            switch_report(0, 0),
        ]],
    );
    assert_eq!(h.drain(), vec![HotkeyAction::Toggle, HotkeyAction::Toggle]);
}

#[test]
fn test_toggle_and_menu_in_one_report() {
    let mut h = run_script(
        switch_target(Some("BTN_A"), Some("BTN_HOME")),
        vec![vec![switch_report(A, HOME), switch_report(0, 0)]],
    );
    assert_eq!(h.drain(), vec![HotkeyAction::Toggle, HotkeyAction::Menu]);
}

#[test]
fn test_dualsense_bluetooth_dpad() {
    let mut pressed = vec![0u8; 78];
    pressed[0] = 0x31;
    pressed[9] = 0x00; // hat up
    let mut released = pressed.clone();
    released[9] = 0x08; // neutral

    let mut h = run_script(
        TargetDevice::new(0x054C, 0x0CE6, Some("DPAD_UP"), Some("DPAD_DOWN")),
        vec![vec![Step::Report(pressed), Step::Report(released)]],
    );
    assert_eq!(h.drain(), vec![HotkeyAction::Toggle]);
}

#[test]
fn test_zero_byte_read_reacquires() {
    let mut h = run_script(
        switch_target(Some("BTN_A"), None),
        vec![
            vec![switch_report(A, 0), Step::Empty],
            vec![switch_report(0, 0)],
        ],
    );
    assert_eq!(h.probe.opens.load(Ordering::SeqCst), 2);
    // Held state survives the reconnect, so the release still fires
    assert_eq!(h.drain(), vec![HotkeyAction::Toggle]);
}

#[test]
fn test_disconnect_and_read_error_reacquire() {
    let mut h = run_script(
        switch_target(Some("BTN_A"), None),
        vec![
            vec![Step::Disconnect],
            vec![Step::Fail],
            vec![switch_report(A, 0), switch_report(0, 0)],
        ],
    );
    assert_eq!(h.probe.opens.load(Ordering::SeqCst), 3);
    assert_eq!(h.probe.streams_dropped.load(Ordering::SeqCst), 3);
    assert_eq!(h.drain(), vec![HotkeyAction::Toggle]);
}

#[test]
fn test_fault_in_read_path_is_contained() {
    let mut h = run_script(
        switch_target(Some("BTN_A"), None),
        vec![vec![Step::Panic], vec![switch_report(A, 0), switch_report(0, 0)]],
    );
    assert_eq!(h.probe.opens.load(Ordering::SeqCst), 2);
    assert_eq!(h.drain(), vec![HotkeyAction::Toggle]);
}

#[test]
fn test_connected_flag_follows_device() {
    let target = switch_target(Some("BTN_A"), None);
    let (backend, probe) = ScriptedBackend::new(0x057E, 0x2009, vec![vec![]]);
    let mut h = Harness::new(target, backend, probe);
    assert!(!h.service.is_connected());

    h.service.start().unwrap();
    assert!(wait_for(Duration::from_secs(5), || h.service.is_connected()));
    assert!(h.service.is_running());

    assert!(h.service.dispose());
    assert!(!h.service.is_connected());
    assert!(!h.service.is_running());
    assert_eq!(h.probe.streams_dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_fault_while_opening_is_contained() {
    let target = switch_target(Some("BTN_A"), None);
    let (backend, probe) = ScriptedBackend::new(
        0x057E,
        0x2009,
        vec![vec![switch_report(A, 0), switch_report(0, 0)]],
    );
    let mut h = Harness::new(target, PanicOnFirstOpen::new(backend), probe);
    h.service.start().unwrap();
    h.wait_idle();

    assert!(h.service.is_running());
    assert!(h.service.is_connected());
    assert_eq!(h.probe.opens.load(Ordering::SeqCst), 1);
    assert!(h.service.dispose());
    assert!(!h.service.is_connected());
    assert_eq!(h.drain(), vec![HotkeyAction::Toggle]);
}

#[test]
fn test_pause_keeps_device_open() {
    let (backend, probe, feed) = ScriptedBackend::live();
    let mut h = Harness::new(switch_target(Some("BTN_A"), None), backend, probe);
    h.service.start().unwrap();
    assert!(wait_for(Duration::from_secs(5), || h.service.is_connected()));

    h.service.pause();
    assert!(h.wait_parked());
    std::thread::sleep(Duration::from_millis(50));
    assert!(h.service.is_connected());
    assert_eq!(h.probe.streams_dropped.load(Ordering::SeqCst), 0);
    assert_eq!(h.probe.opens.load(Ordering::SeqCst), 1);

    h.service.resume();
    for step in [switch_report(A, 0), switch_report(0, 0)] {
        feed.lock().push_back(step);
    }
    assert_eq!(h.wait_fired(Duration::from_secs(5)), vec![HotkeyAction::Toggle]);

    assert!(h.service.dispose());
    assert!(h.drain().is_empty());
    assert_eq!(h.probe.opens.load(Ordering::SeqCst), 1);
    assert_eq!(h.probe.streams_dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stop_while_parked_at_pause_gate() {
    let (backend, probe, _feed) = ScriptedBackend::live();
    let mut h = Harness::new(switch_target(Some("BTN_A"), None), backend, probe);
    h.service.start().unwrap();
    assert!(wait_for(Duration::from_secs(5), || h.service.is_connected()));

    h.service.pause();
    assert!(h.wait_parked());
    assert!(h.service.is_paused());

    let start = Instant::now();
    h.service.stop();
    assert!(h.service.dispose());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(!h.service.is_connected());
    assert_eq!(h.probe.streams_dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stop_while_paused_without_device() {
    let (backend, probe) = ScriptedBackend::absent();
    let mut h = Harness::new(switch_target(Some("BTN_A"), None), backend, probe);
    h.service.start().unwrap();
    h.service.pause();
    assert!(h.service.is_paused());

    let start = Instant::now();
    h.service.stop();
    assert!(h.service.dispose());
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_paused_service_does_not_search() {
    let (backend, probe) = ScriptedBackend::absent();
    let mut h = Harness::new(switch_target(Some("BTN_A"), None), backend, probe);
    h.service.pause();
    h.service.start().unwrap();

    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(h.probe.finds.load(Ordering::SeqCst), 0);

    h.service.resume();
    assert!(wait_for(Duration::from_secs(5), || h.probe.finds.load(Ordering::SeqCst) > 0));
    assert!(h.service.dispose());
}

#[test]
fn test_unknown_device_is_not_opened() {
    let target = TargetDevice::new(0x1234, 0x5678, Some("BTN_A"), None);
    let (backend, probe) = ScriptedBackend::new(0x1234, 0x5678, vec![vec![switch_report(A, 0)]]);
    let mut h = Harness::new(target, backend, probe);
    h.service.start().unwrap();

    assert!(wait_for(Duration::from_secs(5), || h.probe.finds.load(Ordering::SeqCst) >= 3));
    assert_eq!(h.probe.opens.load(Ordering::SeqCst), 0);
    assert!(!h.service.is_connected());
    assert!(h.service.dispose());
}

#[test]
fn test_start_is_idempotent_and_not_restartable() {
    let (backend, probe) = ScriptedBackend::absent();
    let mut h = Harness::new(switch_target(None, None), backend, probe);
    h.service.start().unwrap();
    h.service.start().unwrap();
    assert!(h.service.dispose());
    assert!(h.service.start().is_err());
}
