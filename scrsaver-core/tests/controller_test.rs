// SPDX-License-Identifier: LGPL-3.0-only
use scrsaver_core::config::ScrsaverConfig;
use scrsaver_core::display::{DisplayServer, KeepAliveKeys, ScreensaverParams};
use scrsaver_core::service::{BusCall, ScreensaverBus, ServicePresence, WatchHandle};
use scrsaver_core::{InhibitError, Scrsaver, Suppression};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct FakeBus {
    calls: Mutex<Vec<BusCall>>,
    replies: Mutex<VecDeque<Result<Option<u32>, InhibitError>>>,
    presence: Mutex<Option<ServicePresence>>,
}

impl FakeBus {
    fn reply(&self, reply: Result<Option<u32>, InhibitError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    fn calls(&self) -> Vec<BusCall> {
        self.calls.lock().unwrap().clone()
    }

    fn presence(&self) -> ServicePresence {
        self.presence.lock().unwrap().clone().expect("watch not started")
    }
}

impl ScreensaverBus for FakeBus {
    fn call(&self, call: &BusCall) -> Result<Option<u32>, InhibitError> {
        self.calls.lock().unwrap().push(call.clone());
        self.replies.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }

    fn watch(&self, presence: ServicePresence) -> Result<WatchHandle, InhibitError> {
        *self.presence.lock().unwrap() = Some(presence);
        Ok(WatchHandle::inert())
    }
}

struct FakeDisplay {
    params: Mutex<ScreensaverParams>,
    keys: Option<KeepAliveKeys>,
    reads: Mutex<usize>,
    writes: Mutex<Vec<ScreensaverParams>>,
    taps: Mutex<Vec<u8>>,
}

impl FakeDisplay {
    fn new(timeout: i32, keys: Option<KeepAliveKeys>) -> Arc<Self> {
        Arc::new(Self {
            params: Mutex::new(ScreensaverParams {
                timeout,
                interval: 600,
                prefer_blanking: 2,
                allow_exposures: 2,
            }),
            keys,
            reads: Mutex::new(0),
            writes: Mutex::new(Vec::new()),
            taps: Mutex::new(Vec::new()),
        })
    }

    fn current(&self) -> ScreensaverParams {
        *self.params.lock().unwrap()
    }

    fn writes(&self) -> Vec<ScreensaverParams> {
        self.writes.lock().unwrap().clone()
    }

    fn taps(&self) -> Vec<u8> {
        self.taps.lock().unwrap().clone()
    }
}

impl DisplayServer for FakeDisplay {
    fn screensaver_params(&self) -> Result<ScreensaverParams, InhibitError> {
        *self.reads.lock().unwrap() += 1;
        Ok(self.current())
    }

    fn set_screensaver_params(&self, params: &ScreensaverParams) -> Result<(), InhibitError> {
        *self.params.lock().unwrap() = *params;
        self.writes.lock().unwrap().push(*params);
        Ok(())
    }

    fn keepalive_keys(&self) -> Option<KeepAliveKeys> {
        self.keys
    }

    fn fake_key_tap(&self, keycode: u8) -> Result<(), InhibitError> {
        self.taps.lock().unwrap().push(keycode);
        Ok(())
    }
}

const KEYS: KeepAliveKeys = KeepAliveKeys {
    primary: 64,
    secondary: 108,
};

fn fast_config() -> ScrsaverConfig {
    ScrsaverConfig {
        min_timeout: Duration::from_millis(40),
        ..ScrsaverConfig::default()
    }
}

fn controller(bus: Option<&Arc<FakeBus>>, display: &Arc<FakeDisplay>) -> Scrsaver {
    Scrsaver::with_backends(
        fast_config(),
        bus.map(|bus| bus.clone() as Arc<dyn ScreensaverBus>),
        Some(display.clone() as Arc<dyn DisplayServer>),
    )
}

#[test]
fn test_no_connection_uses_display_once() {
    let display = FakeDisplay::new(600, None);
    let original = display.current();
    let mut scrsaver = controller(None, &display);
    assert!(!scrsaver.service_present());

    scrsaver.disable();
    assert!(scrsaver.is_disabled());
    assert_eq!(scrsaver.suppression(), Some(Suppression::Display));
    assert_eq!(display.writes(), vec![ScreensaverParams::SUPPRESSED]);

    scrsaver.enable();
    assert!(!scrsaver.is_disabled());
    assert_eq!(display.current(), original);
    assert_eq!(display.writes(), vec![ScreensaverParams::SUPPRESSED, original]);
}

#[test]
fn test_repeated_calls_are_idempotent() {
    let display = FakeDisplay::new(600, None);
    let mut scrsaver = controller(None, &display);

    scrsaver.disable();
    scrsaver.disable();
    scrsaver.enable();
    scrsaver.enable();

    // One suppress write, one restore write, one snapshot read.
    assert_eq!(display.writes().len(), 2);
    assert_eq!(*display.reads.lock().unwrap(), 1);
}

#[test]
fn test_set_state_dispatches() {
    let display = FakeDisplay::new(600, None);
    let mut scrsaver = controller(None, &display);

    scrsaver.set_state(true);
    assert!(display.writes().is_empty());

    scrsaver.set_state(false);
    assert!(scrsaver.is_disabled());
    scrsaver.set_state(false);
    assert_eq!(display.writes().len(), 1);

    scrsaver.set_state(true);
    assert!(!scrsaver.is_disabled());
    assert_eq!(display.writes().len(), 2);
}

#[test]
fn test_service_present_inhibits_with_cookie() {
    let bus = Arc::new(FakeBus::default());
    let display = FakeDisplay::new(600, None);
    let mut scrsaver = controller(Some(&bus), &display);
    bus.presence().appeared();
    assert!(scrsaver.service_present());

    bus.reply(Ok(Some(42)));
    scrsaver.disable();
    assert_eq!(scrsaver.cookie(), 42);
    assert_eq!(scrsaver.suppression(), Some(Suppression::Service));
    assert_eq!(
        bus.calls(),
        vec![BusCall::Inhibit {
            application: "Totem".to_string(),
            reason: "Running in presentation mode".to_string(),
        }]
    );

    scrsaver.enable();
    assert_eq!(scrsaver.cookie(), 0);
    let uninhibits = bus
        .calls()
        .into_iter()
        .filter(|call| matches!(call, BusCall::UnInhibit { .. }))
        .collect::<Vec<_>>();
    assert_eq!(uninhibits, vec![BusCall::UnInhibit { cookie: 42 }]);
    assert!(display.writes().is_empty());
}

#[test]
fn test_inhibit_without_cookie_is_still_released() {
    let bus = Arc::new(FakeBus::default());
    let display = FakeDisplay::new(600, None);
    let mut scrsaver = controller(Some(&bus), &display);
    bus.presence().appeared();

    bus.reply(Ok(None));
    scrsaver.disable();
    assert_eq!(scrsaver.cookie(), 0);
    assert_eq!(scrsaver.suppression(), Some(Suppression::Service));

    scrsaver.enable();
    assert_eq!(bus.calls()[1], BusCall::UnInhibit { cookie: 0 });
    assert!(display.writes().is_empty());
}

#[test]
fn test_service_absent_until_it_appears() {
    let bus = Arc::new(FakeBus::default());
    let display = FakeDisplay::new(600, None);
    let mut scrsaver = controller(Some(&bus), &display);

    scrsaver.disable();
    scrsaver.enable();
    assert!(bus.calls().is_empty());
    assert_eq!(display.writes().len(), 2);

    bus.presence().appeared();
    scrsaver.disable();
    assert_eq!(bus.calls().len(), 1);
    assert_eq!(display.writes().len(), 2);
}

#[test]
fn test_legacy_inhibit_after_unknown_method() {
    let bus = Arc::new(FakeBus::default());
    let display = FakeDisplay::new(600, None);
    let mut scrsaver = controller(Some(&bus), &display);
    bus.presence().appeared();

    bus.reply(Err(InhibitError::UnknownMethod {
        method: "Inhibit".to_string(),
        message: "No such method".to_string(),
    }));
    scrsaver.disable();

    let calls = bus.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[1],
        BusCall::InhibitActivation {
            reason: "Running in presentation mode".to_string(),
        }
    );
    assert_eq!(scrsaver.cookie(), 0);

    bus.reply(Err(InhibitError::UnknownMethod {
        method: "UnInhibit".to_string(),
        message: "No such method".to_string(),
    }));
    scrsaver.enable();
    assert_eq!(bus.calls()[3], BusCall::AllowActivation);
}

#[test]
fn test_service_failure_is_not_fatal() {
    let bus = Arc::new(FakeBus::default());
    let display = FakeDisplay::new(600, None);
    let mut scrsaver = controller(Some(&bus), &display);
    bus.presence().appeared();

    bus.reply(Err(InhibitError::Bus {
        method: "Inhibit".to_string(),
        message: "Access denied".to_string(),
    }));
    scrsaver.disable();
    assert!(scrsaver.is_disabled());
    assert_eq!(scrsaver.cookie(), 0);
    assert_eq!(scrsaver.suppression(), None);

    scrsaver.enable();
    assert!(!scrsaver.is_disabled());
    assert_eq!(bus.calls().len(), 1);
}

#[test]
fn test_restore_through_the_backend_that_suppressed() {
    let bus = Arc::new(FakeBus::default());
    let display = FakeDisplay::new(600, None);
    let original = display.current();
    let mut scrsaver = controller(Some(&bus), &display);

    scrsaver.disable();
    // The service shows up mid-playback.
    bus.presence().appeared();
    scrsaver.enable();

    assert!(bus.calls().is_empty());
    assert_eq!(display.current(), original);
}

#[test]
fn test_service_vanishing_mid_playback() {
    let bus = Arc::new(FakeBus::default());
    let display = FakeDisplay::new(600, None);
    let mut scrsaver = controller(Some(&bus), &display);
    bus.presence().appeared();

    bus.reply(Ok(Some(5)));
    scrsaver.disable();
    bus.presence().vanished();
    scrsaver.enable();

    assert_eq!(scrsaver.cookie(), 0);
    assert_eq!(bus.calls().len(), 1);
    assert!(display.writes().is_empty());
}

#[test]
fn test_keepalive_ticks_stop_on_enable() {
    let display = FakeDisplay::new(0, Some(KEYS));
    let mut scrsaver = controller(None, &display);

    scrsaver.disable();
    thread::sleep(Duration::from_millis(150));
    scrsaver.enable();

    let taps = display.taps();
    assert!(taps.len() >= 2, "expected key taps, got {taps:?}");
    assert_eq!(taps[0], KEYS.primary);
    assert_eq!(taps[1], KEYS.secondary);
    assert!(display.writes().is_empty());

    thread::sleep(Duration::from_millis(80));
    assert_eq!(display.taps().len(), taps.len());
}

#[test]
fn test_keepalive_alternation_continues_across_sessions() {
    let display = FakeDisplay::new(0, Some(KEYS));
    let mut scrsaver = controller(None, &display);

    for _ in 0..2 {
        scrsaver.disable();
        thread::sleep(Duration::from_millis(70));
        scrsaver.enable();
    }

    let taps = display.taps();
    assert!(taps.windows(2).all(|pair| pair[0] != pair[1]), "taps repeat: {taps:?}");
}

#[test]
fn test_drop_stops_keepalive() {
    let display = FakeDisplay::new(0, Some(KEYS));
    let mut scrsaver = controller(None, &display);

    scrsaver.disable();
    drop(scrsaver);

    let taps = display.taps().len();
    thread::sleep(Duration::from_millis(80));
    assert_eq!(display.taps().len(), taps);
    // Teardown does not restore anything.
    assert!(display.writes().is_empty());
}

#[test]
fn test_without_any_backend() {
    let mut scrsaver = Scrsaver::with_backends(fast_config(), None, None);
    scrsaver.disable();
    assert!(scrsaver.is_disabled());
    assert_eq!(scrsaver.suppression(), None);
    scrsaver.enable();
    assert!(!scrsaver.is_disabled());
}
