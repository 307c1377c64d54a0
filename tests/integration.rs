//! Integration tests for wrls-atreus host-testable logic.

use wrls_atreus::apps::{App, AppKey, AppStep, RunningApp};
use wrls_atreus::config::{
    APP_LIFE_KEY, CHORD_APPS, CHORD_DEBUG, CHORD_HELP, CHORD_SHUTDOWN, NAV_LAYER_KEY,
    PASSKEY_ACCEPT_KEY, UI_TIMEOUT_MS, UI_TIME_STEP_MS,
};
use wrls_atreus::dispatch::{CycleFlags, Dispatcher};
use wrls_atreus::hid::keycodes::{KEY_A, KEY_DOWN, KEY_ERR_OVF, KEY_O};
use wrls_atreus::hid::{encode, KeyboardReport};
use wrls_atreus::keymap::{ActiveKeys, Keymap, Layer};
use wrls_atreus::matrix::{KeyCoord, KeySnapshot};
use wrls_atreus::power_logic::PowerSample;
use wrls_atreus::ui::anim::Frame;
use wrls_atreus::ui::{LinkState, Panel, Step, Ui, UiMessage, UiPage, UiServices};

const A: KeyCoord = KeyCoord::new(1, 2);

#[derive(Default)]
struct RecordingPanel {
    power_on: usize,
    power_off: usize,
    presents: usize,
}

impl Panel for RecordingPanel {
    fn clear(&mut self) {}
    fn goto(&mut self, _x: u8, _line: u8) {}
    fn put_text(&mut self, _text: &str) {}
    fn put_text_inverted(&mut self, _text: &str) {}
    fn put_bitmap(&mut self, _frame: &Frame) {}
    fn present(&mut self) {
        self.presents += 1;
    }
    fn set_power(&mut self, on: bool) {
        if on {
            self.power_on += 1;
        } else {
            self.power_off += 1;
        }
    }
}

#[derive(Default)]
struct Services {
    pending: bool,
    replies: Vec<bool>,
    swapped: bool,
}

impl UiServices for Services {
    fn power(&self) -> PowerSample {
        PowerSample::default()
    }
    fn link(&self) -> LinkState {
        LinkState::default()
    }
    fn passkey_pending(&self) -> bool {
        self.pending
    }
    fn reply_passkey(&mut self, accept: bool) {
        self.replies.push(accept);
        self.pending = false;
    }
    fn toggle_modifier_swap(&mut self) -> bool {
        self.swapped = !self.swapped;
        self.swapped
    }
    fn modifiers_swapped(&self) -> bool {
        self.swapped
    }
    fn boot_count(&self) -> u16 {
        1
    }
}

#[test]
fn nav_held_before_key_latches_nav() {
    let nav = KeySnapshot::from_keys(&[NAV_LAYER_KEY], false);
    let (active, _) = ActiveKeys::resolve(&ActiveKeys::new(), &nav);
    let (active, layer) = ActiveKeys::resolve(
        &active,
        &KeySnapshot::from_keys(&[NAV_LAYER_KEY, A], false),
    );
    assert_eq!(layer, Layer::Nav);
    assert_eq!(active.find(A).map(|r| r.layer), Some(Layer::Nav));

    let report = encode(active.records(), &Keymap::new());
    assert_eq!(report.keycodes[0], KEY_DOWN);
}

#[test]
fn key_held_before_nav_keeps_base_until_repressed() {
    let mut active = ActiveKeys::new();
    active.update(&KeySnapshot::from_keys(&[A], false));
    active.update(&KeySnapshot::from_keys(&[A, NAV_LAYER_KEY], false));
    assert_eq!(active.find(A).map(|r| r.layer), Some(Layer::Base));
    assert_eq!(encode(active.records(), &Keymap::new()).keycodes[0], KEY_A);

    // Release A with Nav still held, then press it again.
    active.update(&KeySnapshot::from_keys(&[NAV_LAYER_KEY], false));
    active.update(&KeySnapshot::from_keys(&[NAV_LAYER_KEY, A], false));
    assert_eq!(active.find(A).map(|r| r.layer), Some(Layer::Nav));
    assert_eq!(encode(active.records(), &Keymap::new()).keycodes[0], KEY_DOWN);
}

#[test]
fn seven_codes_report_rollover() {
    // Seven non-null Base keys, pressed over two scans (a scan holds six).
    let first: Vec<KeyCoord> = (0..6).map(|col| KeyCoord::new(0, col)).collect();
    let mut active = ActiveKeys::new();
    active.update(&KeySnapshot::from_keys(&first, false));
    assert_eq!(active.len(), 6);

    // A full tracker drops the seventh; encode a hand-built record list
    // instead, which is what a larger snapshot would produce.
    let mut records = active.records().to_vec();
    records.push(wrls_atreus::keymap::ActiveKey::new(KeyCoord::new(1, 4), Layer::Base));
    let report = encode(&records, &Keymap::new());
    assert_eq!(report.keycodes, [KEY_ERR_OVF; 6]);
    assert!(report.is_rollover());
    assert_eq!(report.reserved, 0);
    assert!(!report.keycodes.contains(&KEY_O));
}

#[test]
fn help_stays_on_unrelated_key() {
    let mut ui = Ui::new(0);
    let mut panel = RecordingPanel::default();
    let mut services = Services::default();

    ui.step(UiMessage::WakeAndKeyPressed(CHORD_HELP), 0, &mut panel, &mut services);
    assert_eq!(ui.current(), UiPage::Help);
    assert_eq!(panel.power_on, 1);

    ui.step(UiMessage::KeyPressed(KeyCoord::new(2, 9)), 100, &mut panel, &mut services);
    assert_eq!(ui.current(), UiPage::Help);
}

#[test]
fn debug_times_out_exactly_once() {
    let mut ui = Ui::new(0);
    let mut panel = RecordingPanel::default();
    let mut services = Services::default();

    ui.step(UiMessage::WakeAndKeyPressed(CHORD_DEBUG), 0, &mut panel, &mut services);
    assert_eq!(ui.current(), UiPage::Debug);
    assert_eq!(panel.presents, 1);

    let mut now = 0;
    while now < UI_TIMEOUT_MS * 3 {
        now += UI_TIME_STEP_MS;
        ui.step(UiMessage::NoMessage, now, &mut panel, &mut services);
    }
    assert_eq!(ui.current(), UiPage::Disabled);
    assert_eq!(panel.power_off, 1);
}

#[test]
fn non_navigable_pages_ignore_other_messages() {
    let others = [
        UiMessage::WakePressed,
        UiMessage::WakeAndKeyPressed(CHORD_HELP),
        UiMessage::WakeAndKeyPressed(CHORD_DEBUG),
        UiMessage::KeyPressed(KeyCoord::new(0, 5)),
        UiMessage::DisplayPasskeyRequested(1),
        UiMessage::Startup,
    ];

    for msg in others {
        let mut ui = Ui::new(0);
        let mut panel = RecordingPanel::default();
        let mut services = Services {
            pending: true,
            ..Default::default()
        };
        ui.step(UiMessage::ConfirmPasskeyRequested(9), 0, &mut panel, &mut services);
        ui.step(msg, 10, &mut panel, &mut services);
        assert_eq!(ui.current(), UiPage::ConfirmPasskey, "{msg:?}");

        let mut ui = Ui::new(0);
        ui.step(UiMessage::WakeAndKeyPressed(CHORD_APPS), 0, &mut panel, &mut services);
        ui.step(msg, 10, &mut panel, &mut services);
        assert_eq!(ui.current(), UiPage::AppsMenu, "{msg:?}");
    }
}

#[test]
fn passkey_confirmed_from_dispatched_keys() {
    let mut dispatcher = Dispatcher::new(0);
    let mut ui = Ui::new(0);
    let mut panel = RecordingPanel::default();
    let mut services = Services {
        pending: true,
        ..Default::default()
    };

    ui.step(UiMessage::ConfirmPasskeyRequested(123_456), 0, &mut panel, &mut services);
    let flags = CycleFlags {
        ui_active: ui.is_active(),
        ..Default::default()
    };
    let out = dispatcher.cycle(KeySnapshot::from_keys(&[PASSKEY_ACCEPT_KEY], false), 0, flags);
    let msg = out.message.expect("key press for the dialog");
    ui.step(msg, 50, &mut panel, &mut services);
    assert_eq!(services.replies, [true]);

    ui.step(UiMessage::NoMessage, 100, &mut panel, &mut services);
    assert_eq!(ui.current(), UiPage::Idle);
}

#[test]
fn chord_through_dispatcher_opens_page_without_typing() {
    let mut dispatcher = Dispatcher::new(0);
    let mut ui = Ui::new(0);
    let mut panel = RecordingPanel::default();
    let mut services = Services::default();

    let out = dispatcher.cycle(KeySnapshot::from_keys(&[], true), 0, CycleFlags::default());
    ui.step(out.message.unwrap(), 0, &mut panel, &mut services);
    assert_eq!(ui.current(), UiPage::Idle);

    let flags = CycleFlags {
        ui_active: ui.is_active(),
        ..Default::default()
    };
    let out = dispatcher.cycle(KeySnapshot::from_keys(&[CHORD_HELP], true), 0, flags);
    assert_eq!(out.report, None);
    ui.step(out.message.unwrap(), 50, &mut panel, &mut services);
    assert_eq!(ui.current(), UiPage::Help);

    // Releasing everything clears the host.
    let out = dispatcher.cycle(KeySnapshot::new(), 0, flags);
    assert_eq!(out.report, Some(KeyboardReport::empty()));
}

#[test]
fn shutdown_chord_from_dispatcher_ends_in_ship_mode() {
    let mut dispatcher = Dispatcher::new(0);
    let mut ui = Ui::new(0);
    let mut panel = RecordingPanel::default();
    let mut services = Services::default();

    let out = dispatcher.cycle(KeySnapshot::new(), 100_000, CycleFlags::default());
    let msg = out.message.expect("forced shutdown");
    assert_eq!(msg, UiMessage::WakeAndKeyPressed(CHORD_SHUTDOWN));

    let mut now = 0;
    let mut step = ui.step(msg, now, &mut panel, &mut services);
    while step == Step::Continue && now < 60_000 {
        now += UI_TIME_STEP_MS;
        step = ui.step(UiMessage::NoMessage, now, &mut panel, &mut services);
    }
    assert_eq!(step, Step::ShipMode);
}

#[test]
fn app_launch_and_exit_round_trip() {
    let mut ui = Ui::new(0);
    let mut panel = RecordingPanel::default();
    let mut services = Services::default();

    ui.step(UiMessage::WakeAndKeyPressed(CHORD_APPS), 0, &mut panel, &mut services);
    let step = ui.step(UiMessage::WakeAndKeyPressed(APP_LIFE_KEY), 50, &mut panel, &mut services);
    let app = match step {
        Step::Launch(app) => app,
        other => panic!("expected launch, got {other:?}"),
    };
    assert_eq!(app, App::Life);

    let mut running = RunningApp::start(app, 1234);
    let held = KeySnapshot::from_keys(&[APP_LIFE_KEY], true);
    assert_eq!(running.update(AppKey::from_snapshot(&held)), AppStep::Idle);
    assert_eq!(running.update(AppKey::from_snapshot(&KeySnapshot::new())), AppStep::Redraw);
    let exit = KeySnapshot::from_keys(&[], true);
    assert_eq!(running.update(AppKey::from_snapshot(&exit)), AppStep::Exit);

    // Back in the menu with a fresh timeout.
    ui.resume(UI_TIMEOUT_MS * 2);
    ui.step(UiMessage::NoMessage, UI_TIMEOUT_MS * 2 + 50, &mut panel, &mut services);
    assert_eq!(ui.current(), UiPage::AppsMenu);
}
