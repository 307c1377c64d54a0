//! One scan cycle: track keys, build the host report, raise UI messages and
//! decide how long to wait before the next scan.
//!
//! The dispatcher task owns a [`Dispatcher`] and executes its
//! [`CycleOutput`]; nothing here touches hardware.

use crate::config::{CHORD_SHUTDOWN, SCAN_HELD_PERIOD_MS, SCAN_IDLE_WAIT_MS};
use crate::hid::keyboard::{encode, KeyboardReport};
use crate::keymap::{ActiveKeys, Keymap};
use crate::matrix::KeySnapshot;
use crate::power_logic::should_force_sleep;
use crate::ui::message::UiMessage;

/// Shared flags sampled by the dispatcher task before each cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleFlags {
    /// An application owns the keys and the display.
    pub app_running: bool,
    /// A UI page is showing.
    pub ui_active: bool,
    pub advertising: bool,
    pub modifiers_swapped: bool,
    /// No UI task is running (the display failed to start).
    pub ui_unavailable: bool,
}

/// How to wait before the next cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wait {
    /// Keys are held; sleep this many ms and scan again.
    Poll(u64),
    /// Nothing held; wait for a key interrupt, at most this many ms.
    Idle(u64),
}

/// Everything one cycle asks the dispatcher task to do.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleOutput {
    /// Report to send to the host, if any.
    pub report: Option<KeyboardReport>,
    /// Message for the UI task, if any.
    pub message: Option<UiMessage>,
    /// Enter ship mode without going through the Shutdown page.
    pub ship_mode: bool,
    pub wait: Wait,
}

/// Dispatcher state carried between cycles.
pub struct Dispatcher {
    previous: KeySnapshot,
    active: ActiveKeys,
    /// Last time the snapshot changed.
    last_active_s: u64,
    /// Last time nothing at all was held.
    last_released_s: u64,
    /// The shutdown chord went out for the current idle episode.
    sleep_requested: bool,
}

impl Dispatcher {
    pub const fn new(now_s: u64) -> Self {
        Self {
            previous: KeySnapshot::new(),
            active: ActiveKeys::new(),
            last_active_s: now_s,
            last_released_s: now_s,
            sleep_requested: false,
        }
    }

    /// Records for the currently held keys.
    pub fn active(&self) -> &ActiveKeys {
        &self.active
    }

    /// Process one snapshot taken at `now_s`.
    pub fn cycle(&mut self, snapshot: KeySnapshot, now_s: u64, flags: CycleFlags) -> CycleOutput {
        self.active.update(&snapshot);

        let changed = snapshot != self.previous;
        let mut report = None;
        let mut message = None;
        let mut ship_mode = false;

        if changed {
            self.last_active_s = now_s;
            self.sleep_requested = false;

            if snapshot.wake_down {
                // Wake chords never reach the host.
                if !flags.app_running {
                    message = match snapshot.first() {
                        Some(key) => Some(UiMessage::WakeAndKeyPressed(key)),
                        None if !self.previous.wake_down => Some(UiMessage::WakePressed),
                        None => None,
                    };
                }
            } else if flags.app_running {
                // Clear anything the host may still think is held.
                report = Some(KeyboardReport::empty());
            } else {
                let keymap = Keymap::with_modifiers_swapped(flags.modifiers_swapped);
                report = Some(encode(self.active.records(), &keymap));
            }

            if message.is_none() && flags.ui_active && !flags.app_running {
                message = snapshot.first().map(UiMessage::KeyPressed);
            }
        }

        if snapshot.is_idle() {
            self.last_released_s = now_s;
        }

        let idle_s = now_s.saturating_sub(self.last_active_s);
        let held_s = now_s.saturating_sub(self.last_released_s);
        if !self.sleep_requested && should_force_sleep(idle_s, held_s, flags.advertising) {
            self.sleep_requested = true;
            // The Shutdown page can only play when the UI task is free.
            if flags.ui_unavailable || flags.app_running {
                ship_mode = true;
            } else {
                message = Some(UiMessage::WakeAndKeyPressed(CHORD_SHUTDOWN));
            }
        }

        let wait = if snapshot.is_idle() {
            Wait::Idle(SCAN_IDLE_WAIT_MS)
        } else {
            Wait::Poll(SCAN_HELD_PERIOD_MS)
        };

        self.previous = snapshot;
        CycleOutput {
            report,
            message,
            ship_mode,
            wait,
        }
    }
}
