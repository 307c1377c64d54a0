//! Host-testable library interface for wrls-atreus.
//!
//! This module re-exports the pure logic modules (keymap, HID encoding,
//! UI state machine, applications, dispatcher) so they can be tested on
//! the host without any embedded hardware.
//!
//! Usage: `cargo test --lib` and `cargo test --test integration`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main].
//! This lib.rs provides a separate entry point for host-based testing.

#![cfg_attr(not(test), no_std)]

pub mod config;

// ═══════════════════════════════════════════════════════════════════════════
// Module Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub mod matrix {
    pub mod snapshot {
        pub use crate::matrix_snapshot_impl::*;
    }

    pub use snapshot::{KeyCoord, KeySnapshot};
}

pub mod keymap {
    pub mod layout {
        pub use crate::keymap_layout_impl::*;
    }
    pub mod tracker {
        pub use crate::keymap_tracker_impl::*;
    }

    pub use layout::{resolve_layer, KeyWithMod, Keymap, Layer};
    pub use tracker::{ActiveKey, ActiveKeys};
}

pub mod hid {
    pub mod keycodes {
        pub use crate::hid_keycodes_impl::*;
    }
    pub mod keyboard {
        pub use crate::hid_keyboard_impl::*;
    }

    pub use keyboard::{encode, KeyboardReport, ProtocolMode};
}

pub mod ui {
    pub mod anim {
        pub use crate::ui_anim_impl::*;
    }
    pub mod message {
        pub use crate::ui_message_impl::*;
    }
    pub mod page {
        pub use crate::ui_page_impl::*;
    }
    pub mod machine {
        pub use crate::ui_machine_impl::*;
    }

    pub use machine::{LinkState, Panel, Step, Ui, UiServices};
    pub use message::{MessageKind, UiMessage};
    pub use page::{Page, UiPage};
}

pub mod apps {
    pub mod app {
        pub use crate::apps_app_impl::*;
    }
    pub mod lander {
        pub use crate::apps_lander_impl::*;
    }
    pub mod life {
        pub use crate::apps_life_impl::*;
    }
    pub mod mandelbrot {
        pub use crate::apps_mandelbrot_impl::*;
    }

    pub use app::{App, AppKey, AppStep, RunningApp};
}

pub mod power_logic {
    pub use crate::power_logic_impl::*;
}

pub mod dispatch {
    pub use crate::dispatch_impl::*;
}

pub mod led_logic {
    pub use crate::led_logic_impl::*;
}

// Internal module paths for the actual implementations
#[path = "matrix/snapshot.rs"]
mod matrix_snapshot_impl;

#[path = "keymap/layout.rs"]
mod keymap_layout_impl;
#[path = "keymap/tracker.rs"]
mod keymap_tracker_impl;

#[path = "hid/keyboard.rs"]
mod hid_keyboard_impl;
#[path = "hid/keycodes.rs"]
mod hid_keycodes_impl;

#[path = "ui/anim.rs"]
mod ui_anim_impl;
#[path = "ui/machine.rs"]
mod ui_machine_impl;
#[path = "ui/message.rs"]
mod ui_message_impl;
#[path = "ui/page.rs"]
mod ui_page_impl;

#[path = "apps/app.rs"]
mod apps_app_impl;
#[path = "apps/lander.rs"]
mod apps_lander_impl;
#[path = "apps/life.rs"]
mod apps_life_impl;
#[path = "apps/mandelbrot.rs"]
mod apps_mandelbrot_impl;

#[path = "dispatch.rs"]
mod dispatch_impl;
#[path = "led_logic.rs"]
mod led_logic_impl;
#[path = "power_logic.rs"]
mod power_logic_impl;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════
