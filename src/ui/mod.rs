//! User interface subsystem - OLED pages driven by UI messages.
//!
//! The UI task receives [`UiMessage`]s from the dispatcher and the BLE
//! security handler, steps the page state machine and draws on the
//! SSD1306 through the [`Panel`] trait.
//!
//! ## Components
//!
//! - **Machine**: page navigation, timeout and per-page rendering
//! - **Display**: SSD1306 128×64 OLED via I²C
//! - **Anim**: procedural wake / sleep / idle animations

pub mod anim;
pub mod display;
pub mod machine;
pub mod message;
pub mod page;
pub mod task;

pub use machine::{LinkState, Panel, Step, Ui, UiServices};
pub use message::{MessageKind, UiMessage};
pub use page::{Page, UiPage};
