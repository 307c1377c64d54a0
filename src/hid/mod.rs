//! HID usage codes and the boot keyboard report sent over BLE.

pub mod keyboard;
pub mod keycodes;

pub use keyboard::{encode, KeyboardReport, ProtocolMode};
