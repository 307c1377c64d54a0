//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **HID service** - HID over GATT (report and boot protocol), Battery
//!    and Device Information services.
//! 2. **Peripheral** - advertises as a keyboard, bonds with the host and
//!    forwards the dispatcher's reports while connected.
//! 3. **Pairing** - hands passkey confirmation to the UI and waits for the
//!    user's answer.
//!
//! Reconnection is plain re-advertising after a disconnect.

pub mod hid_service;
pub mod pairing;
pub mod peripheral;

pub use hid_service::Server;
pub use peripheral::{ble_task, link_state, send_report};
