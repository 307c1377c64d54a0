//! Error type shared by the firmware tasks.
//!
//! Variants are fieldless or carry a small `Copy` tag, and all of them
//! format with `defmt`.  None is fatal: callers log and carry on.

use defmt::Format;

/// Top-level error type used across the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Error {
    // BLE
    /// The SoftDevice rejected a BLE operation.
    Ble(BleError),

    /// Advertising could not start or ended without a connection.
    Advertise,

    /// An input report or battery notification was not delivered.
    Notify,

    // Storage
    /// Flash read/write/erase failed.
    Storage,

    // Peripherals
    /// I²C transaction to the display failed.
    Display,

    /// I²C transaction to the nPM1300 failed.
    Pmic,

    // Tasks
    /// A queue had no free slot.
    ChannelFull,

    /// Operation timed out.
    Timeout,
}

/// SoftDevice calls that can fail outside of advertising and notifying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum BleError {
    /// Writing a local attribute value failed.
    SetValue,
    /// Connection parameter update was refused.
    ConnParams,
}

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}
