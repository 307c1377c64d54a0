//! The 8-byte boot keyboard report and the encoder that fills it from the
//! tracked keys.
//!
//! ```text
//! [0] modifier bits  LCtrl LShift LAlt LGui RCtrl RShift RAlt RGui (bit 0..7)
//! [1] always zero
//! [2..8] usage codes, unused slots 0x00, all 0x01 on rollover
//! ```

use crate::config::MAX_ENCODED_KEYS;
use crate::hid::keycodes::{KEY_ERR_OVF, KEY_NONE};
use crate::keymap::{ActiveKey, Keymap};

pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// HID protocol mode chosen by the host.  Every connection starts in
/// report mode.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolMode {
    Boot = 0,
    #[default]
    Report = 1,
}

impl ProtocolMode {
    /// Decode a protocol mode write; other values are not a mode.
    pub const fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(ProtocolMode::Boot),
            1 => Some(ProtocolMode::Report),
            _ => None,
        }
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// One input report as sent to the host.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifier: u8,
    pub reserved: u8,
    pub keycodes: [u8; MAX_ENCODED_KEYS],
}

impl KeyboardReport {
    /// Everything released.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [KEY_NONE; MAX_ENCODED_KEYS],
        }
    }

    /// Parse from raw report bytes (e.g. the boot output of a host tool).
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < KEYBOARD_REPORT_SIZE {
            return None;
        }
        Some(Self {
            modifier: data[0],
            reserved: data[1],
            keycodes: [data[2], data[3], data[4], data[5], data[6], data[7]],
        })
    }

    /// Serialise into a byte slice for transmission.
    /// Returns the number of bytes written (8, or 0 if `buf` is too small).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        buf[2..8].copy_from_slice(&self.keycodes);
        KEYBOARD_REPORT_SIZE
    }

    /// The report as a fixed 8-byte array.
    pub fn to_bytes(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        let mut buf = [0u8; KEYBOARD_REPORT_SIZE];
        self.serialize(&mut buf);
        buf
    }

    /// No modifier and no code.
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == KEY_NONE)
    }

    /// Returns `true` if the report carries the rollover error.
    pub fn is_rollover(&self) -> bool {
        self.keycodes.iter().all(|&k| k == KEY_ERR_OVF)
    }
}

/// Encode tracked keys into a report.
///
/// Each key is looked up under the layer it was pressed on.  Modifier bits
/// are OR-ed together and non-null codes fill the slots in record order.
/// A seventh code turns every slot into `KEY_ERR_OVF`; the modifier byte
/// keeps whatever was accumulated up to that point.
pub fn encode(keys: &[ActiveKey], keymap: &Keymap) -> KeyboardReport {
    let mut report = KeyboardReport::empty();
    let mut n_keys = 0;

    for key in keys {
        let mapped = keymap.lookup(key.coord, key.layer);
        if mapped.code == KEY_NONE {
            continue;
        }
        if n_keys == MAX_ENCODED_KEYS {
            report.keycodes = [KEY_ERR_OVF; MAX_ENCODED_KEYS];
            break;
        }
        report.keycodes[n_keys] = mapped.code;
        report.modifier |= mapped.modifier;
        n_keys += 1;
    }

    report
}

/// Report map served over HID-over-GATT: the boot keyboard layout above
/// plus the five host LEDs as an output report.  No report IDs.
pub const KEYBOARD_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    //
    //   - Modifier keys (8 bits) -
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    //   - Reserved byte -
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant) - padding
    //
    //   - Key codes (6 bytes) -
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x65, //   Logical Maximum (101)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x65, //   Usage Maximum (101)
    0x81, 0x00, //   Input (Data, Array)
    //
    //   - LED output (5 bits + 3 padding) -
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant) - padding
    //
    0xC0, // End Collection
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::keycodes::*;
    use crate::keymap::Layer;
    use crate::matrix::KeyCoord;

    fn base(row: u8, col: u8) -> ActiveKey {
        ActiveKey::new(KeyCoord::new(row, col), Layer::Base)
    }

    #[test]
    fn serialize_layout() {
        let report = KeyboardReport {
            modifier: 0x05,
            reserved: 0x00,
            keycodes: [0x04, 0x05, 0x06, 0x00, 0x00, 0x00],
        };
        assert_eq!(report.to_bytes(), [0x05, 0x00, 0x04, 0x05, 0x06, 0x00, 0x00, 0x00]);

        let mut small = [0u8; 4];
        assert_eq!(report.serialize(&mut small), 0);
    }

    #[test]
    fn protocol_mode_defaults_to_report() {
        assert_eq!(ProtocolMode::default(), ProtocolMode::Report);
        assert_eq!(ProtocolMode::from_byte(0), Some(ProtocolMode::Boot));
        assert_eq!(ProtocolMode::from_byte(1), Some(ProtocolMode::Report));
        assert_eq!(ProtocolMode::from_byte(2), None);
        assert_eq!(ProtocolMode::Report.as_byte(), 1);
    }

    #[test]
    fn from_bytes_rejects_short_input() {
        assert!(KeyboardReport::from_bytes(&[0x02, 0x00, 0x04]).is_none());
        let parsed = KeyboardReport::from_bytes(&[0x02, 0, 0x04, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(parsed.modifier, MOD_LSHIFT);
        assert_eq!(parsed.keycodes[0], KEY_A);
    }

    #[test]
    fn encode_empty_is_release() {
        let report = encode(&[], &Keymap::new());
        assert!(report.is_empty());
        assert_eq!(report, KeyboardReport::empty());
    }

    #[test]
    fn encode_accumulates_modifiers() {
        // Ctrl (1,5) + Shift (2,0) + A (1,2)
        let keys = [base(1, 5), base(2, 0), base(1, 2)];
        let report = encode(&keys, &Keymap::new());
        assert_eq!(report.modifier, MOD_LCTRL | MOD_LSHIFT);
        assert_eq!(report.keycodes, [KEY_LEFTCTRL, KEY_LEFTSHIFT, KEY_A, 0, 0, 0]);
        assert_eq!(report.reserved, 0);
    }

    #[test]
    fn encode_skips_null_codes_without_using_slots() {
        // (2,5) is empty on the base layer.
        let keys = [base(2, 5), base(0, 0)];
        let report = encode(&keys, &Keymap::new());
        assert_eq!(report.keycodes, [KEY_X, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn seventh_code_overflows_but_keeps_modifiers() {
        let keys = [
            base(2, 0), // shift
            base(0, 0),
            base(0, 1),
            base(0, 2),
            base(0, 3),
            base(0, 4),
            base(0, 5),
        ];
        let report = encode(&keys, &Keymap::new());
        assert_eq!(report.keycodes, [KEY_ERR_OVF; 6]);
        assert!(report.is_rollover());
        assert_eq!(report.modifier, MOD_LSHIFT);
        assert_eq!(report.reserved, 0);
    }
}
