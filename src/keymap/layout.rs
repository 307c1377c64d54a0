//! Keymap tables and layer resolution.
//!
//! Four 4×11 layers.  A null entry on a non-base layer is transparent:
//! the base-layer entry for the same position is used instead.

use crate::config::{
    FUNCTION_LAYER_KEY, MATRIX_COLS, MATRIX_ROWS, NAV_LAYER_KEY, SYMBOLS_LAYER_KEY,
};
use crate::hid::keycodes::*;
use crate::matrix::{KeyCoord, KeySnapshot};

/// Logical keymap layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Layer {
    #[default]
    Base,
    /// Arrows, paging and the number pad.
    Nav,
    /// Brackets and punctuation.
    Symbols,
    /// F-keys.
    Function,
}

/// A HID usage paired with the modifier bit it contributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyWithMod {
    pub code: u8,
    pub modifier: u8,
}

impl KeyWithMod {
    pub const NONE: Self = Self::new(KEY_NONE, MOD_NONE);

    pub const fn new(code: u8, modifier: u8) -> Self {
        Self { code, modifier }
    }

    pub const fn is_none(&self) -> bool {
        self.code == KEY_NONE
    }
}

type LayerTable = [[KeyWithMod; MATRIX_COLS]; MATRIX_ROWS];

const fn k(code: u8) -> KeyWithMod {
    KeyWithMod::new(code, MOD_NONE)
}

const fn shifted(code: u8) -> KeyWithMod {
    KeyWithMod::new(code, MOD_LSHIFT)
}

const __: KeyWithMod = KeyWithMod::NONE;

#[rustfmt::skip]
const BASE: LayerTable = [
    [k(KEY_X), k(KEY_V), k(KEY_L), k(KEY_C), k(KEY_W), k(KEY_Z), k(KEY_K), k(KEY_H), k(KEY_G), k(KEY_F), k(KEY_Q)],
    [k(KEY_U), k(KEY_I), k(KEY_A), k(KEY_E), k(KEY_O), KeyWithMod::new(KEY_LEFTCTRL, MOD_LCTRL), k(KEY_S), k(KEY_N), k(KEY_R), k(KEY_T), k(KEY_D)],
    [KeyWithMod::new(KEY_LEFTSHIFT, MOD_LSHIFT), shifted(KEY_3), k(KEY_Y), k(KEY_P), k(KEY_TAB), __, k(KEY_B), k(KEY_M), k(KEY_COMMA), k(KEY_DOT), k(KEY_J)],
    [k(KEY_ESC), __, __, k(KEY_BACKSPACE), k(KEY_SPACE), KeyWithMod::new(KEY_LEFTMETA, MOD_LMETA), __, __, KeyWithMod::new(KEY_LEFTALT, MOD_LALT), k(KEY_GRAVE), k(KEY_ENTER)],
];

#[rustfmt::skip]
const NAV: LayerTable = [
    [k(KEY_PAGEUP), k(KEY_BACKSPACE), k(KEY_UP), k(KEY_DELETE), k(KEY_PAGEDOWN), __, __, k(KEY_7), k(KEY_8), k(KEY_9), __],
    [k(KEY_HOME), k(KEY_LEFT), k(KEY_DOWN), k(KEY_RIGHT), k(KEY_END), __, __, k(KEY_4), k(KEY_5), k(KEY_6), __],
    [__, __, shifted(KEY_3), __, __, __, __, k(KEY_1), k(KEY_2), k(KEY_3), __],
    [__, __, __, __, k(KEY_0), __, __, __, __, __, __],
];

#[rustfmt::skip]
const SYMBOLS: LayerTable = [
    [shifted(KEY_2), shifted(KEY_MINUS), k(KEY_LEFTBRACE), k(KEY_RIGHTBRACE), shifted(KEY_6), __, shifted(KEY_1), shifted(KEY_COMMA), shifted(KEY_DOT), k(KEY_EQUAL), shifted(KEY_7)],
    [k(KEY_BACKSLASH), k(KEY_SLASH), shifted(KEY_LEFTBRACE), KeyWithMod::new(KEY_RIGHTBRACE, MOD_RSHIFT), shifted(KEY_8), __, shifted(KEY_SLASH), shifted(KEY_9), shifted(KEY_0), k(KEY_MINUS), shifted(KEY_SEMICOLON)],
    [__, __, shifted(KEY_4), shifted(KEY_BACKSLASH), shifted(KEY_GRAVE), k(KEY_GRAVE), k(KEY_KPPLUS), shifted(KEY_5), shifted(KEY_APOSTROPHE), k(KEY_APOSTROPHE), k(KEY_SEMICOLON)],
    [__, __, __, __, __, __, __, __, __, __, __],
];

#[rustfmt::skip]
const FUNCTION: LayerTable = [
    [k(KEY_F1), k(KEY_F2), k(KEY_F3), k(KEY_F4), k(KEY_F5), __, k(KEY_F6), k(KEY_F7), k(KEY_F8), k(KEY_F9), k(KEY_F10)],
    [__, __, __, __, __, __, __, __, __, __, k(KEY_F11)],
    [__, __, __, __, __, __, __, __, __, __, k(KEY_F12)],
    [__, __, __, __, __, __, __, __, __, __, __],
];

const fn table(layer: Layer) -> &'static LayerTable {
    match layer {
        Layer::Base => &BASE,
        Layer::Nav => &NAV,
        Layer::Symbols => &SYMBOLS,
        Layer::Function => &FUNCTION,
    }
}

/// Pick the layer for this frame from the held layer-shift keys.
///
/// Priority is fixed (Nav, then Symbols, then Function) and does not
/// depend on where the shift keys fall in the scan.
pub fn resolve_layer(snapshot: &KeySnapshot) -> Layer {
    if snapshot.contains(NAV_LAYER_KEY) {
        Layer::Nav
    } else if snapshot.contains(SYMBOLS_LAYER_KEY) {
        Layer::Symbols
    } else if snapshot.contains(FUNCTION_LAYER_KEY) {
        Layer::Function
    } else {
        Layer::Base
    }
}

/// Layer tables plus the per-user modifier swap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Keymap {
    /// Swap left Ctrl and left GUI on the base layer (macOS hosts).
    pub modifiers_swapped: bool,
}

impl Keymap {
    pub const fn new() -> Self {
        Self {
            modifiers_swapped: false,
        }
    }

    pub const fn with_modifiers_swapped(modifiers_swapped: bool) -> Self {
        Self { modifiers_swapped }
    }

    /// Resolve a position under `layer`, falling back to the base layer for
    /// transparent entries.  Out-of-range positions resolve to no key.
    pub fn lookup(&self, coord: KeyCoord, layer: Layer) -> KeyWithMod {
        let (row, col) = (coord.row as usize, coord.col as usize);
        if row >= MATRIX_ROWS || col >= MATRIX_COLS {
            return KeyWithMod::NONE;
        }

        let entry = table(layer)[row][col];
        if !entry.is_none() {
            return entry;
        }
        self.base_entry(row, col)
    }

    fn base_entry(&self, row: usize, col: usize) -> KeyWithMod {
        let entry = BASE[row][col];
        if !self.modifiers_swapped {
            return entry;
        }
        match entry.code {
            KEY_LEFTCTRL => KeyWithMod::new(KEY_LEFTMETA, MOD_LMETA),
            KEY_LEFTMETA => KeyWithMod::new(KEY_LEFTCTRL, MOD_LCTRL),
            _ => entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_shift_key_is_base() {
        let snapshot = KeySnapshot::from_keys(&[KeyCoord::new(0, 0)], false);
        assert_eq!(resolve_layer(&snapshot), Layer::Base);
        assert_eq!(resolve_layer(&KeySnapshot::new()), Layer::Base);
    }

    #[test]
    fn each_shift_key_selects_its_layer() {
        for (key, layer) in [
            (NAV_LAYER_KEY, Layer::Nav),
            (SYMBOLS_LAYER_KEY, Layer::Symbols),
            (FUNCTION_LAYER_KEY, Layer::Function),
        ] {
            let snapshot = KeySnapshot::from_keys(&[key], false);
            assert_eq!(resolve_layer(&snapshot), layer);
        }
    }

    #[test]
    fn layer_priority_is_fixed() {
        // Function is scanned before Nav, Nav still wins.
        let snapshot =
            KeySnapshot::from_keys(&[FUNCTION_LAYER_KEY, SYMBOLS_LAYER_KEY, NAV_LAYER_KEY], false);
        assert_eq!(resolve_layer(&snapshot), Layer::Nav);

        let snapshot = KeySnapshot::from_keys(&[FUNCTION_LAYER_KEY, SYMBOLS_LAYER_KEY], false);
        assert_eq!(resolve_layer(&snapshot), Layer::Symbols);
    }

    #[test]
    fn transparent_entries_fall_back_to_base() {
        let keymap = Keymap::new();
        // (0,0) is X on base, empty on Function.
        assert_eq!(keymap.lookup(KeyCoord::new(0, 0), Layer::Function).code, KEY_F1);
        assert_eq!(keymap.lookup(KeyCoord::new(1, 0), Layer::Function).code, KEY_U);
        assert_eq!(keymap.lookup(KeyCoord::new(0, 2), Layer::Nav).code, KEY_UP);
        assert_eq!(keymap.lookup(KeyCoord::new(0, 2), Layer::Base).code, KEY_L);
    }

    #[test]
    fn out_of_range_is_none() {
        let keymap = Keymap::new();
        assert!(keymap.lookup(KeyCoord::new(4, 0), Layer::Base).is_none());
        assert!(keymap.lookup(KeyCoord::new(0, 11), Layer::Nav).is_none());
    }

    #[test]
    fn modifier_swap_exchanges_ctrl_and_gui() {
        let ctrl = KeyCoord::new(1, 5);
        let gui = KeyCoord::new(3, 5);

        let plain = Keymap::new();
        assert_eq!(plain.lookup(ctrl, Layer::Base), KeyWithMod::new(KEY_LEFTCTRL, MOD_LCTRL));

        let swapped = Keymap::with_modifiers_swapped(true);
        assert_eq!(swapped.lookup(ctrl, Layer::Base), KeyWithMod::new(KEY_LEFTMETA, MOD_LMETA));
        assert_eq!(swapped.lookup(gui, Layer::Base), KeyWithMod::new(KEY_LEFTCTRL, MOD_LCTRL));
        // Swap also applies through a transparent entry.
        assert_eq!(swapped.lookup(ctrl, Layer::Nav).code, KEY_LEFTMETA);
        // Other keys untouched.
        assert_eq!(swapped.lookup(KeyCoord::new(1, 2), Layer::Base).code, KEY_A);
    }

    #[test]
    fn symbols_carry_shift() {
        let keymap = Keymap::new();
        // '(' is shift+9
        assert_eq!(
            keymap.lookup(KeyCoord::new(1, 7), Layer::Symbols),
            KeyWithMod::new(KEY_9, MOD_LSHIFT)
        );
    }
}
