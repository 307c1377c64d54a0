//! Physical key positions and the per-scan snapshot of held switches.

use crate::config::MAX_PRESSED_KEYS;
use heapless::Vec;

/// A physical switch position in the matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyCoord {
    pub row: u8,
    pub col: u8,
}

impl KeyCoord {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// `const`-context equality, used by the page trigger table.
    pub const fn same(self, other: KeyCoord) -> bool {
        self.row == other.row && self.col == other.col
    }
}

/// Everything the scanner saw in one pass.
///
/// Keys are stored in scan order (column-major), which is stable for a
/// fixed scan pattern, so two snapshots compare equal exactly when the
/// same switches are held.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeySnapshot {
    keys: Vec<KeyCoord, MAX_PRESSED_KEYS>,
    pub wake_down: bool,
}

impl KeySnapshot {
    /// Nothing held.
    pub const fn new() -> Self {
        Self {
            keys: Vec::new(),
            wake_down: false,
        }
    }

    /// Build from a list of coordinates; anything past capacity is dropped.
    pub fn from_keys(keys: &[KeyCoord], wake_down: bool) -> Self {
        let mut snapshot = Self {
            keys: Vec::new(),
            wake_down,
        };
        for &key in keys {
            snapshot.push(key);
        }
        snapshot
    }

    /// Record a held key. Returns `false` once the snapshot is full.
    pub fn push(&mut self, key: KeyCoord) -> bool {
        self.keys.push(key).is_ok()
    }

    pub fn keys(&self) -> &[KeyCoord] {
        &self.keys
    }

    pub fn contains(&self, key: KeyCoord) -> bool {
        self.keys.contains(&key)
    }

    /// First key in scan order.
    pub fn first(&self) -> Option<KeyCoord> {
        self.keys.first().copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_full(&self) -> bool {
        self.keys.is_full()
    }

    /// No matrix key held (the wake button may be).
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Neither a matrix key nor the wake button is held.
    pub fn is_idle(&self) -> bool {
        self.keys.is_empty() && !self.wake_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_saturates_at_capacity() {
        let mut snapshot = KeySnapshot::new();
        for col in 0..MAX_PRESSED_KEYS as u8 {
            assert!(snapshot.push(KeyCoord::new(0, col)));
        }
        assert!(!snapshot.push(KeyCoord::new(1, 0)));
        assert!(snapshot.is_full());
        assert_eq!(snapshot.len(), MAX_PRESSED_KEYS);
        assert!(!snapshot.contains(KeyCoord::new(1, 0)));
    }

    #[test]
    fn equality_depends_on_wake_and_order() {
        let a = KeySnapshot::from_keys(&[KeyCoord::new(0, 1), KeyCoord::new(1, 1)], false);
        let b = KeySnapshot::from_keys(&[KeyCoord::new(0, 1), KeyCoord::new(1, 1)], false);
        let swapped = KeySnapshot::from_keys(&[KeyCoord::new(1, 1), KeyCoord::new(0, 1)], false);
        let woken = KeySnapshot::from_keys(&[KeyCoord::new(0, 1), KeyCoord::new(1, 1)], true);
        assert_eq!(a, b);
        assert_ne!(a, swapped);
        assert_ne!(a, woken);
    }

    #[test]
    fn idle_means_no_keys_and_no_wake() {
        assert!(KeySnapshot::new().is_idle());
        assert!(!KeySnapshot::from_keys(&[], true).is_idle());
        assert!(KeySnapshot::from_keys(&[], true).is_empty());
        assert!(!KeySnapshot::from_keys(&[KeyCoord::new(2, 2)], false).is_idle());
    }
}
