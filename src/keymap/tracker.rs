//! Held-key tracking with layer latching.
//!
//! A key keeps the layer it was pressed under until it is released, so
//! pressing or releasing a layer-shift key never changes what an already
//! held key sends.

use crate::config::MAX_PRESSED_KEYS;
use crate::keymap::{resolve_layer, Layer};
use crate::matrix::{KeyCoord, KeySnapshot};
use heapless::Vec;

/// A held key and the layer that was active when it went down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActiveKey {
    pub coord: KeyCoord,
    pub layer: Layer,
}

impl ActiveKey {
    pub const fn new(coord: KeyCoord, layer: Layer) -> Self {
        Self { coord, layer }
    }
}

/// The set of currently held keys, oldest press first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActiveKeys {
    records: Vec<ActiveKey, MAX_PRESSED_KEYS>,
}

impl ActiveKeys {
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Compute the records for `snapshot` from the previous frame's records.
    ///
    /// Keys still held keep their record untouched; newly pressed keys are
    /// tagged with the layer resolved from `snapshot`; released keys drop out.
    /// Presses beyond capacity are not tracked.
    pub fn resolve(previous: &ActiveKeys, snapshot: &KeySnapshot) -> (ActiveKeys, Layer) {
        let layer = resolve_layer(snapshot);
        let mut next = ActiveKeys::new();

        for record in previous.records.iter() {
            if snapshot.contains(record.coord) {
                // Cannot fail: next holds at most as many as previous.
                let _ = next.records.push(*record);
            }
        }

        for &coord in snapshot.keys() {
            if next.find(coord).is_some() {
                continue;
            }
            if next.records.push(ActiveKey::new(coord, layer)).is_err() {
                break;
            }
        }

        (next, layer)
    }

    /// In-place form of [`ActiveKeys::resolve`]. Returns the frame's layer.
    pub fn update(&mut self, snapshot: &KeySnapshot) -> Layer {
        let (next, layer) = Self::resolve(self, snapshot);
        *self = next;
        layer
    }

    /// Forget every held key.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> &[ActiveKey] {
        &self.records
    }

    pub fn find(&self, coord: KeyCoord) -> Option<&ActiveKey> {
        self.records.iter().find(|r| r.coord == coord)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
