//! Layer tables and the held-key tracker.

pub mod layout;
pub mod tracker;

pub use layout::{resolve_layer, KeyWithMod, Keymap, Layer};
pub use tracker::{ActiveKey, ActiveKeys};
