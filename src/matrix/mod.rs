//! Key matrix: positions, per-scan snapshots and the GPIO scanner.

pub mod scanner;
pub mod snapshot;

pub use snapshot::{KeyCoord, KeySnapshot};
