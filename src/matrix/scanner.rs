//! GPIO matrix scanner.
//!
//! Columns are driven high one at a time and the four rows (pulled down)
//! are read back.  The wake button sits on its own pin, active low with
//! the internal pull-up.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{select, select_array};
use embassy_nrf::gpio::{AnyPin, Input, Level, Output, OutputDrive, Pull};
use embassy_time::{with_timeout, Duration};

use crate::config::{MATRIX_COLS, MATRIX_ROWS};
use crate::matrix::{KeyCoord, KeySnapshot};

/// Column settle time before the rows are sampled (CPU cycles at 64 MHz).
const COLUMN_SETTLE_CYCLES: u32 = 320;

/// Wake button state as of the latest scan.  Written only by the
/// dispatcher task.
pub static WAKE_HELD: AtomicBool = AtomicBool::new(false);

pub fn wake_is_held() -> bool {
    WAKE_HELD.load(Ordering::Relaxed)
}

pub struct Matrix<'d> {
    rows: [Input<'d>; MATRIX_ROWS],
    cols: [Output<'d>; MATRIX_COLS],
    wake: Input<'d>,
}

impl<'d> Matrix<'d> {
    pub fn new(rows: [AnyPin; MATRIX_ROWS], cols: [AnyPin; MATRIX_COLS], wake: AnyPin) -> Self {
        Self {
            rows: rows.map(|pin| Input::new(pin, Pull::Down)),
            cols: cols.map(|pin| Output::new(pin, Level::Low, OutputDrive::Standard)),
            wake: Input::new(wake, Pull::Up),
        }
    }

    /// Scan the whole matrix.  Keys are recorded column by column and the
    /// scan stops once the snapshot is full.
    pub fn scan(&mut self) -> KeySnapshot {
        let mut snapshot = KeySnapshot::new();
        snapshot.wake_down = self.wake.is_low();
        WAKE_HELD.store(snapshot.wake_down, Ordering::Relaxed);

        'columns: for (col, out) in self.cols.iter_mut().enumerate() {
            out.set_high();
            cortex_m::asm::delay(COLUMN_SETTLE_CYCLES);
            for (row, input) in self.rows.iter().enumerate() {
                if input.is_high() && !snapshot.push(KeyCoord::new(row as u8, col as u8)) {
                    out.set_low();
                    break 'columns;
                }
            }
            out.set_low();
        }

        snapshot
    }

    /// Sleep until any key or the wake button goes down, at most
    /// `timeout_ms`.  Returns `true` if a key woke us.
    pub async fn wait_for_key(&mut self, timeout_ms: u64) -> bool {
        for out in self.cols.iter_mut() {
            out.set_high();
        }

        let rows = select_array(self.rows.each_mut().map(|row| row.wait_for_high()));
        let woke = with_timeout(
            Duration::from_millis(timeout_ms),
            select(rows, self.wake.wait_for_low()),
        )
        .await
        .is_ok();

        for out in self.cols.iter_mut() {
            out.set_low();
        }
        woke
    }
}
