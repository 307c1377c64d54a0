//! Application-wide constants and compile-time configuration.
//!
//! All key positions, timing parameters, and protocol constants live
//! here so they can be tuned in one place.  Nothing in this module
//! depends on the HAL, so it is shared by the host tests.

use crate::matrix::KeyCoord;

// Key matrix

/// Number of matrix rows (read as inputs).
pub const MATRIX_ROWS: usize = 4;

/// Number of matrix columns (driven as outputs).
pub const MATRIX_COLS: usize = 11;

/// Maximum number of switches captured by one scan.
pub const MAX_PRESSED_KEYS: usize = 6;

/// Maximum number of key codes in one HID report.
pub const MAX_ENCODED_KEYS: usize = 6;

// Layer-shift keys

pub const NAV_LAYER_KEY: KeyCoord = KeyCoord::new(3, 7);
pub const SYMBOLS_LAYER_KEY: KeyCoord = KeyCoord::new(3, 6);
pub const FUNCTION_LAYER_KEY: KeyCoord = KeyCoord::new(3, 1);

// Wake chords (wake + key) that open UI pages

pub const CHORD_SHUTDOWN: KeyCoord = KeyCoord::new(1, 6); // S
pub const CHORD_DEBUG: KeyCoord = KeyCoord::new(1, 10); // D
pub const CHORD_SWAP_MODIFIERS: KeyCoord = KeyCoord::new(0, 4); // W
pub const CHORD_HELP: KeyCoord = KeyCoord::new(0, 7); // H
pub const CHORD_APPS: KeyCoord = KeyCoord::new(1, 2); // A

/// Passkey confirmation dialog answers.
pub const PASSKEY_ACCEPT_KEY: KeyCoord = KeyCoord::new(2, 2); // Y
pub const PASSKEY_REJECT_KEY: KeyCoord = KeyCoord::new(1, 7); // N

// Apps menu (wake + key)

pub const APP_LIFE_KEY: KeyCoord = KeyCoord::new(0, 8); // G
pub const APP_LANDER_KEY: KeyCoord = KeyCoord::new(0, 2); // L
pub const APP_MANDELBROT_KEY: KeyCoord = KeyCoord::new(2, 7); // M
pub const APPS_EXIT_KEY: KeyCoord = KeyCoord::new(0, 0); // X

// Application navigation keys (no wake)

pub const APP_KEY_UP: KeyCoord = KeyCoord::new(0, 2); // L
pub const APP_KEY_DOWN: KeyCoord = KeyCoord::new(2, 2); // Y
pub const APP_KEY_LEFT: KeyCoord = KeyCoord::new(1, 1); // I
pub const APP_KEY_RIGHT: KeyCoord = KeyCoord::new(1, 3); // E
pub const APP_KEY_SELECT: KeyCoord = KeyCoord::new(1, 2); // A
pub const APP_KEY_BACK: KeyCoord = KeyCoord::new(0, 1); // V

// UI timing

/// UI refresh period while a page is shown (ms).
pub const UI_TIME_STEP_MS: u64 = 50;

/// Inactivity timeout before the display is switched off (ms).
pub const UI_TIMEOUT_MS: u64 = 10_000;

/// Depth of the UI message queue.  One slot: only the latest request matters.
pub const UI_MSG_QUEUE_SIZE: usize = 1;

/// How long a producer waits for a free queue slot before dropping (ms).
pub const UI_SEND_TIMEOUT_MS: u64 = 50;

/// How long the modifier-swap confirmation stays on screen (ms).
pub const SWAP_PAGE_HOLD_MS: u64 = 350;

/// Animation frame duration unit (ms per frame count).
pub const ANIM_TICK_MS: u64 = 100;

// Scanning & sleep

/// Scan period while any key is held (ms).
pub const SCAN_HELD_PERIOD_MS: u64 = 50;

/// Upper bound of the idle wait for a matrix interrupt (ms).
pub const SCAN_IDLE_WAIT_MS: u64 = 2_000;

/// Inactivity before a forced shutdown (seconds).
pub const DEEP_SLEEP_TIMEOUT_S: u64 = 60 * 30;

/// Inactivity before a forced shutdown while still advertising (seconds).
pub const DEEP_SLEEP_ADVERTISING_TIMEOUT_S: u64 = 60 * 5;

/// Continuous press duration before a forced shutdown (seconds).
/// Catches a key wedged down inside a bag.
pub const DEEP_SLEEP_NO_RELEASE_TIMEOUT_S: u64 = 60 * 10;

// Display

pub const DISPLAY_WIDTH: usize = 128;
pub const DISPLAY_HEIGHT: usize = 64;

/// Number of 8-pixel pages (text lines) on the panel.
pub const DISPLAY_LINES: usize = DISPLAY_HEIGHT / 8;

/// SSD1306 I²C address.
pub const DISPLAY_I2C_ADDR: u8 = 0x3C;

// Status LEDs

/// LEDs in the advertising sweep.
pub const LED_COUNT: usize = 4;

/// Time each LED stays lit during the sweep (ms).
pub const LED_SWEEP_STEP_MS: u64 = 150;

// Power

/// nPM1300 PMIC I²C address.
pub const PMIC_I2C_ADDR: u8 = 0x6B;

/// Fuel-gauge refresh period (seconds).
pub const FUEL_GAUGE_PERIOD_S: u64 = 4;

/// Battery capacity used for time-to-empty / time-to-full (mAh).
pub const BATTERY_CAPACITY_MAH: f32 = 800.0;

// BLE

/// Advertised device name.
pub const BLE_DEVICE_NAME: &str = "wrls atreus";

/// GAP appearance: HID keyboard.
pub const BLE_APPEARANCE_KEYBOARD: u16 = 0x03C1;

/// BLE connection interval range (in 1.25 ms units).
pub const BLE_CONN_INTERVAL_MIN: u16 = 6;
pub const BLE_CONN_INTERVAL_MAX: u16 = 12;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 30;

/// BLE supervision timeout (in 10 ms units). 430 = 4.3 s.
pub const BLE_SUP_TIMEOUT: u16 = 430;

/// Maximum number of bonded hosts kept for the session.
pub const MAX_BONDED_HOSTS: usize = 4;

/// How long a new bond waits for the user to confirm the passkey (seconds).
pub const PAIRING_CONFIRM_TIMEOUT_S: u64 = 30;

// Settings storage

/// Flash page index where settings storage starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for settings storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 4;
