//! wrls-atreus - firmware for a wireless Atreus-style keyboard.
//!
//! ## Architecture
//!
//! ```text
//!   matrix ──► dispatcher ──► reports ──► BLE (HID over GATT) ──► host
//!                  │
//!                  └──► UI messages ──► UI task ──► SSD1306
//!                                          │
//!                                          └──► apps (exclusive mode)
//! ```
//!
//! Tasks:
//! - `softdevice_task`: runs the SoftDevice event loop
//! - `ble_task`: advertising, bonding, report delivery
//! - `dispatcher_task`: matrix scan, layer tracking, HID encoding
//! - `ui_task`: OLED pages and applications
//! - `power_task`: nPM1300 fuel gauge and ship mode
//! - `storage_task`: settings in flash
//! - `led_task`: LED sweep while advertising

#![no_std]
#![no_main]

mod apps;
mod ble;
mod config;
mod dispatch;
mod error;
mod hid;
mod keymap;
mod led_logic;
mod leds;
mod matrix;
mod power;
mod power_logic;
mod storage;
mod ui;

use core::mem;

use defmt::{error, info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{AnyPin, Level, Output, OutputDrive, Pin};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::{bind_interrupts, peripherals, twim};
use embassy_time::{Instant, Timer};
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::apps::runner;
use crate::ble::Server;
use crate::config::BLE_DEVICE_NAME;
use crate::dispatch::{CycleFlags, Dispatcher, Wait};
use crate::matrix::scanner::Matrix;
use crate::power::Pmic;
use crate::ui::display::OledPanel;
use crate::ui::UiMessage;

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
    SPIM1_SPIS1_TWIM1_TWIS1_SPI1_TWI1 => twim::InterruptHandler<peripherals::TWISPI1>;
});

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Scan, dispatch, wait; forever.
#[embassy_executor::task]
async fn dispatcher_task(mut matrix: Matrix<'static>, ui_available: bool) {
    let mut dispatcher = Dispatcher::new(Instant::now().as_secs());

    loop {
        let snapshot = matrix.scan();
        let app_running = runner::is_running();
        if app_running {
            runner::APP_INPUT.signal(snapshot.clone());
        }

        let flags = CycleFlags {
            app_running,
            ui_active: ui::task::is_active(),
            advertising: ble::link_state().advertising,
            modifiers_swapped: storage::modifiers_swapped(),
            ui_unavailable: !ui_available,
        };
        let out = dispatcher.cycle(snapshot, Instant::now().as_secs(), flags);

        if let Some(report) = out.report {
            ble::send_report(report);
        }
        if let Some(msg) = out.message {
            // Dropped messages are logged by the sender.
            let _ = ui::task::send(msg).await;
        }
        if out.ship_mode {
            info!("idle too long, entering ship mode");
            power::request_ship_mode();
        }

        match out.wait {
            Wait::Poll(ms) => Timer::after_millis(ms).await,
            Wait::Idle(ms) => {
                matrix.wait_for_key(ms).await;
            }
        }
    }
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 64 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: BLE_DEVICE_NAME.as_ptr() as _,
            current_len: BLE_DEVICE_NAME.len() as u16,
            max_len: BLE_DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("wrls-atreus starting");

    // Keep interrupt priorities clear of the ones the SoftDevice reserves.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);
    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(Priority::P3);
    interrupt::SPIM1_SPIS1_TWIM1_TWIS1_SPI1_TWI1.set_priority(Priority::P3);

    let sd = Softdevice::enable(&softdevice_config());
    static SERVER: StaticCell<Server> = StaticCell::new();
    let server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));

    // PMIC first: it powers the display.
    let mut i2c_config = twim::Config::default();
    i2c_config.frequency = twim::Frequency::K400;
    let pmic_i2c = twim::Twim::new(p.TWISPI1, Irqs, p.P0_06, p.P0_08, i2c_config);
    let mut pmic = Pmic::new(pmic_i2c);
    if let Err(e) = pmic.init().await {
        error!("PMIC init failed: {}", e);
    }

    let mut i2c_config = twim::Config::default();
    i2c_config.frequency = twim::Frequency::K400;
    let display_i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, i2c_config);

    let rows: [AnyPin; config::MATRIX_ROWS] = [
        p.P0_02.degrade(),
        p.P0_03.degrade(),
        p.P0_28.degrade(),
        p.P0_29.degrade(),
    ];
    let cols: [AnyPin; config::MATRIX_COLS] = [
        p.P0_04.degrade(),
        p.P0_05.degrade(),
        p.P0_30.degrade(),
        p.P0_31.degrade(),
        p.P0_11.degrade(),
        p.P0_12.degrade(),
        p.P1_10.degrade(),
        p.P1_11.degrade(),
        p.P1_12.degrade(),
        p.P1_13.degrade(),
        p.P1_14.degrade(),
    ];
    let matrix = Matrix::new(rows, cols, p.P1_15.degrade());

    let led_pins: [AnyPin; config::LED_COUNT] = [
        p.P0_13.degrade(),
        p.P0_14.degrade(),
        p.P0_15.degrade(),
        p.P0_16.degrade(),
    ];
    let leds = led_pins.map(|pin| Output::new(pin, Level::Low, OutputDrive::Standard));

    let _ = ui::task::try_send(UiMessage::Startup);

    unwrap!(spawner.spawn(storage::storage_task(nrf_softdevice::Flash::take(sd))));
    unwrap!(spawner.spawn(power::power_task(pmic)));
    let ui_available = match OledPanel::init(display_i2c) {
        Ok(panel) => {
            unwrap!(spawner.spawn(ui::task::ui_task(panel)));
            true
        }
        Err(e) => {
            error!("display unavailable: {}", e);
            false
        }
    };
    unwrap!(spawner.spawn(leds::led_task(leds)));
    unwrap!(spawner.spawn(ble::ble_task(sd, server)));
    unwrap!(spawner.spawn(dispatcher_task(matrix, ui_available)));

    info!("all tasks spawned");
}
