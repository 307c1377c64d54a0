//! Power management - nPM1300 PMIC over I²C.
//!
//! Implements:
//! - Display load switch at boot
//! - Fuel gauge: VBUS, charger phase, VBAT / IBAT ADC readings
//! - Ship mode (the lowest-power state, left only by the wake button)
//!
//! Registers are addressed with a base byte and an offset byte.

use core::cell::Cell;

use crate::config::{BATTERY_CAPACITY_MAH, FUEL_GAUGE_PERIOD_S, PMIC_I2C_ADDR};
use crate::error::Error;
use crate::matrix::scanner::wake_is_held;
use crate::power_logic::PowerSample;
use defmt::{error, info, warn};
use embassy_futures::select::{select, Either};
use embassy_nrf::peripherals::TWISPI1;
use embassy_nrf::twim::Twim;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker, Timer};
use embedded_hal_async::i2c::I2c;

// Register map (base, offset).
const VBUSINSTATUS: (u8, u8) = (0x02, 0x07);
const BCHGCHARGESTATUS: (u8, u8) = (0x03, 0x34);
const ADC_TASKVBATMEASURE: (u8, u8) = (0x05, 0x00);
const ADC_IBATMEASEN: (u8, u8) = (0x05, 0x24);
/// First of the ADC result registers, read as one block.
const ADC_RESULTS: (u8, u8) = (0x05, 0x10);
const LDSW_TASKLDSW1SET: (u8, u8) = (0x08, 0x00);
const SHIP_TASKENTERSHIPMODE: (u8, u8) = (0x0B, 0x02);

/// Offsets inside the ADC result block.
const RES_IBAT_STAT: usize = 0;
const RES_VBAT_MSB: usize = 1;
const RES_LSB_A: usize = 5;
const RES_IBAT_MSB: usize = 8;
const RES_LSB_B: usize = 10;
const ADC_RESULTS_LEN: usize = 11;

const VBUS_PRESENT: u8 = 1 << 0;

/// `ADCIBATMEASSTATUS` direction codes.
const IBAT_STAT_DISCHARGE: u8 = 0x04;
const IBAT_STAT_CHARGE_TRICKLE: u8 = 0x0C;
const IBAT_STAT_CHARGE_COOL: u8 = 0x0D;
const IBAT_STAT_CHARGE_NORMAL: u8 = 0x0F;

/// Configured charge current and discharge limit (mA).
const CHARGE_CURRENT_MA: f32 = 200.0;
const DISCHARGE_LIMIT_MA: f32 = 1000.0;

/// VBAT full scale (V) of the 10-bit ADC.
const VBAT_FULL_SCALE_V: f32 = 5.0;
const ADC_MAX: f32 = 1023.0;

/// Conversion time after triggering a VBAT measurement.
const ADC_SETTLE: Duration = Duration::from_millis(5);

/// Latest fuel-gauge reading.  Written only by the power task.
static POWER: Mutex<CriticalSectionRawMutex, Cell<PowerSample>> =
    Mutex::new(Cell::new(PowerSample::empty()));

static SHIP_MODE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

pub fn latest() -> PowerSample {
    POWER.lock(|sample| sample.get())
}

/// Ask the power task to switch the keyboard off.
pub fn request_ship_mode() {
    SHIP_MODE.signal(());
}

/// 10-bit ADC value from an MSB register and two LSBs at `shift`.
fn adc_raw(msb: u8, lsbs: u8, shift: u8) -> u16 {
    (u16::from(msb) << 2) | u16::from((lsbs >> shift) & 0b11)
}

fn battery_current_ma(status: u8, raw: u16) -> f32 {
    let full_scale = match status & 0x0F {
        IBAT_STAT_DISCHARGE => -DISCHARGE_LIMIT_MA,
        IBAT_STAT_CHARGE_TRICKLE => CHARGE_CURRENT_MA / 10.0,
        IBAT_STAT_CHARGE_COOL => CHARGE_CURRENT_MA / 2.0,
        IBAT_STAT_CHARGE_NORMAL => CHARGE_CURRENT_MA,
        _ => 0.0,
    };
    f32::from(raw) * full_scale / ADC_MAX
}

pub struct Pmic<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Pmic<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    async fn write_reg(&mut self, (base, offset): (u8, u8), value: u8) -> Result<(), Error> {
        self.i2c
            .write(PMIC_I2C_ADDR, &[base, offset, value])
            .await
            .map_err(|_| Error::Pmic)
    }

    async fn read_regs(&mut self, (base, offset): (u8, u8), buf: &mut [u8]) -> Result<(), Error> {
        self.i2c
            .write_read(PMIC_I2C_ADDR, &[base, offset], buf)
            .await
            .map_err(|_| Error::Pmic)
    }

    async fn read_reg(&mut self, reg: (u8, u8)) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.read_regs(reg, &mut buf).await?;
        Ok(buf[0])
    }

    /// Switch on the display supply and enable battery current
    /// measurement alongside every VBAT conversion.
    pub async fn init(&mut self) -> Result<(), Error> {
        self.write_reg(LDSW_TASKLDSW1SET, 1).await?;
        self.write_reg(ADC_IBATMEASEN, 1).await
    }

    /// Take one fuel-gauge reading.
    pub async fn sample(&mut self) -> Result<PowerSample, Error> {
        let vbus = self.read_reg(VBUSINSTATUS).await? & VBUS_PRESENT != 0;
        let charger = self.read_reg(BCHGCHARGESTATUS).await?;

        self.write_reg(ADC_TASKVBATMEASURE, 1).await?;
        Timer::after(ADC_SETTLE).await;
        let mut res = [0u8; ADC_RESULTS_LEN];
        self.read_regs(ADC_RESULTS, &mut res).await?;

        let vbat_raw = adc_raw(res[RES_VBAT_MSB], res[RES_LSB_A], 0);
        let ibat_raw = adc_raw(res[RES_IBAT_MSB], res[RES_LSB_B], 4);
        let voltage = f32::from(vbat_raw) * VBAT_FULL_SCALE_V / ADC_MAX;
        let current_ma = battery_current_ma(res[RES_IBAT_STAT], ibat_raw);

        Ok(PowerSample::from_readings(
            vbus,
            charger,
            voltage,
            current_ma,
            BATTERY_CAPACITY_MAH,
        ))
    }

    /// Enter ship mode.  Only returns if the PMIC refused.
    pub async fn enter_ship_mode(&mut self) -> Result<(), Error> {
        self.write_reg(SHIP_TASKENTERSHIPMODE, 1).await
    }
}

/// Refresh the shared power sample, and power off on request.
#[embassy_executor::task]
pub async fn power_task(mut pmic: Pmic<Twim<'static, TWISPI1>>) {
    let mut ticker = Ticker::every(Duration::from_secs(FUEL_GAUGE_PERIOD_S));
    let mut charger = None;

    loop {
        match pmic.sample().await {
            Ok(sample) => {
                if charger != Some(sample.charger) {
                    charger = Some(sample.charger);
                    info!("charger {}", sample.charger.as_str());
                }
                POWER.lock(|cell| cell.set(sample));
            }
            Err(e) => warn!("fuel gauge read failed: {}", e),
        }

        if let Either::Second(()) = select(ticker.next(), SHIP_MODE.wait()).await {
            break;
        }
    }

    // Ship mode exits on a wake press, so wait for the release first.
    while wake_is_held() {
        Timer::after_millis(10).await;
    }
    Timer::after_millis(100).await;
    info!("entering ship mode");
    if let Err(e) = pmic.enter_ship_mode().await {
        error!("ship mode failed: {}", e);
    }
}

