//! Battery telemetry and sleep policy, free of any PMIC access.

use crate::config::{
    DEEP_SLEEP_ADVERTISING_TIMEOUT_S, DEEP_SLEEP_NO_RELEASE_TIMEOUT_S, DEEP_SLEEP_TIMEOUT_S,
};

/// nPM1300 `BCHGCHARGESTATUS` bits.
const CHG_STATUS_COMPLETE: u8 = 1 << 1;
const CHG_STATUS_TRICKLE: u8 = 1 << 2;
const CHG_STATUS_CC: u8 = 1 << 3;
const CHG_STATUS_CV: u8 = 1 << 4;

/// Charger phase decoded from the status register.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargerStatus {
    #[default]
    Idle,
    Trickle,
    ConstantCurrent,
    ConstantVoltage,
    Complete,
}

impl ChargerStatus {
    pub fn from_register(status: u8) -> Self {
        if status & CHG_STATUS_COMPLETE != 0 {
            Self::Complete
        } else if status & CHG_STATUS_TRICKLE != 0 {
            Self::Trickle
        } else if status & CHG_STATUS_CC != 0 {
            Self::ConstantCurrent
        } else if status & CHG_STATUS_CV != 0 {
            Self::ConstantVoltage
        } else {
            Self::Idle
        }
    }

    /// Actively charging (constant current or constant voltage phase).
    pub fn is_charging(self) -> bool {
        matches!(self, Self::ConstantCurrent | Self::ConstantVoltage)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Trickle => "trkl",
            Self::ConstantCurrent => "cc",
            Self::ConstantVoltage => "cv",
            Self::Complete => "full",
        }
    }
}

/// One battery/charger reading as shown on the Debug and Idle pages.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerSample {
    pub vbus_present: bool,
    pub charger: ChargerStatus,
    /// Battery voltage (V).
    pub voltage: f32,
    /// Battery current (mA), positive while charging.
    pub current_ma: f32,
    /// State of charge (%).
    pub soc: f32,
    /// Time to empty (s), `None` unless discharging.
    pub tte_s: Option<u32>,
    /// Time to full (s), `None` unless charging.
    pub ttf_s: Option<u32>,
}

impl PowerSample {
    /// Nothing measured yet.
    pub const fn empty() -> Self {
        Self {
            vbus_present: false,
            charger: ChargerStatus::Idle,
            voltage: 0.0,
            current_ma: 0.0,
            soc: 0.0,
            tte_s: None,
            ttf_s: None,
        }
    }

    /// Build a sample from raw readings, deriving SoC and the time estimates.
    pub fn from_readings(
        vbus_present: bool,
        charger_status: u8,
        voltage: f32,
        current_ma: f32,
        capacity_mah: f32,
    ) -> Self {
        let soc = soc_from_voltage(voltage);
        Self {
            vbus_present,
            charger: ChargerStatus::from_register(charger_status),
            voltage,
            current_ma,
            soc,
            tte_s: time_to_empty_s(soc, current_ma, capacity_mah),
            ttf_s: time_to_full_s(soc, current_ma, capacity_mah),
        }
    }

    pub fn is_charging(&self) -> bool {
        self.charger.is_charging()
    }
}

/// Open-circuit voltage to SoC for a single Li-ion cell at room temperature.
const SOC_CURVE: [(f32, f32); 11] = [
    (3.30, 0.0),
    (3.50, 5.0),
    (3.60, 10.0),
    (3.68, 20.0),
    (3.74, 30.0),
    (3.79, 40.0),
    (3.84, 50.0),
    (3.90, 60.0),
    (3.98, 70.0),
    (4.06, 80.0),
    (4.20, 100.0),
];

/// Piecewise-linear state of charge (%) for a cell voltage, clamped to 0..=100.
pub fn soc_from_voltage(voltage: f32) -> f32 {
    let (first_v, first_soc) = SOC_CURVE[0];
    if voltage <= first_v {
        return first_soc;
    }
    for pair in SOC_CURVE.windows(2) {
        let (v0, s0) = pair[0];
        let (v1, s1) = pair[1];
        if voltage <= v1 {
            return s0 + (voltage - v0) * (s1 - s0) / (v1 - v0);
        }
    }
    100.0
}

/// Currents below this (mA) are treated as zero.
const CURRENT_DEADBAND_MA: f32 = 0.5;

/// Seconds until empty at the present discharge current.
pub fn time_to_empty_s(soc: f32, current_ma: f32, capacity_mah: f32) -> Option<u32> {
    if current_ma > -CURRENT_DEADBAND_MA {
        return None;
    }
    let remaining_mah = capacity_mah * soc / 100.0;
    Some((remaining_mah / -current_ma * 3600.0) as u32)
}

/// Seconds until full at the present charge current.
pub fn time_to_full_s(soc: f32, current_ma: f32, capacity_mah: f32) -> Option<u32> {
    if current_ma < CURRENT_DEADBAND_MA {
        return None;
    }
    let missing_mah = capacity_mah * (100.0 - soc) / 100.0;
    Some((missing_mah / current_ma * 3600.0) as u32)
}

/// Whether the keyboard should shut itself down.
///
/// `idle_s` is the time since the snapshot last changed, `held_s` the time
/// since nothing at all was held.  A shorter inactivity bound applies while
/// advertising without a host.
pub fn should_force_sleep(idle_s: u64, held_s: u64, advertising: bool) -> bool {
    idle_s > DEEP_SLEEP_TIMEOUT_S
        || (advertising && idle_s > DEEP_SLEEP_ADVERTISING_TIMEOUT_S)
        || held_s > DEEP_SLEEP_NO_RELEASE_TIMEOUT_S
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charger_status_priority() {
        assert_eq!(ChargerStatus::from_register(0), ChargerStatus::Idle);
        assert_eq!(ChargerStatus::from_register(CHG_STATUS_CC), ChargerStatus::ConstantCurrent);
        assert_eq!(
            ChargerStatus::from_register(CHG_STATUS_COMPLETE | CHG_STATUS_CV),
            ChargerStatus::Complete
        );
        assert!(ChargerStatus::ConstantVoltage.is_charging());
        assert!(!ChargerStatus::Trickle.is_charging());
    }

    #[test]
    fn soc_curve_is_clamped_and_monotonic() {
        assert_eq!(soc_from_voltage(3.0), 0.0);
        assert_eq!(soc_from_voltage(4.3), 100.0);
        assert!((soc_from_voltage(3.84) - 50.0).abs() < 0.01);
        let mut last = -1.0;
        let mut v = 3.2;
        while v < 4.3 {
            let soc = soc_from_voltage(v);
            assert!(soc >= last);
            last = soc;
            v += 0.01;
        }
    }

    #[test]
    fn time_estimates_follow_current_sign() {
        // 50% of 800 mAh at 40 mA discharge: 10 h.
        assert_eq!(time_to_empty_s(50.0, -40.0, 800.0), Some(36_000));
        assert_eq!(time_to_full_s(50.0, -40.0, 800.0), None);
        // 50% missing at 400 mA: 1 h.
        assert_eq!(time_to_full_s(50.0, 400.0, 800.0), Some(3_600));
        assert_eq!(time_to_empty_s(50.0, 400.0, 800.0), None);
        assert_eq!(time_to_empty_s(50.0, 0.1, 800.0), None);
    }

    #[test]
    fn sample_from_readings() {
        let sample = PowerSample::from_readings(true, CHG_STATUS_CC, 3.84, 200.0, 800.0);
        assert!(sample.vbus_present);
        assert!(sample.is_charging());
        assert!(sample.tte_s.is_none());
        assert!(sample.ttf_s.is_some());
    }

    #[test]
    fn empty_sample_is_default() {
        assert_eq!(PowerSample::empty(), PowerSample::default());
        assert!(!PowerSample::empty().is_charging());
    }

    #[test]
    fn sleep_policy_timers() {
        assert!(!should_force_sleep(0, 0, false));
        assert!(!should_force_sleep(DEEP_SLEEP_TIMEOUT_S, 0, false));
        assert!(should_force_sleep(DEEP_SLEEP_TIMEOUT_S + 1, 0, false));
        assert!(!should_force_sleep(DEEP_SLEEP_ADVERTISING_TIMEOUT_S + 1, 0, false));
        assert!(should_force_sleep(DEEP_SLEEP_ADVERTISING_TIMEOUT_S + 1, 0, true));
        assert!(should_force_sleep(0, DEEP_SLEEP_NO_RELEASE_TIMEOUT_S + 1, false));
    }
}
