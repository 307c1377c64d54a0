//! Status LEDs.  A sweep runs while advertising; otherwise all are off.

use defmt::debug;
use embassy_nrf::gpio::Output;
use embassy_time::{Duration, Timer};

use crate::ble;
use crate::config::{LED_COUNT, LED_SWEEP_STEP_MS};
use crate::led_logic::Sweep;

/// How often the advertising flag is checked while the LEDs are dark.
const IDLE_POLL: Duration = Duration::from_millis(500);

fn all_off(leds: &mut [Output<'static>; LED_COUNT]) {
    for led in leds.iter_mut() {
        led.set_low();
    }
}

#[embassy_executor::task]
pub async fn led_task(mut leds: [Output<'static>; LED_COUNT]) {
    all_off(&mut leds);

    loop {
        while !ble::link_state().advertising {
            Timer::after(IDLE_POLL).await;
        }
        debug!("advertising sweep on");

        let mut sweep = Sweep::new();
        while ble::link_state().advertising {
            let led = sweep.current();
            leds[led].set_high();
            Timer::after_millis(LED_SWEEP_STEP_MS).await;
            leds[led].set_low();
            sweep.advance();
        }

        all_off(&mut leds);
        debug!("advertising sweep off");
    }
}
