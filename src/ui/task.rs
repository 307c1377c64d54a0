//! The UI task: owns the display and the page state machine.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{info, warn};
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::twim::Twim;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration, Instant};

use crate::apps::runner;
use crate::ble::{pairing, peripheral};
use crate::config::{UI_MSG_QUEUE_SIZE, UI_SEND_TIMEOUT_MS, UI_TIME_STEP_MS};
use crate::error::Error;
use crate::power;
use crate::power_logic::PowerSample;
use crate::storage::{self, StorageCommand};
use crate::ui::display::OledPanel;
use crate::ui::{LinkState, Step, Ui, UiMessage, UiServices};

static UI_CHANNEL: Channel<CriticalSectionRawMutex, UiMessage, UI_MSG_QUEUE_SIZE> = Channel::new();

/// A page is showing.  Written only by the UI task.
pub static UI_ACTIVE: AtomicBool = AtomicBool::new(false);

pub fn is_active() -> bool {
    UI_ACTIVE.load(Ordering::Relaxed)
}

/// Queue a message, waiting at most `UI_SEND_TIMEOUT_MS` for a free slot.
pub async fn send(msg: UiMessage) -> Result<(), Error> {
    with_timeout(
        Duration::from_millis(UI_SEND_TIMEOUT_MS),
        UI_CHANNEL.send(msg),
    )
    .await
    .map_err(|_| {
        warn!("ui queue full, dropped {}", msg);
        Error::Timeout
    })
}

/// Queue a message without waiting (for non-async callers).
pub fn try_send(msg: UiMessage) -> Result<(), Error> {
    UI_CHANNEL.try_send(msg).map_err(|_| {
        warn!("ui queue full, dropped {}", msg);
        Error::ChannelFull
    })
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

/// Live collaborators behind the pages.
struct TaskServices;

impl UiServices for TaskServices {
    fn power(&self) -> PowerSample {
        power::latest()
    }

    fn link(&self) -> LinkState {
        peripheral::link_state()
    }

    fn passkey_pending(&self) -> bool {
        pairing::pending()
    }

    fn reply_passkey(&mut self, accept: bool) {
        pairing::reply(accept);
    }

    fn toggle_modifier_swap(&mut self) -> bool {
        let swapped = !storage::modifiers_swapped();
        storage::request(StorageCommand::SetModifierSwap(swapped));
        swapped
    }

    fn modifiers_swapped(&self) -> bool {
        storage::modifiers_swapped()
    }

    fn boot_count(&self) -> u16 {
        storage::boot_count()
    }
}

#[embassy_executor::task]
pub async fn ui_task(mut panel: OledPanel<Twim<'static, TWISPI0>>) {
    let mut ui = Ui::new(now_ms());
    let mut services = TaskServices;
    let mut shown = ui.current();

    loop {
        let msg = if ui.wants_tick() {
            with_timeout(Duration::from_millis(UI_TIME_STEP_MS), UI_CHANNEL.receive())
                .await
                .unwrap_or(UiMessage::NoMessage)
        } else {
            UI_CHANNEL.receive().await
        };

        let step = ui.step(msg, now_ms(), &mut panel, &mut services);
        UI_ACTIVE.store(ui.is_active(), Ordering::Relaxed);
        if ui.current() != shown {
            shown = ui.current();
            info!("ui page {}", shown);
        }

        match step {
            Step::Continue => {}
            Step::Launch(app) => {
                runner::run(app, &mut panel).await;
                ui.resume(now_ms());
            }
            Step::ShipMode => {
                info!("shutdown animation done");
                power::request_ship_mode();
                core::future::pending::<()>().await;
            }
        }
    }
}
