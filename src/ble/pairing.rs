//! Pairing gate between the security handler and the ConfirmPasskey page.
//!
//! The BLE task opens the gate with [`confirm`] and waits; the UI task
//! reads [`pending`] and answers through [`reply`].

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};

use crate::config::PAIRING_CONFIRM_TIMEOUT_S;
use crate::ui::task as ui_task;
use crate::ui::UiMessage;

static PENDING: AtomicBool = AtomicBool::new(false);
static REPLY: Signal<CriticalSectionRawMutex, bool> = Signal::new();

/// A confirmation is waiting for the user.
pub fn pending() -> bool {
    PENDING.load(Ordering::Relaxed)
}

/// Answer the open confirmation.  Ignored when none is open.
pub fn reply(accept: bool) {
    if PENDING.swap(false, Ordering::Relaxed) {
        REPLY.signal(accept);
    }
}

/// Show `passkey` and wait for the user.  No answer within
/// `PAIRING_CONFIRM_TIMEOUT_S` counts as a rejection.
pub async fn confirm(passkey: u32) -> bool {
    REPLY.reset();
    PENDING.store(true, Ordering::Relaxed);

    if ui_task::send(UiMessage::ConfirmPasskeyRequested(passkey))
        .await
        .is_err()
    {
        PENDING.store(false, Ordering::Relaxed);
        return false;
    }

    let accepted = with_timeout(
        Duration::from_secs(PAIRING_CONFIRM_TIMEOUT_S),
        REPLY.wait(),
    )
    .await
    .unwrap_or(false);
    PENDING.store(false, Ordering::Relaxed);
    info!("passkey {} confirmed: {}", passkey, accepted);
    accepted
}
