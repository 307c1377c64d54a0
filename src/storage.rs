//! Persistent settings in the nRF52840's internal flash.
//!
//! Uses the `sequential-storage` map over a reserved page range, so
//! wear levelling and garbage collection are handled by the crate.
//!
//! Storage layout:
//!   - key 1: boot count (`u16`, little endian)
//!   - key 2: Ctrl/GUI swap (`bool`, one byte)
//!
//! Only the storage task touches flash.  Everyone else reads the
//! published atomics and sends [`StorageCommand`]s.

use core::ops::Range;
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::config::{STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};
use crate::error::Error;
use defmt::{error, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map::{fetch_item, store_item, Value};

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

const KEY_BOOT_COUNT: u8 = 1;
const KEY_MODIFIER_SWAP: u8 = 2;

/// Scratch buffer for one map item.
const ITEM_BUF_SIZE: usize = 32;

/// Settings changes requested by other tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
pub enum StorageCommand {
    SetModifierSwap(bool),
}

static STORAGE_CHANNEL: Channel<CriticalSectionRawMutex, StorageCommand, 4> = Channel::new();

/// Published settings.  Written only by the storage task.
static BOOT_COUNT: AtomicU16 = AtomicU16::new(0);
static MODIFIERS_SWAPPED: AtomicBool = AtomicBool::new(false);

pub fn boot_count() -> u16 {
    BOOT_COUNT.load(Ordering::Relaxed)
}

pub fn modifiers_swapped() -> bool {
    MODIFIERS_SWAPPED.load(Ordering::Relaxed)
}

/// Queue a settings change for the storage task.
pub fn request(cmd: StorageCommand) {
    if STORAGE_CHANNEL.try_send(cmd).is_err() {
        warn!("storage queue full, dropped {}", cmd);
    }
}

/// Typed access to the settings map.
pub struct Settings<F: NorFlash> {
    flash: F,
    range: Range<u32>,
}

impl<F: NorFlash> Settings<F> {
    pub fn new(flash: F) -> Self {
        Self {
            flash,
            range: STORAGE_START..STORAGE_END,
        }
    }

    async fn fetch<V>(&mut self, key: u8) -> Option<V>
    where
        V: for<'a> Value<'a>,
    {
        let mut buf = [0u8; ITEM_BUF_SIZE];
        match fetch_item::<u8, V, _>(
            &mut self.flash,
            self.range.clone(),
            &mut NoCache::new(),
            &mut buf,
            &key,
        )
        .await
        {
            Ok(value) => value,
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                None
            }
        }
    }

    async fn store<V>(&mut self, key: u8, value: &V) -> Result<(), Error>
    where
        V: for<'a> Value<'a>,
    {
        let mut buf = [0u8; ITEM_BUF_SIZE];
        store_item(
            &mut self.flash,
            self.range.clone(),
            &mut NoCache::new(),
            &mut buf,
            &key,
            value,
        )
        .await
        .map_err(|e| {
            warn!("Flash write error: {:?}", defmt::Debug2Format(&e));
            Error::Storage
        })
    }

    /// Number of boots so far, `0` if never written.
    pub async fn boot_count(&mut self) -> u16 {
        self.fetch::<u16>(KEY_BOOT_COUNT).await.unwrap_or(0)
    }

    /// Count this boot and return the new total.  The total is returned
    /// even when it could not be written back.
    pub async fn increment_boot_count(&mut self) -> u16 {
        let count = self.boot_count().await.wrapping_add(1);
        let _ = self.store(KEY_BOOT_COUNT, &count).await;
        count
    }

    pub async fn modifier_swap(&mut self) -> bool {
        self.fetch::<bool>(KEY_MODIFIER_SWAP).await.unwrap_or(false)
    }

    pub async fn set_modifier_swap(&mut self, swapped: bool) -> Result<(), Error> {
        self.store(KEY_MODIFIER_SWAP, &swapped).await
    }
}

#[embassy_executor::task]
pub async fn storage_task(flash: nrf_softdevice::Flash) {
    let mut settings = Settings::new(flash);

    let boots = settings.increment_boot_count().await;
    BOOT_COUNT.store(boots, Ordering::Relaxed);
    let swapped = settings.modifier_swap().await;
    MODIFIERS_SWAPPED.store(swapped, Ordering::Relaxed);
    info!("boot #{}, modifiers swapped: {}", boots, swapped);

    loop {
        match STORAGE_CHANNEL.receive().await {
            StorageCommand::SetModifierSwap(swapped) => {
                MODIFIERS_SWAPPED.store(swapped, Ordering::Relaxed);
                match settings.set_modifier_swap(swapped).await {
                    Ok(()) => info!("modifiers swapped: {}", swapped),
                    Err(e) => error!("modifier swap not saved: {}", e),
                }
            }
        }
    }
}
