//! HID-over-GATT peripheral: advertising, bonding and the connection loop.

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{debug, info, warn};
use embassy_futures::select::{select, select3, Either, Either3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker, Timer};
use heapless::Vec;
use nrf_softdevice::ble::advertisement_builder::{
    AdvertisementDataType, Flag, LegacyAdvertisementBuilder, ServiceList, ServiceUuid16,
};
use nrf_softdevice::ble::security::{IoCapabilities, SecurityHandler};
use nrf_softdevice::ble::{
    gatt_server, peripheral, Connection, EncryptionInfo, IdentityKey, MasterId, SecurityMode,
};
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;

use crate::ble::hid_service::Server;
use crate::ble::pairing;
use crate::config;
use crate::config::{
    BLE_APPEARANCE_KEYBOARD, BLE_DEVICE_NAME, FUEL_GAUGE_PERIOD_S, MAX_BONDED_HOSTS,
};
use crate::error::{BleError, Error};
use crate::hid::KeyboardReport;
use crate::power;
use crate::ui::message::passkey_from_ascii;
use crate::ui::task as ui_task;
use crate::ui::{LinkState, UiMessage};

/// Link flags.  Written only by the BLE task.
static ADVERTISING: AtomicBool = AtomicBool::new(false);
static CONNECTED: AtomicBool = AtomicBool::new(false);

/// Newest report for the current connection.  A report replaces any that
/// has not been sent yet.
static REPORT: Signal<CriticalSectionRawMutex, KeyboardReport> = Signal::new();

/// Raised by the security handler when a bond completes.
static NEW_BOND: Signal<CriticalSectionRawMutex, MasterId> = Signal::new();

/// Maximum size of the stored GATT system attributes (CCCD state).
const SYS_ATTRS_SIZE: usize = 62;

/// Delay before advertising again after a failure.
const ADVERTISE_RETRY: Duration = Duration::from_secs(1);

pub fn link_state() -> LinkState {
    LinkState {
        advertising: ADVERTISING.load(Ordering::Relaxed),
        connected: CONNECTED.load(Ordering::Relaxed),
    }
}

/// Hand `report` to the BLE task.  Dropped while nobody is connected.
pub fn send_report(report: KeyboardReport) {
    if CONNECTED.load(Ordering::Relaxed) {
        REPORT.signal(report);
    }
}

struct PeerBond {
    master_id: MasterId,
    key: EncryptionInfo,
    peer_id: IdentityKey,
    sys_attrs: Vec<u8, SYS_ATTRS_SIZE>,
}

/// Bond store for the session, plus the passkey of the pairing in progress.
struct Bonder {
    peers: RefCell<Vec<PeerBond, MAX_BONDED_HOSTS>>,
    passkey: Cell<Option<u32>>,
}

impl Bonder {
    fn new() -> Self {
        Self {
            peers: RefCell::new(Vec::new()),
            passkey: Cell::new(None),
        }
    }

    fn take_passkey(&self) -> Option<u32> {
        self.passkey.take()
    }

    fn forget(&self, master_id: MasterId) {
        self.peers.borrow_mut().retain(|p| p.master_id != master_id);
    }
}

impl SecurityHandler for Bonder {
    fn io_capabilities(&self) -> IoCapabilities {
        IoCapabilities::DisplayYesNo
    }

    fn can_bond(&self, _conn: &Connection) -> bool {
        true
    }

    fn display_passkey(&self, passkey: &[u8; 6]) {
        let passkey = passkey_from_ascii(passkey);
        info!("pairing passkey {}", passkey);
        self.passkey.set(Some(passkey));
        let _ = ui_task::try_send(UiMessage::DisplayPasskeyRequested(passkey));
    }

    fn on_bonded(
        &self,
        _conn: &Connection,
        master_id: MasterId,
        key: EncryptionInfo,
        peer_id: IdentityKey,
    ) {
        let mut peers = self.peers.borrow_mut();
        if let Some(existing) = peers.iter_mut().find(|p| p.master_id == master_id) {
            existing.key = key;
            existing.peer_id = peer_id;
        } else {
            if peers.is_full() {
                peers.remove(0);
            }
            let _ = peers.push(PeerBond {
                master_id,
                key,
                peer_id,
                sys_attrs: Vec::new(),
            });
        }
        NEW_BOND.signal(master_id);
    }

    fn get_key(&self, _conn: &Connection, master_id: MasterId) -> Option<EncryptionInfo> {
        self.peers
            .borrow()
            .iter()
            .find_map(|p| (p.master_id == master_id).then_some(p.key))
    }

    fn save_sys_attrs(&self, conn: &Connection) {
        let addr = conn.peer_address();
        let mut peers = self.peers.borrow_mut();
        let Some(peer) = peers.iter_mut().find(|p| p.peer_id.is_match(addr)) else {
            return;
        };
        if peer.sys_attrs.resize(SYS_ATTRS_SIZE, 0).is_err() {
            return;
        }
        match gatt_server::get_sys_attrs(conn, &mut peer.sys_attrs) {
            Ok(len) => peer.sys_attrs.truncate(len),
            Err(e) => {
                warn!("sys attrs not saved: {:?}", defmt::Debug2Format(&e));
                peer.sys_attrs.clear();
            }
        }
    }

    fn load_sys_attrs(&self, conn: &Connection) {
        let addr = conn.peer_address();
        let peers = self.peers.borrow();
        let attrs = peers
            .iter()
            .find(|p| p.peer_id.is_match(addr))
            .map(|p| p.sys_attrs.as_slice())
            .filter(|attrs| !attrs.is_empty());
        if let Err(e) = gatt_server::set_sys_attrs(conn, attrs) {
            warn!("sys attrs not restored: {:?}", defmt::Debug2Format(&e));
        }
    }

    fn on_security_update(&self, _conn: &Connection, mode: SecurityMode) {
        info!("BLE security mode updated: {}", mode);
    }
}

fn bonder() -> &'static Bonder {
    static BONDER: StaticCell<Bonder> = StaticCell::new();
    BONDER.init(Bonder::new())
}

async fn advertise(sd: &'static Softdevice, bonder: &'static Bonder) -> Result<Connection, Error> {
    let appearance = BLE_APPEARANCE_KEYBOARD.to_le_bytes();
    let adv_data = LegacyAdvertisementBuilder::new()
        .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
        .services_16(
            ServiceList::Incomplete,
            &[ServiceUuid16::HUMAN_INTERFACE_DEVICE, ServiceUuid16::BATTERY],
        )
        .raw(AdvertisementDataType::APPEARANCE, &appearance)
        .build();
    let scan_data = LegacyAdvertisementBuilder::new()
        .full_name(BLE_DEVICE_NAME)
        .build();

    let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
        adv_data: &adv_data,
        scan_data: &scan_data,
    };
    peripheral::advertise_pairable(sd, adv, &peripheral::Config::default(), bonder)
        .await
        .map_err(|e| {
            warn!("advertising failed: {:?}", defmt::Debug2Format(&e));
            Error::Advertise
        })
}

fn set_conn_params(conn: &Connection) -> Result<(), Error> {
    conn.set_conn_params(raw::ble_gap_conn_params_t {
        min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
        max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
        slave_latency: config::BLE_SLAVE_LATENCY,
        conn_sup_timeout: config::BLE_SUP_TIMEOUT,
    })
    .map_err(|_| BleError::ConnParams.into())
}

/// Forward reports and refresh the battery level.
async fn pump_reports(sd: &Softdevice, conn: &Connection, server: &Server) {
    let mut ticker = Ticker::every(Duration::from_secs(FUEL_GAUGE_PERIOD_S));
    loop {
        match select(REPORT.wait(), ticker.next()).await {
            Either::First(report) => {
                debug!("report {}", report);
                if let Err(e) = server.hid.send_report(conn, &report) {
                    warn!("report not delivered: {}", e);
                }
            }
            Either::Second(()) => {
                let percent = power::latest().soc as u8;
                if let Err(e) = server.battery.update(sd, conn, percent) {
                    debug!("battery level not notified: {}", e);
                }
            }
        }
    }
}

/// Ask the user to confirm every bond that showed a passkey.  A rejected
/// bond is forgotten and the link dropped.
async fn confirm_bonds(conn: &Connection, bonder: &Bonder) {
    loop {
        let master_id = NEW_BOND.wait().await;
        let Some(passkey) = bonder.take_passkey() else {
            continue;
        };
        if !pairing::confirm(passkey).await {
            warn!("pairing rejected, disconnecting");
            bonder.forget(master_id);
            let _ = conn.disconnect();
            return;
        }
    }
}

/// Advertise, serve one host until it disconnects, repeat.
#[embassy_executor::task]
pub async fn ble_task(sd: &'static Softdevice, server: &'static Server) {
    let bonder = bonder();

    loop {
        ADVERTISING.store(true, Ordering::Relaxed);
        info!("advertising as \"{}\"", BLE_DEVICE_NAME);
        let conn = match advertise(sd, bonder).await {
            Ok(conn) => conn,
            Err(_) => {
                ADVERTISING.store(false, Ordering::Relaxed);
                Timer::after(ADVERTISE_RETRY).await;
                continue;
            }
        };
        ADVERTISING.store(false, Ordering::Relaxed);

        REPORT.reset();
        NEW_BOND.reset();
        CONNECTED.store(true, Ordering::Relaxed);
        info!("host connected");
        if let Err(e) = set_conn_params(&conn) {
            warn!("connection parameters: {}", e);
        }
        if let Err(e) = server.hid.reset_protocol_mode(sd) {
            warn!("protocol mode reset: {}", e);
        }

        match select3(
            gatt_server::run(&conn, server, |_| {}),
            pump_reports(sd, &conn, server),
            confirm_bonds(&conn, bonder),
        )
        .await
        {
            Either3::First(e) => info!("host disconnected: {:?}", defmt::Debug2Format(&e)),
            Either3::Second(()) => {}
            Either3::Third(()) => info!("host dropped after rejected pairing"),
        }
        CONNECTED.store(false, Ordering::Relaxed);
    }
}
