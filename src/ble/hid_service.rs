//! GATT services of the keyboard: HID over GATT, Battery, Device Information.

use core::cell::Cell;

use defmt::{debug, info};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, WriteOp};
use nrf_softdevice::ble::{Connection, SecurityMode, Uuid};
use nrf_softdevice::Softdevice;

use crate::error::{BleError, Error};
use crate::hid::keyboard::{KEYBOARD_REPORT_DESCRIPTOR, KEYBOARD_REPORT_SIZE};
use crate::hid::{KeyboardReport, ProtocolMode};

const DEVICE_INFORMATION: Uuid = Uuid::new_16(0x180a);
const PNP_ID: Uuid = Uuid::new_16(0x2a50);

const BATTERY_SERVICE: Uuid = Uuid::new_16(0x180f);
const BATTERY_LEVEL: Uuid = Uuid::new_16(0x2a19);

const HID_SERVICE: Uuid = Uuid::new_16(0x1812);
const HID_INFO: Uuid = Uuid::new_16(0x2a4a);
const REPORT_MAP: Uuid = Uuid::new_16(0x2a4b);
const HID_CONTROL_POINT: Uuid = Uuid::new_16(0x2a4c);
const HID_REPORT: Uuid = Uuid::new_16(0x2a4d);
const PROTOCOL_MODE: Uuid = Uuid::new_16(0x2a4e);
const BOOT_KEYBOARD_INPUT: Uuid = Uuid::new_16(0x2a22);
const BOOT_KEYBOARD_OUTPUT: Uuid = Uuid::new_16(0x2a32);
const REPORT_REFERENCE: Uuid = Uuid::new_16(0x2908);

/// bcdHID 1.11, country code 0, flags: remote wake + normally connectable.
const HID_INFO_VALUE: [u8; 4] = [0x11, 0x01, 0x00, 0x03];

/// Report reference descriptors: (report ID, type).  The map carries no
/// report IDs, so both use ID 0.
const INPUT_REPORT_REF: [u8; 2] = [0x00, 0x01];
const OUTPUT_REPORT_REF: [u8; 2] = [0x00, 0x02];

/// PnP ID: USB-IF vendor source, vendor 0x1209 (pid.codes), product, version.
const PNP_ID_VALUE: [u8; 7] = [0x02, 0x09, 0x12, 0x01, 0x00, 0x01, 0x00];

fn cccd_enables_notify(data: &[u8]) -> bool {
    data.first().is_some_and(|flags| flags & 0x01 != 0)
}

pub struct DeviceInformationService;

impl DeviceInformationService {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut service = ServiceBuilder::new(sd, DEVICE_INFORMATION)?;
        service
            .add_characteristic(
                PNP_ID,
                Attribute::new(PNP_ID_VALUE),
                Metadata::new(Properties::new().read()),
            )?
            .build();
        service.build();
        Ok(Self)
    }
}

pub struct BatteryService {
    level: u16,
    level_cccd: u16,
}

impl BatteryService {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut service = ServiceBuilder::new(sd, BATTERY_SERVICE)?;
        let level = service
            .add_characteristic(
                BATTERY_LEVEL,
                Attribute::new([0u8]),
                Metadata::new(Properties::new().read().notify()),
            )?
            .build();
        service.build();

        Ok(Self {
            level: level.value_handle,
            level_cccd: level.cccd_handle,
        })
    }

    /// Publish the battery level (%).  The notification fails while the
    /// host is not subscribed.
    pub fn update(&self, sd: &Softdevice, conn: &Connection, percent: u8) -> Result<(), Error> {
        gatt_server::set_value(sd, self.level, &[percent]).map_err(|_| BleError::SetValue)?;
        gatt_server::notify_value(conn, self.level, &[percent]).map_err(|_| Error::Notify)
    }

    fn on_write(&self, handle: u16, data: &[u8]) {
        if handle == self.level_cccd {
            info!("battery notifications: {}", cccd_enables_notify(data));
        }
    }
}

pub struct HidService {
    input_report: u16,
    output_report: u16,
    boot_input: u16,
    boot_output: u16,
    protocol_mode: u16,
    control_point: u16,
    mode: Cell<ProtocolMode>,
}

impl HidService {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut service = ServiceBuilder::new(sd, HID_SERVICE)?;

        service
            .add_characteristic(
                HID_INFO,
                Attribute::new(HID_INFO_VALUE).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read()),
            )?
            .build();

        service
            .add_characteristic(
                REPORT_MAP,
                Attribute::new(KEYBOARD_REPORT_DESCRIPTOR).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read()),
            )?
            .build();

        let control_point = service
            .add_characteristic(
                HID_CONTROL_POINT,
                Attribute::new([0u8]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().write_without_response()),
            )?
            .build();

        let protocol_mode = service
            .add_characteristic(
                PROTOCOL_MODE,
                Attribute::new([ProtocolMode::Report.as_byte()]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read().write_without_response()),
            )?
            .build();

        let mut input = service.add_characteristic(
            HID_REPORT,
            Attribute::new([0u8; KEYBOARD_REPORT_SIZE]).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read().notify()),
        )?;
        input.add_descriptor(
            REPORT_REFERENCE,
            Attribute::new(INPUT_REPORT_REF).security(SecurityMode::JustWorks),
        )?;
        let input_report = input.build();

        let mut output = service.add_characteristic(
            HID_REPORT,
            Attribute::new([0u8]).security(SecurityMode::JustWorks),
            Metadata::new(Properties::new().read().write().write_without_response()),
        )?;
        output.add_descriptor(
            REPORT_REFERENCE,
            Attribute::new(OUTPUT_REPORT_REF).security(SecurityMode::JustWorks),
        )?;
        let output_report = output.build();

        let boot_input = service
            .add_characteristic(
                BOOT_KEYBOARD_INPUT,
                Attribute::new([0u8; KEYBOARD_REPORT_SIZE]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read().notify()),
            )?
            .build();

        let boot_output = service
            .add_characteristic(
                BOOT_KEYBOARD_OUTPUT,
                Attribute::new([0u8]).security(SecurityMode::JustWorks),
                Metadata::new(Properties::new().read().write().write_without_response()),
            )?
            .build();

        service.build();

        Ok(Self {
            input_report: input_report.value_handle,
            output_report: output_report.value_handle,
            boot_input: boot_input.value_handle,
            boot_output: boot_output.value_handle,
            protocol_mode: protocol_mode.value_handle,
            control_point: control_point.value_handle,
            mode: Cell::new(ProtocolMode::Report),
        })
    }

    /// Back to report mode for a new host.
    pub fn reset_protocol_mode(&self, sd: &Softdevice) -> Result<(), Error> {
        self.mode.set(ProtocolMode::Report);
        gatt_server::set_value(sd, self.protocol_mode, &[ProtocolMode::Report.as_byte()])
            .map_err(|_| BleError::SetValue.into())
    }

    /// Notify `report` on the input characteristic of the active protocol.
    pub fn send_report(&self, conn: &Connection, report: &KeyboardReport) -> Result<(), Error> {
        let handle = match self.mode.get() {
            ProtocolMode::Boot => self.boot_input,
            ProtocolMode::Report => self.input_report,
        };
        gatt_server::notify_value(conn, handle, &report.to_bytes()).map_err(|_| Error::Notify)
    }

    fn on_write(&self, handle: u16, data: &[u8]) {
        let Some(&value) = data.first() else {
            return;
        };
        if handle == self.protocol_mode {
            match ProtocolMode::from_byte(value) {
                Some(mode) => {
                    info!("HID protocol mode: {}", mode);
                    self.mode.set(mode);
                }
                None => debug!("ignored protocol mode {}", value),
            }
        } else if handle == self.control_point {
            debug!("HID control point: {}", value);
        } else if handle == self.output_report || handle == self.boot_output {
            debug!("host LEDs: {:#04x}", value);
        }
    }
}

/// The keyboard's GATT server.
pub struct Server {
    _dis: DeviceInformationService,
    pub battery: BatteryService,
    pub hid: HidService,
}

impl Server {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        Ok(Self {
            _dis: DeviceInformationService::new(sd)?,
            battery: BatteryService::new(sd)?,
            hid: HidService::new(sd)?,
        })
    }
}

impl gatt_server::Server for Server {
    type Event = ();

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        self.hid.on_write(handle, data);
        self.battery.on_write(handle, data);
        None
    }
}
