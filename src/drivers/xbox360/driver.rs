use std::sync::Arc;

use packed_struct::prelude::*;

use crate::{
    drivers::xinput::output::{LedStatus, Vibration},
    input::source::{InterruptOut, TransportError},
    xusb::XusbDriver,
};

use super::{
    event::Event,
    hid_report::{InputReport, LedReport, PacketType, INPUT_REPORT_SIZE, LED_REPORT_SIZE},
};

// Hardware ID's
pub const VID: u16 = 0x045e;
pub const PID: u16 = 0x028e;
pub const INTERFACE_PROTOCOL: u8 = 1;

/// Name of the USB device
pub const DEVICE_NAME: &str = "Xbox 360 Wired Controller";

/// Size of every interrupt transfer
pub const PACKET_SIZE: usize = 32;

/// Decode one interrupt transfer payload
pub fn decode(payload: &[u8]) -> Event {
    let Some(header) = payload.get(..2) else {
        log::debug!("Payload too short for a header: {} byte(s)", payload.len());
        return Event::Unknown(None);
    };
    let header = u16::from_le_bytes([header[0], header[1]]);

    let Some(packet_type) = PacketType::from_u16(header) else {
        log::debug!("Unknown packet received. Header was {header:#06x}");
        return Event::Unknown(Some(header));
    };

    match packet_type {
        PacketType::LedStatus
        | PacketType::Unknown0302
        | PacketType::Unknown0303
        | PacketType::Attachment => {
            log::trace!("Ignoring packet {packet_type:?}");
            Event::Ignored(header)
        }
        PacketType::Input => {
            let Some(slice) = payload.get(..INPUT_REPORT_SIZE) else {
                log::debug!("Input report too short: {} byte(s)", payload.len());
                return Event::Unknown(Some(header));
            };
            match InputReport::unpack_from_slice(slice) {
                Ok(report) => {
                    log::trace!("--- Input report ---");
                    log::trace!("{report}");
                    log::trace!("---- End Report ----");
                    Event::Input(report.gamepad.into())
                }
                Err(e) => {
                    log::debug!("Failed to unpack input report: {e:?}");
                    Event::Unknown(Some(header))
                }
            }
        }
    }
}

/// Encode the LED command for the given status
pub fn encode_led(status: LedStatus) -> Result<[u8; LED_REPORT_SIZE], PackingError> {
    let report = LedReport {
        status: status.to_u8(),
        ..Default::default()
    };
    report.pack()
}

/// Output side of a wired controller. Commands are written synchronously to
/// the interrupt OUT endpoint.
#[derive(Debug)]
pub struct Driver {
    out: Arc<dyn InterruptOut>,
}

impl Driver {
    pub fn new(out: Arc<dyn InterruptOut>) -> Self {
        Self { out }
    }
}

impl XusbDriver for Driver {
    fn is_attached(&self) -> bool {
        self.out.is_attached()
    }

    fn set_led(&self, status: LedStatus) -> Result<(), TransportError> {
        let packet = encode_led(status)?;
        let written = self.out.send(&packet)?;
        log::trace!("Wrote {written} byte(s) to set LED {status:?}");
        Ok(())
    }

    // The wire format for rumble on wired controllers is not implemented.
    fn set_vibration(&self, vibration: Vibration) -> Result<(), TransportError> {
        log::info!("Setting vibration: {vibration:?}");
        Ok(())
    }
}
