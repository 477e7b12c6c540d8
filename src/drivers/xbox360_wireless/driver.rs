use std::sync::Arc;

use packed_struct::prelude::*;

use crate::{
    drivers::xinput::output::{LedStatus, Vibration},
    input::source::{InterruptOut, TransportError},
    xusb::XusbDriver,
};

use super::{
    event::{Event, Header},
    hid_report::{
        ControllerPacket, FrameType, InputReport, LedReport, LinkEvent, PresenceReport,
        VibrationReport, INPUT_REPORT_SIZE, LED_REPORT_SIZE, PRESENCE_REPORT_SIZE,
        VIBRATION_REPORT_SIZE,
    },
};

// Hardware ID's
pub const VID: u16 = 0x045e;
pub const PID: u16 = 0x0719;
pub const INTERFACE_PROTOCOL: u8 = 129;

/// Name of the USB device
pub const DEVICE_NAME: &str = "Xbox 360 Wireless Adapter";

/// Size of every interrupt transfer
pub const PACKET_SIZE: usize = 32;

/// Offset added to the [LedStatus] in LED commands
const LED_STATUS_OFFSET: u8 = 0x40;

/// Decode one interrupt transfer payload received on an adapter interface
pub fn decode(payload: &[u8]) -> Event {
    let Some(&frame) = payload.first() else {
        return Event::Unknown(Header::Truncated(0));
    };

    match FrameType::from_u8(frame) {
        Some(FrameType::Link) => decode_link(payload),
        Some(FrameType::Controller) => decode_controller(payload),
        None => {
            log::debug!("Unknown frame type received: {frame:#04x}");
            Event::Unknown(Header::Frame(frame))
        }
    }
}

/// Decode an event from the adapter itself
fn decode_link(payload: &[u8]) -> Event {
    let Some(&value) = payload.get(1) else {
        return Event::Unknown(Header::Truncated(payload.len()));
    };

    match LinkEvent::from_u8(value) {
        Some(LinkEvent::Disconnect) => Event::Disconnect,
        Some(LinkEvent::Connect) => Event::Connect { attachment: false },
        Some(LinkEvent::ConnectWithAttachment) => Event::Connect { attachment: true },
        Some(LinkEvent::AttachmentConnected) => {
            log::trace!("Ignoring attachment connection");
            Event::Ignored(Header::Link(value))
        }
        None => {
            log::debug!("Unknown link event received: {value:#04x}");
            Event::Unknown(Header::Link(value))
        }
    }
}

/// Decode an event from the controller bound to the interface
fn decode_controller(payload: &[u8]) -> Event {
    let Some(header) = payload.get(1..3) else {
        return Event::Unknown(Header::Truncated(payload.len()));
    };
    let header = u16::from_le_bytes([header[0], header[1]]);

    let Some(packet) = ControllerPacket::from_u16(header) else {
        log::debug!("Unknown packet received. Header was {header:#06x}");
        return Event::Unknown(Header::Controller(header));
    };

    match packet {
        ControllerPacket::Input => {
            let Some(slice) = payload.get(..INPUT_REPORT_SIZE) else {
                log::debug!("Input report too short: {} byte(s)", payload.len());
                return Event::Unknown(Header::Truncated(payload.len()));
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
                    Event::Unknown(Header::Controller(header))
                }
            }
        }
        ControllerPacket::Announce => Event::Announce,
        ControllerPacket::AttachmentSerial
        | ControllerPacket::AttachmentDescription
        | ControllerPacket::Ping
        | ControllerPacket::Pong => {
            log::trace!("Ignoring packet {packet:?}");
            Event::Ignored(Header::Controller(header))
        }
    }
}

/// Encode the LED command for the given status
pub fn encode_led(status: LedStatus) -> Result<[u8; LED_REPORT_SIZE], PackingError> {
    let report = LedReport {
        status: status.to_u8() + LED_STATUS_OFFSET,
        ..Default::default()
    };
    report.pack()
}

/// Encode the rumble command. Only the high byte of each magnitude is sent.
pub fn encode_vibration(
    vibration: Vibration,
) -> Result<[u8; VIBRATION_REPORT_SIZE], PackingError> {
    let report = VibrationReport {
        left_motor: (vibration.left_motor >> 8) as u8,
        right_motor: (vibration.right_motor >> 8) as u8,
        ..Default::default()
    };
    report.pack()
}

/// Encode the presence query. Its effects arrive later as ordinary link
/// events.
pub fn encode_presence_query() -> Result<[u8; PRESENCE_REPORT_SIZE], PackingError> {
    PresenceReport::default().pack()
}

/// Output side of one adapter interface
#[derive(Debug)]
pub struct Driver {
    out: Arc<dyn InterruptOut>,
}

impl Driver {
    pub fn new(out: Arc<dyn InterruptOut>) -> Self {
        Self { out }
    }

    /// Force the adapter to resend connection packets for a controller that
    /// connected before this interface was opened.
    pub fn query_presence(&self) -> Result<(), TransportError> {
        let packet = encode_presence_query()?;
        let written = self.out.send(&packet)?;
        log::trace!("Wrote {written} byte(s) for presence query");
        Ok(())
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

    fn set_vibration(&self, vibration: Vibration) -> Result<(), TransportError> {
        let packet = encode_vibration(vibration)?;
        let written = self.out.send(&packet)?;
        log::trace!("Wrote {written} byte(s) to set vibration {vibration:?}");
        Ok(())
    }
}
