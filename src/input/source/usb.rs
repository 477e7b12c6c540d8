//! USB transport backed by nusb
use std::{
    fmt::Display,
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use nusb::{
    transfer::{Direction, EndpointType, Queue, RequestBuffer, TransferError},
    DeviceInfo, Interface,
};

use crate::drivers::{xbox360, xbox360_wireless};

use super::{InterruptIn, InterruptOut, TransportError};

/// Number of IN transfers kept in flight
const TRANSFERS_IN_FLIGHT: usize = 2;

/// Kind of controller interface
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InterfaceKind {
    Xbox360,
    Xbox360Wireless,
}

impl InterfaceKind {
    /// Returns the name of the USB device
    pub fn name(&self) -> &'static str {
        match self {
            InterfaceKind::Xbox360 => xbox360::driver::DEVICE_NAME,
            InterfaceKind::Xbox360Wireless => xbox360_wireless::driver::DEVICE_NAME,
        }
    }

    /// Returns the size of every interrupt transfer
    pub fn packet_size(&self) -> usize {
        match self {
            InterfaceKind::Xbox360 => xbox360::driver::PACKET_SIZE,
            InterfaceKind::Xbox360Wireless => xbox360_wireless::driver::PACKET_SIZE,
        }
    }
}

/// Identifies the interfaces of a supported device
#[derive(Debug, Copy, Clone)]
pub struct DeviceMatch {
    pub vendor_id: u16,
    pub product_id: u16,
    pub protocol: u8,
    pub kind: InterfaceKind,
}

/// Supported devices
pub const DEVICE_TABLE: &[DeviceMatch] = &[
    DeviceMatch {
        vendor_id: xbox360::driver::VID,
        product_id: xbox360::driver::PID,
        protocol: xbox360::driver::INTERFACE_PROTOCOL,
        kind: InterfaceKind::Xbox360,
    },
    DeviceMatch {
        vendor_id: xbox360_wireless::driver::VID,
        product_id: xbox360_wireless::driver::PID,
        protocol: xbox360_wireless::driver::INTERFACE_PROTOCOL,
        kind: InterfaceKind::Xbox360Wireless,
    },
];

/// Returns the kind of interface matching the given ids, if supported
pub fn match_interface(vendor_id: u16, product_id: u16, protocol: u8) -> Option<InterfaceKind> {
    DEVICE_TABLE
        .iter()
        .find(|entry| {
            entry.vendor_id == vendor_id
                && entry.product_id == product_id
                && entry.protocol == protocol
        })
        .map(|entry| entry.kind)
}

/// A supported interface found on the bus
#[derive(Debug, Clone)]
pub struct UsbInterfaceInfo {
    pub kind: InterfaceKind,
    pub interface_number: u8,
    device: DeviceInfo,
}

impl UsbInterfaceInfo {
    pub fn vendor_id(&self) -> u16 {
        self.device.vendor_id()
    }

    pub fn product_id(&self) -> u16 {
        self.device.product_id()
    }

    pub fn bus_number(&self) -> u8 {
        self.device.bus_number()
    }

    pub fn device_address(&self) -> u8 {
        self.device.device_address()
    }

    pub fn product(&self) -> Option<&str> {
        self.device.product_string()
    }

    /// Returns a stable identifier for the interface
    pub fn id(&self) -> String {
        format!(
            "usb:{:03}/{:03}:{}",
            self.bus_number(),
            self.device_address(),
            self.interface_number
        )
    }
}

impl Display for UsbInterfaceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{:04x}:{:04x}] {}",
            self.kind.name(),
            self.vendor_id(),
            self.product_id(),
            self.id()
        )
    }
}

/// Returns every supported interface currently on the bus
pub fn discover() -> Result<Vec<UsbInterfaceInfo>, TransportError> {
    let mut found = Vec::new();
    for device in nusb::list_devices()? {
        for interface in device.interfaces() {
            let Some(kind) =
                match_interface(device.vendor_id(), device.product_id(), interface.protocol())
            else {
                continue;
            };
            log::trace!(
                "Found {} interface {}",
                kind.name(),
                interface.interface_number()
            );
            found.push(UsbInterfaceInfo {
                kind,
                interface_number: interface.interface_number(),
                device: device.clone(),
            });
        }
    }
    Ok(found)
}

/// Claim the given interface and open its interrupt pipes
pub fn open(info: &UsbInterfaceInfo) -> Result<(UsbIn, Arc<UsbOut>), TransportError> {
    let device = info.device.open()?;
    let interface = device.claim_interface(info.interface_number)?;
    let (endpoint_in, endpoint_out) = find_endpoints(&interface)?;
    log::debug!(
        "Opened {}: IN {endpoint_in:#04x}, OUT {endpoint_out:#04x}",
        info.id()
    );

    let attached = Arc::new(AtomicBool::new(true));
    let packet_size = info.kind.packet_size();
    let mut queue = interface.interrupt_in_queue(endpoint_in);
    for _ in 0..TRANSFERS_IN_FLIGHT {
        queue.submit(RequestBuffer::new(packet_size));
    }

    let input = UsbIn {
        queue,
        packet_size,
        attached: attached.clone(),
    };
    let output = UsbOut {
        interface,
        endpoint: endpoint_out,
        attached,
    };
    Ok((input, Arc::new(output)))
}

/// Returns the addresses of the interrupt IN and OUT endpoints of the
/// interface's active alternate setting
fn find_endpoints(interface: &Interface) -> Result<(u8, u8), TransportError> {
    let Some(setting) = interface.descriptors().next() else {
        return Err(TransportError::NotFound);
    };
    let find = |direction: Direction| {
        setting
            .endpoints()
            .find(|endpoint| {
                endpoint.transfer_type() == EndpointType::Interrupt
                    && endpoint.direction() == direction
            })
            .map(|endpoint| endpoint.address())
    };
    let endpoint_in = find(Direction::In).ok_or(TransportError::NotFound)?;
    let endpoint_out = find(Direction::Out).ok_or(TransportError::NotFound)?;
    Ok((endpoint_in, endpoint_out))
}

/// Classify a failed transfer, noting when the device went away
fn transfer_error(error: TransferError, attached: &AtomicBool) -> TransportError {
    match error {
        TransferError::Cancelled => TransportError::Reset,
        TransferError::Disconnected => {
            attached.store(false, Ordering::Release);
            TransportError::EndpointGone
        }
        e => TransportError::Transfer(e.to_string()),
    }
}

/// Interrupt IN pipe
pub struct UsbIn {
    queue: Queue<RequestBuffer>,
    packet_size: usize,
    attached: Arc<AtomicBool>,
}

impl InterruptIn for UsbIn {
    fn receive(&mut self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send {
        async move {
            if self.queue.pending() == 0 {
                return Err(TransportError::Shutdown);
            }
            let completion = self.queue.next_complete().await;
            let result = match completion.status {
                Ok(()) => Ok(completion.data),
                Err(e) => Err(transfer_error(e, &self.attached)),
            };

            // Resubmit unless the pipe is going away
            let fatal = matches!(&result, Err(e) if e.is_fatal());
            if !fatal {
                self.queue.submit(RequestBuffer::new(self.packet_size));
            }
            result
        }
    }

    fn cancel(&mut self) {
        self.queue.cancel_all();
    }
}

/// Interrupt OUT pipe
pub struct UsbOut {
    interface: Interface,
    endpoint: u8,
    attached: Arc<AtomicBool>,
}

impl std::fmt::Debug for UsbOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbOut")
            .field("endpoint", &self.endpoint)
            .field("attached", &self.attached)
            .finish()
    }
}

impl InterruptOut for UsbOut {
    fn send(&self, data: &[u8]) -> Result<usize, TransportError> {
        if !self.is_attached() {
            return Err(TransportError::EndpointGone);
        }
        let transfer = self.interface.interrupt_out(self.endpoint, data.to_vec());
        let completion = futures::executor::block_on(transfer);
        match completion.into_result() {
            Ok(response) => Ok(response.actual_length()),
            Err(e) => Err(transfer_error(e, &self.attached)),
        }
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}
