use std::{error::Error, sync::Arc};

use crate::{
    drivers::{
        xbox360::{driver::Driver, event::Event},
        xinput::{capability::XBOX360_WIRED, output::LedStatus},
    },
    xusb::{SessionHandle, Xusb, XusbDevice, XusbDriver, XusbError},
};

use super::PacketHandler;

/// LED pattern shown once the controller is no longer driven
const TEARDOWN_LED: LedStatus = LedStatus::Rotating;

/// Handles the interface of a wired controller. The controller is registered
/// as soon as the interface is attached.
#[derive(Debug)]
pub struct Xbox360Interface {
    xusb: Arc<Xusb>,
    driver: Arc<Driver>,
    handle: Option<SessionHandle>,
    teardown_led: bool,
}

impl Xbox360Interface {
    pub fn new(xusb: Arc<Xusb>, driver: Arc<Driver>, teardown_led: bool) -> Self {
        Self {
            xusb,
            driver,
            handle: None,
            teardown_led,
        }
    }

    /// Returns the session of the controller, if registered
    pub fn handle(&self) -> Option<SessionHandle> {
        self.handle
    }
}

impl PacketHandler for Xbox360Interface {
    fn attach(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let device = XusbDevice::from_capabilities(&XBOX360_WIRED);
        let handle = self.xusb.register_device(self.driver.clone(), device)?;
        log::info!("Wired controller attached as {handle}");
        self.handle = Some(handle);
        Ok(())
    }

    fn handle_packet(&mut self, payload: &[u8]) {
        match crate::drivers::xbox360::driver::decode(payload) {
            Event::Input(state) => {
                let Some(handle) = self.handle else {
                    log::debug!("Dropping input, controller is not registered");
                    return;
                };
                match self.xusb.report_input(handle, &state) {
                    Ok(()) => (),
                    Err(XusbError::StaleHandle(_)) => {
                        log::warn!("Session {handle} was discarded, dropping input");
                        self.handle = None;
                    }
                    Err(e) => log::debug!("Dropping input for {handle}: {e}"),
                }
            }
            Event::Ignored(header) => log::trace!("Ignored packet {header:#06x}"),
            Event::Unknown(header) => log::debug!("Unknown packet: {header:?}"),
        }
    }

    fn detach(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(e) = self.xusb.unregister_device(handle) {
            log::debug!("Unable to unregister {handle}: {e}");
        }
    }

    fn teardown(&mut self) {
        if !self.teardown_led || !self.driver.is_attached() {
            return;
        }
        if let Err(e) = self.driver.set_led(TEARDOWN_LED) {
            log::debug!("Unable to set teardown LED: {e}");
        }
    }
}
