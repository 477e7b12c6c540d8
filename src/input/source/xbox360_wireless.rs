use std::{error::Error, sync::Arc};

use crate::{
    drivers::{
        xbox360_wireless::{self, driver::Driver, event::Event},
        xinput::{capability::XBOX360_WIRELESS, gamepad::GamepadState, output::LedStatus},
    },
    xusb::{SessionHandle, Xusb, XusbDevice, XusbDriver, XusbError},
};

use super::PacketHandler;

/// LED pattern shown once the controller is no longer driven
const TEARDOWN_LED: LedStatus = LedStatus::Alternating;

/// Binding state of one adapter interface
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// No controller is connected to the interface
    Idle,
    /// A controller is connected and registered as the given session
    Bound(SessionHandle),
}

/// Handles one interface of a wireless adapter. Each interface carries at
/// most one controller, which can connect and disconnect at any time.
#[derive(Debug)]
pub struct Xbox360WirelessInterface {
    xusb: Arc<Xusb>,
    driver: Arc<Driver>,
    state: LinkState,
    presence_query: bool,
    teardown_led: bool,
}

impl Xbox360WirelessInterface {
    pub fn new(
        xusb: Arc<Xusb>,
        driver: Arc<Driver>,
        presence_query: bool,
        teardown_led: bool,
    ) -> Self {
        Self {
            xusb,
            driver,
            state: LinkState::Idle,
            presence_query,
            teardown_led,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Register a newly connected controller
    fn connect(&mut self) {
        if let LinkState::Bound(handle) = self.state {
            log::debug!("Controller already connected as {handle}");
            return;
        }
        let device = XusbDevice::from_capabilities(&XBOX360_WIRELESS);
        match self.xusb.register_device(self.driver.clone(), device) {
            Ok(handle) => {
                log::info!("Wireless controller connected as {handle}");
                self.state = LinkState::Bound(handle);
            }
            Err(e) => log::warn!("Wireless controller rejected: {e}"),
        }
    }

    /// Unregister the connected controller
    fn disconnect(&mut self) {
        let LinkState::Bound(handle) = self.state else {
            log::debug!("Disconnect received while no controller is connected");
            return;
        };
        self.state = LinkState::Idle;
        match self.xusb.unregister_device(handle) {
            Ok(()) => log::info!("Wireless controller {handle} disconnected"),
            Err(e) => log::debug!("Unable to unregister {handle}: {e}"),
        }
    }

    fn report(&mut self, state: &GamepadState) {
        let LinkState::Bound(handle) = self.state else {
            log::debug!("Dropping input, no controller is connected");
            return;
        };
        match self.xusb.report_input(handle, state) {
            Ok(()) => (),
            Err(XusbError::StaleHandle(_)) => {
                // Creating the virtual device failed and the session was
                // discarded.
                log::warn!("Session {handle} was discarded, dropping input");
                self.state = LinkState::Idle;
            }
            Err(e) => log::debug!("Dropping input for {handle}: {e}"),
        }
    }
}

impl PacketHandler for Xbox360WirelessInterface {
    fn attach(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if !self.presence_query {
            return Ok(());
        }
        // A failed query only delays discovery until the controller
        // reconnects.
        if let Err(e) = self.driver.query_presence() {
            log::warn!("Presence query failed: {e}");
        }
        Ok(())
    }

    fn handle_packet(&mut self, payload: &[u8]) {
        match xbox360_wireless::driver::decode(payload) {
            Event::Connect { attachment } => {
                if attachment {
                    log::debug!("Ignoring attachment connected with the controller");
                }
                self.connect();
            }
            Event::Disconnect => self.disconnect(),
            Event::Announce => match self.state {
                LinkState::Bound(handle) => log::trace!("Controller {handle} announced"),
                LinkState::Idle => {
                    log::debug!("Announce received without a connect packet");
                    self.connect();
                }
            },
            Event::Input(state) => self.report(&state),
            Event::Ignored(header) => log::trace!("Ignored packet {header:?}"),
            Event::Unknown(header) => log::debug!("Unknown packet: {header:?}"),
        }
    }

    fn detach(&mut self) {
        self.disconnect();
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
