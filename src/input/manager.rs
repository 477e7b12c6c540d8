use std::{collections::HashMap, error::Error, sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{
    config::Config,
    drivers::{xbox360, xbox360_wireless},
    xusb::Xusb,
};

use super::{
    source::{
        client::InterfaceClient,
        usb::{self, InterfaceKind, UsbInterfaceInfo},
        xbox360::Xbox360Interface,
        xbox360_wireless::Xbox360WirelessInterface,
        InterfaceDevice, InterruptIn, PacketHandler, TransportError,
    },
    target::{new_backend, VirtualDeviceBackend},
};

/// How often the bus is scanned for added and removed interfaces
const SCAN_INTERVAL: Duration = Duration::from_secs(2);

/// An attached interface. It is kept until its task has ended, so the
/// [Manager] can always wait for its teardown.
#[derive(Debug)]
struct ManagedInterface {
    client: InterfaceClient,
    task: JoinHandle<()>,
}

/// Manages controller interfaces
///
/// The [Manager] discovers the interfaces of supported controllers, attaches
/// a handler to each one and tears them all down on shutdown.
pub struct Manager {
    config: Config,
    xusb: Arc<Xusb>,
    /// Mapping of all attached interfaces by id.
    /// E.g. {"usb:001/004:0": <ManagedInterface>}
    interfaces: HashMap<String, ManagedInterface>,
}

impl Manager {
    /// Returns a new [Manager] using the backend selected by the config
    pub fn new(config: Config) -> Manager {
        let backend = new_backend(config.backend, config.device_name_prefix.clone());
        Manager::with_backend(config, backend)
    }

    /// Returns a new [Manager] using the given virtual device backend
    pub fn with_backend(config: Config, backend: Arc<dyn VirtualDeviceBackend>) -> Manager {
        let xusb = Arc::new(Xusb::new(backend, &config));
        Manager {
            config,
            xusb,
            interfaces: HashMap::new(),
        }
    }

    /// Returns the session manager
    pub fn xusb(&self) -> Arc<Xusb> {
        self.xusb.clone()
    }

    /// Attach every supported interface and keep watching the bus until
    /// Ctrl+C is received, then tear everything down.
    pub async fn run(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut interval = tokio::time::interval(SCAN_INTERVAL);
        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    log::info!("Shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.scan() {
                        log::warn!("Unable to scan for devices: {e}");
                    }
                }
            }
        }

        self.stop().await;
        Ok(())
    }

    /// Attach interfaces that appeared and forget those that have stopped. An
    /// interface that stopped while still on the bus is attached again.
    fn scan(&mut self) -> Result<(), TransportError> {
        let found = usb::discover()?;
        self.forget_stopped();

        for info in found {
            if self.interfaces.contains_key(&info.id()) {
                continue;
            }
            log::info!("Found {info}");
            if let Err(e) = self.attach(&info) {
                log::error!("Unable to attach {info}: {e}");
            }
        }

        Ok(())
    }

    /// Open the given interface and start handling its packets
    pub fn attach(&mut self, info: &UsbInterfaceInfo) -> Result<(), TransportError> {
        let (input, output) = usb::open(info)?;
        let id = info.id();
        match info.kind {
            InterfaceKind::Xbox360 => {
                let driver = Arc::new(xbox360::driver::Driver::new(output));
                let handler =
                    Xbox360Interface::new(self.xusb.clone(), driver, self.config.teardown_led);
                self.spawn(id, input, handler);
            }
            InterfaceKind::Xbox360Wireless => {
                let driver = Arc::new(xbox360_wireless::driver::Driver::new(output));
                let handler = Xbox360WirelessInterface::new(
                    self.xusb.clone(),
                    driver,
                    self.config.presence_query_on_attach,
                    self.config.teardown_led,
                );
                self.spawn(id, input, handler);
            }
        }
        Ok(())
    }

    /// Forget every interface whose task has ended and return their ids
    pub fn forget_stopped(&mut self) -> Vec<String> {
        let stopped: Vec<String> = self
            .interfaces
            .iter()
            .filter(|(_, interface)| interface.task.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        for id in stopped.iter() {
            log::debug!("Interface removed: {id}");
            self.interfaces.remove(id);
        }
        stopped
    }

    /// Returns the ids of all interfaces that have not been forgotten yet
    pub fn interface_ids(&self) -> Vec<String> {
        self.interfaces.keys().cloned().collect()
    }

    /// Start handling the packets of an opened interface under the given id
    pub fn spawn<I, H>(&mut self, id: String, input: I, handler: H)
    where
        I: InterruptIn + 'static,
        H: PacketHandler + 'static,
    {
        let (device, client) = InterfaceDevice::new(id.as_str(), input, handler, self.xusb.clone());
        let name = id.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = device.run().await {
                log::error!("Interface {name} failed: {e}");
            }
        });
        self.interfaces.insert(id, ManagedInterface { client, task });
    }

    /// Tear down every interface, wait for all of them, including those
    /// already gone from the bus, then stop the dispatch queues
    pub async fn stop(&mut self) {
        for (id, interface) in self.interfaces.drain() {
            if !interface.client.is_closed() {
                if let Err(e) = interface.client.stop().await {
                    log::debug!("Interface {id} already stopped: {e}");
                }
            }
            if let Err(e) = interface.task.await {
                log::error!("Interface {id} task failed: {e}");
            }
        }
        if let Err(e) = self.xusb.stop().await {
            log::error!("Failed to stop dispatch queues: {e}");
        }
        log::info!("All interfaces stopped");
    }
}
