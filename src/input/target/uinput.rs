use std::{
    error::Error,
    io,
    os::fd::AsRawFd,
    sync::{Arc, Mutex, PoisonError},
    thread,
    time::Duration,
};

use evdev::{
    uinput::{VirtualDevice as UinputVirtualDevice, VirtualDeviceBuilder},
    AbsInfo, AttributeSet, EventSummary, EventType, FFEffectCode, InputEvent, KeyCode,
    SynchronizationCode, SynchronizationEvent, UInputCode, UinputAbsSetup,
};
use nix::fcntl::{FcntlArg, OFlag};

use super::{
    capability::{AxisSource, DeviceLayout},
    feedback::{FeedbackSink, RumbleEffects},
    BackendError, VirtualDevice, VirtualDeviceBackend, VirtualEvent,
};

/// Number of force feedback effects a device can hold
const FF_EFFECTS_MAX: u32 = 16;

/// How often the force feedback thread polls the device
const FF_POLL_RATE: Duration = Duration::from_millis(4);

/// Creates virtual gamepads through uinput
#[derive(Debug, Default)]
pub struct UinputBackend {
    name_prefix: Option<String>,
}

impl UinputBackend {
    pub fn new(name_prefix: Option<String>) -> Self {
        Self { name_prefix }
    }

    /// Returns the name of the virtual device for the given layout
    fn device_name(&self, layout: &DeviceLayout) -> String {
        match self.name_prefix.as_ref() {
            Some(prefix) => format!("{prefix} {}", layout.name),
            None => layout.name.clone(),
        }
    }
}

impl VirtualDeviceBackend for UinputBackend {
    fn create(
        &self,
        layout: &DeviceLayout,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Result<Box<dyn VirtualDevice>, BackendError> {
        let name = self.device_name(layout);
        log::debug!("Creating virtual gamepad: {name}");

        // Setup Key inputs
        let mut keys = AttributeSet::<KeyCode>::new();
        for mapping in layout.buttons.iter() {
            keys.insert(mapping.code);
        }

        let mut builder = VirtualDeviceBuilder::new()?
            .name(name.as_str())
            .with_keys(&keys)?;

        // Setup ABS inputs
        for axis in layout.axes.iter() {
            let (fuzz, flat) = match axis.source {
                AxisSource::LStickX
                | AxisSource::LStickY
                | AxisSource::RStickX
                | AxisSource::RStickY => (16, 128),
                _ => (0, 0),
            };
            let setup = AbsInfo::new(0, axis.min, axis.max, fuzz, flat, 1);
            builder = builder.with_absolute_axis(&UinputAbsSetup::new(axis.code, setup))?;
        }

        // Setup Force Feedback
        if layout.force_feedback {
            let mut ff = AttributeSet::<FFEffectCode>::new();
            ff.insert(FFEffectCode::FF_RUMBLE);
            builder = builder.with_ff(&ff)?.with_ff_effects_max(FF_EFFECTS_MAX);
        }

        let device = builder.build()?;
        log::info!("Created virtual gamepad: {name}");

        // Set the device to do non-blocking reads so the force feedback thread
        // never holds the lock while waiting
        let raw_fd = device.as_raw_fd();
        nix::fcntl::fcntl(raw_fd, FcntlArg::F_SETFL(OFlag::O_NONBLOCK)).map_err(io::Error::from)?;

        let device = Arc::new(Mutex::new(device));
        if layout.force_feedback {
            spawn_ff_thread(name.clone(), device.clone(), feedback);
        }

        Ok(Box::new(UinputDevice { name, device }))
    }
}

/// Spawns the thread that services force feedback requests of the given
/// device. The thread stops once the device is destroyed.
fn spawn_ff_thread(
    name: String,
    device: Arc<Mutex<UinputVirtualDevice>>,
    feedback: Arc<dyn FeedbackSink>,
) {
    tokio::task::spawn_blocking(move || {
        let mut effects = RumbleEffects::new();
        loop {
            // The device was destroyed if this thread holds the last reference
            if Arc::strong_count(&device) == 1 {
                log::debug!("Virtual device {name} stopped. Stopping FF handler thread.");
                break;
            }

            if let Err(e) = process_ff(&device, &mut effects, feedback.as_ref()) {
                log::warn!("Error processing FF events of {name}: {e:?}");
            }

            thread::sleep(FF_POLL_RATE);
        }
    });
}

/// Process pending force feedback events of the given device
fn process_ff(
    device: &Mutex<UinputVirtualDevice>,
    effects: &mut RumbleEffects,
    feedback: &dyn FeedbackSink,
) -> Result<(), Box<dyn Error>> {
    let events: Vec<InputEvent> = {
        let mut device = device.lock().unwrap_or_else(PoisonError::into_inner);
        let events = match device.fetch_events() {
            Ok(events) => events.collect(),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        events
    };

    for event in events {
        match event.destructure() {
            EventSummary::UInput(event, UInputCode::UI_FF_UPLOAD, ..) => {
                let mut upload = device
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .process_ff_upload(event)?;
                effects.upload(upload.effect_id(), upload.effect());
                upload.set_retval(0);
            }
            EventSummary::UInput(event, UInputCode::UI_FF_ERASE, ..) => {
                let erase = device
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .process_ff_erase(event)?;
                effects.erase(erase.effect_id() as i16);
            }
            EventSummary::ForceFeedback(_, code, value) if u32::from(code.0) < FF_EFFECTS_MAX => {
                if let Some(vibration) = effects.play(code.0 as i16, value) {
                    feedback.rumble(vibration);
                }
            }
            _ => {
                log::trace!("Unhandled event: {event:?}");
            }
        }
    }

    Ok(())
}

/// Virtual gamepad backed by a uinput device
pub struct UinputDevice {
    name: String,
    device: Arc<Mutex<UinputVirtualDevice>>,
}

impl std::fmt::Debug for UinputDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UinputDevice")
            .field("name", &self.name)
            .finish()
    }
}

impl VirtualDevice for UinputDevice {
    fn emit(&mut self, events: &[VirtualEvent]) -> Result<(), BackendError> {
        let events: Vec<InputEvent> = events
            .iter()
            .map(|event| match *event {
                VirtualEvent::Key(code, pressed) => {
                    InputEvent::new(EventType::KEY.0, code.0, pressed as i32)
                }
                VirtualEvent::Axis(code, value) => {
                    InputEvent::new(EventType::ABSOLUTE.0, code.0, value)
                }
            })
            .collect();
        let mut device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        device.emit(events.as_slice())?;
        device.emit(&[SynchronizationEvent::new(SynchronizationCode::SYN_REPORT, 0).into()])?;
        Ok(())
    }

    fn destroy(self: Box<Self>) {
        // Dropping the device removes it from the system
        log::info!("Destroying virtual gamepad: {}", self.name);
    }
}
