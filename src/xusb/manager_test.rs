use std::{
    error::Error,
    sync::{Arc, Mutex},
};

use crate::{
    config::Config,
    drivers::xinput::{
        capability::XBOX360_WIRED,
        gamepad::{self, GamepadState},
        output::{LedStatus, Vibration},
    },
    input::{
        source::TransportError,
        target::debug::{DebugBackend, DebugRecord},
    },
    xusb::{
        command::XusbCommand, queue::DispatchQueue, slot::SlotTable, Xusb, XusbDevice,
        XusbDriver, XusbError, MAX_CONTROLLERS,
    },
};

const NAME: &str = "Xbox 360 Wired Controller";

#[derive(Debug, Default)]
struct RecordingDriver {
    leds: Mutex<Vec<LedStatus>>,
    vibrations: Mutex<Vec<Vibration>>,
}

impl XusbDriver for RecordingDriver {
    fn set_led(&self, status: LedStatus) -> Result<(), TransportError> {
        self.leds.lock().unwrap().push(status);
        Ok(())
    }

    fn set_vibration(&self, vibration: Vibration) -> Result<(), TransportError> {
        self.vibrations.lock().unwrap().push(vibration);
        Ok(())
    }
}

fn setup(config: &Config) -> (Xusb, DebugBackend) {
    let backend = DebugBackend::new();
    let xusb = Xusb::new(Arc::new(backend.clone()), config);
    (xusb, backend)
}

fn device() -> XusbDevice {
    XusbDevice::from_capabilities(&XBOX360_WIRED)
}

#[tokio::test]
async fn test_register_sets_player_led() -> Result<(), Box<dyn Error>> {
    let (xusb, backend) = setup(&Config::default());
    let driver = Arc::new(RecordingDriver::default());

    let first = xusb.register_device(driver.clone(), device())?;
    let second = xusb.register_device(driver.clone(), device())?;
    xusb.flush().await?;

    assert_eq!((first.index, second.index), (0, 1));
    assert_eq!(
        backend.records(),
        vec![
            DebugRecord::Created(NAME.to_string()),
            DebugRecord::Created(NAME.to_string())
        ]
    );
    assert_eq!(
        *driver.leds.lock().unwrap(),
        vec![LedStatus::On1, LedStatus::On2]
    );

    xusb.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_task_ordering() -> Result<(), Box<dyn Error>> {
    let (xusb, backend) = setup(&Config::default());
    let driver = Arc::new(RecordingDriver::default());

    let handle = xusb.register_device(driver, device())?;
    for trigger in 1..=3 {
        let state = GamepadState {
            trigger_l: trigger,
            ..Default::default()
        };
        xusb.report_input(handle, &state)?;
    }
    xusb.unregister_device(handle)?;
    xusb.flush().await?;

    let records = backend.records();
    assert_eq!(records.len(), 5);
    assert_eq!(records[0], DebugRecord::Created(NAME.to_string()));
    for (i, record) in records[1..4].iter().enumerate() {
        let DebugRecord::Emitted(_, events) = record else {
            panic!("Expected emitted events, got {record:?}");
        };
        let trigger = i as i32 + 1;
        assert!(events.contains(&crate::input::target::VirtualEvent::Axis(
            evdev::AbsoluteAxisCode::ABS_Z,
            trigger
        )));
    }
    assert_eq!(records[4], DebugRecord::Destroyed(NAME.to_string()));
    assert_eq!(xusb.slots().occupied(), 0);

    xusb.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_limit_reached() -> Result<(), Box<dyn Error>> {
    let (xusb, _backend) = setup(&Config::default());
    let driver = Arc::new(RecordingDriver::default());

    let mut handles = Vec::new();
    for _ in 0..MAX_CONTROLLERS {
        handles.push(xusb.register_device(driver.clone(), device())?);
    }
    let result = xusb.register_device(driver.clone(), device());
    assert!(matches!(result, Err(XusbError::LimitReached)));
    assert_eq!(xusb.slots().occupied(), MAX_CONTROLLERS);

    // Freeing a slot lets the same connect succeed
    xusb.unregister_device(handles[1])?;
    let handle = xusb.register_device(driver, device())?;
    assert_eq!(handle.index, 1);
    assert_ne!(handle, handles[1]);
    xusb.flush().await?;

    xusb.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_register_failure_releases_slot() -> Result<(), Box<dyn Error>> {
    let (xusb, backend) = setup(&Config::default());
    let driver = Arc::new(RecordingDriver::default());
    backend.set_fail_create(true);

    let handle = xusb.register_device(driver.clone(), device())?;
    xusb.flush().await?;

    assert_eq!(xusb.slots().occupied(), 0);
    assert!(backend.records().is_empty());
    assert!(driver.leds.lock().unwrap().is_empty());
    let result = xusb.report_input(handle, &GamepadState::default());
    assert!(matches!(result, Err(XusbError::StaleHandle(_))));

    xusb.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_stale_handle() -> Result<(), Box<dyn Error>> {
    let (xusb, backend) = setup(&Config::default());
    let driver = Arc::new(RecordingDriver::default());

    let old = xusb.register_device(driver.clone(), device())?;
    xusb.unregister_device(old)?;
    let new = xusb.register_device(driver, device())?;
    assert_eq!(old.index, new.index);

    let state = GamepadState {
        buttons: gamepad::A,
        ..Default::default()
    };
    assert!(matches!(
        xusb.report_input(old, &state),
        Err(XusbError::StaleHandle(_))
    ));
    assert!(matches!(
        xusb.unregister_device(old),
        Err(XusbError::StaleHandle(_))
    ));
    xusb.flush().await?;

    // Only the new session remains
    assert_eq!(
        backend.records(),
        vec![
            DebugRecord::Created(NAME.to_string()),
            DebugRecord::Destroyed(NAME.to_string()),
            DebugRecord::Created(NAME.to_string()),
        ]
    );
    assert!(xusb.slots().is_current(new));

    xusb.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_pending_input_limit() -> Result<(), Box<dyn Error>> {
    let config = Config {
        max_pending_inputs: 0,
        ..Default::default()
    };
    let (xusb, _backend) = setup(&config);
    let driver = Arc::new(RecordingDriver::default());

    let handle = xusb.register_device(driver, device())?;
    let result = xusb.report_input(handle, &GamepadState::default());
    assert!(matches!(result, Err(XusbError::InputDropped(_))));

    xusb.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_output_requests() -> Result<(), Box<dyn Error>> {
    let (xusb, _backend) = setup(&Config::default());
    let driver = Arc::new(RecordingDriver::default());

    let handle = xusb.register_device(driver.clone(), device())?;
    xusb.set_vibration(handle, Vibration::new(0x1234, 0xFFFF))?;
    xusb.set_led(handle, LedStatus::Rotating)?;
    xusb.flush().await?;

    assert_eq!(
        *driver.vibrations.lock().unwrap(),
        vec![Vibration::new(0x1234, 0xFFFF)]
    );
    assert_eq!(
        *driver.leds.lock().unwrap(),
        vec![LedStatus::On1, LedStatus::Rotating]
    );

    xusb.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_rumble_from_virtual_device() -> Result<(), Box<dyn Error>> {
    let (xusb, backend) = setup(&Config::default());
    let driver = Arc::new(RecordingDriver::default());

    let handle = xusb.register_device(driver.clone(), device())?;
    xusb.flush().await?;
    assert!(backend.play_rumble(0, Vibration::new(0xC000, 0x4000)));
    assert!(backend.play_rumble(0, Vibration::default()));
    xusb.flush().await?;
    assert_eq!(
        *driver.vibrations.lock().unwrap(),
        vec![Vibration::new(0xC000, 0x4000), Vibration::default()]
    );

    // Rumble played on a destroyed device no longer reaches the controller
    xusb.unregister_device(handle)?;
    xusb.flush().await?;
    assert!(backend.play_rumble(0, Vibration::new(0xFFFF, 0xFFFF)));
    xusb.flush().await?;
    assert_eq!(driver.vibrations.lock().unwrap().len(), 2);

    xusb.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_register_before_late_unregister() -> Result<(), Box<dyn Error>> {
    let backend = DebugBackend::new();
    let slots = Arc::new(SlotTable::new());
    let (queue, client) = DispatchQueue::new(0, Arc::new(backend.clone()), slots.clone(), 64);
    let task = queue.spawn();
    let driver: Arc<dyn XusbDriver> = Arc::new(RecordingDriver::default());

    let first = slots.allocate(NAME, &XBOX360_WIRED)?;
    client.enqueue(XusbCommand::Register {
        handle: first,
        device: device(),
        driver: driver.clone(),
    })?;

    // The slot is released and reused before the first session's
    // unregistration reaches the queue
    slots.release_handle(first)?;
    let second = slots.allocate(NAME, &XBOX360_WIRED)?;
    assert_eq!(second.index, first.index);
    client.enqueue(XusbCommand::Register {
        handle: second,
        device: device(),
        driver,
    })?;
    client.enqueue(XusbCommand::Unregister { handle: first })?;
    let state = GamepadState {
        buttons: gamepad::A,
        ..Default::default()
    };
    client.enqueue_input(second, state)?;
    client.flush().await?;

    let records = backend.records();
    assert_eq!(records.len(), 4);
    assert_eq!(
        records[..3],
        [
            DebugRecord::Created(NAME.to_string()),
            DebugRecord::Destroyed(NAME.to_string()),
            DebugRecord::Created(NAME.to_string()),
        ]
    );
    assert!(matches!(records[3], DebugRecord::Emitted(..)));
    assert!(slots.is_current(second));
    assert!(!slots.is_current(first));

    client.stop()?;
    task.await?;
    Ok(())
}

#[tokio::test]
async fn test_register_after_stop() -> Result<(), Box<dyn Error>> {
    let (xusb, backend) = setup(&Config::default());
    let driver = Arc::new(RecordingDriver::default());
    xusb.stop().await?;

    let result = xusb.register_device(driver, device());
    assert!(matches!(result, Err(XusbError::QueueClosed(0))));
    assert_eq!(xusb.slots().occupied(), 0);
    assert!(backend.records().is_empty());

    Ok(())
}
