use std::{error::Error, sync::Arc, time::Duration};

use evdev::{AbsoluteAxisCode, KeyCode};

use xusbd::{
    config::Config,
    drivers::{xbox360, xbox360_wireless, xinput::output::LedStatus},
    input::{
        source::{
            memory::{self, MemoryOut},
            xbox360::Xbox360Interface,
            xbox360_wireless::Xbox360WirelessInterface,
            InterfaceDevice, TransportError,
        },
        target::{
            debug::{DebugBackend, DebugRecord},
            VirtualEvent,
        },
    },
    xusb::Xusb,
};

const WIRED_NAME: &str = "Xbox 360 Wired Controller";
const WIRELESS_NAME: &str = "Xbox 360 Wireless Controller";

fn packet(prefix: &[u8]) -> Vec<u8> {
    let mut payload = vec![0; 32];
    payload[..prefix.len()].copy_from_slice(prefix);
    payload
}

fn setup() -> (Arc<Xusb>, DebugBackend, Arc<MemoryOut>) {
    let backend = DebugBackend::new();
    let xusb = Arc::new(Xusb::new(Arc::new(backend.clone()), &Config::default()));
    (xusb, backend, Arc::new(MemoryOut::new()))
}

#[tokio::test]
async fn test_wired_end_to_end() -> Result<(), Box<dyn Error>> {
    let (xusb, backend, out) = setup();
    let driver = Arc::new(xbox360::driver::Driver::new(out.clone()));
    let handler = Xbox360Interface::new(xusb.clone(), driver, true);
    let (input, feeder) = memory::channel();
    let (device, _client) = InterfaceDevice::new("wired", input, handler, xusb.clone());

    // Pressing A, then an unknown packet, then releasing everything
    feeder.send(Ok(packet(&[0x00, 0x14, 0x00, 0x10])))?;
    feeder.send(Ok(packet(&[0xDE, 0xAD])))?;
    feeder.send(Ok(packet(&[0x00, 0x14])))?;
    drop(feeder);
    device.run().await.map_err(|e| e.to_string())?;

    let records = backend.records();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0], DebugRecord::Created(WIRED_NAME.to_string()));
    let DebugRecord::Emitted(_, pressed) = &records[1] else {
        panic!("Expected emitted events, got {:?}", records[1]);
    };
    assert!(pressed.contains(&VirtualEvent::Key(KeyCode::BTN_SOUTH, true)));
    assert!(pressed.contains(&VirtualEvent::Axis(AbsoluteAxisCode::ABS_X, 0)));
    let DebugRecord::Emitted(_, released) = &records[2] else {
        panic!("Expected emitted events, got {:?}", records[2]);
    };
    assert!(released.contains(&VirtualEvent::Key(KeyCode::BTN_SOUTH, false)));
    assert_eq!(records[3], DebugRecord::Destroyed(WIRED_NAME.to_string()));

    assert_eq!(
        out.sent(),
        vec![
            xbox360::driver::encode_led(LedStatus::On1)?.to_vec(),
            xbox360::driver::encode_led(LedStatus::Rotating)?.to_vec(),
        ]
    );
    assert_eq!(xusb.slots().occupied(), 0);

    Ok(())
}

#[tokio::test]
async fn test_wireless_connect_disconnect() -> Result<(), Box<dyn Error>> {
    let (xusb, backend, out) = setup();
    let driver = Arc::new(xbox360_wireless::driver::Driver::new(out.clone()));
    let handler = Xbox360WirelessInterface::new(xusb.clone(), driver, true, true);
    let (input, feeder) = memory::channel();
    let (device, _client) = InterfaceDevice::new("wireless", input, handler, xusb.clone());

    feeder.send(Ok(packet(&[0x08, 0x80])))?;
    feeder.send(Ok(packet(&[0x00, 0x0F, 0x00])))?;
    feeder.send(Ok(packet(&[0x00, 0x01, 0x00, 0, 0, 0, 0x00, 0x20])))?;
    feeder.send(Ok(packet(&[0x08, 0x00])))?;
    feeder.send(Ok(packet(&[0x08, 0x00])))?;
    drop(feeder);
    device.run().await.map_err(|e| e.to_string())?;

    let records = backend.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0], DebugRecord::Created(WIRELESS_NAME.to_string()));
    let DebugRecord::Emitted(_, events) = &records[1] else {
        panic!("Expected emitted events, got {:?}", records[1]);
    };
    assert!(events.contains(&VirtualEvent::Key(KeyCode::BTN_EAST, true)));
    assert_eq!(records[2], DebugRecord::Destroyed(WIRELESS_NAME.to_string()));

    assert_eq!(
        out.sent(),
        vec![
            xbox360_wireless::driver::encode_presence_query()?.to_vec(),
            xbox360_wireless::driver::encode_led(LedStatus::On1)?.to_vec(),
            xbox360_wireless::driver::encode_led(LedStatus::Alternating)?.to_vec(),
        ]
    );
    assert_eq!(xusb.slots().occupied(), 0);

    Ok(())
}

#[tokio::test]
async fn test_stop_unregisters_bound_controller() -> Result<(), Box<dyn Error>> {
    let (xusb, backend, out) = setup();
    let driver = Arc::new(xbox360_wireless::driver::Driver::new(out.clone()));
    let handler = Xbox360WirelessInterface::new(xusb.clone(), driver, false, false);
    let (input, feeder) = memory::channel();
    let (device, client) = InterfaceDevice::new("wireless", input, handler, xusb.clone());

    feeder.send(Ok(packet(&[0x08, 0xC0])))?;
    let task = tokio::spawn(device.run());
    // Wait for the connect to be handled before stopping
    while xusb.slots().occupied() == 0 {
        tokio::task::yield_now().await;
    }
    client.stop().await?;
    task.await?.map_err(|e| e.to_string())?;

    assert_eq!(
        backend.records(),
        vec![
            DebugRecord::Created(WIRELESS_NAME.to_string()),
            DebugRecord::Destroyed(WIRELESS_NAME.to_string()),
        ]
    );
    assert_eq!(xusb.slots().occupied(), 0);
    // Only the player LED; no presence query and no teardown LED
    assert_eq!(out.sent().len(), 1);
    drop(feeder);

    Ok(())
}

#[tokio::test]
async fn test_transient_errors_resume() -> Result<(), Box<dyn Error>> {
    let (xusb, backend, out) = setup();
    let driver = Arc::new(xbox360::driver::Driver::new(out.clone()));
    let handler = Xbox360Interface::new(xusb.clone(), driver, false);
    let (input, feeder) = memory::channel();
    let (device, _client) = InterfaceDevice::new("wired", input, handler, xusb.clone());

    feeder.send(Err(TransportError::Transfer("stall".to_string())))?;
    feeder.send(Ok(packet(&[0x00, 0x14, 0x00, 0x10])))?;
    // Fatal errors end the receive loop; later packets are never seen
    feeder.send(Err(TransportError::EndpointGone))?;
    feeder.send(Ok(packet(&[0x00, 0x14, 0x00, 0x20])))?;
    device.run().await.map_err(|e| e.to_string())?;

    let emitted = backend
        .records()
        .iter()
        .filter(|record| matches!(record, DebugRecord::Emitted(..)))
        .count();
    assert_eq!(emitted, 1);

    Ok(())
}

#[tokio::test]
async fn test_input_ordering() -> Result<(), Box<dyn Error>> {
    let (xusb, backend, out) = setup();
    let driver = Arc::new(xbox360::driver::Driver::new(out.clone()));
    let handler = Xbox360Interface::new(xusb.clone(), driver, false);
    let (input, feeder) = memory::channel();
    let (device, _client) = InterfaceDevice::new("wired", input, handler, xusb.clone());

    for trigger in 1..=50u8 {
        feeder.send(Ok(packet(&[0x00, 0x14, 0x00, 0x00, trigger])))?;
    }
    drop(feeder);
    device.run().await.map_err(|e| e.to_string())?;

    let records = backend.records();
    assert_eq!(records.len(), 52);
    assert!(matches!(records.first(), Some(DebugRecord::Created(_))));
    assert!(matches!(records.last(), Some(DebugRecord::Destroyed(_))));
    let triggers: Vec<i32> = records[1..51]
        .iter()
        .filter_map(|record| match record {
            DebugRecord::Emitted(_, events) => events.iter().find_map(|event| match event {
                VirtualEvent::Axis(AbsoluteAxisCode::ABS_Z, value) => Some(*value),
                _ => None,
            }),
            _ => None,
        })
        .collect();
    assert_eq!(triggers, (1..=50).collect::<Vec<i32>>());

    Ok(())
}

#[tokio::test]
async fn test_teardown_write_does_not_block_runtime() -> Result<(), Box<dyn Error>> {
    let backend = DebugBackend::new();
    let xusb = Arc::new(Xusb::new(Arc::new(backend.clone()), &Config::default()));
    let (out, permits) = MemoryOut::gated();
    let out = Arc::new(out);
    let driver = Arc::new(xbox360::driver::Driver::new(out.clone()));
    let handler = Xbox360Interface::new(xusb.clone(), driver, true);
    let (input, feeder) = memory::channel();
    let (device, _client) = InterfaceDevice::new("wired", input, handler, xusb.clone());

    // The player LED is written by the dispatch queue
    permits.send(())?;
    drop(feeder);
    let task = tokio::spawn(device.run());

    // The teardown LED write waits for a permit that can only be granted
    // while the runtime keeps running other tasks
    tokio::time::sleep(Duration::from_millis(100)).await;
    permits.send(())?;
    task.await?.map_err(|e| e.to_string())?;

    assert_eq!(
        out.sent(),
        vec![
            xbox360::driver::encode_led(LedStatus::On1)?.to_vec(),
            xbox360::driver::encode_led(LedStatus::Rotating)?.to_vec(),
        ]
    );
    assert_eq!(
        backend.records(),
        vec![
            DebugRecord::Created(WIRED_NAME.to_string()),
            DebugRecord::Destroyed(WIRED_NAME.to_string()),
        ]
    );

    xusb.stop().await?;
    Ok(())
}
