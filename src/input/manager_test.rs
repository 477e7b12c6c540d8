use std::{error::Error, sync::Arc, time::Duration};

use crate::{
    config::Config,
    drivers::{
        xbox360::driver::{encode_led, Driver},
        xinput::output::LedStatus,
    },
    input::{
        manager::Manager,
        source::{
            memory::{self, MemoryFeeder, MemoryOut},
            xbox360::Xbox360Interface,
        },
        target::debug::{DebugBackend, DebugRecord},
    },
};

const NAME: &str = "Xbox 360 Wired Controller";

/// Attach a wired controller under the given id
fn spawn_wired(manager: &mut Manager, id: &str) -> (MemoryFeeder, Arc<MemoryOut>) {
    let out = Arc::new(MemoryOut::new());
    let driver = Arc::new(Driver::new(out.clone()));
    let handler = Xbox360Interface::new(manager.xusb(), driver, true);
    let (input, feeder) = memory::channel();
    manager.spawn(id.to_string(), input, handler);
    (feeder, out)
}

#[tokio::test]
async fn test_forget_stopped() -> Result<(), Box<dyn Error>> {
    let backend = DebugBackend::new();
    let mut manager = Manager::with_backend(Config::default(), Arc::new(backend.clone()));
    let (unplugged, _) = spawn_wired(&mut manager, "usb:001/002:0");
    let (_feeder, _) = spawn_wired(&mut manager, "usb:001/003:0");

    drop(unplugged);
    let mut stopped = Vec::new();
    for _ in 0..100 {
        stopped = manager.forget_stopped();
        if !stopped.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(stopped, vec!["usb:001/002:0".to_string()]);
    assert_eq!(manager.interface_ids(), vec!["usb:001/003:0".to_string()]);

    manager.stop().await;
    assert!(manager.interface_ids().is_empty());
    assert_eq!(manager.xusb().slots().occupied(), 0);

    Ok(())
}

#[tokio::test]
async fn test_stop_waits_for_every_interface() -> Result<(), Box<dyn Error>> {
    let backend = DebugBackend::new();
    let mut manager = Manager::with_backend(Config::default(), Arc::new(backend.clone()));
    let (unplugged, unplugged_out) = spawn_wired(&mut manager, "usb:001/002:0");
    let (_feeder, out) = spawn_wired(&mut manager, "usb:001/003:0");

    // One interface is still tearing itself down when the manager stops
    drop(unplugged);
    manager.stop().await;

    let expected = vec![encode_led(LedStatus::Rotating)?.to_vec()];
    assert!(unplugged_out.sent().ends_with(&expected));
    assert!(out.sent().ends_with(&expected));

    let records = backend.records();
    let created = records
        .iter()
        .filter(|record| **record == DebugRecord::Created(NAME.to_string()))
        .count();
    let destroyed = records
        .iter()
        .filter(|record| **record == DebugRecord::Destroyed(NAME.to_string()))
        .count();
    assert_eq!((created, destroyed), (2, 2));
    assert_eq!(records.last(), Some(&DebugRecord::Destroyed(NAME.to_string())));

    Ok(())
}
