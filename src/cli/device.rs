use std::error::Error;

use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

use crate::input::source::usb;

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "VID:PID")]
    ids: String,
    #[tabled(rename = "Product")]
    product: String,
}

/// List every attached interface of a supported controller
pub fn handle_devices() -> Result<(), Box<dyn Error + Send + Sync>> {
    let interfaces = usb::discover()?;
    if interfaces.is_empty() {
        println!("No supported controllers found");
        return Ok(());
    }

    let rows: Vec<InterfaceRow> = interfaces
        .iter()
        .map(|info| InterfaceRow {
            id: info.id(),
            kind: info.kind.name().to_string(),
            ids: format!("{:04x}:{:04x}", info.vendor_id(), info.product_id()),
            product: info.product().unwrap_or_default().to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::modern_rounded())
        .with(Panel::header("Controller Interfaces"));
    println!("{table}");

    Ok(())
}
