use std::error::Error;

use crate::cli::decode::{button_names, parse_hex};

#[tokio::test]
async fn test_parse_hex() -> Result<(), Box<dyn Error>> {
    assert_eq!(parse_hex("00 14 0a FF").map_err(|e| e.to_string())?, vec![0x00, 0x14, 0x0A, 0xFF]);
    assert_eq!(parse_hex("0014,0aff").map_err(|e| e.to_string())?, vec![0x00, 0x14, 0x0A, 0xFF]);
    assert_eq!(parse_hex("0x08:0x80").map_err(|e| e.to_string())?, vec![0x08, 0x80]);
    assert!(parse_hex("").map_err(|e| e.to_string())?.is_empty());
    assert!(parse_hex("001").is_err());
    assert!(parse_hex("0x0 0x14").is_err());
    assert!(parse_hex("zz").is_err());
    assert!(parse_hex("00 1g").is_err());

    Ok(())
}

#[tokio::test]
async fn test_button_names() -> Result<(), Box<dyn Error>> {
    assert_eq!(button_names(0x1001), vec!["DPAD_UP", "A"]);
    assert!(button_names(0).is_empty());

    Ok(())
}
