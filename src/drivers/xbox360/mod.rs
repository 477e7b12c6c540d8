//! Wired Xbox 360 controller
pub mod driver;
pub mod event;
pub mod hid_report;
