//! Xbox 360 wireless adapter. The adapter exposes one USB interface per
//! controller it can pair with.
pub mod driver;
pub mod event;
pub mod hid_report;
