//! Userspace driver for wired Xbox 360 controllers and the Xbox 360 wireless
//! adapter. Controllers are exposed as virtual gamepads.
pub mod cli;
pub mod config;
pub mod drivers;
pub mod input;
pub mod xusb;
