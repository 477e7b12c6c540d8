//! Data model shared by all XInput-style controllers
pub mod capability;
pub mod gamepad;
pub mod output;
