pub mod xbox360;
pub mod xbox360_wireless;
pub mod xinput;
