/// LED patterns of the ring of light around the guide button. The wire value
/// of each pattern is its ordinal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum LedStatus {
    Off = 0,
    AllBlinking,
    FlashOn1,
    FlashOn2,
    FlashOn3,
    FlashOn4,
    On1,
    On2,
    On3,
    On4,
    Rotating,
    SectionalBlinking,
    SlowSectionalBlinking,
    Alternating,
}

impl LedStatus {
    /// Returns the "player N" pattern for the given zero-based slot index.
    /// Indexes past the fourth player have no indicator and turn the LED off.
    pub fn player(index: usize) -> Self {
        match index {
            0 => LedStatus::On1,
            1 => LedStatus::On2,
            2 => LedStatus::On3,
            3 => LedStatus::On4,
            _ => LedStatus::Off,
        }
    }

    pub fn to_u8(&self) -> u8 {
        *self as u8
    }
}

/// Rumble motor magnitudes
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Vibration {
    pub left_motor: u16,
    pub right_motor: u16,
}

impl Vibration {
    pub fn new(left_motor: u16, right_motor: u16) -> Self {
        Self {
            left_motor,
            right_motor,
        }
    }
}
