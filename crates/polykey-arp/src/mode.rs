//! Arpeggiator play modes.

use serde::{Deserialize, Serialize};

/// Order in which the unfolded pattern is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ArpMode {
    #[default]
    Off = 0,
    /// Lowest to highest, then wrap
    Up = 1,
    /// Highest to lowest, then wrap
    Down = 2,
    /// Ping-pong without repeating the end notes
    UpDown = 3,
    /// Independent random pick every step
    Random = 4,
}

impl ArpMode {
    pub const ALL: [ArpMode; 5] = [
        ArpMode::Off,
        ArpMode::Up,
        ArpMode::Down,
        ArpMode::UpDown,
        ArpMode::Random,
    ];

    pub fn from_u8(val: u8) -> Self {
        match val {
            1 => ArpMode::Up,
            2 => ArpMode::Down,
            3 => ArpMode::UpDown,
            4 => ArpMode::Random,
            _ => ArpMode::Off,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArpMode::Off => "Off",
            ArpMode::Up => "Up",
            ArpMode::Down => "Down",
            ArpMode::UpDown => "Up/Down",
            ArpMode::Random => "Random",
        }
    }

    pub fn is_on(&self) -> bool {
        *self != ArpMode::Off
    }

    /// Next mode in panel order, wrapping back to Off.
    pub fn next(&self) -> ArpMode {
        Self::from_u8((*self as u8 + 1) % Self::ALL.len() as u8)
    }

    pub fn prev(&self) -> ArpMode {
        let len = Self::ALL.len() as u8;
        Self::from_u8((*self as u8 + len - 1) % len)
    }
}
