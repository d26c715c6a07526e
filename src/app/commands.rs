//! Inbound operator input.
//!
//! The keypad scanner lives outside the crate; it hands the control loop
//! one decoded [`Key`] per poll.

/// A key on the 4×4 membrane keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// `0`–`9`.
    Digit(u8),
    /// `#`: open the setpoint editor / confirm an entry.
    Confirm,
    /// `*`: leave the session / cancel an entry.
    Cancel,
    A,
    B,
    C,
    D,
}

impl Key {
    /// Decode a keypad legend character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => c.to_digit(10).map(|d| Self::Digit(d as u8)),
            '#' => Some(Self::Confirm),
            '*' => Some(Self::Cancel),
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }
}
