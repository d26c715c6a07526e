//! Non-blocking setpoint entry.
//!
//! The operator can retarget the regulator without leaving the session:
//! `#` opens the editor, up to two digits are typed, `#` confirms and `*`
//! cancels.  One key is consumed per control tick, so regulation never
//! waits on the keypad.

use heapless::String;
use log::{info, warn};

use super::commands::Key;

/// Maximum digits in an entry (°C values are two digits wide).
const ENTRY_DIGITS: usize = 2;

/// Result of feeding one key to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Entry still in progress.
    Editing,
    /// A valid setpoint was confirmed; the editor has closed.
    Confirmed(u8),
    /// The confirmed entry was empty or out of bounds; the buffer was
    /// cleared and the editor stays open.
    Rejected,
    /// The operator backed out; the editor has closed.
    Cancelled,
}

#[derive(Debug)]
pub struct SetpointEditor {
    entry: String<ENTRY_DIGITS>,
    open: bool,
    min_c: u8,
    max_c: u8,
}

impl SetpointEditor {
    pub fn new(min_c: u8, max_c: u8) -> Self {
        Self {
            entry: String::new(),
            open: false,
            min_c,
            max_c,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Digits typed so far.
    pub fn entry(&self) -> &str {
        self.entry.as_str()
    }

    /// Whether `celsius` is an acceptable setpoint.
    pub fn in_bounds(&self, celsius: u8) -> bool {
        (self.min_c..=self.max_c).contains(&celsius)
    }

    pub fn open(&mut self) {
        self.entry.clear();
        self.open = true;
    }

    /// Feed one key.  Call only while [`is_open`](Self::is_open).
    pub fn handle(&mut self, key: Key) -> EditOutcome {
        match key {
            Key::Digit(d) => {
                // A full buffer ignores further digits.
                if let Some(c) = char::from_digit(u32::from(d), 10) {
                    let _ = self.entry.push(c);
                }
                EditOutcome::Editing
            }
            Key::Confirm => match self.entry.parse::<u8>() {
                Ok(value) if self.in_bounds(value) => {
                    self.close();
                    info!("setpoint entry confirmed: {value} C");
                    EditOutcome::Confirmed(value)
                }
                _ => {
                    warn!(
                        "setpoint entry '{}' rejected (allowed {}-{} C)",
                        self.entry, self.min_c, self.max_c
                    );
                    self.entry.clear();
                    EditOutcome::Rejected
                }
            },
            Key::Cancel => {
                self.close();
                EditOutcome::Cancelled
            }
            Key::A | Key::B | Key::C | Key::D => EditOutcome::Editing,
        }
    }

    fn close(&mut self) {
        self.entry.clear();
        self.open = false;
    }
}
