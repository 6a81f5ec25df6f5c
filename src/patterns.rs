//! Pattern library and animation step tables for the 8x8 matrix.
//!
//! A [`Pattern`] is eight bytes, one per row, with bit 7 as the leftmost LED.
//! Animations are immutable `&'static [Step]` tables: the monitor walks them
//! in order, showing each pattern for its dwell time.
//!
//! ## Rust concepts
//! - `const` data tables instead of mutable globals
//! - Newtypes: `Pattern([u8; 8])` makes the 8-row invariant a type property
//! - `TryFrom` for fallible conversions

use crate::error::Error;
use std::fmt;

/// Number of rows (and row registers) on one matrix.
pub const ROWS: usize = 8;

// ── Pattern ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pattern([u8; ROWS]);

impl Pattern {
    pub const fn new(rows: [u8; ROWS]) -> Self {
        Self(rows)
    }

    pub fn rows(&self) -> &[u8; ROWS] {
        &self.0
    }

    /// Row `index` (0 = top), or `None` past the last row.
    pub fn row(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    /// Whether the LED at (`row`, `col`) is lit. Column 0 is the most
    /// significant bit.
    pub fn is_lit(&self, row: usize, col: usize) -> bool {
        row < ROWS && col < 8 && self.0[row] & (0x80 >> col) != 0
    }

    pub fn lit_count(&self) -> u32 {
        self.0.iter().map(|row| row.count_ones()).sum()
    }

    // ── Library ─────────────────────────────────────────────────────

    pub const BLANK: Pattern = Pattern([0x00; ROWS]);

    pub const SMILEY: Pattern = Pattern([
        0b00111100, //   ****
        0b01000010, //  *    *
        0b10100101, // * *  * *
        0b10000001, // *      *
        0b10100101, // * *  * *
        0b10011001, // *  **  *
        0b01000010, //  *    *
        0b00111100, //   ****
    ]);

    /// Thick warning border.
    pub const ALERT: Pattern = Pattern([
        0b11111111, 0b11111111, 0b11000011, 0b11000011, 0b11000011, 0b11000011, 0b11111111,
        0b11111111,
    ]);

    pub const EXCLAMATION: Pattern = Pattern([
        0b00011000, 0b00011000, 0b00011000, 0b00011000, 0b00011000, 0b00000000, 0b00011000,
        0b00011000,
    ]);
}

impl Default for Pattern {
    fn default() -> Self {
        Self::BLANK
    }
}

impl From<[u8; ROWS]> for Pattern {
    fn from(rows: [u8; ROWS]) -> Self {
        Self(rows)
    }
}

impl TryFrom<&[u8]> for Pattern {
    type Error = Error;

    fn try_from(rows: &[u8]) -> Result<Self, Error> {
        let rows: [u8; ROWS] = rows
            .try_into()
            .map_err(|_| Error::PatternLength(rows.len()))?;
        Ok(Self(rows))
    }
}

/// Renders the pattern as eight lines of `*` and `.`, handy in logs.
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.0.iter().enumerate() {
            for col in 0..8 {
                let lit = row & (0x80 >> col) != 0;
                f.write_str(if lit { "*" } else { "." })?;
            }
            if i + 1 < ROWS {
                f.write_str("\n")?;
            }
        }
        Ok(())
    }
}

// ── Animation steps ─────────────────────────────────────────────────

/// One frame of an animation: a pattern held for a fixed dwell time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub pattern: Pattern,
    pub dwell_ms: u32,
}

impl Step {
    pub const fn new(pattern: Pattern, dwell_ms: u32) -> Self {
        Self { pattern, dwell_ms }
    }
}

/// Warning border and exclamation flashing twice, then a smiley.
pub const ALERT_SEQUENCE: [Step; 5] = [
    Step::new(Pattern::ALERT, 500),
    Step::new(Pattern::EXCLAMATION, 500),
    Step::new(Pattern::ALERT, 500),
    Step::new(Pattern::EXCLAMATION, 500),
    Step::new(Pattern::SMILEY, 2000),
];

/// Single hold used when no matrix is attached.
pub const HOLD_SEQUENCE: [Step; 1] = [Step::new(Pattern::BLANK, 2000)];

/// Splash shown once the matrix is initialized.
pub const STARTUP_SEQUENCE: [Step; 1] = [Step::new(Pattern::SMILEY, 2000)];

/// Sum of the dwell times of `steps`.
pub fn total_dwell_ms(steps: &[Step]) -> u32 {
    steps.iter().map(|s| s.dwell_ms).sum()
}
