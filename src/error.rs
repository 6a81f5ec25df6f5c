//! Crate-wide error type.
//!
//! Every hardware seam (sensor pin, indicator pin, chip-select pin, SPI bus,
//! status display) reports failures through [`Error`]. HAL errors are reduced
//! to their `ErrorKind` at the seam so the rest of the crate does not carry
//! one generic parameter per peripheral.
//!
//! ## Rust concepts
//! - Implementing `Display` and `std::error::Error` by hand
//! - `embedded_hal::digital::Error::kind()` / `spi::Error::kind()`

use embedded_hal::{digital, spi};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Reading the motion sensor input failed.
    Sensor(digital::ErrorKind),
    /// Driving the indicator output failed.
    Indicator(digital::ErrorKind),
    /// Driving the matrix chip-select line failed.
    ChipSelect(digital::ErrorKind),
    /// The SPI transfer to the matrix driver failed.
    Bus(spi::ErrorKind),
    /// The status display rejected an operation.
    Status(String),
    /// A pattern was built from a slice that is not exactly 8 rows long.
    PatternLength(usize),
    /// A register write addressed a chip outside the daisy chain.
    DeviceIndex { device: usize, devices: usize },
    /// A daisy chain was configured with no chips or too many.
    ChainLength(usize),
    /// A recorded sensor script could not be loaded.
    Script(String),
}

impl Error {
    pub(crate) fn sensor<E: digital::Error>(e: E) -> Self {
        Self::Sensor(e.kind())
    }

    pub(crate) fn indicator<E: digital::Error>(e: E) -> Self {
        Self::Indicator(e.kind())
    }

    pub(crate) fn chip_select<E: digital::Error>(e: E) -> Self {
        Self::ChipSelect(e.kind())
    }

    pub(crate) fn bus<E: spi::Error>(e: E) -> Self {
        Self::Bus(e.kind())
    }

    pub(crate) fn status<E: fmt::Debug>(e: E) -> Self {
        Self::Status(format!("{e:?}"))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(kind) => write!(f, "motion sensor read failed: {kind}"),
            Self::Indicator(kind) => write!(f, "indicator output failed: {kind}"),
            Self::ChipSelect(kind) => write!(f, "matrix chip-select failed: {kind}"),
            Self::Bus(kind) => write!(f, "matrix bus transaction failed: {kind}"),
            Self::Status(msg) => write!(f, "status display failed: {msg}"),
            Self::PatternLength(len) => write!(f, "pattern must have 8 rows, got {len}"),
            Self::DeviceIndex { device, devices } => {
                write!(f, "matrix device {device} is outside a chain of {devices}")
            }
            Self::ChainLength(len) => write!(f, "unsupported daisy chain length {len}"),
            Self::Script(msg) => write!(f, "invalid sensor script: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T, E = Error> = std::result::Result<T, E>;
