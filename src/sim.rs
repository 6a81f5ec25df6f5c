//! Host-side stand-ins for every hardware seam.
//!
//! These let the real controller, monitor and MAX7219 protocol run on a
//! development machine: the sensor replays a recorded script, the SPI bus
//! and pins log what they would have driven, and the status display prints
//! its message.
//!
//! ## Rust concepts
//! - Implementing `embedded-hal` traits with `Infallible` errors
//! - `serde::Deserialize` for loading a JSON file

use crate::error::{Error, Result};
use crate::status::StatusDisplay;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::spi::{ErrorType as SpiErrorType, SpiBus};
use serde::Deserialize;
use std::convert::Infallible;
use std::fs;
use std::path::Path;
use std::time::Duration;

// ── Sensor script ───────────────────────────────────────────────────

/// Recorded sensor samples, one per control-loop tick.
///
/// On disk this is JSON: `{"samples": [0, 0, 1, 1, 0, 1]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SensorScript {
    pub samples: Vec<u8>,
}

impl SensorScript {
    pub fn from_json(text: &str) -> Result<Self> {
        let script: SensorScript =
            serde_json::from_str(text).map_err(|e| Error::Script(e.to_string()))?;
        if let Some((index, value)) = script.samples.iter().enumerate().find(|(_, v)| **v > 1) {
            return Err(Error::Script(format!(
                "sample {index} is {value}, expected 0 or 1"
            )));
        }
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Script(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Input pin replaying a [`SensorScript`]; reads low once the script runs out.
pub struct ScriptedSensor {
    samples: std::vec::IntoIter<u8>,
}

impl ScriptedSensor {
    pub fn new(script: SensorScript) -> Self {
        Self {
            samples: script.samples.into_iter(),
        }
    }
}

impl PinErrorType for ScriptedSensor {
    type Error = Infallible;
}

impl InputPin for ScriptedSensor {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.samples.next() == Some(1))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

// ── Bus and pins ────────────────────────────────────────────────────

/// SPI bus that logs every byte it is asked to send.
#[derive(Debug, Default)]
pub struct TraceSpi {
    bytes_sent: usize,
}

impl TraceSpi {
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }
}

impl SpiErrorType for TraceSpi {
    type Error = Infallible;
}

impl SpiBus<u8> for TraceSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
        self.bytes_sent += words.len();
        tracing::trace!("spi write {:02x?}", words);
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
        read.fill(0);
        self.write(write)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
        self.write(words)?;
        words.fill(0);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

/// Output pin that logs its level changes under a name.
#[derive(Debug)]
pub struct TracePin {
    name: &'static str,
    high: bool,
}

impl TracePin {
    pub fn new(name: &'static str) -> Self {
        Self { name, high: false }
    }

    pub fn is_set_high(&self) -> bool {
        self.high
    }
}

impl PinErrorType for TracePin {
    type Error = Infallible;
}

impl OutputPin for TracePin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        tracing::trace!("{} low", self.name);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        tracing::trace!("{} high", self.name);
        Ok(())
    }
}

// ── Status display ──────────────────────────────────────────────────

/// Status display that logs each presented screen.
#[derive(Debug, Default)]
pub struct ConsoleStatus {
    lines: Vec<String>,
    shown: Option<String>,
}

impl ConsoleStatus {
    /// Text of the last presented screen.
    pub fn shown(&self) -> Option<&str> {
        self.shown.as_deref()
    }
}

impl StatusDisplay for ConsoleStatus {
    type Error = Infallible;

    fn clear(&mut self) -> Result<(), Infallible> {
        self.lines.clear();
        Ok(())
    }

    fn draw_text(&mut self, _x: i32, _y: i32, text: &str) -> Result<(), Infallible> {
        self.lines.push(text.to_string());
        Ok(())
    }

    fn present(&mut self) -> Result<(), Infallible> {
        let screen = self.lines.join(" | ");
        tracing::info!("[status] {}", screen);
        self.shown = Some(screen);
        Ok(())
    }
}

// ── Delay ───────────────────────────────────────────────────────────

/// Blocking delay backed by `std::thread::sleep`. With `realtime` off it
/// only adds up the requested time, so a long script replays instantly.
#[derive(Debug, Default)]
pub struct StdDelay {
    realtime: bool,
    elapsed: Duration,
}

impl StdDelay {
    pub fn new(realtime: bool) -> Self {
        Self {
            realtime,
            elapsed: Duration::ZERO,
        }
    }

    /// Total time requested so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        let duration = Duration::from_nanos(ns.into());
        self.elapsed += duration;
        if self.realtime {
            std::thread::sleep(duration);
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        let duration = Duration::from_millis(ms.into());
        self.elapsed += duration;
        if self.realtime {
            std::thread::sleep(duration);
        }
    }
}
