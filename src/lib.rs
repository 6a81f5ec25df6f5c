//! Motion-triggered alert controller.
//!
//! A PIR motion sensor is polled at a fixed cadence. Each low → high change
//! lights an indicator LED, puts "MOTION!" on a status display and plays a
//! short animation on an 8x8 LED matrix driven by a MAX7219.
//!
//! Layout:
//! - [`max7219`]: register map and chip-select framed SPI protocol
//! - [`patterns`]: the 8x8 bitmaps and animation step tables
//! - [`status`]: the status display seam
//! - [`monitor`]: rising-edge detection and the alert sequence
//! - [`controller`]: bring-up order, polling loop, fault policy
//! - [`sim`]: host-side backends for running without hardware
//! - `hardware` (feature `hardware`): Raspberry Pi wiring

pub mod controller;
pub mod error;
#[cfg(feature = "hardware")]
pub mod hardware;
pub mod max7219;
pub mod monitor;
pub mod patterns;
pub mod sim;
pub mod status;
#[cfg(test)]
mod test_utils;

pub use error::{Error, Result};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ── Wiring configuration ───────────────────────────────────────────

/// Which pins and bus settings the controller uses.
///
/// # Rust concept: derive macros
/// `Clone, Copy` make this cheaply copyable (it's a handful of integers).
/// Pin numbers are configuration data, passed in explicitly rather than
/// baked into the driver code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    /// GPIO the motion sensor output is wired to.
    pub sensor: u8,
    /// GPIO driving the indicator LED.
    pub indicator: u8,
    /// GPIO used as the MAX7219 chip-select (LOAD) line.
    pub chip_select: u8,
    /// SPI clock in Hz. The MAX7219 accepts up to 10 MHz.
    pub spi_hz: u32,
    /// I2C address of the status display.
    pub status_address: u8,
    /// Number of cascaded MAX7219 chips.
    pub matrix_devices: usize,
}

impl PinConfig {
    pub const MAX_SPI_HZ: u32 = 10_000_000;

    /// SPI clock actually used: never above what the chip supports.
    pub fn effective_spi_hz(&self) -> u32 {
        self.spi_hz.min(Self::MAX_SPI_HZ)
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            sensor: 15,
            indicator: 14,
            chip_select: 5,
            spi_hz: Self::MAX_SPI_HZ,
            status_address: 0x3C,
            matrix_devices: 1,
        }
    }
}

// ── Shutdown ───────────────────────────────────────────────────────

/// Install a Ctrl+C handler that clears the returned flag.
///
/// # Rust concept: Arc and AtomicBool
/// The flag is shared between the control loop and the signal handler
/// thread; `AtomicBool` needs no mutex for a single bool.
pub fn setup_signal_handler() -> std::result::Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();

    ctrlc::set_handler(move || {
        tracing::info!("Ctrl+C received, stopping after the current step");
        flag.store(false, Ordering::SeqCst);
    })?;

    Ok(running)
}

/// Whether the control loop should keep polling.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────
