//! MAX7219 8x8 LED matrix driver.
//!
//! The chip latches one 16-bit word per device each time chip-select rises:
//! the register address byte followed by the value byte. Chips can be
//! cascaded; data shifts through the chain, so a frame for `n` devices is
//! `2 * n` bytes and the first pair sent ends up in the device furthest from
//! the controller.
//!
//! Chip-select is driven by hand around every frame rather than by the SPI
//! peripheral, so the framing is visible to (and testable by) this module.
//!
//! ## Rust concepts
//! - Generic structs bounded by `embedded-hal` traits (`SpiBus`, `OutputPin`)
//! - `#[repr(u8)]` enums for wire-level constants
//! - Traits at the seam: [`MatrixDisplay`] lets the monitor run with or
//!   without a matrix attached

// https://www.analog.com/media/en/technical-documentation/data-sheets/MAX7219-MAX7221.pdf

use crate::error::{Error, Result};
use crate::patterns::{Pattern, ROWS};
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// Most cascaded devices one driver will address.
pub const MAX_CHAIN: usize = 8;

/// Brightness written by [`MatrixDriver::initialize`] (range 0x00-0x0F).
pub const DEFAULT_INTENSITY: u8 = 0x08;

/// Highest intensity the chip accepts.
pub const MAX_INTENSITY: u8 = 0x0F;

// ── Registers ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Register {
    NoOp = 0x00,
    Row0 = 0x01,
    Row1 = 0x02,
    Row2 = 0x03,
    Row3 = 0x04,
    Row4 = 0x05,
    Row5 = 0x06,
    Row6 = 0x07,
    Row7 = 0x08,
    DecodeMode = 0x09,
    Intensity = 0x0A,
    ScanLimit = 0x0B,
    Shutdown = 0x0C,
    DisplayTest = 0x0F,
}

impl Register {
    /// Row registers in increasing order; pattern row `i` goes to `ROWS[i]`.
    pub const ROWS: [Register; ROWS] = [
        Register::Row0,
        Register::Row1,
        Register::Row2,
        Register::Row3,
        Register::Row4,
        Register::Row5,
        Register::Row6,
        Register::Row7,
    ];

    /// Row register for pattern row `index` (register = index + 1).
    pub fn row(index: usize) -> Option<Register> {
        Self::ROWS.get(index).copied()
    }

    pub fn addr(self) -> u8 {
        self as u8
    }
}

impl From<Register> for u8 {
    fn from(register: Register) -> u8 {
        register.addr()
    }
}

// Register values used during bring-up.
const SHUTDOWN_ENTER: u8 = 0x00;
const SHUTDOWN_LEAVE: u8 = 0x01;
const DISPLAY_TEST_OFF: u8 = 0x00;
const DISPLAY_TEST_ON: u8 = 0x01;
const DECODE_NONE: u8 = 0x00;
const SCAN_ALL_ROWS: u8 = 0x07;

// ── Matrix seam ─────────────────────────────────────────────────────

/// What the alert sequence needs from an 8x8 matrix.
pub trait MatrixDisplay {
    /// Bring the display into a known blank state.
    fn initialize(&mut self) -> Result<()>;

    fn clear(&mut self) -> Result<()>;

    fn show_pattern(&mut self, pattern: &Pattern) -> Result<()>;
}

/// Stand-in for setups without a matrix: every operation succeeds and does
/// nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMatrix;

impl MatrixDisplay for NoMatrix {
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        Ok(())
    }

    fn show_pattern(&mut self, _pattern: &Pattern) -> Result<()> {
        Ok(())
    }
}

// ── Driver ──────────────────────────────────────────────────────────

pub struct MatrixDriver<SPI, CS> {
    spi: SPI,
    cs: CS,
    devices: usize,
}

impl<SPI, CS> MatrixDriver<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    /// Driver for a single chip. Leaves chip-select deasserted.
    pub fn new(spi: SPI, cs: CS) -> Result<Self> {
        Self::chained(spi, cs, 1)
    }

    /// Driver for `devices` cascaded chips (1..=[`MAX_CHAIN`]).
    pub fn chained(spi: SPI, mut cs: CS, devices: usize) -> Result<Self> {
        if devices == 0 || devices > MAX_CHAIN {
            return Err(Error::ChainLength(devices));
        }
        cs.set_high().map_err(Error::chip_select)?;
        Ok(Self { spi, cs, devices })
    }

    pub fn devices(&self) -> usize {
        self.devices
    }

    /// Write `value` to `register` on every chip in the chain, in a single
    /// chip-select frame. With one chip the frame is exactly two bytes.
    pub fn write_register(&mut self, register: Register, value: u8) -> Result<()> {
        let mut frame = [0u8; 2 * MAX_CHAIN];
        for pair in frame[..2 * self.devices].chunks_exact_mut(2) {
            pair[0] = register.addr();
            pair[1] = value;
        }
        self.transmit(2 * self.devices, &frame)
    }

    /// Write `value` to `register` on one chip only; the others receive
    /// no-op words. Device 0 is the chip wired to the controller.
    pub fn write_register_to(
        &mut self,
        device: usize,
        register: Register,
        value: u8,
    ) -> Result<()> {
        if device >= self.devices {
            return Err(Error::DeviceIndex {
                device,
                devices: self.devices,
            });
        }
        // The last pair shifted out stays in the nearest chip.
        let slot = self.devices - 1 - device;
        let mut frame = [0u8; 2 * MAX_CHAIN];
        frame[2 * slot] = register.addr();
        frame[2 * slot + 1] = value;
        self.transmit(2 * self.devices, &frame)
    }

    fn transmit(&mut self, len: usize, frame: &[u8]) -> Result<()> {
        let bytes = &frame[..len];
        tracing::debug!("max7219 frame {:02x?}", bytes);

        self.cs.set_low().map_err(Error::chip_select)?;
        let sent = self
            .spi
            .write(bytes)
            .and_then(|()| self.spi.flush())
            .map_err(Error::bus);
        // Release the chip even when the transfer failed, so the next frame
        // starts clean.
        let released = self.cs.set_high().map_err(Error::chip_select);
        sent.and(released)
    }

    /// Configure every chip for raw 8x8 output, then blank it.
    ///
    /// The chip stays in shutdown until test, decode, scan limit and
    /// intensity are set, so no stale register contents are ever lit.
    pub fn initialize(&mut self) -> Result<()> {
        self.write_register(Register::Shutdown, SHUTDOWN_ENTER)?;
        self.write_register(Register::DisplayTest, DISPLAY_TEST_OFF)?;
        self.write_register(Register::DecodeMode, DECODE_NONE)?;
        self.write_register(Register::ScanLimit, SCAN_ALL_ROWS)?;
        self.write_register(Register::Intensity, DEFAULT_INTENSITY)?;
        self.write_register(Register::Shutdown, SHUTDOWN_LEAVE)?;
        self.clear()?;
        tracing::info!("MAX7219 initialized ({} device(s))", self.devices);
        Ok(())
    }

    /// Turn every LED off, row register 1 through 8.
    pub fn clear(&mut self) -> Result<()> {
        for register in Register::ROWS {
            self.write_register(register, 0x00)?;
        }
        Ok(())
    }

    /// Write `pattern` to every chip, top row first.
    pub fn show_pattern(&mut self, pattern: &Pattern) -> Result<()> {
        for (register, row) in Register::ROWS.into_iter().zip(pattern.rows()) {
            self.write_register(register, *row)?;
        }
        Ok(())
    }

    pub fn show_pattern_on(&mut self, device: usize, pattern: &Pattern) -> Result<()> {
        for (register, row) in Register::ROWS.into_iter().zip(pattern.rows()) {
            self.write_register_to(device, register, *row)?;
        }
        Ok(())
    }

    /// Set brightness, clamped to 0..=15.
    pub fn set_intensity(&mut self, level: u8) -> Result<()> {
        self.write_register(Register::Intensity, level.min(MAX_INTENSITY))
    }

    pub fn set_shutdown(&mut self, shutdown: bool) -> Result<()> {
        let value = if shutdown { SHUTDOWN_ENTER } else { SHUTDOWN_LEAVE };
        self.write_register(Register::Shutdown, value)
    }

    /// Light every LED regardless of row data (hardware self-test).
    pub fn set_display_test(&mut self, on: bool) -> Result<()> {
        let value = if on { DISPLAY_TEST_ON } else { DISPLAY_TEST_OFF };
        self.write_register(Register::DisplayTest, value)
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS> MatrixDisplay for MatrixDriver<SPI, CS>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    fn initialize(&mut self) -> Result<()> {
        MatrixDriver::initialize(self)
    }

    fn clear(&mut self) -> Result<()> {
        MatrixDriver::clear(self)
    }

    fn show_pattern(&mut self, pattern: &Pattern) -> Result<()> {
        MatrixDriver::show_pattern(self, pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Event, FakePin, FakeSpi, frames, timeline};
    use embedded_hal::spi;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn driver(tl: &crate::test_utils::Timeline) -> MatrixDriver<FakeSpi, FakePin> {
        MatrixDriver::new(FakeSpi::new(tl), FakePin::chip_select(tl)).unwrap()
    }

    #[test]
    fn new_starts_deselected() {
        let tl = timeline();
        let _driver = driver(&tl);
        assert_eq!(*tl.borrow(), vec![Event::CsHigh]);
    }

    #[test]
    fn write_register_frames_two_bytes_in_one_select() {
        let tl = timeline();
        let mut driver = driver(&tl);
        tl.borrow_mut().clear();

        driver.write_register(Register::Shutdown, 0x01).unwrap();

        assert_eq!(
            *tl.borrow(),
            vec![
                Event::CsLow,
                Event::Write(vec![0x0C, 0x01]),
                Event::Flush,
                Event::CsHigh,
            ]
        );
    }

    #[rstest]
    #[case(Register::NoOp, 0x00)]
    #[case(Register::Row0, 0x01)]
    #[case(Register::Row7, 0x08)]
    #[case(Register::DecodeMode, 0x09)]
    #[case(Register::Intensity, 0x0A)]
    #[case(Register::ScanLimit, 0x0B)]
    #[case(Register::Shutdown, 0x0C)]
    #[case(Register::DisplayTest, 0x0F)]
    fn register_addresses(#[case] register: Register, #[case] addr: u8) {
        assert_eq!(register.addr(), addr);
        assert_eq!(u8::from(register), addr);
    }

    #[test]
    fn row_register_is_index_plus_one() {
        for index in 0..8 {
            assert_eq!(Register::row(index).map(Register::addr), Some(index as u8 + 1));
        }
        assert_eq!(Register::row(8), None);
    }

    #[test]
    fn initialize_leaves_shutdown_last_then_clears() {
        let tl = timeline();
        let mut driver = driver(&tl);
        tl.borrow_mut().clear();

        driver.initialize().unwrap();

        let mut expected = vec![
            vec![0x0C, 0x00],
            vec![0x0F, 0x00],
            vec![0x09, 0x00],
            vec![0x0B, 0x07],
            vec![0x0A, 0x08],
            vec![0x0C, 0x01],
        ];
        expected.extend((1..=8).map(|row| vec![row, 0x00]));
        assert_eq!(frames(&tl), expected);
    }

    #[test]
    fn clear_then_show_pattern_overwrites_every_row() {
        let tl = timeline();
        let mut driver = driver(&tl);
        driver.show_pattern(&Pattern::ALERT).unwrap();
        tl.borrow_mut().clear();

        driver.clear().unwrap();
        driver.show_pattern(&Pattern::SMILEY).unwrap();

        let frames = frames(&tl);
        assert_eq!(frames.len(), 16);
        let shown: Vec<Vec<u8>> = frames[8..].to_vec();
        let expected: Vec<Vec<u8>> = Pattern::SMILEY
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| vec![i as u8 + 1, *row])
            .collect();
        assert_eq!(shown, expected);
        assert!(frames[..8].iter().all(|f| f[1] == 0x00));
    }

    #[test]
    fn show_pattern_is_repeatable() {
        let tl = timeline();
        let mut driver = driver(&tl);
        tl.borrow_mut().clear();

        driver.show_pattern(&Pattern::EXCLAMATION).unwrap();
        let first = frames(&tl);
        tl.borrow_mut().clear();
        driver.clear().unwrap();
        tl.borrow_mut().clear();
        driver.show_pattern(&Pattern::EXCLAMATION).unwrap();

        assert_eq!(frames(&tl), first);
    }

    #[test]
    fn bus_failure_is_reported_and_releases_chip_select() {
        let tl = timeline();
        let mut driver =
            MatrixDriver::new(FakeSpi::failing_at(&tl, 0), FakePin::chip_select(&tl)).unwrap();
        tl.borrow_mut().clear();

        let err = driver.write_register(Register::Intensity, 0x03).unwrap_err();

        assert_eq!(err, Error::Bus(spi::ErrorKind::Other));
        assert_eq!(*tl.borrow(), vec![Event::CsLow, Event::CsHigh]);
    }

    #[test]
    fn failure_mid_pattern_stops_the_write() {
        let tl = timeline();
        let mut driver =
            MatrixDriver::new(FakeSpi::failing_at(&tl, 3), FakePin::chip_select(&tl)).unwrap();

        assert!(driver.show_pattern(&Pattern::SMILEY).is_err());
        assert_eq!(frames(&tl).len(), 4);
        assert_eq!(frames(&tl)[3], Vec::<u8>::new());
    }

    #[test]
    fn chip_select_failure_is_reported() {
        let tl = timeline();
        let result = MatrixDriver::new(FakeSpi::new(&tl), FakePin::chip_select(&tl).failing());
        assert!(matches!(result, Err(Error::ChipSelect(_))));
    }

    #[rstest]
    #[case(0)]
    #[case(9)]
    fn chained_rejects_bad_length(#[case] devices: usize) {
        let tl = timeline();
        let result = MatrixDriver::chained(FakeSpi::new(&tl), FakePin::chip_select(&tl), devices);
        assert!(matches!(result, Err(Error::ChainLength(n)) if n == devices));
    }

    #[test]
    fn chained_broadcast_repeats_pair_per_device() {
        let tl = timeline();
        let mut driver =
            MatrixDriver::chained(FakeSpi::new(&tl), FakePin::chip_select(&tl), 3).unwrap();
        tl.borrow_mut().clear();

        driver.write_register(Register::ScanLimit, 0x07).unwrap();

        assert_eq!(frames(&tl), vec![vec![0x0B, 0x07, 0x0B, 0x07, 0x0B, 0x07]]);
    }

    #[rstest]
    #[case(0, vec![0x00, 0x00, 0x00, 0x00, 0x03, 0x55])]
    #[case(1, vec![0x00, 0x00, 0x03, 0x55, 0x00, 0x00])]
    #[case(2, vec![0x03, 0x55, 0x00, 0x00, 0x00, 0x00])]
    fn addressed_write_pads_with_noops(#[case] device: usize, #[case] expected: Vec<u8>) {
        let tl = timeline();
        let mut driver =
            MatrixDriver::chained(FakeSpi::new(&tl), FakePin::chip_select(&tl), 3).unwrap();
        tl.borrow_mut().clear();

        driver.write_register_to(device, Register::Row2, 0x55).unwrap();

        assert_eq!(frames(&tl), vec![expected]);
    }

    #[test]
    fn addressed_write_outside_chain_sends_nothing() {
        let tl = timeline();
        let mut driver =
            MatrixDriver::chained(FakeSpi::new(&tl), FakePin::chip_select(&tl), 2).unwrap();
        tl.borrow_mut().clear();

        let err = driver.show_pattern_on(2, &Pattern::SMILEY).unwrap_err();

        assert_eq!(
            err,
            Error::DeviceIndex {
                device: 2,
                devices: 2
            }
        );
        assert!(tl.borrow().is_empty());
    }

    #[rstest]
    #[case(0x00, 0x00)]
    #[case(0x08, 0x08)]
    #[case(0x0F, 0x0F)]
    #[case(0x20, 0x0F)]
    fn set_intensity_clamps(#[case] level: u8, #[case] written: u8) {
        let tl = timeline();
        let mut driver = driver(&tl);
        tl.borrow_mut().clear();

        driver.set_intensity(level).unwrap();

        assert_eq!(frames(&tl), vec![vec![0x0A, written]]);
    }

    #[test]
    fn shutdown_and_display_test_toggle() {
        let tl = timeline();
        let mut driver = driver(&tl);
        tl.borrow_mut().clear();

        driver.set_display_test(true).unwrap();
        driver.set_display_test(false).unwrap();
        driver.set_shutdown(true).unwrap();
        driver.set_shutdown(false).unwrap();

        assert_eq!(
            frames(&tl),
            vec![
                vec![0x0F, 0x01],
                vec![0x0F, 0x00],
                vec![0x0C, 0x00],
                vec![0x0C, 0x01],
            ]
        );
    }

    #[test]
    fn no_matrix_accepts_everything() {
        let mut matrix = NoMatrix;
        assert!(matrix.initialize().is_ok());
        assert!(matrix.show_pattern(&Pattern::ALERT).is_ok());
        assert!(matrix.clear().is_ok());
    }
}
