//! Raspberry Pi wiring: GPIO pins, SPI for the MAX7219 and an SSD1306 OLED
//! on I2C as the status display.
//!
//! Only compiled with the `hardware` feature, so the rest of the crate (and
//! its tests) builds on any host.
//!
//! ## Rust concepts
//! - `Box<dyn std::error::Error>` at the hardware boundary, where several
//!   unrelated error types meet
//! - Type aliases for long generic types

use crate::PinConfig;
use crate::controller::Controller;
use crate::error::Error;
use crate::max7219::{MatrixDisplay, MatrixDriver, NoMatrix};
use crate::monitor::{MotionMonitor, Variant};
use crate::sim::StdDelay;
use crate::status::StatusDisplay;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use rppal::i2c::I2c;
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

type Oled = Ssd1306<I2CInterface<I2c>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

pub type HardwareMatrix = MatrixDriver<Spi, OutputPin>;

pub type HardwareController<M> = Controller<InputPin, OutputPin, M, OledStatus, StdDelay>;

// ── Status display ─────────────────────────────────────────────────

/// 128x64 SSD1306 OLED drawing text in a 6x10 font.
pub struct OledStatus {
    display: Oled,
    style: MonoTextStyle<'static, BinaryColor>,
}

impl OledStatus {
    pub fn new(i2c: I2c, address: u8) -> Result<Self, Error> {
        let interface = I2CDisplayInterface::new_custom_address(i2c, address);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display.init().map_err(Error::status)?;

        Ok(Self {
            display,
            style: MonoTextStyle::new(&FONT_6X10, BinaryColor::On),
        })
    }
}

impl StatusDisplay for OledStatus {
    type Error = <Oled as DrawTarget>::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.display.clear_buffer();
        Ok(())
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str) -> Result<(), Self::Error> {
        Text::with_baseline(text, Point::new(x, y), self.style, Baseline::Top)
            .draw(&mut self.display)?;
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.display.flush()
    }
}

// ── Construction ───────────────────────────────────────────────────

fn build<M: MatrixDisplay>(
    gpio: &Gpio,
    pins: PinConfig,
    matrix: M,
    variant: Variant,
) -> Result<HardwareController<M>, Box<dyn std::error::Error>> {
    let sensor = gpio.get(pins.sensor)?.into_input();
    let indicator = gpio.get(pins.indicator)?.into_output_low();
    let status = OledStatus::new(I2c::new()?, pins.status_address)?;

    tracing::info!(
        "GPIO: sensor={} indicator={} | OLED at {:#04x}",
        pins.sensor,
        pins.indicator,
        pins.status_address
    );

    let monitor = MotionMonitor::new(sensor, indicator, matrix, status, variant);
    Ok(Controller::new(monitor, StdDelay::new(true)))
}

/// Controller with the MAX7219 matrix on SPI0 and a GPIO chip-select.
pub fn controller_with_matrix(
    pins: PinConfig,
) -> Result<HardwareController<HardwareMatrix>, Box<dyn std::error::Error>> {
    let gpio = Gpio::new()?;
    let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, pins.effective_spi_hz(), Mode::Mode0)?;
    let cs = gpio.get(pins.chip_select)?.into_output_high();
    let matrix = MatrixDriver::chained(spi, cs, pins.matrix_devices)?;

    tracing::info!(
        "SPI0 @ {} Hz, chip-select GPIO {}, {} device(s)",
        pins.effective_spi_hz(),
        pins.chip_select,
        pins.matrix_devices
    );
    build(&gpio, pins, matrix, Variant::WithMatrix)
}

/// Controller for the status display and indicator only.
pub fn controller_display_only(
    pins: PinConfig,
) -> Result<HardwareController<NoMatrix>, Box<dyn std::error::Error>> {
    let gpio = Gpio::new()?;
    build(&gpio, pins, NoMatrix, Variant::DisplayOnly)
}
