//! # Pattern Tour
//!
//! Brings up the MAX7219 and shows each library pattern for two seconds:
//! smiley, warning border, exclamation. A quick wiring check for the matrix
//! without the motion sensor or status display.
//!
//! ## Run it
//! ```sh
//! cargo run --example pattern_tour                      # logs the SPI frames
//! cargo build --release --features hardware --example pattern_tour
//! sudo ./target/release/examples/pattern_tour           # real matrix
//! ```
//!
//! ## Rust concepts introduced
//! - Writing code generic over `embedded-hal` traits, then choosing the
//!   backend in `main`
//! - `impl Display` for a quick ASCII preview of each pattern

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use motion_alert_rs::max7219::MatrixDriver;
use motion_alert_rs::patterns::Pattern;

const TOUR: [(&str, Pattern); 3] = [
    ("smiley", Pattern::SMILEY),
    ("alert", Pattern::ALERT),
    ("exclamation", Pattern::EXCLAMATION),
];

fn tour<SPI, CS, D>(
    matrix: &mut MatrixDriver<SPI, CS>,
    delay: &mut D,
) -> Result<(), motion_alert_rs::Error>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    D: DelayNs,
{
    matrix.initialize()?;
    delay.delay_ms(2000);

    for (name, pattern) in TOUR {
        println!("Showing {name} ...\n{pattern}\n");
        matrix.show_pattern(&pattern)?;
        delay.delay_ms(2000);
    }

    matrix.clear()?;
    println!("Test complete!");
    Ok(())
}

#[cfg(not(feature = "hardware"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use motion_alert_rs::sim::{StdDelay, TracePin, TraceSpi};

    let mut matrix = MatrixDriver::new(TraceSpi::default(), TracePin::new("cs"))?;
    let mut delay = StdDelay::new(false);
    tour(&mut matrix, &mut delay)?;

    let (spi, _cs) = matrix.release();
    println!("{} bytes sent", spi.bytes_sent());
    Ok(())
}

#[cfg(feature = "hardware")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use motion_alert_rs::PinConfig;
    use motion_alert_rs::sim::StdDelay;
    use rppal::gpio::Gpio;
    use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

    let pins = PinConfig::default();
    let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, pins.effective_spi_hz(), Mode::Mode0)?;
    let cs = Gpio::new()?.get(pins.chip_select)?.into_output_high();

    let mut matrix = MatrixDriver::new(spi, cs)?;
    let mut delay = StdDelay::new(true);
    tour(&mut matrix, &mut delay)?;
    Ok(())
}
