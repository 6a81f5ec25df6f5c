//! Motion alert controller
//!
//! Polls a PIR motion sensor and, on every new detection, lights the
//! indicator LED, shows "MOTION!" on the status display and plays an alert
//! animation on the MAX7219 LED matrix.
//!
//! ## Modes
//! - **Hardware** (feature `hardware`): drives the Raspberry Pi pins
//! - **Replay** (`--script FILE`): runs the same controller against a
//!   recorded sensor script with logging backends, on any machine
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/motion-alert-rs --sensor-pin 15 --cs-pin 5
//! cargo run -- --script walkby.json
//! ```

use clap::Parser;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use motion_alert_rs::controller::{Controller, RunSummary};
use motion_alert_rs::max7219::{MatrixDisplay, MatrixDriver, NoMatrix};
use motion_alert_rs::monitor::{MotionMonitor, Variant};
use motion_alert_rs::sim::{
    ConsoleStatus, ScriptedSensor, SensorScript, StdDelay, TracePin, TraceSpi,
};
use motion_alert_rs::status::StatusDisplay;
use motion_alert_rs::{PinConfig, setup_signal_handler};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use tracing_subscriber::EnvFilter;

/// Motion-triggered alert controller
#[derive(Parser, Debug)]
#[command(name = "motion-alert-rs")]
#[command(about = "Motion-triggered alerts on a status display and a MAX7219 LED matrix")]
#[command(version)]
struct Args {
    /// GPIO connected to the motion sensor output
    #[arg(long, default_value_t = PinConfig::default().sensor)]
    sensor_pin: u8,

    /// GPIO driving the indicator LED
    #[arg(long, default_value_t = PinConfig::default().indicator)]
    indicator_pin: u8,

    /// GPIO used as MAX7219 chip-select
    #[arg(long, default_value_t = PinConfig::default().chip_select)]
    cs_pin: u8,

    /// SPI clock in Hz (capped at 10 MHz)
    #[arg(long, default_value_t = PinConfig::default().spi_hz)]
    spi_hz: u32,

    /// Number of cascaded MAX7219 chips
    #[arg(long, default_value_t = 1)]
    devices: usize,

    /// Run without the LED matrix (status display and indicator only)
    #[arg(long)]
    display_only: bool,

    /// Replay a recorded sensor script (JSON) instead of reading hardware
    #[arg(long)]
    script: Option<PathBuf>,

    /// When replaying, sleep for real instead of skipping the delays
    #[arg(long)]
    realtime: bool,
}

impl Args {
    fn pins(&self) -> PinConfig {
        PinConfig {
            sensor: self.sensor_pin,
            indicator: self.indicator_pin,
            chip_select: self.cs_pin,
            spi_hz: self.spi_hz,
            matrix_devices: self.devices,
            ..PinConfig::default()
        }
    }

    fn variant(&self) -> Variant {
        if self.display_only {
            Variant::DisplayOnly
        } else {
            Variant::WithMatrix
        }
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    tracing::info!("Motion alert controller v{}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(summary) => {
            match serde_json::to_string(&summary) {
                Ok(json) => tracing::info!("Summary: {}", json),
                Err(e) => tracing::warn!("could not encode summary: {}", e),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let running = setup_signal_handler()?;

    if let Some(path) = &args.script {
        return replay(args, path, &running);
    }

    run_hardware(args, &running)
}

/// Start the controller, then poll until Ctrl+C (or `ticks` steps).
fn drive<S, L, M, St, D>(
    mut controller: Controller<S, L, M, St, D>,
    ticks: Option<u64>,
    running: &AtomicBool,
) -> Result<RunSummary, Box<dyn std::error::Error>>
where
    S: InputPin,
    L: OutputPin,
    M: MatrixDisplay,
    St: StatusDisplay,
    D: DelayNs,
{
    controller.start()?;
    let summary = match ticks {
        Some(n) => controller.run_ticks(n, running)?,
        None => controller.run(running)?,
    };
    Ok(summary)
}

fn replay(
    args: &Args,
    path: &std::path::Path,
    running: &AtomicBool,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let script = SensorScript::load(path)?;
    let ticks = script.len() as u64;
    tracing::info!("Replaying {} sample(s) from {}", ticks, path.display());

    let sensor = ScriptedSensor::new(script);
    let indicator = TracePin::new("indicator");
    let delay = StdDelay::new(args.realtime);

    match args.variant() {
        Variant::WithMatrix => {
            let pins = args.pins();
            let cs = TracePin::new("cs");
            let matrix = MatrixDriver::chained(TraceSpi::default(), cs, pins.matrix_devices)?;
            let status = ConsoleStatus::default();
            let monitor =
                MotionMonitor::new(sensor, indicator, matrix, status, Variant::WithMatrix);
            drive(Controller::new(monitor, delay), Some(ticks), running)
        }
        Variant::DisplayOnly => {
            let status = ConsoleStatus::default();
            let monitor =
                MotionMonitor::new(sensor, indicator, NoMatrix, status, Variant::DisplayOnly);
            drive(Controller::new(monitor, delay), Some(ticks), running)
        }
    }
}

#[cfg(feature = "hardware")]
fn run_hardware(
    args: &Args,
    running: &AtomicBool,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    use motion_alert_rs::hardware;

    let pins = args.pins();
    match args.variant() {
        Variant::WithMatrix => drive(hardware::controller_with_matrix(pins)?, None, running),
        Variant::DisplayOnly => drive(hardware::controller_display_only(pins)?, None, running),
    }
}

#[cfg(not(feature = "hardware"))]
fn run_hardware(
    _args: &Args,
    _running: &AtomicBool,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    Err(
        "no hardware support in this build; rebuild with --features hardware or pass --script"
            .into(),
    )
}
