//! Motion monitor: rising-edge detection and the alert sequence.
//!
//! The monitor samples the motion sensor once per tick. A low → high change
//! between two consecutive samples raises an alert, which runs to completion
//! before the method returns: indicator on, "MOTION!" on the status display,
//! the matrix animation, then everything back to idle.
//!
//! Only the previous sample is remembered, and it starts low. A sensor that
//! is already high at boot therefore has to drop once before it can alert.
//!
//! ## Rust concepts
//! - Small `Copy` state types (`EdgeDetector`, `MonitorState`)
//! - Generic structs over several hardware traits
//! - `&'static [Step]` tables chosen by an enum

use crate::error::{Error, Result};
use crate::max7219::MatrixDisplay;
use crate::patterns::{ALERT_SEQUENCE, HOLD_SEQUENCE, STARTUP_SEQUENCE, Step};
use crate::status::{MSG_MONITORING, MSG_MOTION, StatusDisplay};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

// ── Edge detection ──────────────────────────────────────────────────

/// One-sample rising-edge detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeDetector {
    last: bool,
}

impl EdgeDetector {
    /// Seeded low: a signal that is high on the first sample is not an edge.
    pub const fn new() -> Self {
        Self { last: false }
    }

    /// Record `current` and report whether it is a rising edge.
    pub fn update(&mut self, current: bool) -> bool {
        let rising = current && !self.last;
        self.last = current;
        rising
    }

    pub fn last(&self) -> bool {
        self.last
    }
}

// ── States ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MonitorState {
    #[default]
    Idle,
    /// Inside the alert sequence.
    Alerted,
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    Quiet,
    Alerted,
}

/// Which hardware the alert is played on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    /// Status display, indicator and LED matrix.
    #[default]
    WithMatrix,
    /// Status display and indicator only; the alert is a plain hold.
    DisplayOnly,
}

impl Variant {
    pub fn alert_sequence(self) -> &'static [Step] {
        match self {
            Variant::WithMatrix => &ALERT_SEQUENCE,
            Variant::DisplayOnly => &HOLD_SEQUENCE,
        }
    }

    pub fn startup_sequence(self) -> &'static [Step] {
        match self {
            Variant::WithMatrix => &STARTUP_SEQUENCE,
            Variant::DisplayOnly => &[],
        }
    }
}

/// Show each step's pattern for its dwell time. Blocks for the whole
/// sequence.
pub fn play_sequence<M, D>(matrix: &mut M, delay: &mut D, steps: &[Step]) -> Result<()>
where
    M: MatrixDisplay + ?Sized,
    D: DelayNs + ?Sized,
{
    for step in steps {
        matrix.show_pattern(&step.pattern)?;
        delay.delay_ms(step.dwell_ms);
    }
    Ok(())
}

// ── Monitor ─────────────────────────────────────────────────────────

pub struct MotionMonitor<SENSOR, LED, MATRIX, STATUS> {
    sensor: SENSOR,
    indicator: LED,
    matrix: MATRIX,
    status: STATUS,
    edge: EdgeDetector,
    state: MonitorState,
    variant: Variant,
    alerts: u32,
}

impl<SENSOR, LED, MATRIX, STATUS> MotionMonitor<SENSOR, LED, MATRIX, STATUS>
where
    SENSOR: InputPin,
    LED: OutputPin,
    MATRIX: MatrixDisplay,
    STATUS: StatusDisplay,
{
    pub fn new(
        sensor: SENSOR,
        indicator: LED,
        matrix: MATRIX,
        status: STATUS,
        variant: Variant,
    ) -> Self {
        Self {
            sensor,
            indicator,
            matrix,
            status,
            edge: EdgeDetector::new(),
            state: MonitorState::Idle,
            variant,
            alerts: 0,
        }
    }

    /// Read the sensor once and act on it.
    pub fn poll<D: DelayNs + ?Sized>(&mut self, delay: &mut D) -> Result<Tick> {
        let current = self.sensor.is_high().map_err(Error::sensor)?;
        self.tick(current, delay)
    }

    /// Feed one sample. On a rising edge the full alert sequence runs before
    /// this returns.
    pub fn tick<D: DelayNs + ?Sized>(&mut self, current: bool, delay: &mut D) -> Result<Tick> {
        if !self.edge.update(current) {
            return Ok(Tick::Quiet);
        }

        self.state = MonitorState::Alerted;
        self.alerts += 1;
        tracing::info!(alert = self.alerts, "motion detected");

        let result = self.run_alert(delay);
        if result.is_err() {
            if let Err(e) = self.indicator.set_low() {
                let e = Error::indicator(e);
                tracing::warn!("could not reset indicator after failed alert: {}", e);
            }
        }
        self.state = MonitorState::Idle;
        result.map(|()| Tick::Alerted)
    }

    fn run_alert<D: DelayNs + ?Sized>(&mut self, delay: &mut D) -> Result<()> {
        self.indicator.set_high().map_err(Error::indicator)?;
        self.status.show_message(MSG_MOTION).map_err(Error::status)?;

        play_sequence(&mut self.matrix, delay, self.variant.alert_sequence())?;

        self.indicator.set_low().map_err(Error::indicator)?;
        self.matrix.clear()?;
        self.status.show_message(MSG_MONITORING).map_err(Error::status)?;
        Ok(())
    }

    pub fn set_indicator(&mut self, on: bool) -> Result<()> {
        let result = if on {
            self.indicator.set_high()
        } else {
            self.indicator.set_low()
        };
        result.map_err(Error::indicator)
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Alerts raised since construction.
    pub fn alerts(&self) -> u32 {
        self.alerts
    }

    pub fn matrix_mut(&mut self) -> &mut MATRIX {
        &mut self.matrix
    }

    pub fn status_mut(&mut self) -> &mut STATUS {
        &mut self.status
    }

    pub fn release(self) -> (SENSOR, LED, MATRIX, STATUS) {
        (self.sensor, self.indicator, self.matrix, self.status)
    }
}
