//! Control loop: bring-up order, polling cadence and fault accounting.
//!
//! One iteration reads the sensor exactly once (through the monitor), lets
//! the monitor run any alert to completion, then sleeps for the poll
//! interval. Nothing is sampled while an alert is playing, which is what
//! keeps a long animation from being re-triggered.
//!
//! Failed iterations are tolerated up to [`MAX_CONSECUTIVE_FAULTS`] in a row;
//! the status display shows a fault message meanwhile. One more failure ends
//! the loop with that error. Status writes made by the fault policy itself
//! are best effort and never end the loop.

use crate::error::{Error, Result};
use crate::is_running;
use crate::max7219::MatrixDisplay;
use crate::monitor::{MotionMonitor, Tick, play_sequence};
use crate::status::{MSG_FAULT, MSG_MONITORING, MSG_READY, StatusDisplay};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use serde::Serialize;
use std::sync::atomic::AtomicBool;

/// Sleep between two sensor samples.
pub const POLL_INTERVAL_MS: u32 = 100;

/// How long "System Ready" stays up during startup.
pub const BOOT_HOLD_MS: u32 = 2000;

/// Failed iterations in a row the loop rides out before giving up.
pub const MAX_CONSECUTIVE_FAULTS: u32 = 5;

/// Counters reported when the loop ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub alerts: u32,
    pub faults: u32,
}

pub struct Controller<SENSOR, LED, MATRIX, STATUS, DELAY> {
    monitor: MotionMonitor<SENSOR, LED, MATRIX, STATUS>,
    delay: DELAY,
    ticks: u64,
    faults: u32,
    consecutive_faults: u32,
}

impl<SENSOR, LED, MATRIX, STATUS, DELAY> Controller<SENSOR, LED, MATRIX, STATUS, DELAY>
where
    SENSOR: InputPin,
    LED: OutputPin,
    MATRIX: MatrixDisplay,
    STATUS: StatusDisplay,
    DELAY: DelayNs,
{
    pub fn new(monitor: MotionMonitor<SENSOR, LED, MATRIX, STATUS>, delay: DELAY) -> Self {
        Self {
            monitor,
            delay,
            ticks: 0,
            faults: 0,
            consecutive_faults: 0,
        }
    }

    /// Bring up the outputs: matrix first, then the ready message, the
    /// startup splash, and finally the idle "Monitoring..." screen.
    pub fn start(&mut self) -> Result<()> {
        tracing::info!("Initializing...");
        self.monitor.set_indicator(false)?;
        self.monitor.matrix_mut().initialize()?;
        self.show(MSG_READY)?;
        self.delay.delay_ms(BOOT_HOLD_MS);

        let splash = self.monitor.variant().startup_sequence();
        play_sequence(self.monitor.matrix_mut(), &mut self.delay, splash)?;
        self.monitor.matrix_mut().clear()?;

        self.show(MSG_MONITORING)?;
        tracing::info!("Motion detector started ({:?})", self.monitor.variant());
        Ok(())
    }

    fn show(&mut self, text: &str) -> Result<()> {
        self.monitor
            .status_mut()
            .show_message(text)
            .map_err(Error::status)
    }

    fn show_best_effort(&mut self, text: &str) {
        if let Err(e) = self.show(text) {
            tracing::warn!("could not show {:?}: {}", text, e);
        }
    }

    /// One loop iteration: a single sample, then the poll interval. The
    /// sleep happens whether or not the sample succeeded.
    pub fn step(&mut self) -> Result<Tick> {
        self.ticks += 1;
        let outcome = self.monitor.poll(&mut self.delay);
        self.delay.delay_ms(POLL_INTERVAL_MS);
        outcome
    }

    /// `step()` under the fault policy.
    fn supervised_step(&mut self) -> Result<()> {
        match self.step() {
            Ok(_) => {
                if self.consecutive_faults > 0 {
                    tracing::info!("recovered after {} failed step(s)", self.consecutive_faults);
                    self.consecutive_faults = 0;
                    self.show_best_effort(MSG_MONITORING);
                }
                Ok(())
            }
            Err(e) => {
                self.faults += 1;
                self.consecutive_faults += 1;
                if self.consecutive_faults > MAX_CONSECUTIVE_FAULTS {
                    tracing::error!(
                        "giving up after {} failed steps: {}",
                        self.consecutive_faults,
                        e
                    );
                    return Err(e);
                }
                tracing::warn!(
                    "step {} failed ({}/{}): {}",
                    self.ticks,
                    self.consecutive_faults,
                    MAX_CONSECUTIVE_FAULTS,
                    e
                );
                self.show_best_effort(MSG_FAULT);
                Ok(())
            }
        }
    }

    /// Poll until `running` is cleared (e.g. by Ctrl+C).
    pub fn run(&mut self, running: &AtomicBool) -> Result<RunSummary> {
        while is_running(running) {
            self.supervised_step()?;
        }
        tracing::info!("Shutting down after {} tick(s)", self.ticks);
        Ok(self.summary())
    }

    /// Poll at most `ticks` times, stopping early if `running` is cleared.
    pub fn run_ticks(&mut self, ticks: u64, running: &AtomicBool) -> Result<RunSummary> {
        for _ in 0..ticks {
            if !is_running(running) {
                break;
            }
            self.supervised_step()?;
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.ticks,
            alerts: self.monitor.alerts(),
            faults: self.faults,
        }
    }

    pub fn monitor(&self) -> &MotionMonitor<SENSOR, LED, MATRIX, STATUS> {
        &self.monitor
    }

    pub fn release(self) -> (MotionMonitor<SENSOR, LED, MATRIX, STATUS>, DELAY) {
        (self.monitor, self.delay)
    }
}
