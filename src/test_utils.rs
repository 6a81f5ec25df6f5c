use crate::status::StatusDisplay;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::spi::{self, ErrorType as SpiErrorType, SpiBus};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// One observable side effect, in the order the hardware would see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CsLow,
    CsHigh,
    Write(Vec<u8>),
    Flush,
    IndicatorHigh,
    IndicatorLow,
    Status(String),
    DelayMs(u32),
}

pub type Timeline = Rc<RefCell<Vec<Event>>>;

pub fn timeline() -> Timeline {
    Rc::new(RefCell::new(Vec::new()))
}

/// Bytes of every completed chip-select frame, in order.
pub fn frames(timeline: &Timeline) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut current: Option<Vec<u8>> = None;
    for event in timeline.borrow().iter() {
        match event {
            Event::CsLow => current = Some(Vec::new()),
            Event::Write(bytes) => {
                if let Some(frame) = current.as_mut() {
                    frame.extend_from_slice(bytes);
                }
            }
            Event::CsHigh => {
                if let Some(frame) = current.take() {
                    frames.push(frame);
                }
            }
            _ => {}
        }
    }
    frames
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeError;

impl digital::Error for FakeError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl spi::Error for FakeError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

// ── SPI ─────────────────────────────────────────────────────────────

pub struct FakeSpi {
    timeline: Timeline,
    /// Fail the n-th write (0-based) once it is reached.
    fail_on_write: Option<usize>,
    writes: usize,
}

impl FakeSpi {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
            fail_on_write: None,
            writes: 0,
        }
    }

    pub fn failing_at(timeline: &Timeline, write: usize) -> Self {
        Self {
            fail_on_write: Some(write),
            ..Self::new(timeline)
        }
    }
}

impl SpiErrorType for FakeSpi {
    type Error = FakeError;
}

impl SpiBus<u8> for FakeSpi {
    fn read(&mut self, _words: &mut [u8]) -> Result<(), FakeError> {
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), FakeError> {
        let index = self.writes;
        self.writes += 1;
        if self.fail_on_write == Some(index) {
            return Err(FakeError);
        }
        self.timeline.borrow_mut().push(Event::Write(words.to_vec()));
        Ok(())
    }

    fn transfer(&mut self, _read: &mut [u8], write: &[u8]) -> Result<(), FakeError> {
        self.write(write)
    }

    fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), FakeError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), FakeError> {
        self.timeline.borrow_mut().push(Event::Flush);
        Ok(())
    }
}

// ── Pins ────────────────────────────────────────────────────────────

/// Output pin that records its edges as `high` / `low` events.
pub struct FakePin {
    timeline: Timeline,
    high: Event,
    low: Event,
    failing: bool,
}

impl FakePin {
    pub fn chip_select(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
            high: Event::CsHigh,
            low: Event::CsLow,
            failing: false,
        }
    }

    pub fn indicator(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
            high: Event::IndicatorHigh,
            low: Event::IndicatorLow,
            failing: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }
}

impl PinErrorType for FakePin {
    type Error = FakeError;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), FakeError> {
        if self.failing {
            return Err(FakeError);
        }
        self.timeline.borrow_mut().push(self.low.clone());
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), FakeError> {
        if self.failing {
            return Err(FakeError);
        }
        self.timeline.borrow_mut().push(self.high.clone());
        Ok(())
    }
}

/// Input pin replaying a fixed list of samples; `None` entries fail the read.
/// Once exhausted it reads low.
pub struct FakeSensor {
    samples: VecDeque<Option<bool>>,
}

impl FakeSensor {
    pub fn new(samples: &[u8]) -> Self {
        Self {
            samples: samples.iter().map(|&s| Some(s == 1)).collect(),
        }
    }

    pub fn with_faults(samples: &[Option<bool>]) -> Self {
        Self {
            samples: samples.iter().copied().collect(),
        }
    }
}

impl PinErrorType for FakeSensor {
    type Error = FakeError;
}

impl InputPin for FakeSensor {
    fn is_high(&mut self) -> Result<bool, FakeError> {
        match self.samples.pop_front() {
            Some(Some(level)) => Ok(level),
            Some(None) => Err(FakeError),
            None => Ok(false),
        }
    }

    fn is_low(&mut self) -> Result<bool, FakeError> {
        self.is_high().map(|high| !high)
    }
}

// ── Status display and delay ────────────────────────────────────────

/// Records the text presented on each `present()`. A failed `present()`
/// records nothing.
pub struct FakeStatus {
    timeline: Timeline,
    pending: String,
    fail_on_present: Option<usize>,
    fail_always: bool,
    presents: usize,
}

impl FakeStatus {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
            pending: String::new(),
            fail_on_present: None,
            fail_always: false,
            presents: 0,
        }
    }

    /// Fail the n-th `present()` (0-based) only.
    pub fn failing_at(timeline: &Timeline, present: usize) -> Self {
        Self {
            fail_on_present: Some(present),
            ..Self::new(timeline)
        }
    }

    pub fn failing(timeline: &Timeline) -> Self {
        Self {
            fail_always: true,
            ..Self::new(timeline)
        }
    }
}

impl StatusDisplay for FakeStatus {
    type Error = FakeError;

    fn clear(&mut self) -> Result<(), FakeError> {
        self.pending.clear();
        Ok(())
    }

    fn draw_text(&mut self, _x: i32, _y: i32, text: &str) -> Result<(), FakeError> {
        self.pending.push_str(text);
        Ok(())
    }

    fn present(&mut self) -> Result<(), FakeError> {
        let index = self.presents;
        self.presents += 1;
        if self.fail_always || self.fail_on_present == Some(index) {
            return Err(FakeError);
        }
        self.timeline
            .borrow_mut()
            .push(Event::Status(self.pending.clone()));
        Ok(())
    }
}

pub struct FakeDelay {
    timeline: Timeline,
}

impl FakeDelay {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
        }
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.timeline
            .borrow_mut()
            .push(Event::DelayMs(ns / 1_000_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.timeline.borrow_mut().push(Event::DelayMs(ms));
    }
}

/// Messages presented on the status display, in order.
pub fn messages(timeline: &Timeline) -> Vec<String> {
    timeline
        .borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Status(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

/// Dwell times requested from the delay, in order.
pub fn delays(timeline: &Timeline) -> Vec<u32> {
    timeline
        .borrow()
        .iter()
        .filter_map(|e| match e {
            Event::DelayMs(ms) => Some(*ms),
            _ => None,
        })
        .collect()
}
