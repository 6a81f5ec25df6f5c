//! Status display seam: the textual surface next to the matrix.
//!
//! The pixel display driver itself is an external collaborator; this module
//! only fixes the three operations the controller relies on plus the
//! messages it shows.

/// Shown once hardware bring-up has finished.
pub const MSG_READY: &str = "System Ready";
/// Shown for the duration of an alert.
pub const MSG_MOTION: &str = "MOTION!";
/// Shown while idle and polling.
pub const MSG_MONITORING: &str = "Monitoring...";
/// Shown after a failed control-loop step.
pub const MSG_FAULT: &str = "Fault";

pub trait StatusDisplay {
    type Error: core::fmt::Debug;

    /// Blank the off-screen buffer.
    fn clear(&mut self) -> Result<(), Self::Error>;

    /// Draw `text` with its top-left corner at (`x`, `y`).
    fn draw_text(&mut self, x: i32, y: i32, text: &str) -> Result<(), Self::Error>;

    /// Push the buffer to the panel.
    fn present(&mut self) -> Result<(), Self::Error>;

    /// Replace whatever is shown with a single line of text at the origin.
    fn show_message(&mut self, text: &str) -> Result<(), Self::Error> {
        self.clear()?;
        self.draw_text(0, 0, text)?;
        self.present()
    }
}

impl<T: StatusDisplay + ?Sized> StatusDisplay for &mut T {
    type Error = T::Error;

    fn clear(&mut self) -> Result<(), Self::Error> {
        T::clear(self)
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str) -> Result<(), Self::Error> {
        T::draw_text(self, x, y, text)
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        T::present(self)
    }
}
