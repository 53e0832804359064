//! Virtual 16x2 character LCD.
//!
//! Mirrors an HD44780-style module behind an I2C backpack: two rows of sixteen
//! ASCII cells. Text is written from column 0, control characters are
//! stripped and anything past the last column is cut off.
//!
//! Every call to [`show_lines`](StatusDisplay::show_lines) produces one
//! [`LcdFrame`]. The paired [`VirtualLcdHandle`] sees the current frame and
//! the full list of frames shown so far.
//!
//! # Examples
//!
//! ```
//! use tollgate_hardware::mock::VirtualLcd;
//! use tollgate_hardware::traits::StatusDisplay;
//!
//! # #[tokio::main]
//! # async fn main() -> tollgate_hardware::Result<()> {
//! let (mut lcd, mut handle) = VirtualLcd::new();
//! lcd.show_lines("Access Granted", "Gate Opening...").await?;
//!
//! assert_eq!(handle.current().text(0), "Access Granted");
//! assert_eq!(handle.current().line(0), "Access Granted  ");
//! assert_eq!(handle.take_frames().len(), 1);
//! # Ok(())
//! # }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tollgate_core::constants::{LCD_COLUMNS, LCD_ROWS};

use crate::{Result, traits::StatusDisplay};

/// Snapshot of both LCD rows, each padded to the full width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcdFrame {
    lines: [String; LCD_ROWS],
}

impl LcdFrame {
    /// A frame with every cell blank.
    pub fn blank() -> Self {
        Self {
            lines: std::array::from_fn(|_| " ".repeat(LCD_COLUMNS)),
        }
    }

    /// Row content including trailing padding.
    ///
    /// # Panics
    ///
    /// Panics if `row` is not 0 or 1.
    pub fn line(&self, row: usize) -> &str {
        &self.lines[row]
    }

    /// Row content without trailing padding.
    pub fn text(&self, row: usize) -> &str {
        self.lines[row].trim_end()
    }

    /// Returns `true` if the frame shows exactly `line0` / `line1`, ignoring padding.
    pub fn shows(&self, line0: &str, line1: &str) -> bool {
        self.text(0) == line0.trim_end() && self.text(1) == line1.trim_end()
    }
}

impl Default for LcdFrame {
    fn default() -> Self {
        Self::blank()
    }
}

impl fmt::Display for LcdFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = "-".repeat(LCD_COLUMNS);
        writeln!(f, "+{border}+")?;
        for line in &self.lines {
            writeln!(f, "|{line}|")?;
        }
        write!(f, "+{border}+")
    }
}

/// Virtual LCD device.
#[derive(Debug)]
pub struct VirtualLcd {
    frame: LcdFrame,
    current_tx: watch::Sender<LcdFrame>,
    frames_tx: mpsc::UnboundedSender<LcdFrame>,
}

impl VirtualLcd {
    pub fn new() -> (Self, VirtualLcdHandle) {
        let (current_tx, current_rx) = watch::channel(LcdFrame::blank());
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();

        let lcd = Self {
            frame: LcdFrame::blank(),
            current_tx,
            frames_tx,
        };
        let handle = VirtualLcdHandle {
            current_rx,
            frames_rx,
        };

        (lcd, handle)
    }

    /// Current frame as held by the device.
    pub fn frame(&self) -> &LcdFrame {
        &self.frame
    }

    fn publish(&self) {
        // Receivers may be gone when the handle was dropped; the device keeps working.
        let _ = self.frames_tx.send(self.frame.clone());
        self.current_tx.send_replace(self.frame.clone());
    }
}

impl StatusDisplay for VirtualLcd {
    async fn show_lines(&mut self, line0: &str, line1: &str) -> Result<()> {
        self.frame.lines = [render_row(line0), render_row(line1)];
        self.publish();
        Ok(())
    }
}

/// Observer side of a [`VirtualLcd`].
#[derive(Debug)]
pub struct VirtualLcdHandle {
    current_rx: watch::Receiver<LcdFrame>,
    frames_rx: mpsc::UnboundedReceiver<LcdFrame>,
}

impl VirtualLcdHandle {
    /// Frame currently on screen.
    pub fn current(&self) -> LcdFrame {
        self.current_rx.borrow().clone()
    }

    /// Drain every frame shown since the last call.
    pub fn take_frames(&mut self) -> Vec<LcdFrame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.frames_rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Wait until the screen changes. Returns `None` once the LCD is dropped.
    pub async fn changed(&mut self) -> Option<LcdFrame> {
        self.current_rx.changed().await.ok()?;
        Some(self.current_rx.borrow_and_update().clone())
    }
}

/// Render `text` as one full row: unprintable characters dropped, cut at
/// the last column and padded with blanks. Leading spaces are kept since the
/// module writes text verbatim from column 0.
fn render_row(text: &str) -> String {
    let mut row: String = text
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .take(LCD_COLUMNS)
        .collect();
    let padding = LCD_COLUMNS - row.len();
    row.extend(std::iter::repeat_n(' ', padding));
    row
}
