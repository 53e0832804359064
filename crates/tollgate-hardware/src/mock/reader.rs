//! Mock RFID card reader.
//!
//! The reader and its [`MockCardReaderHandle`] share an mpsc channel: the
//! handle presents cards, the reader reports them one poll at a time. A
//! presented card is reported as new exactly once, like a real reader that
//! halts a tag after reading it.
//!
//! # Examples
//!
//! ```
//! use tollgate_core::Uid;
//! use tollgate_hardware::mock::MockCardReader;
//! use tollgate_hardware::traits::CardReader;
//!
//! # #[tokio::main]
//! # async fn main() -> tollgate_hardware::Result<()> {
//! let (mut reader, handle) = MockCardReader::new();
//! assert!(!reader.is_new_card_present().await?);
//!
//! handle.present_card(Uid::new(vec![0xC0, 0x5F, 0x6E, 0x1D])?).await?;
//! assert!(reader.is_new_card_present().await?);
//! assert_eq!(reader.read_uid().await?.to_string(), "C0 5F 6E 1D");
//! assert!(!reader.is_new_card_present().await?);
//! # Ok(())
//! # }
//! ```

use tokio::sync::mpsc;
use tollgate_core::Uid;

use crate::{HardwareError, Result, traits::CardReader};

/// Depth of the card event channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
enum CardEvent {
    Presented(Uid),
    Unreadable,
}

/// Mock RFID reader driven by a [`MockCardReaderHandle`].
#[derive(Debug)]
pub struct MockCardReader {
    event_rx: mpsc::Receiver<CardEvent>,

    /// Event reported by the last successful presence check, awaiting `read_uid`.
    staged: Option<CardEvent>,

    reads: u64,
}

impl MockCardReader {
    pub fn new() -> (Self, MockCardReaderHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let reader = Self {
            event_rx,
            staged: None,
            reads: 0,
        };

        (reader, MockCardReaderHandle { event_tx })
    }

    /// Number of successful UID reads so far.
    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl CardReader for MockCardReader {
    async fn is_new_card_present(&mut self) -> Result<bool> {
        if self.staged.is_some() {
            return Ok(true);
        }
        match self.event_rx.try_recv() {
            Ok(event) => {
                self.staged = Some(event);
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn read_uid(&mut self) -> Result<Uid> {
        match self.staged.take() {
            Some(CardEvent::Presented(uid)) => {
                self.reads += 1;
                Ok(uid)
            }
            Some(CardEvent::Unreadable) => Err(HardwareError::card_read(
                "card left the field before its UID was read",
            )),
            None => Err(HardwareError::card_read("no card in the field")),
        }
    }
}

/// Handle for presenting cards to a [`MockCardReader`].
#[derive(Debug, Clone)]
pub struct MockCardReaderHandle {
    event_tx: mpsc::Sender<CardEvent>,
}

impl MockCardReaderHandle {
    /// Present a card; the reader reports it on its next poll.
    pub async fn present_card(&self, uid: Uid) -> Result<()> {
        self.send(CardEvent::Presented(uid)).await
    }

    /// Present a card whose UID read will fail.
    pub async fn present_unreadable_card(&self) -> Result<()> {
        self.send(CardEvent::Unreadable).await
    }

    async fn send(&self, event: CardEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected("card reader event channel closed"))
    }
}
