//! Mock buzzer that records tone commands.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::{Result, traits::ToneEmitter};

/// Command received by a [`MockBuzzer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneCommand {
    Play { freq_hz: u16, duration: Duration },
    Stop,
}

/// Mock buzzer.
#[derive(Debug)]
pub struct MockBuzzer {
    playing_tx: watch::Sender<Option<u16>>,
    commands_tx: mpsc::UnboundedSender<ToneCommand>,
}

impl MockBuzzer {
    pub fn new() -> (Self, MockBuzzerHandle) {
        let (playing_tx, playing_rx) = watch::channel(None);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        (
            Self {
                playing_tx,
                commands_tx,
            },
            MockBuzzerHandle {
                playing_rx,
                commands_rx,
            },
        )
    }

    fn record(&self, command: ToneCommand) {
        let _ = self.commands_tx.send(command);
    }
}

impl ToneEmitter for MockBuzzer {
    async fn play_tone(&mut self, freq_hz: u16, duration: Duration) -> Result<()> {
        self.playing_tx.send_replace(Some(freq_hz));
        self.record(ToneCommand::Play { freq_hz, duration });
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.playing_tx.send_replace(None);
        self.record(ToneCommand::Stop);
        Ok(())
    }
}

/// Observer side of a [`MockBuzzer`].
#[derive(Debug)]
pub struct MockBuzzerHandle {
    playing_rx: watch::Receiver<Option<u16>>,
    commands_rx: mpsc::UnboundedReceiver<ToneCommand>,
}

impl MockBuzzerHandle {
    /// Frequency of the tone currently sounding, if any.
    pub fn playing(&self) -> Option<u16> {
        *self.playing_rx.borrow()
    }

    /// Drain the commands received since the last call.
    pub fn take_commands(&mut self) -> Vec<ToneCommand> {
        let mut commands = Vec::new();
        while let Ok(command) = self.commands_rx.try_recv() {
            commands.push(command);
        }
        commands
    }
}
