//! Mock gate servo that records every angle it is driven to.

use tokio::sync::{mpsc, watch};
use tollgate_core::GatePosition;

use crate::{Result, traits::GateActuator};

/// Mock gate servo. Starts Closed.
#[derive(Debug)]
pub struct MockServo {
    position_tx: watch::Sender<GatePosition>,
    moves_tx: mpsc::UnboundedSender<GatePosition>,
}

impl MockServo {
    pub fn new() -> (Self, MockServoHandle) {
        let (position_tx, position_rx) = watch::channel(GatePosition::Closed);
        let (moves_tx, moves_rx) = mpsc::unbounded_channel();

        (
            Self {
                position_tx,
                moves_tx,
            },
            MockServoHandle {
                position_rx,
                moves_rx,
            },
        )
    }

    pub fn position(&self) -> GatePosition {
        *self.position_tx.borrow()
    }
}

impl GateActuator for MockServo {
    async fn set_angle(&mut self, position: GatePosition) -> Result<()> {
        self.position_tx.send_replace(position);
        let _ = self.moves_tx.send(position);
        Ok(())
    }
}

/// Observer side of a [`MockServo`].
#[derive(Debug)]
pub struct MockServoHandle {
    position_rx: watch::Receiver<GatePosition>,
    moves_rx: mpsc::UnboundedReceiver<GatePosition>,
}

impl MockServoHandle {
    /// Current gate position.
    pub fn position(&self) -> GatePosition {
        *self.position_rx.borrow()
    }

    /// Drain the positions commanded since the last call.
    pub fn take_moves(&mut self) -> Vec<GatePosition> {
        let mut moves = Vec::new();
        while let Ok(position) = self.moves_rx.try_recv() {
            moves.push(position);
        }
        moves
    }
}
