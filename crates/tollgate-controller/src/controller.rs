//! The gate control loop.
//!
//! [`Controller`] owns every peripheral, the host codec, the resolver and the
//! sequencer. One call to [`poll_once`](Controller::poll_once) is one loop
//! iteration:
//!
//! 1. drain the host link and handle every complete line;
//! 2. run the sequencer steps whose deadlines have passed;
//! 3. poll the card reader, but only when `Idle`.
//!
//! A running sequence is never interrupted. Lines keep being drained while it
//! runs, but no card is observed until it returns to `Idle`.

use std::future::Future;

use bytes::BytesMut;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::codec::{Decoder, Encoder};
use tollgate_core::{CanonicalUid, GatePosition};
use tollgate_hardware::{CardReader, GateActuator, HostLink, StatusDisplay, ToneEmitter};
use tollgate_protocol::{ControllerMessage, HostCodec, HostCommand, Inbound};
use tracing::{debug, error, info, trace, warn};

use crate::config::ControllerConfig;
use crate::error::Result;
use crate::resolver::{PendingRequest, Resolution, Resolver};
use crate::sequencer::{Action, Sequencer};
use crate::state_machine::{GateState, StateMachine};

/// The peripherals a controller drives.
#[derive(Debug)]
pub struct Peripherals<R, D, T, G, L> {
    pub reader: R,
    pub display: D,
    pub tone: T,
    pub gate: G,
    pub link: L,
}

/// Gate controller context.
#[derive(Debug)]
pub struct Controller<R, D, T, G, L> {
    config: ControllerConfig,
    peripherals: Peripherals<R, D, T, G, L>,
    codec: HostCodec,
    rx_buffer: BytesMut,
    resolver: Resolver,
    sequencer: Sequencer,
}

impl<R, D, T, G, L> Controller<R, D, T, G, L>
where
    R: CardReader,
    D: StatusDisplay,
    T: ToneEmitter,
    G: GateActuator,
    L: HostLink,
{
    pub fn new(config: ControllerConfig, peripherals: Peripherals<R, D, T, G, L>) -> Self {
        let resolver = Resolver::new(config.mode());
        let sequencer = Sequencer::new(*config.timings());

        Self {
            config,
            peripherals,
            codec: HostCodec::new(),
            rx_buffer: BytesMut::new(),
            resolver,
            sequencer,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> GateState {
        self.sequencer.state()
    }

    /// Gate position as last commanded.
    pub fn gate(&self) -> GatePosition {
        self.sequencer.gate()
    }

    /// Remote mode: the request awaiting a host decision.
    pub fn pending_request(&self) -> Option<&PendingRequest> {
        self.resolver.pending()
    }

    pub fn state_machine(&self) -> &StateMachine {
        self.sequencer.machine()
    }

    pub fn peripherals(&self) -> &Peripherals<R, D, T, G, L> {
        &self.peripherals
    }

    /// Bring peripherals to their resting state and announce readiness.
    pub async fn start(&mut self) -> Result<()> {
        let actions = self.sequencer.startup();
        self.apply(&actions).await;

        self.send(ControllerMessage::Ready).await?;
        info!(mode = %self.config.mode(), "Controller ready");
        Ok(())
    }

    /// Run one loop iteration.
    ///
    /// # Errors
    ///
    /// Host link and card reader failures are returned after the rest of the
    /// iteration ran, so a failing link never stalls a running sequence.
    pub async fn poll_once(&mut self) -> Result<()> {
        let link_result = self.service_host_link().await;

        let now = Instant::now();
        let actions = self.sequencer.advance(now)?;
        self.apply(&actions).await;

        if self.sequencer.is_idle() {
            self.poll_reader(now).await?;
        }

        link_result
    }

    /// Iterate every poll interval until `shutdown` completes.
    ///
    /// Iteration errors are logged and never stop the loop.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        if let Err(error) = self.start().await {
            warn!(%error, "Startup announcement failed");
        }

        let mut interval = tokio::time::interval(self.config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(state = %self.state(), "Controller stopping");
                    return;
                }
                _ = interval.tick() => {
                    if let Err(error) = self.poll_once().await {
                        error!(%error, state = %self.state(), "Control loop iteration failed");
                    }
                }
            }
        }
    }

    /// Iterate forever.
    pub async fn run(&mut self) {
        self.run_until(std::future::pending()).await
    }

    async fn service_host_link(&mut self) -> Result<()> {
        let read = self
            .peripherals
            .link
            .read_available(&mut self.rx_buffer)
            .await?;
        if read > 0 {
            trace!(bytes = read, buffered = self.codec.pending_len(), "Host bytes received");
        }

        while let Some(inbound) = self.codec.decode(&mut self.rx_buffer)? {
            match inbound {
                Inbound::Command(command) => self.handle_decision(command).await?,
                Inbound::Unrecognized(line) => {
                    debug!(line = %line, "Ignoring unrecognized host line");
                }
            }
        }
        Ok(())
    }

    async fn handle_decision(&mut self, command: HostCommand) -> Result<()> {
        if !self.resolver.is_remote() {
            debug!(decision = %command, "Host decision ignored in local mode");
            return Ok(());
        }

        if !self.sequencer.accepts_decision() {
            warn!(
                decision = %command,
                state = %self.state(),
                "Host decision dropped while a sequence is running"
            );
            return Ok(());
        }

        let now = Instant::now();
        match self.resolver.take_pending() {
            Some(request) => info!(
                uid = %request.uid,
                decision = %command,
                waited_ms = now.duration_since(request.sent_at).as_millis() as u64,
                "Host decision received"
            ),
            None => warn!(decision = %command, "Unsolicited host decision, no request pending"),
        }

        let reason = self.config.mode().denial_reason();
        let actions = self.sequencer.start(command.outcome(), reason, now)?;
        self.apply(&actions).await;
        Ok(())
    }

    async fn poll_reader(&mut self, now: Instant) -> Result<()> {
        if !self.peripherals.reader.is_new_card_present().await? {
            return Ok(());
        }

        let uid = match self.peripherals.reader.read_uid().await {
            Ok(uid) => uid.canonical(),
            Err(error) if error.is_card_read() => {
                debug!(%error, "Card read failed, scan cycle aborted");
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };

        info!(uid = %uid, "Card detected");
        let actions = self.sequencer.begin_processing()?;
        self.apply(&actions).await;

        match self.resolver.resolve(&uid) {
            Resolution::Decided(outcome) => {
                let reason = self.config.mode().denial_reason();
                let actions = self.sequencer.start(outcome, reason, now)?;
                self.apply(&actions).await;
                Ok(())
            }
            Resolution::Deferred(uid) => self.request_decision(uid, now).await,
        }
    }

    async fn request_decision(&mut self, uid: CanonicalUid, now: Instant) -> Result<()> {
        match self.send(ControllerMessage::Uid(uid.clone())).await {
            Ok(()) => {
                info!(uid = %uid, "UID sent to host");
                self.resolver.mark_sent(uid, now);
                self.sequencer.await_host(now);
                Ok(())
            }
            Err(error) => {
                let actions = self.sequencer.hand_off()?;
                self.apply(&actions).await;
                Err(error)
            }
        }
    }

    async fn send(&mut self, message: ControllerMessage) -> Result<()> {
        let mut out = BytesMut::new();
        self.codec.encode(message, &mut out)?;
        self.peripherals.link.write_all(&out).await?;
        Ok(())
    }

    async fn apply(&mut self, actions: &[Action]) {
        for action in actions {
            let result = match *action {
                Action::Show(line0, line1) => {
                    self.peripherals.display.show_lines(line0, line1).await
                }
                Action::PlayTone { freq_hz, duration } => {
                    self.peripherals.tone.play_tone(freq_hz, duration).await
                }
                Action::StopTone => self.peripherals.tone.stop().await,
                Action::SetGate(position) => self.peripherals.gate.set_angle(position).await,
            };

            if let Err(error) = result {
                warn!(?action, %error, "Feedback surface failed, sequence continues");
            }
        }
    }
}
