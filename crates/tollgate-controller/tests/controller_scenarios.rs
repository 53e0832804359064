//! End-to-end scenarios for the control loop.
//!
//! Every test runs on a paused Tokio clock: time only moves through
//! `tokio::time::advance`, so deadlines are hit exactly.

use std::time::Duration;

use tollgate_controller::{Controller, ControllerConfig, GateState, Peripherals};
use tollgate_core::{GatePosition, Uid};
use tollgate_hardware::mock::{
    LcdFrame, MockBuzzer, MockBuzzerHandle, MockCardReader, MockCardReaderHandle, MockHostLink,
    MockHostLinkHandle, MockServo, MockServoHandle, ToneCommand, VirtualLcd, VirtualLcdHandle,
};

// ============================================================================
// Test Data Constants
// ============================================================================

mod test_data {
    pub const CARD: [u8; 4] = [0xC0, 0x5F, 0x6E, 0x1D];
    pub const CARD_CANONICAL: &str = "C0 5F 6E 1D";
    pub const OTHER_REFERENCE: &str = "AA BB CC DD";
    pub const SHORT_CARD: [u8; 2] = [0x01, 0x02];
    pub const READY_LINE: &str = "System Ready. Waiting for card...";
}

// ============================================================================
// Rig
// ============================================================================

type TestController = Controller<MockCardReader, VirtualLcd, MockBuzzer, MockServo, MockHostLink>;

struct Rig {
    controller: TestController,
    cards: MockCardReaderHandle,
    lcd: VirtualLcdHandle,
    buzzer: MockBuzzerHandle,
    servo: MockServoHandle,
    host: MockHostLinkHandle,
}

impl Rig {
    async fn start(config: ControllerConfig) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init();

        let (reader, cards) = MockCardReader::new();
        let (display, lcd) = VirtualLcd::new();
        let (tone, buzzer) = MockBuzzer::new();
        let (gate, servo) = MockServo::new();
        let (link, host) = MockHostLink::new();

        let mut controller = Controller::new(
            config,
            Peripherals {
                reader,
                display,
                tone,
                gate,
                link,
            },
        );
        controller.start().await.unwrap();

        let mut rig = Self {
            controller,
            cards,
            lcd,
            buzzer,
            servo,
            host,
        };
        assert_eq!(rig.host.take_lines(), vec![test_data::READY_LINE.to_string()]);
        assert!(rig.lcd.current().shows("  Toll System", "Ready for cards"));
        rig.lcd.take_frames();
        rig.buzzer.take_commands();
        rig.servo.take_moves();
        rig
    }

    async fn local(reference: &str) -> Self {
        Self::start(ControllerConfig::local(reference).unwrap()).await
    }

    async fn remote() -> Self {
        Self::start(ControllerConfig::remote()).await
    }

    async fn present(&self, bytes: &[u8]) {
        self.cards
            .present_card(Uid::new(bytes.to_vec()).unwrap())
            .await
            .unwrap();
    }

    async fn poll(&mut self) {
        self.controller.poll_once().await.unwrap();
    }

    /// Advance the clock by `millis`, then run one iteration.
    async fn step(&mut self, millis: u64) {
        tokio::time::advance(Duration::from_millis(millis)).await;
        self.poll().await;
    }

    fn state(&self) -> GateState {
        self.controller.state()
    }

    fn shows_banner(&self) -> bool {
        self.lcd.current().shows("  Toll System", "Ready for cards")
    }

    fn frames(&mut self) -> Vec<LcdFrame> {
        self.lcd.take_frames()
    }
}

// ============================================================================
// Local mode
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_local_matching_card_is_granted() {
    let mut rig = Rig::local(test_data::CARD_CANONICAL).await;

    rig.present(&test_data::CARD).await;
    rig.poll().await;

    assert_eq!(rig.state(), GateState::Granted);
    let frames = rig.frames();
    assert!(frames[0].shows("Card Detected", "Processing..."));
    assert!(frames[1].shows("Access Granted", "Gate Opening..."));
    assert_eq!(rig.buzzer.playing(), Some(500));
    assert_eq!(rig.servo.position(), GatePosition::Closed);

    rig.step(300).await;
    assert_eq!(rig.buzzer.playing(), None);
    assert_eq!(rig.servo.position(), GatePosition::Open);

    rig.step(4999).await;
    assert_eq!(rig.servo.position(), GatePosition::Open);
    assert_eq!(rig.state(), GateState::Granted);

    rig.step(1).await;
    assert_eq!(rig.servo.position(), GatePosition::Closed);
    assert_eq!(rig.state(), GateState::Idle);
    assert!(rig.shows_banner());

    assert_eq!(
        rig.servo.take_moves(),
        vec![GatePosition::Open, GatePosition::Closed]
    );
    // Local mode never talks to the host.
    assert!(rig.host.take_lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_local_mismatching_card_is_denied() {
    let mut rig = Rig::local(test_data::OTHER_REFERENCE).await;

    rig.present(&test_data::CARD).await;
    rig.poll().await;

    assert_eq!(rig.state(), GateState::Denied);
    assert!(rig.lcd.current().shows("Access Denied", "Unknown Card"));
    assert_eq!(
        rig.buzzer.take_commands(),
        vec![ToneCommand::Play {
            freq_hz: 300,
            duration: Duration::from_millis(1000)
        }]
    );

    rig.step(1000).await;
    assert_eq!(rig.buzzer.take_commands(), vec![ToneCommand::Stop]);
    assert!(rig.lcd.current().shows("Access Denied", "Unknown Card"));

    rig.step(3000).await;
    assert_eq!(rig.state(), GateState::Idle);
    assert!(rig.shows_banner());
    assert!(rig.servo.take_moves().is_empty());
    assert_eq!(rig.servo.position(), GatePosition::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_card_not_observed_while_sequencing() {
    let mut rig = Rig::local(test_data::CARD_CANONICAL).await;

    rig.present(&test_data::CARD).await;
    rig.poll().await;
    rig.present(&test_data::CARD).await;

    for _ in 0..10 {
        rig.step(500).await;
        assert_eq!(rig.controller.peripherals().reader.reads(), 1);
    }
    assert_eq!(rig.state(), GateState::Granted);

    // Sequence ends at 5.3s; the waiting card is read on that same iteration.
    rig.step(300).await;
    assert_eq!(rig.controller.peripherals().reader.reads(), 2);
    assert_eq!(rig.state(), GateState::Granted);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_sequences_leave_gate_closed() {
    let mut rig = Rig::local(test_data::CARD_CANONICAL).await;

    for _ in 0..3 {
        rig.present(&test_data::CARD).await;
        rig.poll().await;
        rig.step(5300).await;
        assert_eq!(rig.state(), GateState::Idle);
        assert_eq!(rig.servo.position(), GatePosition::Closed);
    }

    let mut rig = Rig::local(test_data::OTHER_REFERENCE).await;
    for _ in 0..3 {
        rig.present(&test_data::CARD).await;
        rig.poll().await;
        rig.step(1000).await;
        rig.step(3000).await;
        assert_eq!(rig.state(), GateState::Idle);
    }
    assert!(rig.servo.take_moves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_read_failure_aborts_cycle_silently() {
    let mut rig = Rig::local(test_data::CARD_CANONICAL).await;

    rig.cards.present_unreadable_card().await.unwrap();
    rig.poll().await;

    assert_eq!(rig.state(), GateState::Idle);
    assert!(rig.frames().is_empty());
    assert!(rig.buzzer.take_commands().is_empty());
    assert!(rig.controller.state_machine().history().is_empty());

    // The next card is handled normally.
    rig.present(&test_data::CARD).await;
    rig.poll().await;
    assert_eq!(rig.state(), GateState::Granted);
}

#[tokio::test(start_paused = true)]
async fn test_local_mode_ignores_host_decisions() {
    let mut rig = Rig::local(test_data::CARD_CANONICAL).await;

    rig.host.send_line("ACCESS_GRANTED").unwrap();
    rig.poll().await;

    assert_eq!(rig.state(), GateState::Idle);
    assert!(rig.frames().is_empty());
}

// ============================================================================
// Remote mode
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_remote_without_reply_stays_idle() {
    let mut rig = Rig::remote().await;

    rig.present(&test_data::SHORT_CARD).await;
    rig.poll().await;

    assert_eq!(rig.host.take_lines(), vec!["UID:01 02".to_string()]);
    assert_eq!(rig.state(), GateState::Processing);
    assert!(rig.lcd.current().shows("Card Detected", "Processing..."));

    rig.step(1000).await;
    assert_eq!(rig.state(), GateState::Idle);
    assert!(rig.shows_banner());

    for _ in 0..60 {
        rig.step(1000).await;
    }
    assert_eq!(rig.state(), GateState::Idle);
    assert!(rig.shows_banner());
    assert!(rig.host.take_lines().is_empty());
    assert_eq!(
        rig.controller.pending_request().unwrap().uid.as_str(),
        "01 02"
    );

    // A second card replaces the pending request.
    rig.present(&[0x03, 0x04]).await;
    rig.poll().await;
    assert_eq!(rig.host.take_lines(), vec!["UID:03 04".to_string()]);
    assert_eq!(
        rig.controller.pending_request().unwrap().uid.as_str(),
        "03 04"
    );
}

#[tokio::test(start_paused = true)]
async fn test_remote_decision_inside_response_window() {
    let mut rig = Rig::remote().await;

    rig.present(&test_data::CARD).await;
    rig.poll().await;
    assert_eq!(rig.host.take_lines(), vec!["UID:C0 5F 6E 1D".to_string()]);

    rig.host.send_line("ACCESS_GRANTED").unwrap();
    rig.step(100).await;

    assert_eq!(rig.state(), GateState::Granted);
    assert!(rig.controller.pending_request().is_none());
    let last = rig.controller.state_machine().last_transitions(1);
    assert_eq!(last[0].from, GateState::Processing);

    rig.step(300).await;
    assert_eq!(rig.servo.position(), GatePosition::Open);
    rig.step(5000).await;
    assert_eq!(rig.servo.position(), GatePosition::Closed);
    assert_eq!(rig.state(), GateState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_remote_decision_after_hand_off() {
    let mut rig = Rig::remote().await;

    rig.present(&test_data::CARD).await;
    rig.poll().await;
    rig.step(1000).await;
    assert_eq!(rig.state(), GateState::Idle);

    rig.host.send_line("ACCESS_DENIED").unwrap();
    rig.step(2000).await;

    assert_eq!(rig.state(), GateState::Denied);
    assert!(rig.lcd.current().shows("Access Denied", "Insuff. Balance"));
    assert!(rig.controller.pending_request().is_none());

    rig.step(1000).await;
    rig.step(3000).await;
    assert_eq!(rig.state(), GateState::Idle);
    assert_eq!(rig.servo.position(), GatePosition::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_lowercase_command_is_ignored() {
    let mut rig = Rig::remote().await;

    rig.host.send_line("access_granted").unwrap();
    rig.poll().await;

    assert_eq!(rig.state(), GateState::Idle);
    assert!(rig.frames().is_empty());
    assert!(rig.buzzer.take_commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_split_command_matches_whole_command() {
    let mut rig = Rig::remote().await;

    rig.host.send_bytes(b"ACCESS_GRA").unwrap();
    rig.poll().await;
    assert_eq!(rig.state(), GateState::Idle);

    rig.host.send_bytes(b"NTED\n").unwrap();
    rig.step(20).await;
    assert_eq!(rig.state(), GateState::Granted);
}

#[tokio::test(start_paused = true)]
async fn test_crlf_command_is_accepted() {
    let mut rig = Rig::remote().await;

    rig.host.send_bytes(b"ACCESS_DENIED\r\n").unwrap();
    rig.poll().await;
    assert_eq!(rig.state(), GateState::Denied);
}

#[tokio::test(start_paused = true)]
async fn test_unsolicited_decision_is_applied() {
    let mut rig = Rig::remote().await;
    assert!(rig.controller.pending_request().is_none());

    rig.host.send_line("ACCESS_GRANTED").unwrap();
    rig.poll().await;

    assert_eq!(rig.state(), GateState::Granted);
    let last = rig.controller.state_machine().last_transitions(1);
    assert_eq!(last[0].from, GateState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_decision_during_sequence_is_dropped() {
    let mut rig = Rig::remote().await;

    rig.host.send_line("ACCESS_GRANTED").unwrap();
    rig.poll().await;
    rig.step(300).await;

    rig.host.send_line("ACCESS_DENIED").unwrap();
    rig.step(100).await;
    assert_eq!(rig.state(), GateState::Granted);

    rig.step(4900).await;
    assert_eq!(rig.state(), GateState::Idle);
    let denied = rig
        .controller
        .state_machine()
        .history()
        .iter()
        .any(|t| t.to == GateState::Denied);
    assert!(!denied);
}

#[tokio::test(start_paused = true)]
async fn test_two_decisions_in_one_read() {
    let mut rig = Rig::remote().await;

    rig.host.send_bytes(b"ACCESS_DENIED\nACCESS_GRANTED\n").unwrap();
    rig.poll().await;

    assert_eq!(rig.state(), GateState::Denied);
    rig.step(4000).await;
    assert_eq!(rig.state(), GateState::Idle);
    assert!(rig.servo.take_moves().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_host_write_failure_returns_to_idle() {
    let rig = Rig::remote().await;
    let Rig {
        mut controller,
        cards,
        lcd,
        host,
        ..
    } = rig;
    drop(host);

    cards
        .present_card(Uid::new(test_data::CARD.to_vec()).unwrap())
        .await
        .unwrap();
    let result = controller.poll_once().await;

    assert!(result.is_err());
    assert_eq!(controller.state(), GateState::Idle);
    assert!(controller.pending_request().is_none());
    assert!(lcd.current().shows("  Toll System", "Ready for cards"));
}

// ============================================================================
// Run loop
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_run_until_completes_sequence() {
    let (reader, cards) = MockCardReader::new();
    let (display, lcd) = VirtualLcd::new();
    let (tone, _buzzer) = MockBuzzer::new();
    let (gate, mut servo) = MockServo::new();
    let (link, mut host) = MockHostLink::new();

    let mut controller = Controller::new(
        ControllerConfig::local(test_data::CARD_CANONICAL).unwrap(),
        Peripherals {
            reader,
            display,
            tone,
            gate,
            link,
        },
    );

    cards
        .present_card(Uid::new(test_data::CARD.to_vec()).unwrap())
        .await
        .unwrap();
    controller
        .run_until(tokio::time::sleep(Duration::from_secs(6)))
        .await;

    assert_eq!(controller.state(), GateState::Idle);
    assert_eq!(
        servo.take_moves(),
        vec![
            GatePosition::Closed,
            GatePosition::Open,
            GatePosition::Closed
        ]
    );
    assert!(lcd.current().shows("  Toll System", "Ready for cards"));
    assert_eq!(host.take_lines(), vec![test_data::READY_LINE.to_string()]);
}
