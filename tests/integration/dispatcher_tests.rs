//! Request → CabinetService → queued steps → responses.

use filterunit::app::commands::{Command, CommandTag, Envelope, MessageKind, RawRequest, Request};
use filterunit::app::ports::MagnetState;
use filterunit::app::result::ResultCode;
use filterunit::app::service::CabinetService;
use filterunit::config::CabinetConfig;
use filterunit::steps::Step;
use filterunit::steps::queue::QUEUE_CAPACITY;

use crate::mock_hw::{HardwareCall, MockCabinet, RecordingSink};

struct Bench {
    svc: CabinetService,
    hw: MockCabinet,
    sink: RecordingSink,
    next_id: u32,
}

impl Bench {
    fn new() -> Self {
        Self {
            svc: CabinetService::new(CabinetConfig::default()),
            hw: MockCabinet::new(),
            sink: RecordingSink::new(),
            next_id: 100,
        }
    }

    /// Send a command and drain the queue; returns its message id.
    fn send(&mut self, command: Command) -> u32 {
        let id = self.submit(command);
        self.drain();
        id
    }

    /// Send a command without draining.
    fn submit(&mut self, command: Command) -> u32 {
        self.next_id += 1;
        let id = self.next_id;
        self.svc.handle_request(Request::new(id, command), &mut self.sink);
        id
    }

    fn drain(&mut self) {
        while self.svc.queue_len() > 0 {
            self.svc.run_once(&mut self.hw, &mut self.sink).unwrap();
        }
    }

    /// Result of the first response to message `id`.
    fn result(&self, id: u32) -> ResultCode {
        self.sink.for_message(id)[0].result().unwrap()
    }

    fn add_filter(&mut self, id: &str) -> ResultCode {
        let msg = self.send(Command::AddFilter {
            id: id.into(),
            material: "glass".into(),
            thickness: "2".into(),
        });
        self.result(msg)
    }

    fn add_combination(&mut self, id: &str, members: &[&str]) -> ResultCode {
        let msg = self.send(Command::AddCombination {
            id: id.into(),
            name: format!("{id} set"),
            members: members.iter().map(|m| (*m).to_string()).collect(),
        });
        self.result(msg)
    }
}

// ── Capacity and slots ────────────────────────────────────────

#[test]
fn four_filters_fill_slots_then_drawers_full() {
    let mut b = Bench::new();
    for id in ["F1", "F2", "F3", "F4"] {
        assert_eq!(b.add_filter(id), ResultCode::Success);
    }
    let slots: Vec<u8> = b.svc.inventory().filters().iter().map(|f| f.slot).collect();
    assert_eq!(slots, vec![1, 2, 3, 4]);

    let delivered = b.sink.responses.len();
    assert_eq!(b.add_filter("F5"), ResultCode::DrawersFull);
    assert_eq!(b.sink.responses.len(), delivered + 1);
    assert_eq!(b.svc.inventory().filter_count(), 4);
}

#[test]
fn duplicate_filter_rejected_without_steps() {
    let mut b = Bench::new();
    b.add_filter("F1");
    let calls = b.hw.calls.len();
    assert_eq!(b.add_filter("F1"), ResultCode::InvalidParameter);
    assert_eq!(b.hw.calls.len(), calls);
    assert_eq!(b.svc.inventory().filter_count(), 1);
}

#[test]
fn add_filter_drives_full_sequence() {
    let mut b = Bench::new();
    b.add_filter("F1");
    assert_eq!(
        b.hw.without_closes(),
        vec![
            HardwareCall::Crane(0),
            HardwareCall::Crane(140),
            HardwareCall::Magnet(MagnetState::On),
            HardwareCall::Crane(0),
            HardwareCall::Open(1),
            HardwareCall::Crane(105),
            HardwareCall::Magnet(MagnetState::Off),
            HardwareCall::Crane(0),
        ]
    );
    // Two retract sweeps over drawers 0..=4.
    let closes = b.hw.calls.len() - b.hw.without_closes().len();
    assert_eq!(closes, 10);
}

#[test]
fn request_add_rejects_when_full() {
    let mut b = Bench::new();
    for id in ["F1", "F2", "F3", "F4"] {
        b.add_filter(id);
    }
    let msg = b.send(Command::RequestAddFilter { id: "F5".into() });
    assert_eq!(b.result(msg), ResultCode::DrawersFull);

    let msg = b.send(Command::RequestRemoveFilter { id: "F3".into() });
    assert_eq!(b.result(msg), ResultCode::Success);
    assert_eq!(b.hw.calls.last(), Some(&HardwareCall::Open(0)));
}

#[test]
fn cancel_commands_answer_immediately() {
    let mut b = Bench::new();
    let msg = b.submit(Command::CancelAddFilter);
    assert_eq!(b.result(msg), ResultCode::Success);
    assert_eq!(b.svc.queue_len(), 1);

    let msg = b.submit(Command::CancelRemoveFilter);
    assert_eq!(b.result(msg), ResultCode::Success);
    assert_eq!(b.svc.queue_len(), 3);
}

#[test]
fn unknown_filter_removal_is_invalid_parameter() {
    let mut b = Bench::new();
    let msg = b.send(Command::RemoveFilter { id: "nope".into() });
    assert_eq!(b.result(msg), ResultCode::InvalidParameter);
    let msg = b.send(Command::RequestRemoveFilter { id: "nope".into() });
    assert_eq!(b.result(msg), ResultCode::InvalidParameter);
    assert!(b.hw.calls.is_empty());
}

// ── Listings ──────────────────────────────────────────────────

#[test]
fn get_filters_lists_triples() {
    let mut b = Bench::new();
    b.add_filter("F1");
    b.add_filter("F2");
    let msg = b.send(Command::GetFilters);
    assert_eq!(
        b.sink.for_message(msg)[0].params,
        vec!["0", "F1", "glass", "2", "F2", "glass", "2"]
    );
}

#[test]
fn status_reports_empty_drawers() {
    let mut b = Bench::new();
    for id in ["F1", "F2", "F3"] {
        b.add_filter(id);
    }
    let msg = b.send(Command::GetSystemStatus);
    assert_eq!(b.sink.for_message(msg)[0].params, vec!["0", "Nominal", "1.0", "1"]);
}

// ── Combinations ──────────────────────────────────────────────

#[test]
fn combination_with_unknown_member_is_fce() {
    let mut b = Bench::new();
    b.add_filter("F1");
    assert_eq!(
        b.add_combination("C1", &["F1", "F9"]),
        ResultCode::FilterCombinationError
    );
    assert!(b.svc.inventory().combinations().is_empty());
}

#[test]
fn duplicate_combination_is_invalid_parameter() {
    let mut b = Bench::new();
    b.add_filter("F1");
    assert_eq!(b.add_combination("C1", &["F1"]), ResultCode::Success);
    assert_eq!(b.add_combination("C1", &["F1"]), ResultCode::InvalidParameter);
    let msg = b.send(Command::RemoveCombination { id: "C2".into() });
    assert_eq!(b.result(msg), ResultCode::InvalidParameter);
}

#[test]
fn place_and_unplace_worked_example() {
    let mut b = Bench::new();
    for id in ["F1", "F2", "F3", "F4"] {
        b.add_filter(id);
    }
    assert_eq!(b.add_combination("C1", &["F2", "F4"]), ResultCode::Success);

    let place = b.submit(Command::PlaceCombination { id: "C1".into() });
    assert_eq!(b.sink.for_message(place).len(), 1, "ack only before drain");
    assert_eq!(b.result(place), ResultCode::Success);
    assert!(b.svc.inventory().combination("C1").unwrap().placed);

    // Second place is refused synchronously and queues nothing more.
    let queued = b.svc.queue_len();
    let again = b.submit(Command::PlaceCombination { id: "C1".into() });
    assert_eq!(b.result(again), ResultCode::FilterCombinationError);
    assert_eq!(b.svc.queue_len(), queued);

    b.drain();
    let replies = b.sink.for_message(place);
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[1].envelope.command, CommandTag::PlaceCombinationCallback.code());
    assert_eq!(replies[1].envelope.kind, MessageKind::Response);
    assert_eq!(replies[1].result(), Some(ResultCode::Success));

    let unplace = b.send(Command::UnplaceCombination);
    assert_eq!(b.result(unplace), ResultCode::Success);
    assert!(!b.svc.inventory().combination("C1").unwrap().placed);
    assert_eq!(b.sink.callbacks(CommandTag::RemoveCombinationCallback), 1);

    let again = b.send(Command::UnplaceCombination);
    assert_eq!(b.result(again), ResultCode::FilterCombinationError);
}

#[test]
fn place_unknown_combination_is_fce() {
    let mut b = Bench::new();
    let msg = b.send(Command::PlaceCombination { id: "C9".into() });
    assert_eq!(b.result(msg), ResultCode::FilterCombinationError);
    assert_eq!(b.svc.placed(), None);
}

#[test]
fn unplace_crane_moves_mirror_place() {
    let mut b = Bench::new();
    for id in ["F1", "F2", "F3", "F4"] {
        b.add_filter(id);
    }
    b.add_combination("C1", &["F3", "F1", "F4"]);

    b.hw.calls.clear();
    b.send(Command::PlaceCombination { id: "C1".into() });
    let mut placed = b.hw.crane_moves();

    b.hw.calls.clear();
    b.send(Command::UnplaceCombination);
    placed.reverse();
    assert_eq!(b.hw.crane_moves(), placed);
}

#[test]
fn removing_filter_prunes_referencing_combinations() {
    let mut b = Bench::new();
    for id in ["F1", "F2", "F3"] {
        b.add_filter(id);
    }
    b.add_combination("C1", &["F1", "F2"]);
    b.add_combination("C2", &["F2"]);
    b.add_combination("C3", &["F3"]);

    let msg = b.send(Command::RemoveFilter { id: "F2".into() });
    assert_eq!(b.result(msg), ResultCode::Success);
    let ids: Vec<&str> = b
        .svc
        .inventory()
        .combinations()
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(ids, vec!["C3"]);

    // Freed drawer 2 is reused.
    b.add_filter("F5");
    assert_eq!(b.svc.inventory().filter("F5").unwrap().slot, 2);
}

#[test]
fn removing_member_of_placed_combination_logs_orphaned_stack() {
    let mut b = Bench::new();
    for id in ["F1", "F2"] {
        b.add_filter(id);
    }
    b.add_combination("C1", &["F1", "F2"]);
    let msg = b.send(Command::PlaceCombination { id: "C1".into() });
    assert_eq!(b.result(msg), ResultCode::Success);

    let msg = b.send(Command::RemoveFilter { id: "F2".into() });
    assert_eq!(b.result(msg), ResultCode::Success);
    assert_eq!(b.svc.placed(), None);

    let warning = b
        .svc
        .events()
        .iter()
        .find(|e| e.text.contains("C1 dropped while placed"))
        .expect("orphaned stack not logged");
    assert_eq!(warning.level, log::Level::Warn);
}

// ── Decoding and busy ─────────────────────────────────────────

#[test]
fn raw_requests_report_decode_errors() {
    let mut b = Bench::new();
    let raw = |command: u8, params: &[&str]| RawRequest {
        envelope: Envelope {
            message_id: 5,
            block_id: 3,
            priority: 2,
            command,
            kind: MessageKind::Request,
        },
        params: params.iter().map(|p| (*p).to_string()).collect(),
    };

    b.svc.handle_raw(raw(1, &["F1"]), &mut b.sink);
    b.svc.handle_raw(raw(42, &[]), &mut b.sink);
    b.svc.handle_raw(raw(18, &[]), &mut b.sink);
    assert_eq!(
        b.sink.results(),
        vec![
            ResultCode::ParameterCountError,
            ResultCode::UnknownMessage,
            ResultCode::UnknownMessage
        ]
    );
    let first = &b.sink.responses[0].envelope;
    assert_eq!((first.message_id, first.block_id, first.priority), (5, 3, 2));
    assert_eq!(first.command, 1);
    assert_eq!(b.svc.queue_len(), 0);
}

#[test]
fn full_queue_answers_server_busy_without_mutation() {
    let mut b = Bench::new();
    // Each CancelAddFilter queues one step; fill all but five slots.
    for _ in 0..QUEUE_CAPACITY - 5 {
        b.submit(Command::CancelAddFilter);
    }
    let msg = b.submit(Command::AddFilter {
        id: "F1".into(),
        material: "glass".into(),
        thickness: "2".into(),
    });
    assert_eq!(b.result(msg), ResultCode::ServerBusy);
    assert_eq!(b.svc.inventory().filter_count(), 0);
    assert!(!b.svc.is_dirty());

    b.drain();
    let msg = b.submit(Command::AddFilter {
        id: "F1".into(),
        material: "glass".into(),
        thickness: "2".into(),
    });
    b.drain();
    assert_eq!(b.result(msg), ResultCode::Success);
}

#[test]
fn every_request_gets_exactly_one_primary_response() {
    let mut b = Bench::new();
    let ids = [
        b.send(Command::GetFilters),
        b.send(Command::GetCombinations),
        b.send(Command::GetSystemLog),
        b.send(Command::Stop),
        b.send(Command::Reset),
        b.send(Command::CancelAddFilter),
        b.send(Command::Unknown(0)),
    ];
    for id in ids {
        assert_eq!(b.sink.for_message(id).len(), 1, "message {id}");
    }
    assert!(b.hw.calls.contains(&HardwareCall::Deinit));
    assert!(b.hw.calls.contains(&HardwareCall::Init));
}

#[test]
fn pending_steps_expose_queue_contents() {
    let mut b = Bench::new();
    b.submit(Command::Stop);
    let pending: Vec<&Step> = b.svc.pending_steps().collect();
    assert_eq!(pending, vec![&Step::StopHardware]);
}
