//! Tick-level behaviour: busy gating, fault halt and recovery.

use filterunit::app::commands::{Command, Request};
use filterunit::app::ports::HardwareState;
use filterunit::app::result::ResultCode;
use filterunit::app::service::CabinetService;
use filterunit::config::CabinetConfig;
use filterunit::diagnostics::Health;
use filterunit::error::HardwareFault;
use filterunit::steps::Step;
use filterunit::steps::executor::TickOutcome;

use crate::mock_hw::{HardwareCall, MockCabinet, RecordingSink};

fn add_filter(id: u32, filter: &str) -> Request {
    Request::new(
        id,
        Command::AddFilter {
            id: filter.into(),
            material: "glass".into(),
            thickness: "2".into(),
        },
    )
}

#[test]
fn one_step_per_tick_in_fifo_order() {
    let mut svc = CabinetService::new(CabinetConfig::default());
    let mut hw = MockCabinet::new();
    let mut sink = RecordingSink::new();
    svc.handle_request(add_filter(1, "F1"), &mut sink);

    let first = svc.run_once(&mut hw, &mut sink).unwrap();
    assert_eq!(
        first,
        TickOutcome::Executed {
            step: Step::MoveCrane(0),
            hardware_pending: true
        }
    );
    assert_eq!(hw.calls, vec![HardwareCall::Crane(0)]);
    assert_eq!(svc.queue_len(), 10);
}

#[test]
fn busy_hardware_holds_the_queue() {
    let mut svc = CabinetService::new(CabinetConfig::default());
    let mut hw = MockCabinet::new();
    let mut sink = RecordingSink::new();
    svc.handle_request(add_filter(1, "F1"), &mut sink);

    hw.state = HardwareState::Busy;
    for _ in 0..5 {
        assert_eq!(svc.run_once(&mut hw, &mut sink), Ok(TickOutcome::Busy));
    }
    assert!(hw.calls.is_empty());
    assert_eq!(svc.queue_len(), 11);
}

#[test]
fn error_state_halts_until_reset() {
    let mut svc = CabinetService::new(CabinetConfig::default());
    let mut hw = MockCabinet::new();
    let mut sink = RecordingSink::new();
    svc.handle_request(add_filter(1, "F1"), &mut sink);
    svc.run_once(&mut hw, &mut sink).unwrap();

    hw.state = HardwareState::Error;
    for _ in 0..3 {
        assert_eq!(svc.run_once(&mut hw, &mut sink), Err(HardwareFault));
    }
    assert_eq!(svc.queue_len(), 10);
    assert_eq!(svc.status().health, Health::Fault);

    // Reset is acknowledged at once and recovers on the next tick.
    svc.handle_request(Request::new(2, Command::Reset), &mut sink);
    assert_eq!(sink.for_message(2)[0].result(), Some(ResultCode::Success));
    assert_eq!(
        svc.run_once(&mut hw, &mut sink),
        Ok(TickOutcome::Recovered { abandoned: 10 })
    );
    assert_eq!(hw.calls.last(), Some(&HardwareCall::Init));
    assert_eq!(svc.queue_len(), 0);
    assert_eq!(svc.status().health, Health::Nominal);

    // The interrupted AddFilter still gets its one answer.
    let answers = sink.for_message(1);
    assert_eq!(answers.len(), 1);
    assert_eq!(
        answers[0].result(),
        Some(ResultCode::ActionNotPerformedDueToState)
    );
}

#[test]
fn steps_after_reset_survive_recovery() {
    let mut svc = CabinetService::new(CabinetConfig::default());
    let mut hw = MockCabinet::new();
    let mut sink = RecordingSink::new();

    hw.state = HardwareState::Error;
    svc.handle_request(Request::new(1, Command::Reset), &mut sink);
    svc.handle_request(add_filter(2, "F1"), &mut sink);
    assert_eq!(
        svc.run_once(&mut hw, &mut sink),
        Ok(TickOutcome::Recovered { abandoned: 0 })
    );
    while svc.queue_len() > 0 {
        svc.run_once(&mut hw, &mut sink).unwrap();
    }
    assert_eq!(sink.for_message(2)[0].result(), Some(ResultCode::Success));
}

#[test]
fn reset_with_full_queue_flushes_and_restarts() {
    let mut svc = CabinetService::new(CabinetConfig::default());
    let mut hw = MockCabinet::new();
    let mut sink = RecordingSink::new();
    svc.handle_request(add_filter(1, "F1"), &mut sink);
    let mut id = 10;
    while svc.queue_len() < filterunit::steps::queue::QUEUE_CAPACITY {
        id += 1;
        svc.handle_request(Request::new(id, Command::CancelAddFilter), &mut sink);
    }
    hw.state = HardwareState::Error;

    svc.handle_request(Request::new(2, Command::Reset), &mut sink);
    assert_eq!(sink.for_message(2)[0].result(), Some(ResultCode::Success));
    assert_eq!(
        sink.for_message(1)[0].result(),
        Some(ResultCode::ActionNotPerformedDueToState)
    );
    assert_eq!(svc.queue_len(), 1);
    assert_eq!(
        svc.run_once(&mut hw, &mut sink),
        Ok(TickOutcome::Recovered { abandoned: 0 })
    );
}

#[test]
fn fault_is_logged_once() {
    let mut svc = CabinetService::new(CabinetConfig::default());
    let mut hw = MockCabinet::new();
    let mut sink = RecordingSink::new();
    hw.state = HardwareState::Error;
    for _ in 0..4 {
        let _ = svc.run_once(&mut hw, &mut sink);
    }
    let faults = svc
        .events()
        .iter()
        .filter(|e| e.text.contains("error state"))
        .count();
    assert_eq!(faults, 1);
}
