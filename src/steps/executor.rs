//! One-step-per-tick executor.
//!
//! Each call to [`run_once`] does at most one unit of work:
//!
//! 1. Hardware in `Error` → surface [`HardwareFault`], pop nothing
//!    (unless a queued `StartHardware` can recover it, see below).
//! 2. Queue empty or hardware `Busy` → nothing this tick.
//! 3. Otherwise pop one step and run it.
//!
//! The returned `hardware_pending` flag is informational: it does not hold
//! back the next tick.  Only the hardware's own `Busy` state does.
//!
//! ## Fault recovery
//!
//! A faulted cabinet cannot drain its queue, so a `StartHardware` queued
//! behind other work would never run.  When the hardware is in `Error` and
//! the queue holds a `StartHardware`, the tick abandons every step ahead of
//! it, answers each abandoned response with
//! [`ResultCode::ActionNotPerformedDueToState`], and re-initialises the
//! hardware.

use log::{debug, error, info, warn};

use crate::app::ports::{DrawerStatus, HardwarePort, HardwareState, ResponseSink};
use crate::app::result::ResultCode;
use crate::error::HardwareFault;

use super::Step;
use super::queue::ActionQueue;

/// Safety bound on the close-drawer sweep.
const MAX_DRAWER_SWEEP: u8 = u8::MAX;

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing queued.
    Idle,
    /// Hardware still settling; step left in the queue.
    Busy,
    /// One step ran.
    Executed {
        step: Step,
        /// The mechanics may still be moving.
        hardware_pending: bool,
    },
    /// A faulted cabinet was re-initialised after dropping `abandoned` steps.
    Recovered { abandoned: usize },
}

/// Run at most one queued step.
pub fn run_once(
    queue: &mut ActionQueue,
    hw: &mut impl HardwarePort,
    sink: &mut impl ResponseSink,
) -> Result<TickOutcome, HardwareFault> {
    match hw.state() {
        HardwareState::Error => {
            if queue.contains(|s| matches!(s, Step::StartHardware)) {
                return Ok(recover(queue, hw, sink));
            }
            error!("Executor: hardware in error state, queue halted ({} pending)", queue.len());
            return Err(HardwareFault);
        }
        HardwareState::Busy => return Ok(TickOutcome::Busy),
        HardwareState::Idle => {}
    }

    let Some(step) = queue.pop() else {
        return Ok(TickOutcome::Idle);
    };

    debug!("Executor: {}", step);
    let hardware_pending = execute(&step, hw, sink);
    if hardware_pending {
        debug!("Executor: waiting for hardware");
    }
    Ok(TickOutcome::Executed {
        step,
        hardware_pending,
    })
}

/// Carry out one step.  Returns whether the hardware may still be busy.
fn execute(step: &Step, hw: &mut impl HardwarePort, sink: &mut impl ResponseSink) -> bool {
    match step {
        Step::ExtendDrawer(slot) => {
            if hw.open_drawer(*slot) == DrawerStatus::NoMoreDrawers {
                warn!("Executor: drawer {} does not exist", slot);
            }
            true
        }
        Step::RetractAllDrawers => {
            for slot in 0..MAX_DRAWER_SWEEP {
                if hw.close_drawer(slot) == DrawerStatus::NoMoreDrawers {
                    break;
                }
            }
            true
        }
        Step::MoveCrane(pos) => {
            hw.move_crane(*pos);
            true
        }
        Step::SetMagnet(state) => {
            hw.set_magnet(*state);
            true
        }
        Step::DeliverResponse(response) => {
            sink.deliver(response.clone());
            false
        }
        Step::StopHardware => {
            info!("Executor: stopping hardware");
            hw.deinit();
            true
        }
        Step::StartHardware => {
            info!("Executor: starting hardware");
            hw.init();
            true
        }
    }
}

fn recover(
    queue: &mut ActionQueue,
    hw: &mut impl HardwarePort,
    sink: &mut impl ResponseSink,
) -> TickOutcome {
    let mut abandoned = 0;
    while let Some(step) = queue.pop() {
        match step {
            Step::StartHardware => break,
            Step::DeliverResponse(mut response) => {
                response.set_result(ResultCode::ActionNotPerformedDueToState);
                sink.deliver(response);
                abandoned += 1;
            }
            _ => abandoned += 1,
        }
    }
    warn!("Executor: recovering from hardware error, {} steps abandoned", abandoned);
    hw.init();
    TickOutcome::Recovered { abandoned }
}
