//! Atomic hardware actions and the FIFO that sequences them.
//!
//! ```text
//!  CabinetService ──push_sequence──▶ ┌────────────┐ ──pop──▶ run_once ──▶ HardwarePort
//!   (only producer)                  │ ActionQueue│          (only consumer)   ResponseSink
//!                                    └────────────┘
//! ```
//!
//! A request expands into a run of [`Step`]s (see [`plans`]).  The executor
//! drains exactly one step per tick and never waits for the mechanics to
//! settle; the hardware's `Busy` state is the only thing that holds a tick
//! back.

pub mod executor;
pub mod plans;
pub mod queue;

use core::fmt;

use crate::app::ports::MagnetState;
use crate::app::responses::Response;

/// One atomic action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Push one drawer out (0 is the staging drawer).
    ExtendDrawer(u8),
    /// Pull every drawer in.
    RetractAllDrawers,
    /// Drive the crane to an absolute position.
    MoveCrane(i32),
    SetMagnet(MagnetState),
    /// Hand a finished response to the transport.
    DeliverResponse(Response),
    StopHardware,
    StartHardware,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtendDrawer(slot) => write!(f, "extend drawer {slot}"),
            Self::RetractAllDrawers => write!(f, "retract all drawers"),
            Self::MoveCrane(pos) => write!(f, "crane to {pos}"),
            Self::SetMagnet(MagnetState::On) => write!(f, "magnet on"),
            Self::SetMagnet(MagnetState::Off) => write!(f, "magnet off"),
            Self::DeliverResponse(r) => write!(f, "deliver response #{}", r.envelope.message_id),
            Self::StopHardware => write!(f, "stop hardware"),
            Self::StartHardware => write!(f, "start hardware"),
        }
    }
}
