//! Simulated cabinet, a stand-in for the register-level driver.
//!
//! Implements [`HardwarePort`] by tracking drawers, crane and magnet in
//! memory.  Every motion keeps the cabinet `Busy` for a configurable
//! number of [`advance`](SimulatedCabinet::advance) calls, which the bench
//! loop makes once per tick.  Faults can be injected to exercise the
//! recovery path.

use log::{debug, info, warn};

use crate::app::ports::{DrawerStatus, HardwarePort, HardwareState, MagnetState};

/// In-memory cabinet mechanics.
pub struct SimulatedCabinet {
    /// Drawer 0 is staging, so this holds `capacity + 1` flags.
    drawers_open: Vec<bool>,
    crane: i32,
    magnet: MagnetState,
    powered: bool,
    fault: bool,
    settle_ticks: u32,
    busy_remaining: u32,
    motions: u64,
}

impl SimulatedCabinet {
    /// A cabinet with `capacity` filter drawers plus the staging drawer.
    ///
    /// Each motion stays busy for `settle_ticks` calls to
    /// [`advance`](Self::advance); zero makes every motion instant.
    pub fn new(capacity: u8, settle_ticks: u32) -> Self {
        Self {
            drawers_open: vec![false; capacity as usize + 1],
            crane: 0,
            magnet: MagnetState::Off,
            powered: true,
            fault: false,
            settle_ticks,
            busy_remaining: 0,
            motions: 0,
        }
    }

    /// Let one tick of simulated time pass.
    pub fn advance(&mut self) {
        self.busy_remaining = self.busy_remaining.saturating_sub(1);
    }

    /// Drive the cabinet into its error state until the next `init()`.
    pub fn inject_fault(&mut self) {
        warn!("SimulatedCabinet: fault injected");
        self.fault = true;
    }

    pub fn crane_position(&self) -> i32 {
        self.crane
    }

    pub fn magnet(&self) -> MagnetState {
        self.magnet
    }

    pub fn is_open(&self, slot: u8) -> bool {
        self.drawers_open.get(slot as usize).copied().unwrap_or(false)
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Motions accepted since construction.
    pub fn motions(&self) -> u64 {
        self.motions
    }

    /// Start a motion; `false` if the mechanics are powered down.
    fn begin_motion(&mut self, what: &str) -> bool {
        if !self.powered {
            warn!("SimulatedCabinet: {} ignored, mechanics stopped", what);
            return false;
        }
        debug!("SimulatedCabinet: {}", what);
        self.motions += 1;
        self.busy_remaining = self.settle_ticks;
        true
    }
}

impl HardwarePort for SimulatedCabinet {
    fn init(&mut self) {
        self.fault = false;
        self.powered = true;
        self.busy_remaining = 0;
        info!("SimulatedCabinet: initialised");
    }

    fn deinit(&mut self) {
        self.powered = false;
        self.busy_remaining = 0;
        self.magnet = MagnetState::Off;
        info!("SimulatedCabinet: stopped");
    }

    fn state(&self) -> HardwareState {
        if self.fault {
            HardwareState::Error
        } else if self.busy_remaining > 0 {
            HardwareState::Busy
        } else {
            HardwareState::Idle
        }
    }

    fn open_drawer(&mut self, slot: u8) -> DrawerStatus {
        if slot as usize >= self.drawers_open.len() {
            return DrawerStatus::NoMoreDrawers;
        }
        if self.begin_motion("open drawer") {
            self.drawers_open[slot as usize] = true;
        }
        DrawerStatus::Done
    }

    fn close_drawer(&mut self, slot: u8) -> DrawerStatus {
        let Some(open) = self.drawers_open.get(slot as usize).copied() else {
            return DrawerStatus::NoMoreDrawers;
        };
        if open && self.begin_motion("close drawer") {
            self.drawers_open[slot as usize] = false;
        }
        DrawerStatus::Done
    }

    fn move_crane(&mut self, position: i32) {
        if self.crane != position && self.begin_motion("move crane") {
            self.crane = position;
        }
    }

    fn set_magnet(&mut self, state: MagnetState) {
        if self.powered {
            self.magnet = state;
        }
    }
}
