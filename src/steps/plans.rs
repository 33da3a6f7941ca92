//! Physical step sequences for each command.
//!
//! Pure functions of the crane geometry and the drawers involved.  The
//! caller appends the terminal [`Step::DeliverResponse`] where needed.
//!
//! Combination members are parked in the bay one pitch apart, counting down
//! from the staging position, so member `i` sits at
//! `staging - i * bay_pitch`.  Unplacing walks members in reverse, which
//! makes its crane moves the exact mirror of the place sequence.

use crate::app::ports::MagnetState;
use crate::config::CabinetConfig;

use super::Step;

/// Staging drawer index.
pub const STAGING_DRAWER: u8 = 0;

/// Crane positions derived from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraneLayout {
    home: i32,
    /// Index 0 is the staging drawer.
    slot_positions: Vec<i32>,
    bay_pitch: i32,
}

impl CraneLayout {
    pub fn from_config(config: &CabinetConfig) -> Self {
        Self {
            home: config.crane_home,
            slot_positions: config.slot_positions.clone(),
            bay_pitch: config.bay_pitch,
        }
    }

    pub fn home(&self) -> i32 {
        self.home
    }

    pub fn staging(&self) -> i32 {
        self.slot(STAGING_DRAWER)
    }

    /// Crane position over drawer `slot`.  Validated config covers every
    /// drawer; an index past the table parks at home.
    pub fn slot(&self, slot: u8) -> i32 {
        self.slot_positions
            .get(slot as usize)
            .copied()
            .unwrap_or(self.home)
    }

    /// Bay position for the `index`-th combination member.
    pub fn bay(&self, index: usize) -> i32 {
        self.staging() - index as i32 * self.bay_pitch
    }
}

/// Take a filter from the staging drawer and file it into `slot`.
pub fn add_filter(layout: &CraneLayout, slot: u8) -> Vec<Step> {
    vec![
        Step::MoveCrane(layout.home()),
        Step::RetractAllDrawers,
        Step::MoveCrane(layout.staging()),
        Step::SetMagnet(MagnetState::On),
        Step::MoveCrane(layout.home()),
        Step::ExtendDrawer(slot),
        Step::MoveCrane(layout.slot(slot)),
        Step::SetMagnet(MagnetState::Off),
        Step::MoveCrane(layout.home()),
        Step::RetractAllDrawers,
    ]
}

/// Present the empty staging drawer.
pub fn request_add_filter(layout: &CraneLayout) -> Vec<Step> {
    vec![
        Step::MoveCrane(layout.home()),
        Step::ExtendDrawer(STAGING_DRAWER),
    ]
}

pub fn cancel_add_filter() -> Vec<Step> {
    vec![Step::RetractAllDrawers]
}

/// Park the crane after the operator took a filter away.
pub fn remove_filter(layout: &CraneLayout) -> Vec<Step> {
    vec![Step::MoveCrane(layout.home()), Step::RetractAllDrawers]
}

/// Carry the filter in `slot` to the staging drawer.
pub fn request_remove_filter(layout: &CraneLayout, slot: u8) -> Vec<Step> {
    vec![
        Step::MoveCrane(layout.home()),
        Step::RetractAllDrawers,
        Step::ExtendDrawer(slot),
        Step::MoveCrane(layout.slot(slot)),
        Step::SetMagnet(MagnetState::On),
        Step::RetractAllDrawers,
        Step::MoveCrane(layout.staging()),
        Step::SetMagnet(MagnetState::Off),
        Step::MoveCrane(layout.home()),
        Step::ExtendDrawer(STAGING_DRAWER),
    ]
}

pub fn cancel_remove_filter(layout: &CraneLayout) -> Vec<Step> {
    vec![Step::MoveCrane(layout.home()), Step::RetractAllDrawers]
}

/// Stack the filters in `slots` (stacking order) into the bay.
pub fn place_combination(layout: &CraneLayout, slots: &[u8]) -> Vec<Step> {
    let mut steps = vec![Step::RetractAllDrawers, Step::MoveCrane(layout.home())];
    for (i, &slot) in slots.iter().enumerate() {
        steps.extend([
            Step::ExtendDrawer(slot),
            Step::MoveCrane(layout.slot(slot)),
            Step::SetMagnet(MagnetState::On),
            Step::MoveCrane(layout.home()),
            Step::RetractAllDrawers,
            Step::MoveCrane(layout.bay(i)),
            Step::SetMagnet(MagnetState::Off),
            Step::MoveCrane(layout.home()),
        ]);
    }
    steps.push(Step::ExtendDrawer(STAGING_DRAWER));
    steps
}

/// Return the stacked filters in `slots` (stacking order) to their drawers.
pub fn unplace_combination(layout: &CraneLayout, slots: &[u8]) -> Vec<Step> {
    let mut steps = vec![Step::RetractAllDrawers, Step::MoveCrane(layout.home())];
    for (i, &slot) in slots.iter().enumerate().rev() {
        steps.extend([
            Step::MoveCrane(layout.bay(i)),
            Step::SetMagnet(MagnetState::On),
            Step::MoveCrane(layout.home()),
            Step::ExtendDrawer(slot),
            Step::MoveCrane(layout.slot(slot)),
            Step::SetMagnet(MagnetState::Off),
            Step::MoveCrane(layout.home()),
            Step::RetractAllDrawers,
        ]);
    }
    steps
}

/// Crane targets of a sequence, in order.
pub fn crane_moves(steps: &[Step]) -> Vec<i32> {
    steps
        .iter()
        .filter_map(|s| match s {
            Step::MoveCrane(pos) => Some(*pos),
            _ => None,
        })
        .collect()
}
