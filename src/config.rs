//! Cabinet configuration parameters
//!
//! Drawer count, crane geometry and loop timing for one cabinet.
//! Values can be overridden through the JSON config file at start-up.

use serde::{Deserialize, Serialize};

/// Upper bound on drawers; the staging drawer plus this many must fit the
/// crane position table.
pub const MAX_DRAWERS: u8 = 32;

/// Core cabinet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CabinetConfig {
    // --- Storage ---
    /// Number of filter drawers (excluding the staging drawer 0)
    pub drawer_capacity: u8,
    /// Path of the durable inventory record
    pub record_path: String,

    // --- Crane geometry ---
    /// Crane parking position
    pub crane_home: i32,
    /// Crane position per drawer; index 0 is the staging drawer
    pub slot_positions: Vec<i32>,
    /// Distance between stacked combination members in the bay
    pub bay_pitch: i32,

    // --- Timing ---
    /// Main loop tick interval (milliseconds)
    pub tick_interval_ms: u32,
    /// Ticks a dirty inventory waits before it is written out
    pub autosave_after_ticks: u32,
}

impl Default for CabinetConfig {
    fn default() -> Self {
        Self {
            // Storage
            drawer_capacity: 4,
            record_path: "database.txt".into(),

            // Crane geometry
            crane_home: 0,
            slot_positions: vec![140, 105, 75, 35, 0],
            bay_pitch: 10,

            // Timing
            tick_interval_ms: 50,      // 20 Hz
            autosave_after_ticks: 100, // 5 s at 20 Hz
        }
    }
}

impl CabinetConfig {
    /// Range-check every field.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(1..=MAX_DRAWERS).contains(&self.drawer_capacity) {
            return Err("drawer_capacity must be 1–32");
        }
        if self.slot_positions.len() != self.drawer_capacity as usize + 1 {
            return Err("slot_positions must hold staging plus one entry per drawer");
        }
        if self.bay_pitch <= 0 {
            return Err("bay_pitch must be positive");
        }
        if self.record_path.trim().is_empty() {
            return Err("record_path must not be empty");
        }
        if !(1..=10_000).contains(&self.tick_interval_ms) {
            return Err("tick_interval_ms must be 1–10000");
        }
        if self.autosave_after_ticks == 0 {
            return Err("autosave_after_ticks must be non-zero");
        }
        Ok(())
    }
}
