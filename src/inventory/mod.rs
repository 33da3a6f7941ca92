//! In-memory inventory of stored filters and named combinations.
//!
//! [`Inventory`] is the sole owner of every [`Filter`] and [`Combination`].
//! Combinations refer to their members by filter id, never by address, so
//! a removed filter can never leave a dangling member behind: removal
//! cascades to every combination that lists it.
//!
//! ```text
//!   drawers   1      2      3      4
//!           ┌────┐ ┌────┐ ┌────┐ ┌────┐
//!           │ F1 │ │ F2 │ │    │ │ F4 │      C1 = [F2, F4]
//!           └────┘ └────┘ └────┘ └────┘
//! ```

pub mod record;

use log::{debug, info, warn};

use crate::app::ports::RecordPort;
use crate::error::{RecordError, StoreError};

/// A filter disk stored in one drawer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Drawer index, 1-based.
    pub slot: u8,
    pub id: String,
    pub material: String,
    pub thickness: String,
}

/// An ordered group of filters assembled as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    pub id: String,
    pub name: String,
    /// Currently assembled in the bay.
    pub placed: bool,
    /// Member filter ids in stacking order.
    pub members: Vec<String>,
}

impl Combination {
    pub fn contains(&self, filter_id: &str) -> bool {
        self.members.iter().any(|m| m == filter_id)
    }
}

/// Filter and combination store with a fixed drawer count.
#[derive(Debug, Clone)]
pub struct Inventory {
    capacity: u8,
    filters: Vec<Filter>,
    combinations: Vec<Combination>,
}

impl Inventory {
    pub fn new(capacity: u8) -> Self {
        Self {
            capacity,
            filters: Vec::with_capacity(capacity as usize),
            combinations: Vec::new(),
        }
    }

    // ── Filters ───────────────────────────────────────────────

    /// Slot a filter with `id` would get, or why it cannot be added.
    pub fn has_capacity(&self, id: &str) -> Result<u8, StoreError> {
        if self.filters.len() >= self.capacity as usize {
            return Err(StoreError::CapacityExhausted);
        }
        if self.filter(id).is_some() {
            return Err(StoreError::DuplicateId);
        }
        // Lowest free drawer; equals count + 1 until a filter is removed.
        (1..=self.capacity)
            .find(|slot| self.filters.iter().all(|f| f.slot != *slot))
            .ok_or(StoreError::CapacityExhausted)
    }

    /// Store a new filter and return its slot.
    pub fn add_filter(
        &mut self,
        id: &str,
        material: &str,
        thickness: &str,
    ) -> Result<u8, StoreError> {
        let slot = self.has_capacity(id)?;
        for field in [id, material, thickness] {
            check_field(field)?;
        }
        self.filters.push(Filter {
            slot,
            id: id.to_owned(),
            material: material.to_owned(),
            thickness: thickness.to_owned(),
        });
        info!("Inventory: filter '{}' stored in drawer {}", id, slot);
        Ok(slot)
    }

    /// Remove a filter and every combination that lists it.
    ///
    /// Returns the ids of the combinations removed by the cascade.
    pub fn remove_filter(&mut self, id: &str) -> Result<Vec<String>, StoreError> {
        let Some(pos) = self.filters.iter().position(|f| f.id == id) else {
            warn!("Inventory: remove_filter '{}' not found", id);
            return Err(StoreError::NotFound);
        };

        let mut pruned = Vec::new();
        self.combinations.retain(|c| {
            if c.contains(id) {
                pruned.push(c.id.clone());
                false
            } else {
                true
            }
        });
        self.filters.remove(pos);

        if !pruned.is_empty() {
            info!("Inventory: removing '{}' pruned combinations {:?}", id, pruned);
        }
        Ok(pruned)
    }

    pub fn filter(&self, id: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.id == id)
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    // ── Combinations ──────────────────────────────────────────

    /// Store a combination.  `members` must already resolve.
    pub fn add_combination(
        &mut self,
        id: &str,
        name: &str,
        members: Vec<String>,
    ) -> Result<(), StoreError> {
        if self.combination(id).is_some() {
            return Err(StoreError::DuplicateId);
        }
        check_field(id)?;
        check_field(name)?;
        if let Some(missing) = members.iter().find(|m| self.filter(m).is_none()) {
            debug!("Inventory: combination '{}' member '{}' unresolved", id, missing);
            return Err(StoreError::NotFound);
        }
        self.combinations.push(Combination {
            id: id.to_owned(),
            name: name.to_owned(),
            placed: false,
            members,
        });
        info!("Inventory: combination '{}' added", id);
        Ok(())
    }

    pub fn remove_combination(&mut self, id: &str) -> Result<(), StoreError> {
        let Some(pos) = self.combinations.iter().position(|c| c.id == id) else {
            warn!("Inventory: remove_combination '{}' not found", id);
            return Err(StoreError::NotFound);
        };
        self.combinations.remove(pos);
        info!("Inventory: combination '{}' removed", id);
        Ok(())
    }

    pub fn combination(&self, id: &str) -> Option<&Combination> {
        self.combinations.iter().find(|c| c.id == id)
    }

    pub fn combinations(&self) -> &[Combination] {
        &self.combinations
    }

    /// The combination currently assembled, if any.
    pub fn placed_combination(&self) -> Option<&Combination> {
        self.combinations.iter().find(|c| c.placed)
    }

    /// Flip the `placed` flag of one combination.
    pub fn set_placed(&mut self, id: &str, placed: bool) -> Result<(), StoreError> {
        let combination = self
            .combinations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        combination.placed = placed;
        Ok(())
    }

    // ── Capacity ──────────────────────────────────────────────

    pub fn capacity(&self) -> u8 {
        self.capacity
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    pub fn empty_drawers(&self) -> usize {
        (self.capacity as usize).saturating_sub(self.filters.len())
    }

    // ── Persistence ───────────────────────────────────────────

    /// Write the whole inventory through `port`.
    pub fn persist(&self, port: &mut impl RecordPort) -> Result<(), RecordError> {
        let text = record::encode(self);
        port.write_record(&text).map_err(|e| {
            warn!("Inventory: persist failed: {}", e);
            RecordError::from(e)
        })?;
        debug!(
            "Inventory: persisted {} filters, {} combinations",
            self.filters.len(),
            self.combinations.len()
        );
        Ok(())
    }

    /// Replace the contents with the record read through `port`.
    ///
    /// On any error the current contents are left untouched.
    pub fn load(&mut self, port: &impl RecordPort) -> Result<(), RecordError> {
        let text = port.read_record().map_err(|e| {
            warn!("Inventory: load failed: {}", e);
            RecordError::from(e)
        })?;
        let loaded = record::decode(&text, self.capacity).map_err(|e| {
            warn!("Inventory: record unreadable: {}", e);
            e
        })?;
        *self = loaded;
        info!(
            "Inventory: loaded {} filters, {} combinations",
            self.filters.len(),
            self.combinations.len()
        );
        Ok(())
    }

    /// Insert a decoded filter as-is, keeping its recorded slot.
    fn restore_filter(&mut self, filter: Filter) -> Result<(), StoreError> {
        if self.filters.len() >= self.capacity as usize {
            return Err(StoreError::CapacityExhausted);
        }
        if self.filter(&filter.id).is_some() || self.filters.iter().any(|f| f.slot == filter.slot)
        {
            return Err(StoreError::DuplicateId);
        }
        self.filters.push(filter);
        Ok(())
    }
}

/// Fields end up in the comma/semicolon separated record.
fn check_field(text: &str) -> Result<(), StoreError> {
    if text.is_empty() || text.contains([',', ';', '\n', '\r']) {
        return Err(StoreError::InvalidField);
    }
    Ok(())
}
