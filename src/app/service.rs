//! Application service: the hexagonal core.
//!
//! [`CabinetService`] owns the inventory, the action queue and the
//! diagnostics log.  It exposes a hardware-agnostic API: every request is
//! validated against the inventory, expanded into queued [`Step`]s, and
//! answered with exactly one [`Response`] (place and unplace add a
//! completion callback).  All I/O flows through port traits injected at
//! call sites, so the whole service runs against mock adapters in tests.
//!
//! ```text
//!  RawRequest ──▶ ┌──────────────────────────┐ ──▶ ResponseSink
//!                 │      CabinetService       │
//! HardwarePort ◀──│ Inventory · Queue · Log   │ ◀─▶ RecordPort
//!                 └──────────────────────────┘
//! ```
//!
//! Validation always runs before the free-queue check, and the free-queue
//! check before any inventory mutation, so a rejected request never leaves
//! a trace in the store.

use log::{Level, debug, info};

use crate::config::CabinetConfig;
use crate::diagnostics::{EventLog, Health, SystemStatus, VERSION};
use crate::error::{HardwareFault, RecordError, StoreError};
use crate::inventory::Inventory;
use crate::steps::executor::{self, TickOutcome};
use crate::steps::plans::{self, CraneLayout};
use crate::steps::queue::ActionQueue;
use crate::steps::Step;

use super::commands::{Command, CommandTag, Envelope, RawRequest, Request};
use super::ports::{HardwarePort, RecordPort, ResponseSink, StorageError};
use super::responses::Response;
use super::result::ResultCode;

// ───────────────────────────────────────────────────────────────
// CabinetService
// ───────────────────────────────────────────────────────────────

/// Command dispatcher and step producer for one cabinet.
pub struct CabinetService {
    config: CabinetConfig,
    layout: CraneLayout,
    inventory: Inventory,
    queue: ActionQueue,
    /// Id of the combination committed to the bay.
    placed: Option<String>,
    events: EventLog,
    /// Set by an errored tick, cleared by the next good one.
    faulted: bool,
    tick_count: u64,
    dirty: bool,
    dirty_since_tick: u64,
}

impl CabinetService {
    /// Construct an empty cabinet from (already validated) configuration.
    pub fn new(config: CabinetConfig) -> Self {
        let layout = CraneLayout::from_config(&config);
        let inventory = Inventory::new(config.drawer_capacity);
        Self {
            config,
            layout,
            inventory,
            queue: ActionQueue::new(),
            placed: None,
            events: EventLog::new(),
            faulted: false,
            tick_count: 0,
            dirty: false,
            dirty_since_tick: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load the durable record and re-derive the placed combination.
    ///
    /// On error the inventory stays as it was (empty at start-up).
    pub fn restore(&mut self, port: &impl RecordPort) -> Result<(), RecordError> {
        match self.inventory.load(port) {
            Ok(()) => {
                self.placed = self.inventory.placed_combination().map(|c| c.id.clone());
                self.dirty = false;
                let text = format!(
                    "Record loaded: {} filters, {} combinations",
                    self.inventory.filter_count(),
                    self.inventory.combinations().len()
                );
                self.events.record(self.tick_count, Level::Info, &text);
                Ok(())
            }
            Err(RecordError::Storage(StorageError::NotFound)) => {
                info!("CabinetService: no record yet, starting empty");
                Err(RecordError::Storage(StorageError::NotFound))
            }
            Err(e) => {
                let text = format!("Record load failed: {e}");
                self.events.record(self.tick_count, Level::Error, &text);
                Err(e)
            }
        }
    }

    // ── Request handling ──────────────────────────────────────

    /// Decode and handle a request as the transport delivered it.
    pub fn handle_raw(&mut self, raw: RawRequest, sink: &mut impl ResponseSink) {
        let envelope = raw.envelope;
        match raw.decode() {
            Ok(request) => self.handle_request(request, sink),
            Err(code) => {
                let text = format!("Request #{} rejected: {:?}", envelope.message_id, code);
                self.events.record(self.tick_count, Level::Warn, &text);
                sink.deliver(Response::new(envelope.reply(), code));
            }
        }
    }

    /// Validate one request, queue its steps, and answer it.
    pub fn handle_request(&mut self, request: Request, sink: &mut impl ResponseSink) {
        let Request { envelope, command } = request;
        debug!("CabinetService: request #{} {:?}", envelope.message_id, command);

        let outcome = match command {
            Command::AddFilter {
                id,
                material,
                thickness,
            } => self.add_filter(&envelope, &id, &material, &thickness),
            Command::RequestAddFilter { id } => self.request_add_filter(&envelope, &id),
            Command::CancelAddFilter => self.immediate_steps(&envelope, plans::cancel_add_filter()),
            Command::RemoveFilter { id } => self.remove_filter(&envelope, &id),
            Command::RequestRemoveFilter { id } => self.request_remove_filter(&envelope, &id),
            Command::CancelRemoveFilter => {
                let steps = plans::cancel_remove_filter(&self.layout);
                self.immediate_steps(&envelope, steps)
            }
            Command::GetFilters => Ok(Some(self.filter_listing(&envelope))),
            Command::AddCombination { id, name, members } => {
                self.add_combination(&envelope, &id, &name, members)
            }
            Command::RemoveCombination { id } => self.remove_combination(&envelope, &id),
            Command::GetCombinations => Ok(Some(self.combination_listing(&envelope))),
            Command::PlaceCombination { id } => self.place_combination(&envelope, &id),
            Command::UnplaceCombination => self.unplace_combination(&envelope),
            Command::GetSystemStatus => Ok(Some(self.status_response(&envelope))),
            Command::GetSystemLog => Ok(Some(
                Response::new(envelope.reply(), ResultCode::Success).with(self.events.render()),
            )),
            Command::Stop => self.immediate_steps(&envelope, vec![Step::StopHardware]),
            Command::Reset => self.reset(&envelope, sink),
            Command::Unknown(code) => Err(self.reject(
                &envelope,
                ResultCode::UnknownMessage,
                &format!("unknown command code {code}"),
            )),
        };

        match outcome {
            // Answered now.
            Ok(Some(response)) => sink.deliver(response),
            // Answer travels at the end of the queued steps.
            Ok(None) => {}
            Err(code) => sink.deliver(Response::new(envelope.reply(), code)),
        }
    }

    // ── Filters ───────────────────────────────────────────────

    fn add_filter(
        &mut self,
        env: &Envelope,
        id: &str,
        material: &str,
        thickness: &str,
    ) -> Result<Option<Response>, ResultCode> {
        let slot = self
            .inventory
            .has_capacity(id)
            .map_err(|e| self.reject_store(env, e, id))?;
        let steps = with_reply(plans::add_filter(&self.layout, slot), env);
        self.ensure_room(env, &steps)?;
        self.inventory
            .add_filter(id, material, thickness)
            .map_err(|e| self.reject_store(env, e, id))?;
        self.mark_dirty();
        self.enqueue(steps);
        self.note(Level::Info, &format!("Filter {id} added to drawer {slot}"));
        Ok(None)
    }

    fn request_add_filter(&mut self, env: &Envelope, id: &str) -> Result<Option<Response>, ResultCode> {
        self.inventory
            .has_capacity(id)
            .map_err(|e| self.reject_store(env, e, id))?;
        let steps = with_reply(plans::request_add_filter(&self.layout), env);
        self.ensure_room(env, &steps)?;
        self.enqueue(steps);
        self.note(Level::Info, &format!("Staging drawer opened for {id}"));
        Ok(None)
    }

    fn remove_filter(&mut self, env: &Envelope, id: &str) -> Result<Option<Response>, ResultCode> {
        if self.inventory.filter(id).is_none() {
            return Err(self.reject(env, ResultCode::InvalidParameter, &format!("filter {id} unknown")));
        }
        let steps = with_reply(plans::remove_filter(&self.layout), env);
        self.ensure_room(env, &steps)?;
        let pruned = self
            .inventory
            .remove_filter(id)
            .map_err(|e| self.reject_store(env, e, id))?;
        if let Some(stack) = self.placed.take_if(|p| pruned.contains(p)) {
            let why = format!("Combination {stack} dropped while placed, bay holds its other members");
            self.note(Level::Warn, &why);
        }
        self.mark_dirty();
        self.enqueue(steps);
        let text = if pruned.is_empty() {
            format!("Filter {id} removed")
        } else {
            format!("Filter {id} removed with combinations {}", pruned.join(" "))
        };
        self.note(Level::Info, &text);
        Ok(None)
    }

    fn request_remove_filter(&mut self, env: &Envelope, id: &str) -> Result<Option<Response>, ResultCode> {
        let Some(slot) = self.inventory.filter(id).map(|f| f.slot) else {
            return Err(self.reject(env, ResultCode::InvalidParameter, &format!("filter {id} unknown")));
        };
        let steps = with_reply(plans::request_remove_filter(&self.layout, slot), env);
        self.ensure_room(env, &steps)?;
        self.enqueue(steps);
        self.note(Level::Info, &format!("Filter {id} brought to staging"));
        Ok(None)
    }

    fn filter_listing(&self, env: &Envelope) -> Response {
        let mut response = Response::new(env.reply(), ResultCode::Success);
        for f in self.inventory.filters() {
            response.push(f.id.as_str());
            response.push(f.material.as_str());
            response.push(f.thickness.as_str());
        }
        response
    }

    // ── Combinations ──────────────────────────────────────────

    fn add_combination(
        &mut self,
        env: &Envelope,
        id: &str,
        name: &str,
        members: Vec<String>,
    ) -> Result<Option<Response>, ResultCode> {
        if let Some(missing) = members.iter().find(|m| self.inventory.filter(m).is_none()) {
            let why = format!("combination {id} member {missing} unknown");
            return Err(self.reject(env, ResultCode::FilterCombinationError, &why));
        }
        self.inventory
            .add_combination(id, name, members)
            .map_err(|e| match e {
                StoreError::NotFound => self.reject(env, ResultCode::FilterCombinationError, id),
                other => self.reject_store(env, other, id),
            })?;
        self.mark_dirty();
        self.note(Level::Info, &format!("Combination {id} added"));
        Ok(Some(Response::new(env.reply(), ResultCode::Success)))
    }

    fn remove_combination(&mut self, env: &Envelope, id: &str) -> Result<Option<Response>, ResultCode> {
        self.inventory
            .remove_combination(id)
            .map_err(|e| self.reject_store(env, e, id))?;
        if self.placed.as_deref() == Some(id) {
            self.placed = None;
        }
        self.mark_dirty();
        self.note(Level::Info, &format!("Combination {id} removed"));
        Ok(Some(Response::new(env.reply(), ResultCode::Success)))
    }

    fn combination_listing(&self, env: &Envelope) -> Response {
        let mut response = Response::new(env.reply(), ResultCode::Success);
        for c in self.inventory.combinations() {
            response.push(c.id.as_str());
            response.push(c.name.as_str());
            response.push(if c.placed { "true" } else { "false" });
            response.push(c.members.len().to_string());
            for m in &c.members {
                response.push(m.as_str());
            }
        }
        response
    }

    fn place_combination(&mut self, env: &Envelope, id: &str) -> Result<Option<Response>, ResultCode> {
        if let Some(current) = &self.placed {
            let why = format!("place {id} refused, {current} already placed");
            return Err(self.reject(env, ResultCode::FilterCombinationError, &why));
        }
        let Some(slots) = self.member_slots(id) else {
            let why = format!("combination {id} unknown");
            return Err(self.reject(env, ResultCode::FilterCombinationError, &why));
        };

        let mut steps = plans::place_combination(&self.layout, &slots);
        steps.push(Step::DeliverResponse(Response::new(
            env.reply_as(CommandTag::PlaceCombinationCallback),
            ResultCode::Success,
        )));
        self.ensure_room(env, &steps)?;

        self.inventory
            .set_placed(id, true)
            .map_err(|e| self.reject_store(env, e, id))?;
        self.placed = Some(id.to_owned());
        self.mark_dirty();
        self.enqueue(steps);
        self.note(Level::Info, &format!("Combination {id} placing"));
        Ok(Some(Response::new(env.reply(), ResultCode::Success)))
    }

    fn unplace_combination(&mut self, env: &Envelope) -> Result<Option<Response>, ResultCode> {
        let Some(id) = self.placed.clone() else {
            return Err(self.reject(env, ResultCode::FilterCombinationError, "nothing placed"));
        };
        let Some(slots) = self.member_slots(&id) else {
            // The reference outlived its combination; drop it.
            self.placed = None;
            let why = format!("placed combination {id} vanished");
            return Err(self.reject(env, ResultCode::FilterCombinationError, &why));
        };

        let mut steps = plans::unplace_combination(&self.layout, &slots);
        steps.push(Step::DeliverResponse(Response::new(
            env.reply_as(CommandTag::RemoveCombinationCallback),
            ResultCode::Success,
        )));
        self.ensure_room(env, &steps)?;

        self.inventory
            .set_placed(&id, false)
            .map_err(|e| self.reject_store(env, e, &id))?;
        self.placed = None;
        self.mark_dirty();
        self.enqueue(steps);
        self.note(Level::Info, &format!("Combination {id} returning"));
        Ok(Some(Response::new(env.reply(), ResultCode::Success)))
    }

    /// Drawer of every member, in stacking order.
    fn member_slots(&self, id: &str) -> Option<Vec<u8>> {
        let combination = self.inventory.combination(id)?;
        Some(
            combination
                .members
                .iter()
                .filter_map(|m| self.inventory.filter(m).map(|f| f.slot))
                .collect(),
        )
    }

    // ── System ────────────────────────────────────────────────

    fn status_response(&self, env: &Envelope) -> Response {
        let status = self.status();
        Response::new(env.reply(), ResultCode::Success)
            .with(status.health.as_str())
            .with(status.version)
            .with(status.empty_drawers.to_string())
    }

    /// Queue a restart.  A full queue is abandoned rather than refusing,
    /// so a jammed cabinet can always be brought back.
    fn reset(&mut self, env: &Envelope, sink: &mut impl ResponseSink) -> Result<Option<Response>, ResultCode> {
        if self.queue.free() == 0 {
            let mut abandoned = 0;
            while let Some(step) = self.queue.pop() {
                if let Step::DeliverResponse(mut response) = step {
                    response.set_result(ResultCode::ActionNotPerformedDueToState);
                    sink.deliver(response);
                }
                abandoned += 1;
            }
            self.note(Level::Warn, &format!("Reset flushed {abandoned} queued steps"));
        }
        self.immediate_steps(env, vec![Step::StartHardware])
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Drain at most one step.
    pub fn run_once(
        &mut self,
        hw: &mut impl HardwarePort,
        sink: &mut impl ResponseSink,
    ) -> Result<TickOutcome, HardwareFault> {
        self.tick_count += 1;
        match executor::run_once(&mut self.queue, hw, sink) {
            Ok(outcome) => {
                if let TickOutcome::Recovered { abandoned } = outcome {
                    let text = format!("Hardware restarted, {abandoned} steps abandoned");
                    self.events.record(self.tick_count, Level::Warn, &text);
                }
                if self.faulted {
                    self.faulted = false;
                    self.events.record(self.tick_count, Level::Info, "Hardware fault cleared");
                }
                Ok(outcome)
            }
            Err(fault) => {
                if !self.faulted {
                    self.faulted = true;
                    self.events
                        .record(self.tick_count, Level::Error, "Hardware error state, queue halted");
                }
                Err(fault)
            }
        }
    }

    // ── Persistence ───────────────────────────────────────────

    /// Write the inventory now.
    pub fn save(&mut self, port: &mut impl RecordPort) -> Result<(), RecordError> {
        match self.inventory.persist(port) {
            Ok(()) => {
                self.dirty = false;
                info!("CabinetService: record saved");
                Ok(())
            }
            Err(e) => {
                let text = format!("Record save failed: {e}");
                self.events.record(self.tick_count, Level::Error, &text);
                Err(e)
            }
        }
    }

    /// Save once the store has been dirty for `autosave_after_ticks` ticks.
    /// Returns `true` if the record was written.
    pub fn auto_save_if_needed(&mut self, port: &mut impl RecordPort) -> bool {
        if !self.dirty {
            return false;
        }
        let waited = self.tick_count.saturating_sub(self.dirty_since_tick);
        if waited < u64::from(self.config.autosave_after_ticks) {
            return false;
        }
        if self.save(port).is_ok() {
            true
        } else {
            // Retry after another full interval.
            self.dirty_since_tick = self.tick_count;
            false
        }
    }

    /// Save if anything changed since the last write (call before exit).
    pub fn force_save_if_dirty(&mut self, port: &mut impl RecordPort) -> Result<(), RecordError> {
        if self.dirty { self.save(port) } else { Ok(()) }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            health: if self.faulted {
                Health::Fault
            } else {
                Health::Nominal
            },
            version: VERSION,
            empty_drawers: self.inventory.empty_drawers(),
            queued_steps: self.queue.len(),
            ticks: self.tick_count,
        }
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Id of the combination committed to the bay.
    pub fn placed(&self) -> Option<&str> {
        self.placed.as_deref()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_steps(&self) -> impl Iterator<Item = &Step> {
        self.queue.iter()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &CabinetConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Queue `steps` and acknowledge straight away.
    fn immediate_steps(&mut self, env: &Envelope, steps: Vec<Step>) -> Result<Option<Response>, ResultCode> {
        self.ensure_room(env, &steps)?;
        self.enqueue(steps);
        Ok(Some(Response::new(env.reply(), ResultCode::Success)))
    }

    fn ensure_room(&mut self, env: &Envelope, steps: &[Step]) -> Result<(), ResultCode> {
        if steps.len() > self.queue.free() {
            let why = format!("{} steps do not fit ({} free)", steps.len(), self.queue.free());
            return Err(self.reject(env, ResultCode::ServerBusy, &why));
        }
        Ok(())
    }

    fn enqueue(&mut self, steps: Vec<Step>) {
        // Room was checked by ensure_room; a refusal here means nothing was queued.
        if self.queue.push_sequence(steps).is_err() {
            self.note(Level::Error, "Step sequence dropped, queue full");
        }
    }

    fn reject(&mut self, env: &Envelope, code: ResultCode, why: &str) -> ResultCode {
        let text = format!("Request #{} rejected ({:?}): {}", env.message_id, code, why);
        self.events.record(self.tick_count, Level::Warn, &text);
        code
    }

    fn reject_store(&mut self, env: &Envelope, e: StoreError, id: &str) -> ResultCode {
        self.reject(env, ResultCode::from(e), &format!("{id}: {e}"))
    }

    fn note(&mut self, level: Level, text: &str) {
        self.events.record(self.tick_count, level, text);
    }

    fn mark_dirty(&mut self) {
        if !self.dirty {
            self.dirty = true;
            self.dirty_since_tick = self.tick_count;
        }
    }
}

/// Append the deferred success reply to a physical plan.
fn with_reply(mut steps: Vec<Step>, env: &Envelope) -> Vec<Step> {
    steps.push(Step::DeliverResponse(Response::new(
        env.reply(),
        ResultCode::Success,
    )));
    steps
}
