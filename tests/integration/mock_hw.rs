//! Mock adapters for integration tests.
//!
//! Records every hardware call so tests can assert on the full command
//! history without a real cabinet.

use filterunit::app::commands::CommandTag;
use filterunit::app::ports::{
    DrawerStatus, HardwarePort, HardwareState, MagnetState, RecordPort, ResponseSink, StorageError,
};
use filterunit::app::responses::Response;
use filterunit::app::result::ResultCode;

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareCall {
    Init,
    Deinit,
    Open(u8),
    Close(u8),
    Crane(i32),
    Magnet(MagnetState),
}

// ── MockCabinet ───────────────────────────────────────────────

pub struct MockCabinet {
    pub calls: Vec<HardwareCall>,
    pub state: HardwareState,
    /// Highest drawer index, staging included.
    pub last_drawer: u8,
}

#[allow(dead_code)]
impl MockCabinet {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            state: HardwareState::Idle,
            last_drawer: 4,
        }
    }

    /// Crane targets in call order.
    pub fn crane_moves(&self) -> Vec<i32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HardwareCall::Crane(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Calls other than the drawer sweep's closes.
    pub fn without_closes(&self) -> Vec<HardwareCall> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, HardwareCall::Close(_)))
            .cloned()
            .collect()
    }
}

impl Default for MockCabinet {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwarePort for MockCabinet {
    fn init(&mut self) {
        self.calls.push(HardwareCall::Init);
        self.state = HardwareState::Idle;
    }

    fn deinit(&mut self) {
        self.calls.push(HardwareCall::Deinit);
    }

    fn state(&self) -> HardwareState {
        self.state
    }

    fn open_drawer(&mut self, slot: u8) -> DrawerStatus {
        if slot > self.last_drawer {
            return DrawerStatus::NoMoreDrawers;
        }
        self.calls.push(HardwareCall::Open(slot));
        DrawerStatus::Done
    }

    fn close_drawer(&mut self, slot: u8) -> DrawerStatus {
        if slot > self.last_drawer {
            return DrawerStatus::NoMoreDrawers;
        }
        self.calls.push(HardwareCall::Close(slot));
        DrawerStatus::Done
    }

    fn move_crane(&mut self, position: i32) {
        self.calls.push(HardwareCall::Crane(position));
    }

    fn set_magnet(&mut self, state: MagnetState) {
        self.calls.push(HardwareCall::Magnet(state));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub responses: Vec<Response>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<ResultCode> {
        self.responses.iter().filter_map(Response::result).collect()
    }

    pub fn last(&self) -> &Response {
        self.responses.last().expect("no response delivered")
    }

    pub fn for_message(&self, id: u32) -> Vec<&Response> {
        self.responses
            .iter()
            .filter(|r| r.envelope.message_id == id)
            .collect()
    }

    pub fn callbacks(&self, tag: CommandTag) -> usize {
        self.responses
            .iter()
            .filter(|r| r.envelope.command == tag.code())
            .count()
    }
}

impl ResponseSink for RecordingSink {
    fn deliver(&mut self, response: Response) {
        self.responses.push(response);
    }
}

// ── MemoryRecordStore ─────────────────────────────────────────

#[derive(Default)]
pub struct MemoryRecordStore {
    pub text: Option<String>,
    pub fail_writes: bool,
    pub writes: usize,
}

#[allow(dead_code)]
impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_owned()),
            ..Self::default()
        }
    }
}

impl RecordPort for MemoryRecordStore {
    fn read_record(&self) -> Result<String, StorageError> {
        self.text.clone().ok_or(StorageError::NotFound)
    }

    fn write_record(&mut self, text: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.writes += 1;
        self.text = Some(text.to_owned());
        Ok(())
    }
}
