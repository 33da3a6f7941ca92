//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CabinetService (domain)
//! ```
//!
//! Driven adapters (cabinet hardware, response transport, durable record,
//! config file) implement these traits.  The
//! [`CabinetService`](super::service::CabinetService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::config::CabinetConfig;
use super::responses::Response;

// ───────────────────────────────────────────────────────────────
// Hardware port (driven adapter: domain → cabinet mechanics)
// ───────────────────────────────────────────────────────────────

/// Coarse state reported by the cabinet hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareState {
    /// Ready for the next action.
    Idle,
    /// Still carrying out an earlier action.
    Busy,
    /// Faulted; nothing runs until re-initialised.
    Error,
}

/// Per-drawer answer from [`HardwarePort::open_drawer`] / [`HardwarePort::close_drawer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerStatus {
    /// The drawer exists and the command was accepted.
    Done,
    /// There is no drawer at this index.
    NoMoreDrawers,
}

/// Electromagnet on the crane head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagnetState {
    On,
    Off,
}

/// Write-side port: the executor calls this to move the mechanics.
///
/// All motion calls return immediately; completion is observed through
/// [`state`](Self::state) reporting `Busy` until the motion settles.
pub trait HardwarePort {
    /// Bring the mechanics up (also clears the error state).
    fn init(&mut self);

    /// Power the mechanics down.
    fn deinit(&mut self);

    /// Current coarse state.
    fn state(&self) -> HardwareState;

    /// Push drawer `slot` out (0 is the staging drawer).
    fn open_drawer(&mut self, slot: u8) -> DrawerStatus;

    /// Pull drawer `slot` in.
    fn close_drawer(&mut self, slot: u8) -> DrawerStatus;

    /// Drive the crane to an absolute position.
    fn move_crane(&mut self, position: i32);

    /// Switch the electromagnet.
    fn set_magnet(&mut self, state: MagnetState);
}

// ───────────────────────────────────────────────────────────────
// Response sink (driven adapter: domain → transport)
// ───────────────────────────────────────────────────────────────

/// Hands responses to whatever transport the client used.  The domain
/// never learns whether delivery succeeded.
pub trait ResponseSink {
    fn deliver(&mut self, response: Response);
}

// ───────────────────────────────────────────────────────────────
// Record port (driven adapter: domain ↔ durable inventory record)
// ───────────────────────────────────────────────────────────────

/// Whole-record storage for the inventory text.
///
/// Implementations MUST NOT leave a partially written record behind: a
/// failed [`write_record`](Self::write_record) keeps the previous record.
pub trait RecordPort {
    /// Read the full record text.
    fn read_record(&self) -> Result<String, StorageError>;

    /// Replace the full record text.
    fn write_record(&mut self, text: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists cabinet configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`CabinetConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<CabinetConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &CabinetConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`RecordPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// No record has been written yet.
    NotFound,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "record not found"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for StorageError {}
