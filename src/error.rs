//! Unified error types for the cabinet controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level loop's error handling uniform.  None of these ever travel over
//! the wire: the dispatcher maps them onto [`ResultCode`]s before replying.
//!
//! [`ResultCode`]: crate::app::result::ResultCode

use core::fmt;

use crate::app::ports::StorageError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An inventory lookup or mutation was rejected.
    Store(StoreError),
    /// The durable record could not be read, written or parsed.
    Record(RecordError),
    /// The hardware reported its error state.
    Hardware(HardwareFault),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Record(e) => write!(f, "record: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Inventory errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Every drawer already holds a filter.
    CapacityExhausted,
    /// A filter or combination with this id already exists.
    DuplicateId,
    /// No filter or combination with this id.
    NotFound,
    /// A text field is empty or contains a record separator.
    InvalidField,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExhausted => write!(f, "all drawers occupied"),
            Self::DuplicateId => write!(f, "duplicate id"),
            Self::NotFound => write!(f, "not found"),
            Self::InvalidField => write!(f, "invalid field text"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Durable record errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The backing storage failed.
    Storage(StorageError),
    /// The record text does not have the expected shape.
    Malformed { line: usize, reason: &'static str },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "{e}"),
            Self::Malformed { line, reason } => write!(f, "line {line}: {reason}"),
        }
    }
}

impl std::error::Error for RecordError {}

impl From<StorageError> for RecordError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<RecordError> for Error {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware fault
// ---------------------------------------------------------------------------

/// Raised by a tick that found the hardware in its error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareFault;

impl fmt::Display for HardwareFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hardware in error state")
    }
}

impl std::error::Error for HardwareFault {}

impl From<HardwareFault> for Error {
    fn from(e: HardwareFault) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
