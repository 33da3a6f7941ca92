//! Result codes carried in the first parameter of every response.

use core::fmt;

use crate::error::StoreError;

/// Outcome of a request as reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum ResultCode {
    Success = 0,
    CommunicationError = -1,
    UnknownMessage = -2,
    ParameterCountError = -3,
    InvalidParameter = -4,
    ServerBusy = -5,
    ActionNotPerformedDueToState = -6,
    DrawersFull = -7,
    FilterCombinationError = -8,
}

impl ResultCode {
    /// Numeric wire value.
    pub const fn code(self) -> i8 {
        self as i8
    }

    /// Convert a wire value back into a code.
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            -1 => Some(Self::CommunicationError),
            -2 => Some(Self::UnknownMessage),
            -3 => Some(Self::ParameterCountError),
            -4 => Some(Self::InvalidParameter),
            -5 => Some(Self::ServerBusy),
            -6 => Some(Self::ActionNotPerformedDueToState),
            -7 => Some(Self::DrawersFull),
            -8 => Some(Self::FilterCombinationError),
            _ => None,
        }
    }

    /// Text form used as the first response parameter.
    pub fn to_param(self) -> String {
        self.code().to_string()
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// Default mapping for filter-level store rejections.  Combination commands
/// override `NotFound` with `FilterCombinationError` where required.
impl From<StoreError> for ResultCode {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::CapacityExhausted => Self::DrawersFull,
            StoreError::DuplicateId | StoreError::NotFound | StoreError::InvalidField => {
                Self::InvalidParameter
            }
        }
    }
}
