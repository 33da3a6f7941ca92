//! Inbound requests to the cabinet service.
//!
//! The transport hands over a [`RawRequest`]: a correlation envelope plus an
//! ordered list of string parameters.  [`RawRequest::decode`] checks arity
//! and parameter types and produces a typed [`Request`] that the
//! [`CabinetService`](super::service::CabinetService) acts upon.

use super::result::ResultCode;

/// Command codes as they appear in the message envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandTag {
    AddFilter = 1,
    RequestAddFilter = 2,
    CancelAddFilter = 3,
    RemoveFilter = 4,
    RequestRemoveFilter = 5,
    CancelRemoveFilter = 6,
    GetFilters = 7,
    AddCombination = 8,
    RemoveCombination = 9,
    GetCombinations = 10,
    PlaceCombination = 11,
    UnplaceCombination = 12,
    GetSystemStatus = 13,
    GetSystemLog = 14,
    Stop = 15,
    Reset = 16,
    /// Completion notice for a place sequence.  Outbound only.
    PlaceCombinationCallback = 17,
    /// Completion notice for an unplace sequence.  Outbound only.
    RemoveCombinationCallback = 18,
}

impl CommandTag {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::AddFilter),
            2 => Some(Self::RequestAddFilter),
            3 => Some(Self::CancelAddFilter),
            4 => Some(Self::RemoveFilter),
            5 => Some(Self::RequestRemoveFilter),
            6 => Some(Self::CancelRemoveFilter),
            7 => Some(Self::GetFilters),
            8 => Some(Self::AddCombination),
            9 => Some(Self::RemoveCombination),
            10 => Some(Self::GetCombinations),
            11 => Some(Self::PlaceCombination),
            12 => Some(Self::UnplaceCombination),
            13 => Some(Self::GetSystemStatus),
            14 => Some(Self::GetSystemLog),
            15 => Some(Self::Stop),
            16 => Some(Self::Reset),
            17 => Some(Self::PlaceCombinationCallback),
            18 => Some(Self::RemoveCombinationCallback),
            _ => None,
        }
    }
}

/// Whether a message travels client → cabinet or back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
}

/// Correlation header shared by a request and every message it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub message_id: u32,
    pub block_id: u32,
    pub priority: u8,
    /// Raw command code; may be outside [`CommandTag`]'s range.
    pub command: u8,
    pub kind: MessageKind,
}

impl Envelope {
    pub fn request(message_id: u32, command: CommandTag) -> Self {
        Self {
            message_id,
            block_id: 0,
            priority: 0,
            command: command.code(),
            kind: MessageKind::Request,
        }
    }

    /// The matching response header.
    pub fn reply(&self) -> Self {
        Self {
            kind: MessageKind::Response,
            ..*self
        }
    }

    /// A response header that carries a different command code.
    pub fn reply_as(&self, command: CommandTag) -> Self {
        Self {
            command: command.code(),
            kind: MessageKind::Response,
            ..*self
        }
    }
}

/// Commands that the outside world can send into the cabinet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Store a filter the operator has placed in the staging drawer.
    AddFilter {
        id: String,
        material: String,
        thickness: String,
    },
    /// Present the staging drawer so the operator can insert a filter.
    RequestAddFilter { id: String },
    CancelAddFilter,
    /// Forget a filter the operator has taken from the staging drawer.
    RemoveFilter { id: String },
    /// Carry a filter to the staging drawer for the operator to take.
    RequestRemoveFilter { id: String },
    CancelRemoveFilter,
    GetFilters,
    AddCombination {
        id: String,
        name: String,
        members: Vec<String>,
    },
    RemoveCombination { id: String },
    GetCombinations,
    /// Assemble a combination in the bay.
    PlaceCombination { id: String },
    /// Return the assembled combination to its drawers.
    UnplaceCombination,
    GetSystemStatus,
    GetSystemLog,
    Stop,
    Reset,
    /// A callback code or an unrecognised code arrived as a request.
    Unknown(u8),
}

/// A decoded request ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub envelope: Envelope,
    pub command: Command,
}

impl Request {
    /// Build a request whose envelope command code matches `command`.
    pub fn new(message_id: u32, command: Command) -> Self {
        let code = match &command {
            Command::Unknown(raw) => *raw,
            other => other.tag().map_or(0, CommandTag::code),
        };
        Self {
            envelope: Envelope {
                message_id,
                block_id: 0,
                priority: 0,
                command: code,
                kind: MessageKind::Request,
            },
            command,
        }
    }
}

/// A request as the transport delivers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub envelope: Envelope,
    pub params: Vec<String>,
}

impl RawRequest {
    /// Check parameter count and types for the envelope's command code.
    ///
    /// Codes outside the command set and the two callback codes decode to
    /// [`Command::Unknown`]; the dispatcher answers those itself.
    pub fn decode(self) -> Result<Request, ResultCode> {
        let envelope = self.envelope;
        let mut params = self.params.into_iter();
        let Some(tag) = CommandTag::from_code(envelope.command) else {
            return Ok(Request {
                envelope,
                command: Command::Unknown(envelope.command),
            });
        };

        let count = params.len();
        let expect = |n: usize| {
            if count == n {
                Ok(())
            } else {
                Err(ResultCode::ParameterCountError)
            }
        };
        // Arity was checked, so `next()` cannot run dry below.
        let mut take = || params.next().unwrap_or_default();

        let command = match tag {
            CommandTag::AddFilter => {
                expect(3)?;
                Command::AddFilter {
                    id: take(),
                    material: take(),
                    thickness: take(),
                }
            }
            CommandTag::RequestAddFilter => {
                expect(1)?;
                Command::RequestAddFilter { id: take() }
            }
            CommandTag::CancelAddFilter => {
                expect(0)?;
                Command::CancelAddFilter
            }
            CommandTag::RemoveFilter => {
                expect(1)?;
                Command::RemoveFilter { id: take() }
            }
            CommandTag::RequestRemoveFilter => {
                expect(1)?;
                Command::RequestRemoveFilter { id: take() }
            }
            CommandTag::CancelRemoveFilter => {
                expect(0)?;
                Command::CancelRemoveFilter
            }
            CommandTag::GetFilters => {
                expect(0)?;
                Command::GetFilters
            }
            CommandTag::AddCombination => {
                if count < 3 {
                    return Err(ResultCode::ParameterCountError);
                }
                let id = take();
                let name = take();
                let n: usize = take()
                    .trim()
                    .parse()
                    .map_err(|_| ResultCode::InvalidParameter)?;
                if count.checked_sub(3) != Some(n) {
                    return Err(ResultCode::ParameterCountError);
                }
                Command::AddCombination {
                    id,
                    name,
                    members: (0..n).map(|_| take()).collect(),
                }
            }
            CommandTag::RemoveCombination => {
                expect(1)?;
                Command::RemoveCombination { id: take() }
            }
            CommandTag::GetCombinations => {
                expect(0)?;
                Command::GetCombinations
            }
            CommandTag::PlaceCombination => {
                expect(1)?;
                Command::PlaceCombination { id: take() }
            }
            CommandTag::UnplaceCombination => {
                expect(0)?;
                Command::UnplaceCombination
            }
            CommandTag::GetSystemStatus => {
                expect(0)?;
                Command::GetSystemStatus
            }
            CommandTag::GetSystemLog => {
                expect(0)?;
                Command::GetSystemLog
            }
            CommandTag::Stop => {
                expect(0)?;
                Command::Stop
            }
            CommandTag::Reset => {
                expect(0)?;
                Command::Reset
            }
            CommandTag::PlaceCombinationCallback | CommandTag::RemoveCombinationCallback => {
                Command::Unknown(envelope.command)
            }
        };

        Ok(Request { envelope, command })
    }
}

impl Command {
    /// Envelope code for this command; `None` for [`Command::Unknown`].
    pub fn tag(&self) -> Option<CommandTag> {
        let tag = match self {
            Self::AddFilter { .. } => CommandTag::AddFilter,
            Self::RequestAddFilter { .. } => CommandTag::RequestAddFilter,
            Self::CancelAddFilter => CommandTag::CancelAddFilter,
            Self::RemoveFilter { .. } => CommandTag::RemoveFilter,
            Self::RequestRemoveFilter { .. } => CommandTag::RequestRemoveFilter,
            Self::CancelRemoveFilter => CommandTag::CancelRemoveFilter,
            Self::GetFilters => CommandTag::GetFilters,
            Self::AddCombination { .. } => CommandTag::AddCombination,
            Self::RemoveCombination { .. } => CommandTag::RemoveCombination,
            Self::GetCombinations => CommandTag::GetCombinations,
            Self::PlaceCombination { .. } => CommandTag::PlaceCombination,
            Self::UnplaceCombination => CommandTag::UnplaceCombination,
            Self::GetSystemStatus => CommandTag::GetSystemStatus,
            Self::GetSystemLog => CommandTag::GetSystemLog,
            Self::Stop => CommandTag::Stop,
            Self::Reset => CommandTag::Reset,
            Self::Unknown(_) => return None,
        };
        Some(tag)
    }
}
