//! Line-oriented console transport for the bench binary.
//!
//! One request per line, whitespace separated:
//!
//! ```text
//! <message_id> <command_code> [param ...]
//! 7 1 F1 glass 2          # AddFilter F1
//! 8 8 C1 pair 2 F1 F2     # AddCombination C1 = [F1, F2]
//! ```
//!
//! Lines starting with `#` and blank lines are ignored.  Parameters cannot
//! contain whitespace on this transport.

use crate::app::commands::{Envelope, MessageKind, RawRequest};
use crate::app::result::ResultCode;

/// What one console line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Request(RawRequest),
    /// Bench control word, e.g. `fault` or `quit`.
    Control(String),
    Blank,
}

/// Parse one console line.
///
/// A line whose header does not parse fails with
/// [`ResultCode::CommunicationError`]; the caller answers it under message
/// id 0 since no id could be read.
pub fn parse_line(line: &str) -> Result<ConsoleInput, ResultCode> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(ConsoleInput::Blank);
    }
    let mut tokens = line.split_whitespace();
    let Some(first) = tokens.next() else {
        return Ok(ConsoleInput::Blank);
    };
    if first.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok(ConsoleInput::Control(first.to_ascii_lowercase()));
    }

    let message_id: u32 = first.parse().map_err(|_| ResultCode::CommunicationError)?;
    let command: u8 = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or(ResultCode::CommunicationError)?;

    Ok(ConsoleInput::Request(RawRequest {
        envelope: Envelope {
            message_id,
            block_id: 0,
            priority: 0,
            command,
            kind: MessageKind::Request,
        },
        params: tokens.map(str::to_owned).collect(),
    }))
}
