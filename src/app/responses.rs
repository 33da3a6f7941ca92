//! Outbound response messages.
//!
//! Every request produces exactly one [`Response`] (place and unplace add a
//! second, completion callback).  Responses are plain values: they are
//! either delivered through the [`ResponseSink`](super::ports::ResponseSink)
//! straight away or parked inside a queued
//! [`Step::DeliverResponse`](crate::steps::Step::DeliverResponse).

use super::commands::Envelope;
use super::result::ResultCode;

/// A correlated reply: envelope plus ordered string parameters.
///
/// Parameter 0 is always the [`ResultCode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub envelope: Envelope,
    pub params: Vec<String>,
}

impl Response {
    /// A response carrying only a result code.
    pub fn new(envelope: Envelope, result: ResultCode) -> Self {
        Self {
            envelope,
            params: vec![result.to_param()],
        }
    }

    /// Append a data parameter.
    pub fn push(&mut self, param: impl Into<String>) {
        self.params.push(param.into());
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, param: impl Into<String>) -> Self {
        self.push(param);
        self
    }

    /// The result code in parameter 0, if it parses.
    pub fn result(&self) -> Option<ResultCode> {
        self.params
            .first()
            .and_then(|p| p.parse::<i8>().ok())
            .and_then(ResultCode::from_code)
    }

    /// Replace the result code, keeping any data parameters.
    pub fn set_result(&mut self, result: ResultCode) {
        match self.params.first_mut() {
            Some(first) => *first = result.to_param(),
            None => self.params.push(result.to_param()),
        }
    }
}
