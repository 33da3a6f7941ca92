//! Event log and runtime status.
//!
//! The cabinet keeps the last [`EVENT_LOG_SLOTS`] notable events (accepted
//! and rejected requests, hardware faults, persistence failures) in a RAM
//! ring buffer.  *Get system log* renders them one per line.  Events are
//! also forwarded to the `log` facade, so the ring is a bounded copy of
//! what the console already shows.
//!
//! A custom panic hook logs the reason before the default handler runs.

use core::fmt;
use core::fmt::Write as _;

use heapless::{Deque, String};
use log::Level;

/// Events retained for *Get system log*.
pub const EVENT_LOG_SLOTS: usize = 32;
/// Bytes kept per event; longer text is cut at a char boundary.
pub const EVENT_TEXT_LEN: usize = 96;

/// Firmware version tag reported by *Get system status*.
pub const VERSION: &str = "1.0";

/// One retained event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub tick: u64,
    pub level: Level,
    pub text: String<EVENT_TEXT_LEN>,
}

impl Event {
    pub fn new(tick: u64, level: Level, text: &str) -> Self {
        let mut end = text.len().min(EVENT_TEXT_LEN);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let mut t = String::new();
        let _ = t.push_str(&text[..end]);
        Self {
            tick,
            level,
            text: t,
        }
    }
}

/// RAM ring of the most recent events; the oldest is dropped when full.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Deque<Event, EVENT_LOG_SLOTS>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event and echo it to the `log` facade.
    pub fn record(&mut self, tick: u64, level: Level, text: &str) {
        log::log!(level, "{}", text);
        if self.entries.is_full() {
            self.entries.pop_front();
        }
        let _ = self.entries.push_back(Event::new(tick, level, text));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    /// One event per line, oldest first; `"Empty\n"` when nothing is held.
    pub fn render(&self) -> std::string::String {
        if self.entries.is_empty() {
            return "Empty\n".into();
        }
        let mut out = std::string::String::new();
        for e in &self.entries {
            let _ = writeln!(out, "{}", e.text);
        }
        out
    }
}

/// Overall cabinet health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Nominal,
    /// The last tick found the hardware in its error state.
    Fault,
}

impl Health {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nominal => "Nominal",
            Self::Fault => "Fault",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot answered by *Get system status*.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemStatus {
    pub health: Health,
    pub version: &'static str,
    pub empty_drawers: usize,
    pub queued_steps: usize,
    pub ticks: u64,
}

// ───────────────────────────────────────────────────────────────
// Panic hook
// ───────────────────────────────────────────────────────────────

/// Install a panic hook that logs the reason at error level.
///
/// Call once during start-up, after the logger is installed.
pub fn install_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<std::string::String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        match info.location() {
            Some(loc) => log::error!("PANIC at {}:{}: {}", loc.file(), loc.line(), reason),
            None => log::error!("PANIC: {}", reason),
        }
        default_hook(info);
    }));
}
