//! Log-based adapters.
//!
//! [`LogResponseSink`] implements [`ResponseSink`] by writing every
//! response to the log, which is what the bench binary uses in place of a
//! wire transport.  [`init_logger`] installs the subscriber that prints
//! those records.

use log::info;
use tracing_subscriber::util::{SubscriberInitExt as _, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _};

use crate::app::commands::CommandTag;
use crate::app::ports::ResponseSink;
use crate::app::responses::Response;

// ───────────────────────────────────────────────────────────────
// Response sink
// ───────────────────────────────────────────────────────────────

/// Adapter that logs every [`Response`] to the console.
#[derive(Default)]
pub struct LogResponseSink {
    delivered: u64,
}

impl LogResponseSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses delivered so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl ResponseSink for LogResponseSink {
    fn deliver(&mut self, response: Response) {
        self.delivered += 1;
        let env = &response.envelope;
        let command = CommandTag::from_code(env.command)
            .map_or_else(|| format!("#{}", env.command), |t| format!("{t:?}"));
        info!(
            "RESP | id={} block={} | {} | {}",
            env.message_id,
            env.block_id,
            command,
            response.params.join(" | ").escape_debug(),
        );
    }
}

// ───────────────────────────────────────────────────────────────
// Console logger
// ───────────────────────────────────────────────────────────────

/// Install a stderr subscriber and route `log` records into it.
///
/// `RUST_LOG` overrides the default filter.  Fails if a global subscriber
/// or logger is already set.
pub fn init_logger(verbose: bool) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "filterunit=debug,info" } else { "filterunit=info" })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .compact(),
        )
        .try_init()
}
