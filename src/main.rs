//! Filterunit bench controller: main entry point.
//!
//! Hexagonal architecture driven by a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimulatedCabinet   LogResponseSink   FileRecordStore          │
//! │  (HardwarePort)     (ResponseSink)    (RecordPort)             │
//! │  console lines      JsonConfigFile    init_logger              │
//! │  (transport)        (ConfigPort)      (tracing subscriber)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            CabinetService (pure logic)                 │    │
//! │  │  Inventory · ActionQueue · EventLog                    │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `filterunit [cabinet.json]`, then one request per stdin line
//! (see [`filterunit::adapters::console`]).  `fault` injects a hardware
//! fault, `quit` stops reading.
#![deny(unused_must_use)]

use std::io::{self, BufRead as _};
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{Context as _, Result};
use log::{info, warn};

use filterunit::adapters::console::{ConsoleInput, parse_line};
use filterunit::adapters::file_store::{FileRecordStore, JsonConfigFile};
use filterunit::adapters::hardware::SimulatedCabinet;
use filterunit::adapters::log_sink::{LogResponseSink, init_logger};
use filterunit::app::commands::{Envelope, MessageKind};
use filterunit::app::ports::{ConfigPort, ResponseSink, StorageError};
use filterunit::app::responses::Response;
use filterunit::app::service::CabinetService;
use filterunit::diagnostics::{self, Health};
use filterunit::error::RecordError;

const DEFAULT_CONFIG_PATH: &str = "cabinet.json";
/// Ticks each simulated motion keeps the cabinet busy.
const SIM_SETTLE_TICKS: u32 = 2;

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    init_logger(false).context("installing logger")?;
    diagnostics::install_panic_handler();

    info!("╔══════════════════════════════════════╗");
    info!("║  Filterunit v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config (or defaults) ───────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());
    let config = JsonConfigFile::new(&config_path)
        .load()
        .with_context(|| format!("loading {config_path}"))?;
    info!(
        "Config: {} drawers, record {}, tick {} ms",
        config.drawer_capacity, config.record_path, config.tick_interval_ms
    );

    // ── 3. Inventory ──────────────────────────────────────────
    let mut records = FileRecordStore::new(&config.record_path);
    let mut service = CabinetService::new(config.clone());
    match service.restore(&records) {
        Ok(()) => {}
        Err(RecordError::Storage(StorageError::NotFound)) => {
            info!("No record at {}, starting empty", records.path().display());
        }
        Err(e) => warn!("Record unusable ({}), starting empty", e),
    }

    // ── 4. Adapters ───────────────────────────────────────────
    let mut cabinet = SimulatedCabinet::new(config.drawer_capacity, SIM_SETTLE_TICKS);
    let mut sink = LogResponseSink::new();

    let (tx, rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("spawning stdin reader")?;

    // ── 5. Main loop: one request, one step, maybe save ───────
    info!("Ready. Entering main loop.");
    let tick = Duration::from_millis(u64::from(config.tick_interval_ms));
    let mut input_open = true;
    loop {
        if input_open {
            match rx.try_recv() {
                Ok(line) => {
                    input_open = handle_line(&line, &mut service, &mut cabinet, &mut sink);
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => input_open = false,
            }
        }

        cabinet.advance();
        // Faults are recorded by the service; the loop keeps ticking.
        let _ = service.run_once(&mut cabinet, &mut sink);
        service.auto_save_if_needed(&mut records);

        if !input_open && (service.queue_len() == 0 || service.status().health == Health::Fault) {
            break;
        }
        thread::sleep(tick);
    }

    // ── 6. Shutdown ───────────────────────────────────────────
    service
        .force_save_if_dirty(&mut records)
        .context("saving inventory on exit")?;
    info!(
        "Shutdown after {} ticks, {} responses delivered",
        service.tick_count(),
        sink.delivered()
    );
    Ok(())
}

/// Act on one console line.  Returns `false` once input should stop.
fn handle_line(
    line: &str,
    service: &mut CabinetService,
    cabinet: &mut SimulatedCabinet,
    sink: &mut LogResponseSink,
) -> bool {
    match parse_line(line) {
        Ok(ConsoleInput::Request(raw)) => service.handle_raw(raw, sink),
        Ok(ConsoleInput::Control(word)) => match word.as_str() {
            "quit" | "exit" => return false,
            "fault" => cabinet.inject_fault(),
            other => warn!("Unknown console word '{}'", other),
        },
        Ok(ConsoleInput::Blank) => {}
        Err(code) => {
            let envelope = Envelope {
                message_id: 0,
                block_id: 0,
                priority: 0,
                command: 0,
                kind: MessageKind::Response,
            };
            sink.deliver(Response::new(envelope, code));
        }
    }
    true
}
