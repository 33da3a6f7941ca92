//! Fuzz target: console line and request decoding
//!
//! Parses arbitrary lines and hands every request to a fresh service:
//! - No panics on any input
//! - Every request is either answered or has its reply parked in the queue
//!
//! cargo fuzz run fuzz_request_decoder

#![no_main]

use filterunit::adapters::console::{ConsoleInput, parse_line};
use filterunit::app::ports::ResponseSink;
use filterunit::app::responses::Response;
use filterunit::app::service::CabinetService;
use filterunit::config::CabinetConfig;
use filterunit::steps::Step;
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct CountSink(usize);

impl ResponseSink for CountSink {
    fn deliver(&mut self, _response: Response) {
        self.0 += 1;
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let mut svc = CabinetService::new(CabinetConfig::default());
    let mut sink = CountSink::default();
    let mut requests = 0;
    for line in text.lines() {
        if let Ok(ConsoleInput::Request(raw)) = parse_line(line) {
            requests += 1;
            svc.handle_raw(raw, &mut sink);
        }
    }
    let parked = svc
        .pending_steps()
        .filter(|s| matches!(s, Step::DeliverResponse(_)))
        .count();
    assert!(sink.0 + parked >= requests);
});
