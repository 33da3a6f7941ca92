//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no cabinet
//! hardware required.

mod dispatcher_tests;
mod executor_tests;
mod mock_hw;
