//! Filterunit cabinet controller library.
//!
//! Exposes the pure-logic modules (inventory, step sequencing, command
//! dispatch) and the host adapters for integration testing and the bench
//! binary.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod inventory;
pub mod steps;
