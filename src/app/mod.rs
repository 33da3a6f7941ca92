//! Application core: request dispatch and result vocabulary, zero I/O.
//!
//! This module contains the business rules for the cabinet: validating
//! requests against the inventory, expanding them into hardware steps and
//! producing one correlated response per request.  All interaction with
//! hardware and transport happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real mechanics.

pub mod commands;
pub mod ports;
pub mod responses;
pub mod result;
pub mod service;
