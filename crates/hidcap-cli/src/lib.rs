//! hidcap-cli library entry point.
//!
//! Holds the configuration layer and the command implementations so that
//! integration tests in `tests/` and the binary in `main.rs` share the same
//! module tree.

pub mod commands;
pub mod config;
