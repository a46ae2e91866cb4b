//! Storage infrastructure: configuration file loading and saving.
//!
//! The `config` sub-module reads the TOML file that declares the devices, the
//! trigger and the start-up mode, supplies defaults when the file does not
//! exist, and writes a starter file for `lightwall --init-config`.

pub mod config;
