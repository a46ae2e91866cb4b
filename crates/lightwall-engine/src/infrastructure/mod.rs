//! Infrastructure layer for the lightwall engine.
//!
//! Contains the adapters that touch the outside world: device drivers that
//! write to sockets and files, and the TOML configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `lightwall_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`devices`** – the `virtual`, `udp` and `framebuffer` drivers and the
//!   `BuiltinDeviceFactory` that creates them from declarations.  A
//!   `RecordingDevice` is also provided for tests.
//!
//! - **`storage`** – loading and saving the TOML configuration, including the
//!   platform-specific default location.
//!
//! - **`console`** – the stdin command reader that triggers frames and
//!   switches modes at runtime.

pub mod console;
pub mod devices;
pub mod storage;
