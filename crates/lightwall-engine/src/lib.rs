//! lightwall-engine library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the engine do? (for beginners)
//!
//! The engine is the long-running process that animates a wall of LED grids.
//!
//! 1. It reads a TOML file listing the devices (in-memory, UDP-attached or
//!    framebuffer-backed grids) and where each sits on the shared canvas.
//! 2. It builds a `DeviceRegistry` from those declarations.
//! 3. It starts three threads:
//!    - the **trigger**, which raises a signal on a fixed interval;
//!    - the **frame generator**, which waits for the signal and asks the
//!      active animation program for a canvas-sized frame;
//!    - the **frame writer**, which diffs that frame against the one on the
//!      devices and sends only the changed pixels.
//! 4. It runs until Ctrl-C, a `quit` on the console, or a fatal device error.

/// Application layer: pipeline stages and use cases.
pub mod application;

/// Infrastructure layer: device drivers, configuration and the console.
pub mod infrastructure;
