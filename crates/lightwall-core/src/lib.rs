//! # lightwall-core
//!
//! Shared library for Lightwall containing the canvas composition model,
//! the device and animation-program contracts, the built-in effects, and the
//! pixel-frame codec spoken by network-attached grids.
//!
//! It starts no threads and opens no sockets or files.
//!
//! # Architecture overview (for beginners)
//!
//! Lightwall drives several independently sized LED grids as one logical
//! canvas.  Each grid ("device") is placed at a rectangle inside the canvas;
//! an animation program paints whole canvas frames, and only the pixels that
//! changed between two frames are forwarded to the devices that own them.
//!
//! This crate is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure business logic.  The most important piece is the
//!   [`DeviceRegistry`]: the map of which device covers which canvas pixel.
//!
//! - **`effects`** – The built-in animation programs (`cross`, `wash`, `random`, `off`).
//!
//! - **`protocol`** – How a grid travels over the network.  A frame is encoded
//!   into one datagram (16-byte header + packed RGB) and decoded back on the
//!   receiving side.

pub mod domain;
pub mod effects;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `lightwall_core::DeviceRegistry` instead of the full module path.
pub use domain::color::{Color, ColorGrid, GridError, GridSize};
pub use domain::device::{Device, DeviceError, PixelBuffers, VirtualDevice};
pub use domain::program::{Program, ProgramError, ProgramSet, Tick};
pub use domain::registry::{DeviceRegistry, Placement, RegistryError};
pub use protocol::codec::{decode_frame, encode_frame, FrameHeader, ProtocolError};
