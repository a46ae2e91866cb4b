//! Application layer use cases for the lightwall engine.
//!
//! # What use cases does the engine have?
//!
//! - **`build_registry`** – Turns the ordered device declarations from the
//!   configuration into a populated `DeviceRegistry`.  Concrete drivers are
//!   created by a `DeviceFactory` injected by the caller, so this layer never
//!   touches sockets or files.
//!
//! - **`select_mode`** – The validated, thread-safe running-mode handle that
//!   tells the frame generator which program to run.
//!
//! - **`dispatch_frame`** – Diffs two frames and routes every changed pixel
//!   through the registry to the devices that own it, then commits them.
//!
//! - **`pipeline`** – The trigger, frame generator and frame writer stages and
//!   the threads that run them.
//!
//! `signal` and `frame_buffer` are the two synchronisation primitives the
//! stages share.

pub mod build_registry;
pub mod dispatch_frame;
pub mod frame_buffer;
pub mod pipeline;
pub mod select_mode;
pub mod signal;
