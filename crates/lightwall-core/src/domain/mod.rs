//! Domain entities for Lightwall.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of the application is the **domain**.  Domain code
//! holds the core rules (here: how pixels, devices and the shared canvas relate
//! to each other) and never imports OS APIs, sockets or UI frameworks.  Outer
//! layers such as the frame pipeline and the device drivers depend on the
//! domain, never the other way round, which keeps it trivially unit-testable.

/// Colors and the canonical 2-D pixel container.
pub mod color;

/// The device capability every physical or virtual grid implements.
pub mod device;

/// The animation program capability and the named program set.
pub mod program;

/// Device placement inside the shared canvas.
///
/// See [`registry::DeviceRegistry`] for the main type.
pub mod registry;
