//! DispatchFrameUseCase: diff two frames and push changed pixels to devices.
//!
//! This is the most performance-sensitive step of the pipeline: it runs once
//! per animation frame and touches every canvas pixel.
//!
//! # Algorithm
//!
//! ```text
//! for each (x, y) where next[x, y] != current[x, y]:
//!     for each placement covering (x, y):
//!         device.set(next[x, y], x - placement.x, y - placement.y)
//! for each device:
//!     device.show()
//! ```
//!
//! Unchanged pixels generate no device traffic at all.  Pixels no placement
//! covers are counted and dropped.  Overlapping placements all receive the
//! pixel, in registration order.
//!
//! # Failure policy
//!
//! A device whose `show` fails with a transient I/O error is logged and
//! skipped; it will catch up on a later frame.  Any other device error
//! (out-of-range write, fatal driver failure) aborts the dispatch.

use lightwall_core::{ColorGrid, DeviceError, DeviceRegistry, RegistryError};
use thiserror::Error;
use tracing::{debug, warn};

/// Error type for frame dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A placement refers to a device the registry does not know.
    #[error("registry inconsistency: {0}")]
    Registry(#[from] RegistryError),

    /// A device reported a fatal error.
    #[error("fatal device error: {0}")]
    Device(#[from] DeviceError),
}

/// Counters describing one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Canvas pixels whose color changed.
    pub changed_pixels: usize,
    /// `set` calls issued (one per covering placement per changed pixel).
    pub pixel_writes: usize,
    /// Changed pixels no placement covers.
    pub dropped_pixels: usize,
    /// Devices whose `show` succeeded.
    pub devices_shown: usize,
    /// Devices whose `show` failed with a transient error.
    pub show_failures: usize,
}

/// Routes every pixel of `next` that differs from `current` to its devices,
/// then commits all devices.
///
/// # Errors
///
/// Returns [`DispatchError`] on the first fatal device error or registry
/// inconsistency.
pub fn dispatch_frame(
    registry: &DeviceRegistry,
    current: &ColorGrid,
    next: &ColorGrid,
) -> Result<DispatchReport, DispatchError> {
    let mut report = DispatchReport::default();

    for (x, y, color) in next.changed_since(current) {
        report.changed_pixels += 1;

        let placements = registry.devices_at(x, y);
        if placements.is_empty() {
            report.dropped_pixels += 1;
            continue;
        }

        for placement in placements {
            let Some((local_x, local_y)) = placement.to_local(x, y) else {
                continue;
            };
            registry.with_device(&placement.device, |device| {
                device.set(color, local_x, local_y)
            })??;
            report.pixel_writes += 1;
        }
    }

    let mut fatal = None;
    registry.for_each(|device| match device.show() {
        Ok(()) => report.devices_shown += 1,
        Err(e) if !e.is_fatal() => {
            warn!("device {} missed a frame: {e}", device.name());
            report.show_failures += 1;
        }
        Err(e) => {
            fatal.get_or_insert(e);
        }
    });
    if let Some(e) = fatal {
        return Err(e.into());
    }

    debug!(
        "dispatched frame: {} changed, {} writes, {} dropped, {}/{} devices shown",
        report.changed_pixels,
        report.pixel_writes,
        report.dropped_pixels,
        report.devices_shown,
        report.devices_shown + report.show_failures
    );
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
