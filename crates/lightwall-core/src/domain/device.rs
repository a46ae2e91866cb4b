//! The device capability.
//!
//! A device is one addressable pixel grid: a local LED matrix, a grid reached
//! over the network, or a purely in-memory grid.  Every variant exposes the
//! same three-step contract:
//!
//! 1. [`Device::size`] – the declared, immutable grid size.
//! 2. [`Device::set`] – write one pixel into the *staging* buffer.  Nothing
//!    becomes visible yet.
//! 3. [`Device::show`] – publish the staging buffer as the *visible* output.
//!    Hardware and network variants also transmit the frame here.
//!
//! [`PixelBuffers`] implements the staging/visible bookkeeping once so that
//! every driver only has to add its transmission step on top.

use std::io;

use thiserror::Error;

use super::color::{Color, ColorGrid, GridError, GridSize};

/// Errors reported by a device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A pixel write outside the device's declared size.
    ///
    /// The registry never forwards such a coordinate, so this indicates a
    /// programming or configuration error.
    #[error("pixel ({x}, {y}) is outside device {device} ({width}x{height})")]
    OutOfRange {
        device: String,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// Transmitting the frame failed; the device misses this update only.
    #[error("device {device} failed to transmit: {source}")]
    Io {
        device: String,
        #[source]
        source: io::Error,
    },

    /// The driver cannot continue at all.
    #[error("device {device} failed permanently: {reason}")]
    Fatal { device: String, reason: String },
}

impl DeviceError {
    /// `true` when the error must stop the pipeline.
    ///
    /// Transmission failures are transient: the device keeps missing updates
    /// until it recovers.  Everything else is an invariant violation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DeviceError::Io { .. })
    }
}

/// Capability implemented by every physical, network or virtual grid.
pub trait Device: Send {
    /// Unique, immutable device name.
    fn name(&self) -> &str;

    /// Declared grid size.  Never changes during the device's lifetime.
    fn size(&self) -> GridSize;

    /// Writes one pixel into the staging buffer at device-local coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::OutOfRange`] when `(x, y)` is outside [`Device::size`].
    fn set(&mut self, color: Color, x: u32, y: u32) -> Result<(), DeviceError>;

    /// Publishes the staging buffer as the visible output.
    ///
    /// Calling `show` again without an intervening `set` republishes the same
    /// output.
    ///
    /// # Errors
    ///
    /// Drivers return [`DeviceError::Io`] when transmission fails.
    fn show(&mut self) -> Result<(), DeviceError>;

    /// Reads back the currently *visible* pixel.
    fn get(&self, x: u32, y: u32) -> Option<Color>;
}

/// The staging and visible grids of one device.
#[derive(Debug, Clone)]
pub struct PixelBuffers {
    name: String,
    visible: ColorGrid,
    staging: ColorGrid,
}

impl PixelBuffers {
    /// Creates all-black buffers of `size`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::EmptyDimensions`] for a zero-sized device.
    pub fn new(name: impl Into<String>, size: GridSize) -> Result<Self, GridError> {
        let visible = ColorGrid::new(size)?;
        Ok(Self {
            name: name.into(),
            staging: visible.clone(),
            visible,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> GridSize {
        self.visible.size()
    }

    /// Writes into the staging grid.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::OutOfRange`] outside the device's size.
    pub fn stage(&mut self, color: Color, x: u32, y: u32) -> Result<(), DeviceError> {
        self.staging.set(x, y, color).map_err(|_| DeviceError::OutOfRange {
            device: self.name.clone(),
            x,
            y,
            width: self.staging.width(),
            height: self.staging.height(),
        })
    }

    /// Replaces the visible grid with a copy of the staging grid and returns it.
    ///
    /// Staging keeps its content, so later `stage` calls build on the last
    /// published frame without ever touching the visible grid.
    pub fn publish(&mut self) -> &ColorGrid {
        self.visible = self.staging.clone();
        &self.visible
    }

    pub fn visible(&self) -> &ColorGrid {
        &self.visible
    }

    pub fn staging(&self) -> &ColorGrid {
        &self.staging
    }
}

/// A device with no physical output.
///
/// Used for headless runs, previews and tests.
#[derive(Debug, Clone)]
pub struct VirtualDevice {
    buffers: PixelBuffers,
}

impl VirtualDevice {
    /// # Errors
    ///
    /// Returns [`GridError::EmptyDimensions`] for a zero-sized device.
    pub fn new(name: impl Into<String>, size: GridSize) -> Result<Self, GridError> {
        Ok(Self {
            buffers: PixelBuffers::new(name, size)?,
        })
    }

    /// The grid as of the last [`Device::show`].
    pub fn visible(&self) -> &ColorGrid {
        self.buffers.visible()
    }
}

impl Device for VirtualDevice {
    fn name(&self) -> &str {
        self.buffers.name()
    }

    fn size(&self) -> GridSize {
        self.buffers.size()
    }

    fn set(&mut self, color: Color, x: u32, y: u32) -> Result<(), DeviceError> {
        self.buffers.stage(color, x, y)
    }

    fn show(&mut self) -> Result<(), DeviceError> {
        self.buffers.publish();
        Ok(())
    }

    fn get(&self, x: u32, y: u32) -> Option<Color> {
        self.buffers.visible().get(x, y)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_device(w: u32, h: u32) -> VirtualDevice {
        VirtualDevice::new("test", GridSize::new(w, h)).expect("non-empty device")
    }

    #[test]
    fn test_set_then_show_then_get_returns_color() {
        let mut device = make_device(8, 8);
        for (x, y) in [(0, 0), (7, 7), (3, 5)] {
            device.set(Color::RED, x, y).unwrap();
            device.show().unwrap();
            assert_eq!(device.get(x, y), Some(Color::RED));
        }
    }

    #[test]
    fn test_set_without_show_is_not_visible() {
        let mut device = make_device(2, 2);
        device.set(Color::BLUE, 1, 1).unwrap();
        assert_eq!(device.get(1, 1), Some(Color::BLACK));
    }

    #[test]
    fn test_set_out_of_range_fails_with_fatal_error() {
        let mut device = make_device(2, 2);
        let err = device.set(Color::RED, 2, 0).unwrap_err();
        assert!(matches!(err, DeviceError::OutOfRange { x: 2, y: 0, width: 2, height: 2, .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_get_out_of_range_returns_none() {
        let device = make_device(2, 2);
        assert_eq!(device.get(0, 2), None);
    }

    #[test]
    fn test_show_twice_without_set_produces_same_visible_grid() {
        let mut device = make_device(3, 3);
        device.set(Color::GREEN, 1, 2).unwrap();
        device.show().unwrap();
        let first = device.visible().clone();

        device.show().unwrap();

        assert_eq!(device.visible(), &first);
    }

    #[test]
    fn test_staging_survives_publish_and_accumulates() {
        let mut device = make_device(2, 1);
        device.set(Color::RED, 0, 0).unwrap();
        device.show().unwrap();
        device.set(Color::BLUE, 1, 0).unwrap();
        device.show().unwrap();
        assert_eq!(device.get(0, 0), Some(Color::RED));
        assert_eq!(device.get(1, 0), Some(Color::BLUE));
    }

    #[test]
    fn test_zero_sized_device_is_rejected() {
        assert!(VirtualDevice::new("empty", GridSize::new(0, 1)).is_err());
    }

    #[test]
    fn test_io_error_is_not_fatal() {
        let err = DeviceError::Io {
            device: "net".to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(!err.is_fatal());
        assert!(DeviceError::Fatal { device: "x".into(), reason: "gone".into() }.is_fatal());
    }
}
