//! Framebuffer driver: writes frames as packed RGB24 into a device file.
//!
//! Targets memory-mapped LED panel drivers and Linux framebuffers configured
//! for 24 bits per pixel, but works with any writable file: on every
//! [`Device::show`] the visible grid is written row-major, three bytes per
//! pixel, starting at offset 0.
//!
//! `brightness` (0.0 to 1.0) scales every channel on the way out.  The staged
//! and visible grids keep the unscaled colors, so [`Device::get`] reads back
//! what the generator produced rather than what the panel was sent.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use lightwall_core::{Color, Device, DeviceError, GridSize, PixelBuffers};
use tracing::info;

use crate::application::build_registry::DeviceSpecError;

/// An RGB24 pixel grid backed by a file.
#[derive(Debug)]
pub struct FramebufferDevice {
    buffers: PixelBuffers,
    file: File,
    path: PathBuf,
    brightness: f32,
    scratch: Vec<u8>,
}

impl FramebufferDevice {
    /// Opens (creating if needed) `path` for writing.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceSpecError`] for an empty size, a brightness outside
    /// 0.0 to 1.0, or when the file cannot be opened.
    pub fn open(
        name: impl Into<String>,
        size: GridSize,
        path: impl AsRef<Path>,
        brightness: f32,
    ) -> Result<Self, DeviceSpecError> {
        if !(0.0..=1.0).contains(&brightness) {
            return Err(DeviceSpecError::InvalidField {
                field: "brightness",
                reason: format!("{brightness} is outside 0.0..=1.0"),
            });
        }
        let buffers = PixelBuffers::new(name, size)?;
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().write(true).create(true).open(&path)?;
        info!(
            "framebuffer [{}] {size} -> {} at {:.0}% brightness",
            buffers.name(),
            path.display(),
            brightness * 100.0
        );

        Ok(Self {
            scratch: Vec::with_capacity(size.area() * 3),
            buffers,
            file,
            path,
            brightness,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    fn io_error(&self, source: std::io::Error) -> DeviceError {
        DeviceError::Io {
            device: self.buffers.name().to_string(),
            source,
        }
    }
}

impl Device for FramebufferDevice {
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
        let brightness = self.brightness;
        self.scratch.clear();
        for color in self.buffers.publish().pixels() {
            let out = color.scaled(brightness);
            self.scratch.extend_from_slice(&[out.r, out.g, out.b]);
        }

        let written = self
            .file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.write_all(&self.scratch))
            .and_then(|()| self.file.flush());
        written.map_err(|e| self.io_error(e))
    }

    fn get(&self, x: u32, y: u32) -> Option<Color> {
        self.buffers.visible().get(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(test: &str) -> PathBuf {
        std::env::temp_dir().join(format!("lightwall_fb_{}_{test}", std::process::id()))
    }

    #[test]
    fn test_show_writes_rgb24_row_major() {
        // Arrange
        let path = temp_path("rgb24");
        let mut device = FramebufferDevice::open("fb", GridSize::new(2, 2), &path, 1.0).unwrap();

        // Act
        device.set(Color::RED, 1, 0).unwrap();
        device.set(Color::BLUE, 0, 1).unwrap();
        device.show().unwrap();

        // Assert
        let bytes = fs::read(&path).unwrap();
        assert_eq!(
            bytes,
            vec![0, 0, 0, 255, 0, 0, 0, 0, 255, 0, 0, 0],
            "pixels (0,0) (1,0) (0,1) (1,1) in order"
        );
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_show_scales_output_but_not_readback() {
        let path = temp_path("brightness");
        let mut device = FramebufferDevice::open("fb", GridSize::new(1, 1), &path, 0.5).unwrap();

        device.set(Color::WHITE, 0, 0).unwrap();
        device.show().unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 3);
        assert!(bytes.iter().all(|&b| b < 255 && b > 0));
        assert_eq!(device.get(0, 0), Some(Color::WHITE));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_repeated_show_overwrites_from_offset_zero() {
        let path = temp_path("overwrite");
        let mut device = FramebufferDevice::open("fb", GridSize::new(1, 1), &path, 1.0).unwrap();

        device.set(Color::RED, 0, 0).unwrap();
        device.show().unwrap();
        device.set(Color::GREEN, 0, 0).unwrap();
        device.show().unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![0, 255, 0]);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_open_rejects_brightness_out_of_range() {
        let path = temp_path("bad_brightness");
        let result = FramebufferDevice::open("fb", GridSize::new(1, 1), &path, 1.5);
        assert!(matches!(
            result,
            Err(DeviceSpecError::InvalidField { field: "brightness", .. })
        ));
    }

    #[test]
    fn test_open_unwritable_path_fails() {
        let path = temp_path("missing_dir").join("nested").join("fb");
        let result = FramebufferDevice::open("fb", GridSize::new(1, 1), &path, 1.0);
        assert!(matches!(result, Err(DeviceSpecError::Io(_))));
    }
}
