//! Recording device for unit and integration testing.
//!
//! # Why a recording device?
//!
//! Real drivers write to sockets or device files, and what they emit cannot be
//! observed from test code without a second process listening.  The
//! `RecordingDevice` behaves like a [`VirtualDevice`](lightwall_core::VirtualDevice)
//! (staging and visible buffers, read-back through `get`) and additionally
//! pushes every `set` and `show` call into a shared log, so assertions can
//! check exactly which pixels were written and in what order.
//!
//! # Usage in tests
//!
//! ```ignore
//! let device = RecordingDevice::new("A", GridSize::new(1, 1));
//! let calls = device.calls();          // keep a handle before boxing
//! registry.register(Box::new(device), (0, 0))?;
//!
//! dispatch_frame(&registry, &current, &next)?;
//!
//! assert_eq!(calls.snapshot(), vec![DeviceCall::Set { .. }, DeviceCall::Show]);
//! ```
//!
//! # Failure injection
//!
//! [`RecordingDevice::fail_show`] makes `show` return a transient
//! [`DeviceError::Io`].  [`RecordingDevice::with_accepted_size`] makes the
//! device declare one size but reject writes outside a smaller one, which is
//! the only way to provoke an out-of-range write through the registry.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use lightwall_core::{Color, ColorGrid, Device, DeviceError, GridSize, PixelBuffers};

/// One recorded device call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCall {
    Set { color: Color, x: u32, y: u32 },
    Show,
}

/// Shared, cloneable view of a device's call log.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<DeviceCall>>>,
}

impl CallLog {
    /// All calls recorded so far, in order.
    pub fn snapshot(&self) -> Vec<DeviceCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Only the `set` calls, as `(color, x, y)`.
    pub fn sets(&self) -> Vec<(Color, u32, u32)> {
        self.snapshot()
            .into_iter()
            .filter_map(|call| match call {
                DeviceCall::Set { color, x, y } => Some((color, x, y)),
                DeviceCall::Show => None,
            })
            .collect()
    }

    pub fn show_count(&self) -> usize {
        self.snapshot()
            .iter()
            .filter(|call| matches!(call, DeviceCall::Show))
            .count()
    }

    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, call: DeviceCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

/// A device that records every call and performs no I/O.
#[derive(Debug)]
pub struct RecordingDevice {
    declared: GridSize,
    buffers: PixelBuffers,
    calls: CallLog,
    failing: Arc<AtomicBool>,
}

impl RecordingDevice {
    /// Creates a recording device of `size`.
    ///
    /// # Panics
    ///
    /// Panics if `size` has a zero dimension.  Test helper only.
    pub fn new(name: impl Into<String>, size: GridSize) -> Self {
        let buffers = PixelBuffers::new(name, size)
            .unwrap_or_else(|e| panic!("recording device needs a non-empty size: {e}"));
        Self {
            declared: size,
            buffers,
            calls: CallLog::default(),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Keeps the declared size but only accepts writes inside `accepted`.
    pub fn with_accepted_size(mut self, accepted: GridSize) -> Self {
        self.buffers = PixelBuffers::new(self.buffers.name().to_string(), accepted)
            .unwrap_or_else(|e| panic!("accepted size must be non-empty: {e}"));
        self
    }

    /// Handle to the call log; stays valid after the device is boxed.
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    /// Handle that toggles `show` failures after the device is boxed.
    pub fn failure_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.failing)
    }

    /// When `true`, `show` returns a transient I/O error.
    pub fn fail_show(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub fn visible(&self) -> &ColorGrid {
        self.buffers.visible()
    }
}

impl Device for RecordingDevice {
    fn name(&self) -> &str {
        self.buffers.name()
    }

    fn size(&self) -> GridSize {
        self.declared
    }

    fn set(&mut self, color: Color, x: u32, y: u32) -> Result<(), DeviceError> {
        self.buffers.stage(color, x, y)?;
        self.calls.push(DeviceCall::Set { color, x, y });
        Ok(())
    }

    fn show(&mut self) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::Show);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeviceError::Io {
                device: self.buffers.name().to_string(),
                source: io::Error::new(io::ErrorKind::Other, "mock failure"),
            });
        }
        self.buffers.publish();
        Ok(())
    }

    fn get(&self, x: u32, y: u32) -> Option<Color> {
        self.buffers.visible().get(x, y)
    }
}
