//! Device registry: the canvas composition domain entity.
//!
//! The registry owns every named [`Device`] plus the ordered list of
//! [`Placement`]s that position devices inside one shared coordinate space
//! ("canvas space").  The canvas has no stored size: it is the bounding box of
//! the placements' far corners, recomputed on demand.
//!
//! Canvas coordinates translate to device-local coordinates by subtracting the
//! placement origin.  Placements may overlap (every covering device receives
//! the pixel) and may leave gaps (pixels nobody covers are simply dropped).

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

use super::color::GridSize;
use super::device::Device;

/// Errors that can occur when registering or looking up devices.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A device with this name is already registered.
    #[error("duplicate device name: {0}")]
    DuplicateName(String),

    /// No device with this name is registered.
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// The placement's far corner does not fit in canvas coordinates.
    #[error("device {device} at ({x}, {y}) extends past the canvas coordinate range")]
    OutOfCanvas { device: String, x: u32, y: u32 },
}

/// A device's rectangle inside the canvas.
///
/// `width` and `height` are copied from the device at registration time;
/// devices never change size afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Name of the placed device.
    pub device: String,
    /// X coordinate of the top-left corner in canvas space.
    pub x: u32,
    /// Y coordinate of the top-left corner in canvas space.
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Places a `size` rectangle at `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::OutOfCanvas`] when the far corner would not fit
    /// in a `u32`.
    pub fn new(device: impl Into<String>, origin: (u32, u32), size: GridSize) -> Result<Self, RegistryError> {
        let device = device.into();
        let (x, y) = origin;
        if x.checked_add(size.width).is_none() || y.checked_add(size.height).is_none() {
            return Err(RegistryError::OutOfCanvas { device, x, y });
        }
        Ok(Self {
            device,
            x,
            y,
            width: size.width,
            height: size.height,
        })
    }

    /// Rightmost X coordinate (exclusive).
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Bottommost Y coordinate (exclusive).
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Returns `true` if the canvas coordinate lies inside this placement.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Translates a canvas coordinate into the device's local coordinates.
    ///
    /// Returns `None` when the coordinate is outside this placement.
    pub fn to_local(&self, x: u32, y: u32) -> Option<(u32, u32)> {
        self.contains(x, y).then(|| (x - self.x, y - self.y))
    }
}

/// Devices in registration order with a name index.
#[derive(Default)]
struct DeviceTable {
    devices: Vec<Box<dyn Device>>,
    index: HashMap<String, usize>,
}

/// The set of named devices and their placements on the canvas.
///
/// Safe to share between threads.  The device table and the placement list
/// have separate locks: placement lookups never wait on device I/O.
#[derive(Default)]
pub struct DeviceRegistry {
    table: Mutex<DeviceTable>,
    placements: RwLock<Vec<Placement>>,
}

impl fmt::Debug for DeviceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("devices", &self.names())
            .field("placements", &*self.read_placements())
            .finish()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a device and places it with its top-left corner at `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if a device with the same name
    /// is already registered; the registry keeps the first one unchanged.
    /// Returns [`RegistryError::OutOfCanvas`] if the device would extend past
    /// the coordinate range; nothing is registered.
    pub fn register(&self, device: Box<dyn Device>, origin: (u32, u32)) -> Result<(), RegistryError> {
        let name = device.name().to_string();
        let size = device.size();
        let placement = Placement::new(name.clone(), origin, size)?;
        {
            let mut table = self.lock_table();
            if table.index.contains_key(&name) {
                return Err(RegistryError::DuplicateName(name));
            }
            let slot = table.devices.len();
            table.devices.push(device);
            table.index.insert(name.clone(), slot);
        }
        debug!("registered device [{name} {size}]");
        self.push_placement(placement);
        Ok(())
    }

    /// Adds another placement for an already registered device.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownDevice`] if `name` is not registered, or
    /// [`RegistryError::OutOfCanvas`] if the placement would not fit.
    pub fn place(&self, name: &str, origin: (u32, u32)) -> Result<(), RegistryError> {
        let size = self.size_of(name)?;
        self.push_placement(Placement::new(name, origin, size)?);
        Ok(())
    }

    /// Returns the declared size of the named device.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownDevice`] if `name` is not registered.
    pub fn size_of(&self, name: &str) -> Result<GridSize, RegistryError> {
        self.with_device(name, |device| device.size())
    }

    /// Returns every placement covering the canvas coordinate, in registration order.
    ///
    /// An empty result means the coordinate is unmapped.
    pub fn devices_at(&self, x: u32, y: u32) -> Vec<Placement> {
        self.read_placements()
            .iter()
            .filter(|p| p.contains(x, y))
            .cloned()
            .collect()
    }

    /// Returns the bounding size of all placements, `(0, 0)` when there are none.
    pub fn canvas_size(&self) -> GridSize {
        self.read_placements()
            .iter()
            .fold(GridSize::default(), |acc, p| {
                GridSize::new(acc.width.max(p.right()), acc.height.max(p.bottom()))
            })
    }

    /// Snapshot of all placements in registration order.
    pub fn placements(&self) -> Vec<Placement> {
        self.read_placements().clone()
    }

    /// Registered device names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.lock_table()
            .devices
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.lock_table().devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` with exclusive access to the named device.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownDevice`] if `name` is not registered.
    pub fn with_device<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut dyn Device) -> R,
    ) -> Result<R, RegistryError> {
        let mut table = self.lock_table();
        let slot = *table
            .index
            .get(name)
            .ok_or_else(|| RegistryError::UnknownDevice(name.to_string()))?;
        Ok(f(table.devices[slot].as_mut()))
    }

    /// Applies `f` to every registered device in registration order.
    pub fn for_each(&self, mut f: impl FnMut(&mut dyn Device)) {
        let mut table = self.lock_table();
        for device in table.devices.iter_mut() {
            f(device.as_mut());
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn push_placement(&self, placement: Placement) {
        debug!("placing device [{}] at ({}, {})", placement.device, placement.x, placement.y);
        self.placements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(placement);
    }

    fn lock_table(&self) -> std::sync::MutexGuard<'_, DeviceTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_placements(&self) -> std::sync::RwLockReadGuard<'_, Vec<Placement>> {
        self.placements.read().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
