//! BuildRegistryUseCase: turns device declarations into a [`DeviceRegistry`].
//!
//! The main entry point is [`build_registry`], which walks the ordered list of
//! [`DeviceDeclaration`]s (typically loaded from the TOML config), asks a
//! [`DeviceFactory`] to create each device, and places it at its origin.
//!
//! # Degrade, don't die
//!
//! A light installation should come up even when one panel is misconfigured.
//! A declaration with no type, an unknown type, or a missing/invalid parameter
//! is logged and skipped: the canvas just gets smaller.  So is a device whose
//! origin would push it past the canvas coordinate range.  The one exception is
//! two declarations sharing a name, which is ambiguous and therefore fatal.

use std::collections::HashSet;
use std::io;

use lightwall_core::{Device, DeviceRegistry, GridError, RegistryError};
use thiserror::Error;
use tracing::{info, warn};

/// One device declaration: a name, a type tag and type-specific parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDeclaration {
    pub name: String,
    /// Type tag selecting the driver (`"virtual"`, `"udp"`, ...).
    pub kind: Option<String>,
    /// Top-left corner of the device in canvas space.
    pub origin: (u32, u32),
    /// Remaining driver-specific parameters.
    pub params: toml::Table,
}

/// Why a single declaration could not be turned into a device.
#[derive(Debug, Error)]
pub enum DeviceSpecError {
    #[error("no type given")]
    MissingType,

    #[error("unsupported type: {0}")]
    UnknownType(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("invalid grid: {0}")]
    Grid(#[from] GridError),

    #[error("driver initialisation failed: {0}")]
    Io(#[from] io::Error),
}

/// Creates concrete devices from declarations.
///
/// The production implementation lives in `infrastructure::devices`; tests
/// can supply their own.
pub trait DeviceFactory {
    /// # Errors
    ///
    /// Returns [`DeviceSpecError`] when the declaration cannot be honoured.
    fn create(&self, declaration: &DeviceDeclaration) -> Result<Box<dyn Device>, DeviceSpecError>;
}

/// Fatal errors while building the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildRegistryError {
    #[error("device name {0:?} is declared more than once")]
    DuplicateName(String),
}

/// Builds a registry from `declarations`, in order.
///
/// Declarations the factory rejects are logged and skipped.
///
/// # Errors
///
/// Returns [`BuildRegistryError::DuplicateName`] before creating any device if
/// two declarations share a name.
pub fn build_registry(
    declarations: &[DeviceDeclaration],
    factory: &dyn DeviceFactory,
) -> Result<DeviceRegistry, BuildRegistryError> {
    let mut seen = HashSet::new();
    for declaration in declarations {
        if !seen.insert(declaration.name.as_str()) {
            return Err(BuildRegistryError::DuplicateName(declaration.name.clone()));
        }
    }

    let registry = DeviceRegistry::new();
    for declaration in declarations {
        let device = match factory.create(declaration) {
            Ok(device) => device,
            Err(e) => {
                warn!("device {} ignored: {e}", declaration.name);
                continue;
            }
        };
        let size = device.size();
        match registry.register(device, declaration.origin) {
            Ok(()) => info!(
                "created device [{} ({}, {})]",
                declaration.name,
                declaration.kind.as_deref().unwrap_or("?"),
                size
            ),
            Err(e @ RegistryError::OutOfCanvas { .. }) => {
                warn!("device {} ignored: {e}", declaration.name);
            }
            Err(RegistryError::DuplicateName(name) | RegistryError::UnknownDevice(name)) => {
                return Err(BuildRegistryError::DuplicateName(name));
            }
        }
    }
    Ok(registry)
}
