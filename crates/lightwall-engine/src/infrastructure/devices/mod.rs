//! Device drivers and the factory that builds them from declarations.
//!
//! | `type`        | Driver                                  | Parameters                              |
//! |---------------|-----------------------------------------|-----------------------------------------|
//! | `virtual`     | [`VirtualDevice`] (in-memory only)      | `width`, `height`                       |
//! | `udp`         | [`udp::NetworkGridDevice`]              | `address`, `width`, `height`            |
//! | `framebuffer` | [`framebuffer::FramebufferDevice`]      | `path`, `width`, `height`, `brightness` |
//!
//! The type tag is matched by value.  Anything else is reported as
//! [`DeviceSpecError::UnknownType`] and the declaration is skipped by
//! [`build_registry`](crate::application::build_registry::build_registry).
//!
//! [`mock::RecordingDevice`] is not constructible from configuration; it
//! exists for tests.

pub mod framebuffer;
pub mod mock;
pub mod udp;

use std::net::{SocketAddr, ToSocketAddrs};

use lightwall_core::{Device, GridSize, VirtualDevice};

use crate::application::build_registry::{DeviceDeclaration, DeviceFactory, DeviceSpecError};

use framebuffer::FramebufferDevice;
use udp::NetworkGridDevice;

/// Builds the drivers shipped with lightwall.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDeviceFactory;

impl DeviceFactory for BuiltinDeviceFactory {
    fn create(&self, declaration: &DeviceDeclaration) -> Result<Box<dyn Device>, DeviceSpecError> {
        let kind = declaration
            .kind
            .as_deref()
            .ok_or(DeviceSpecError::MissingType)?;
        let params = &declaration.params;
        let name = declaration.name.clone();

        match kind {
            "virtual" => Ok(Box::new(VirtualDevice::new(name, grid_size(params)?)?)),
            "udp" => {
                let target = socket_address(required_str(params, "address")?)?;
                Ok(Box::new(NetworkGridDevice::connect(name, grid_size(params)?, target)?))
            }
            "framebuffer" => {
                let path = required_str(params, "path")?;
                let brightness = optional_float(params, "brightness", 1.0)?;
                Ok(Box::new(FramebufferDevice::open(
                    name,
                    grid_size(params)?,
                    path,
                    brightness,
                )?))
            }
            other => Err(DeviceSpecError::UnknownType(other.to_string())),
        }
    }
}

// ── Parameter helpers ─────────────────────────────────────────────────────────

fn grid_size(params: &toml::Table) -> Result<GridSize, DeviceSpecError> {
    Ok(GridSize::new(
        positive_u32(params, "width")?,
        positive_u32(params, "height")?,
    ))
}

fn positive_u32(params: &toml::Table, field: &'static str) -> Result<u32, DeviceSpecError> {
    let value = params.get(field).ok_or(DeviceSpecError::MissingField(field))?;
    let raw = value.as_integer().ok_or_else(|| DeviceSpecError::InvalidField {
        field,
        reason: format!("expected an integer, got {}", value.type_str()),
    })?;
    match u32::try_from(raw) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(DeviceSpecError::InvalidField {
            field,
            reason: format!("{raw} is not a positive 32-bit integer"),
        }),
    }
}

fn required_str<'a>(params: &'a toml::Table, field: &'static str) -> Result<&'a str, DeviceSpecError> {
    let value = params.get(field).ok_or(DeviceSpecError::MissingField(field))?;
    value.as_str().ok_or_else(|| DeviceSpecError::InvalidField {
        field,
        reason: format!("expected a string, got {}", value.type_str()),
    })
}

fn optional_float(
    params: &toml::Table,
    field: &'static str,
    default: f32,
) -> Result<f32, DeviceSpecError> {
    match params.get(field) {
        None => Ok(default),
        Some(toml::Value::Float(f)) => Ok(*f as f32),
        Some(toml::Value::Integer(i)) => Ok(*i as f32),
        Some(other) => Err(DeviceSpecError::InvalidField {
            field,
            reason: format!("expected a number, got {}", other.type_str()),
        }),
    }
}

/// Resolves `"host:port"`, taking the first address.
fn socket_address(address: &str) -> Result<SocketAddr, DeviceSpecError> {
    let invalid = |reason: String| DeviceSpecError::InvalidField {
        field: "address",
        reason,
    };
    address
        .to_socket_addrs()
        .map_err(|e| invalid(format!("{address}: {e}")))?
        .next()
        .ok_or_else(|| invalid(format!("{address} did not resolve")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration(kind: Option<&str>, params: &str) -> DeviceDeclaration {
        DeviceDeclaration {
            name: "panel".to_string(),
            kind: kind.map(str::to_string),
            origin: (0, 0),
            params: toml::from_str(params).unwrap(),
        }
    }

    #[test]
    fn test_create_virtual_device_with_declared_size() {
        let device = BuiltinDeviceFactory
            .create(&declaration(Some("virtual"), "width = 8\nheight = 4"))
            .unwrap();

        assert_eq!(device.name(), "panel");
        assert_eq!(device.size(), GridSize::new(8, 4));
    }

    #[test]
    fn test_create_udp_device_resolves_address() {
        let device = BuiltinDeviceFactory
            .create(&declaration(
                Some("udp"),
                "address = \"127.0.0.1:7777\"\nwidth = 4\nheight = 4",
            ))
            .unwrap();
        assert_eq!(device.size(), GridSize::new(4, 4));
    }

    #[test]
    fn test_create_without_type_fails() {
        let result = BuiltinDeviceFactory.create(&declaration(None, "width = 1\nheight = 1"));
        assert!(matches!(result, Err(DeviceSpecError::MissingType)));
    }

    #[test]
    fn test_create_unknown_type_fails() {
        let result = BuiltinDeviceFactory.create(&declaration(Some("hologram"), "width = 1\nheight = 1"));
        assert!(matches!(result, Err(DeviceSpecError::UnknownType(ref t)) if t == "hologram"));
    }

    #[test]
    fn test_create_missing_dimension_fails() {
        let result = BuiltinDeviceFactory.create(&declaration(Some("virtual"), "width = 3"));
        assert!(matches!(result, Err(DeviceSpecError::MissingField("height"))));
    }

    #[test]
    fn test_create_rejects_non_positive_and_mistyped_dimensions() {
        for params in ["width = 0\nheight = 1", "width = -4\nheight = 1", "width = \"wide\"\nheight = 1"] {
            let result = BuiltinDeviceFactory.create(&declaration(Some("virtual"), params));
            assert!(
                matches!(result, Err(DeviceSpecError::InvalidField { field: "width", .. })),
                "params {params:?} must be rejected"
            );
        }
    }

    #[test]
    fn test_create_udp_with_bad_address_fails() {
        let result = BuiltinDeviceFactory.create(&declaration(
            Some("udp"),
            "address = \"not an address\"\nwidth = 1\nheight = 1",
        ));
        assert!(matches!(result, Err(DeviceSpecError::InvalidField { field: "address", .. })));
    }

    #[test]
    fn test_optional_float_accepts_integers_and_defaults() {
        let params: toml::Table = toml::from_str("brightness = 1").unwrap();
        assert_eq!(optional_float(&params, "brightness", 0.5).unwrap(), 1.0);
        assert_eq!(optional_float(&toml::Table::new(), "brightness", 0.5).unwrap(), 0.5);
    }
}
