//! TOML-based configuration for the lightwall engine.
//!
//! Reads `AppConfig` from the file given with `--config`, or from the
//! platform-appropriate default location:
//! - Windows:  `%APPDATA%\Lightwall\config.toml`
//! - Linux:    `~/.config/lightwall/config.toml`
//! - macOS:    `~/Library/Application Support/Lightwall/config.toml`
//!
//! # File layout
//!
//! ```toml
//! [engine]
//! mode = "cross"          # cross | wash | random | off
//! log_level = "info"
//!
//! [trigger]
//! source = "timer"        # timer | manual
//! interval_secs = 2.0
//!
//! [programs]
//! cross_color = "#ff0000"
//! wash_step = 7
//! random_seed = 1234      # optional
//!
//! [[devices]]
//! name = "left"
//! type = "udp"
//! address = "192.168.1.40:7000"
//! width = 16
//! height = 16
//!
//! [[devices]]
//! name = "right"
//! type = "virtual"
//! x = 16
//! width = 16
//! height = 16
//! ```
//!
//! Every key except a device's `name` and `type` has a default.  The
//! driver-specific keys of a `[[devices]]` entry are collected into
//! [`DeviceEntry::params`] and interpreted by the device factory.
//!
//! # Serde default values (for beginners)
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.  The same
//! functions back the `Default` impls, so a missing section and a missing
//! file produce identical settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use lightwall_core::effects::EffectOptions;
use lightwall_core::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::application::build_registry::DeviceDeclaration;
use crate::application::pipeline::TriggerSource;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `[trigger] source` names no known trigger.
    #[error("unknown trigger source {0:?} (expected \"timer\" or \"manual\")")]
    UnknownTriggerSource(String),

    /// `[trigger] interval_secs` is not a positive, representable duration.
    #[error("trigger interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub programs: ProgramsConfig,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Name of the program to run at start-up.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerConfig {
    /// `"timer"` or `"manual"`.
    #[serde(default = "default_trigger_source")]
    pub source: String,
    /// Period of the timer trigger.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramsConfig {
    #[serde(default = "default_cross_color")]
    pub cross_color: Color,
    #[serde(default = "default_wash_step")]
    pub wash_step: u16,
    /// Seed for the `random` program; unset means a new sequence every run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

/// One `[[devices]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub x: u32,
    #[serde(default)]
    pub y: u32,
    /// Driver-specific keys.
    #[serde(flatten)]
    pub params: toml::Table,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_mode() -> String {
    "cross".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_trigger_source() -> String {
    "timer".to_string()
}
fn default_interval_secs() -> f64 {
    2.0
}
fn default_cross_color() -> Color {
    Color::RED
}
fn default_wash_step() -> u16 {
    7
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            log_level: default_log_level(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            source: default_trigger_source(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for ProgramsConfig {
    fn default() -> Self {
        Self {
            cross_color: default_cross_color(),
            wash_step: default_wash_step(),
            random_seed: None,
        }
    }
}

// ── Conversions into application types ───────────────────────────────────────

impl AppConfig {
    /// A starter configuration with one 16x16 virtual device.
    pub fn sample() -> Self {
        let mut params = toml::Table::new();
        params.insert("width".into(), toml::Value::Integer(16));
        params.insert("height".into(), toml::Value::Integer(16));
        Self {
            devices: vec![DeviceEntry {
                name: Some("preview".to_string()),
                kind: Some("virtual".to_string()),
                x: 0,
                y: 0,
                params,
            }],
            ..Self::default()
        }
    }

    /// Resolves `[trigger]` into a [`TriggerSource`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTriggerSource`] or
    /// [`ConfigError::InvalidInterval`].
    pub fn trigger_source(&self) -> Result<TriggerSource, ConfigError> {
        match self.trigger.source.as_str() {
            "timer" => {
                let secs = self.trigger.interval_secs;
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(ConfigError::InvalidInterval(secs));
                }
                let interval = Duration::try_from_secs_f64(secs)
                    .map_err(|_| ConfigError::InvalidInterval(secs))?;
                Ok(TriggerSource::Timer { interval })
            }
            "manual" => Ok(TriggerSource::Manual),
            other => Err(ConfigError::UnknownTriggerSource(other.to_string())),
        }
    }

    pub fn effect_options(&self) -> EffectOptions {
        EffectOptions {
            cross_color: self.programs.cross_color,
            wash_step: self.programs.wash_step,
            random_seed: self.programs.random_seed,
        }
    }

    /// Converts `[[devices]]` into declarations, in file order.
    ///
    /// Entries without a name cannot be referred to and are skipped with a
    /// warning; every other check is left to the device factory.
    pub fn device_declarations(&self) -> Vec<DeviceDeclaration> {
        self.devices
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let Some(name) = entry.name.clone() else {
                    warn!("devices[{index}] has no name; ignored");
                    return None;
                };
                Some(DeviceDeclaration {
                    name,
                    kind: entry.kind.clone(),
                    origin: (entry.x, entry.y),
                    params: entry.params.clone(),
                })
            })
            .collect()
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("no config file at {}; using defaults", path.display());
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the `lightwall` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Lightwall"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("lightwall"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Lightwall")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(test: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("lightwall_cfg_{}_{test}", std::process::id()))
            .join("config.toml")
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_values() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.engine.mode, "cross");
        assert_eq!(cfg.engine.log_level, "info");
        assert_eq!(cfg.trigger.source, "timer");
        assert_eq!(cfg.trigger.interval_secs, 2.0);
        assert_eq!(cfg.programs.cross_color, Color::RED);
        assert!(cfg.devices.is_empty());
    }

    #[test]
    fn test_empty_file_equals_default() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_device_entries_keep_order_and_driver_params() {
        let cfg: AppConfig = toml::from_str(
            r##"
            [engine]
            mode = "wash"

            [programs]
            cross_color = "#00ff00"

            [[devices]]
            name = "left"
            type = "udp"
            address = "10.0.0.2:7000"
            width = 16
            height = 8

            [[devices]]
            name = "right"
            type = "virtual"
            x = 16
            width = 16
            height = 8
            "##,
        )
        .unwrap();

        let declarations = cfg.device_declarations();

        assert_eq!(cfg.engine.mode, "wash");
        assert_eq!(cfg.effect_options().cross_color, Color::GREEN);
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].name, "left");
        assert_eq!(declarations[0].kind.as_deref(), Some("udp"));
        assert_eq!(
            declarations[0].params.get("address").and_then(|v| v.as_str()),
            Some("10.0.0.2:7000")
        );
        assert_eq!(declarations[1].origin, (16, 0));
        assert!(!declarations[1].params.contains_key("x"), "origin keys are not driver params");
    }

    #[test]
    fn test_random_seed_reaches_effect_options() {
        let cfg: AppConfig = toml::from_str("[programs]\nrandom_seed = 1234").unwrap();

        assert_eq!(cfg.effect_options().random_seed, Some(1234));
        assert_eq!(AppConfig::default().effect_options().random_seed, None);
    }

    #[test]
    fn test_device_without_type_is_kept_for_factory_to_reject() {
        let cfg: AppConfig = toml::from_str("[[devices]]\nname = \"bare\"\nwidth = 1\nheight = 1").unwrap();
        let declarations = cfg.device_declarations();
        assert_eq!(declarations.len(), 1);
        assert!(declarations[0].kind.is_none());
    }

    #[test]
    fn test_device_without_name_is_skipped() {
        let cfg: AppConfig = toml::from_str("[[devices]]\ntype = \"virtual\"\nwidth = 1\nheight = 1").unwrap();
        assert!(cfg.device_declarations().is_empty());
    }

    #[test]
    fn test_invalid_cross_color_is_parse_error() {
        let result: Result<AppConfig, _> = toml::from_str("[programs]\ncross_color = \"red\"");
        assert!(result.is_err());
    }

    // ── Trigger source ────────────────────────────────────────────────────────

    #[test]
    fn test_trigger_source_timer_uses_interval() {
        let mut cfg = AppConfig::default();
        cfg.trigger.interval_secs = 0.25;
        assert_eq!(
            cfg.trigger_source().unwrap(),
            TriggerSource::Timer { interval: Duration::from_millis(250) }
        );
    }

    #[test]
    fn test_trigger_source_manual() {
        let mut cfg = AppConfig::default();
        cfg.trigger.source = "manual".to_string();
        assert_eq!(cfg.trigger_source().unwrap(), TriggerSource::Manual);
    }

    #[test]
    fn test_trigger_source_unknown_is_error() {
        let mut cfg = AppConfig::default();
        cfg.trigger.source = "midi".to_string();
        assert!(matches!(cfg.trigger_source(), Err(ConfigError::UnknownTriggerSource(s)) if s == "midi"));
    }

    #[test]
    fn test_trigger_source_rejects_non_positive_interval() {
        let mut cfg = AppConfig::default();
        cfg.trigger.interval_secs = 0.0;
        assert!(matches!(cfg.trigger_source(), Err(ConfigError::InvalidInterval(_))));
    }

    #[test]
    fn test_trigger_source_rejects_interval_too_large_for_duration() {
        // Arrange
        let cfg: AppConfig = toml::from_str("[trigger]\ninterval_secs = 1e30\n").unwrap();

        // Act
        let result = cfg.trigger_source();

        // Assert
        assert!(matches!(result, Err(ConfigError::InvalidInterval(secs)) if secs == 1e30));
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_load_missing_file_returns_default() {
        let cfg = load_config_from(&temp_config("missing")).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_and_load_sample_round_trip() {
        // Arrange
        let path = temp_config("round_trip");
        let sample = AppConfig::sample();

        // Act
        save_config_to(&path, &sample).unwrap();
        let restored = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(restored, sample);
        assert_eq!(restored.device_declarations()[0].name, "preview");
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("config.toml"));
        }
    }
}
