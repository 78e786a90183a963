//! Toplevel manager configuration.
//!
//! Compositors usually embed [`ManagerConfig`] in their own config file; it
//! can also be loaded standalone from JSON or overridden from the
//! environment.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::core::errors::{CoreError, Result};

/// Highest protocol version this crate implements.
pub const MAX_VERSION: u32 = 3;

/// Environment variable overriding [`ManagerConfig::version`].
pub const ENV_VERSION: &str = "BOX_TOPLEVEL_VERSION";
/// Environment variable overriding [`ManagerConfig::coalesce_outputs`].
pub const ENV_COALESCE_OUTPUTS: &str = "BOX_TOPLEVEL_COALESCE_OUTPUTS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Protocol version advertised by the global (1..=3).
    pub version: u32,
    /// Defer output changes and `done` to the next idle tick. When off,
    /// every change is flushed as soon as it happens.
    pub coalesce_outputs: bool,
    /// Skip title/app-id/state broadcasts when the value did not change.
    pub suppress_redundant: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            version: MAX_VERSION,
            coalesce_outputs: true,
            suppress_redundant: false,
        }
    }
}

impl ManagerConfig {
    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| CoreError::config_error(e.to_string()))?;
        Ok(config.sanitized())
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read toplevel config {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Failed to parse toplevel config {}", path.display()))
    }

    /// Defaults overlaid with `BOX_TOPLEVEL_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`; unparsable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(ENV_VERSION) {
            match value.trim().parse() {
                Ok(version) => self.version = version,
                Err(_) => tracing::warn!("Ignoring {}={:?}: not a number", ENV_VERSION, value),
            }
        }
        if let Some(value) = lookup(ENV_COALESCE_OUTPUTS) {
            match parse_bool(&value) {
                Some(flag) => self.coalesce_outputs = flag,
                None => tracing::warn!("Ignoring {}={:?}: not a boolean", ENV_COALESCE_OUTPUTS, value),
            }
        }
        self.sanitized()
    }

    /// Clamp the advertised version into the supported range.
    pub fn sanitized(mut self) -> Self {
        let clamped = self.version.clamp(1, MAX_VERSION);
        if clamped != self.version {
            tracing::warn!("Toplevel manager version {} unsupported, using {}", self.version, clamped);
            self.version = clamped;
        }
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.version, 3);
        assert!(config.coalesce_outputs);
        assert!(!config.suppress_redundant);
    }

    #[test]
    fn test_partial_json() {
        let config = ManagerConfig::from_json(r#"{ "suppress_redundant": true }"#).unwrap();
        assert_eq!(config.version, MAX_VERSION);
        assert!(config.suppress_redundant);
    }

    #[test]
    fn test_version_is_clamped() {
        let config = ManagerConfig::from_json(r#"{ "version": 9 }"#).unwrap();
        assert_eq!(config.version, MAX_VERSION);
        let config = ManagerConfig::from_json(r#"{ "version": 0 }"#).unwrap();
        assert_eq!(config.version, 1);
    }

    #[test]
    fn test_invalid_json() {
        let err = ManagerConfig::from_json("{ version: ").unwrap_err();
        assert!(matches!(err, CoreError::ConfigError(_)));
    }

    #[test]
    fn test_overrides() {
        let config = ManagerConfig::default().with_overrides(|key| match key {
            ENV_VERSION => Some("2".to_string()),
            ENV_COALESCE_OUTPUTS => Some("off".to_string()),
            _ => None,
        });
        assert_eq!(config.version, 2);
        assert!(!config.coalesce_outputs);

        let config = ManagerConfig::default().with_overrides(|key| match key {
            ENV_VERSION => Some("three".to_string()),
            _ => None,
        });
        assert_eq!(config.version, 3);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "version": 2, "coalesce_outputs": false }}"#).unwrap();

        let config = ManagerConfig::load(file.path()).unwrap();
        assert_eq!(config.version, 2);
        assert!(!config.coalesce_outputs);

        assert!(ManagerConfig::load("/nonexistent/box-toplevel.json").is_err());
    }
}
