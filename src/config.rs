// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application settings.
//!
//! Settings are read from a YAML file named by `$DENTMARK_SETTINGS`, falling
//! back to `dentmark.yaml` in the working directory. A missing file means
//! defaults; a malformed one is logged and also yields defaults.

use crate::models::palette::ShapeKind;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Upper bound on per-image undo depth.
pub const MAX_HISTORY: usize = 50;

/// Environment variable naming the settings file.
pub const SETTINGS_ENV: &str = "DENTMARK_SETTINGS";

const DEFAULT_SETTINGS_FILE: &str = "dentmark.yaml";

/// Size of the area images are fitted into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl Default for ContainerSize {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 700.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Verbose logging for marker and surface operations.
    pub debug_logging: bool,
    pub history_limit: usize,
    /// Minimum gap between two pointer-created markers.
    pub marker_debounce_ms: u64,
    /// Quiet period before a burst of resize events is applied.
    pub resize_debounce_ms: u64,
    /// Per-shape multiplier on the design size ratios.
    pub shape_size_factors: BTreeMap<ShapeKind, f64>,
    pub default_container: ContainerSize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            history_limit: MAX_HISTORY,
            marker_debounce_ms: 300,
            resize_debounce_ms: 150,
            shape_size_factors: BTreeMap::new(),
            default_container: ContainerSize::default(),
        }
    }
}

impl Settings {
    /// Parse settings from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        Ok(settings)
    }

    /// Load settings from a file, falling back to defaults on any failure.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings file at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                log::warn!("Failed to read settings {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_yaml_str(&text) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Malformed settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load from the configured location.
    pub fn load_default() -> Self {
        Self::load(&settings_path())
    }

    /// History depth clamped to `1..=MAX_HISTORY`.
    pub fn effective_history_limit(&self) -> usize {
        self.history_limit.clamp(1, MAX_HISTORY)
    }

    /// Size factor for a shape kind; invalid entries count as 1.
    pub fn size_factor(&self, shape: ShapeKind) -> f64 {
        match self.shape_size_factors.get(&shape) {
            Some(&f) if f.is_finite() && f > 0.0 => f,
            _ => 1.0,
        }
    }

    /// Default `env_logger` filter for the debug-logging toggle.
    pub fn log_filter(&self) -> &'static str {
        if self.debug_logging {
            "debug"
        } else {
            "info"
        }
    }
}

/// Path of the settings file.
pub fn settings_path() -> PathBuf {
    std::env::var_os(SETTINGS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let s = Settings::from_yaml_str("debug_logging: true\nshape_size_factors:\n  point: 1.5\n")
            .unwrap();
        assert!(s.debug_logging);
        assert_eq!(s.marker_debounce_ms, 300);
        assert_eq!(s.size_factor(ShapeKind::Point), 1.5);
        assert_eq!(s.size_factor(ShapeKind::Oval), 1.0);
        assert_eq!(s.log_filter(), "debug");
    }

    #[test]
    fn test_history_limit_is_capped() {
        let s = Settings {
            history_limit: 500,
            ..Settings::default()
        };
        assert_eq!(s.effective_history_limit(), MAX_HISTORY);
        let s = Settings {
            history_limit: 0,
            ..Settings::default()
        };
        assert_eq!(s.effective_history_limit(), 1);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let s = Settings::load(Path::new("/definitely/not/here/dentmark.yaml"));
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn test_bad_size_factor_ignored() {
        let s = Settings::from_yaml_str("shape_size_factors:\n  cross: -2.0\n").unwrap();
        assert_eq!(s.size_factor(ShapeKind::Cross), 1.0);
    }
}
