// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CpdError, Result};
use crate::types::Orientation;

/// Environment variable that disables the print-backend manager when set to
/// any non-empty value.
pub const DISABLE_ENV: &str = "CPDB_DISABLE";

/// Directory where installed print backends register themselves.
pub const DEFAULT_BACKEND_DIR: &str = "/usr/share/print-backends";

/// Interface description every backend implements.
pub const DEFAULT_INTERFACE_FILE: &str = "/usr/share/dbus-1/interfaces/org.openprinting.Backend.xml";

/// How `check_printers_changed` learns about printer set changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeDetection {
    /// Use push notifications when the transport has them, polling otherwise.
    Auto,
    /// Rely on queued backend notifications.
    Events,
    /// Compare snapshot sizes on every check.
    Polling,
}

/// Settings new printer records start from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterDefaults {
    /// Feature string of new records (empty for ordinary printers).
    pub features: String,
    pub copies: u32,
    pub orientation: Orientation,
}

impl Default for PrinterDefaults {
    fn default() -> Self {
        Self {
            features: String::new(),
            copies: 1,
            orientation: Orientation::Portrait,
        }
    }
}

/// Print-backend manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpdConfig {
    /// Master switch; `false` defers every operation to the fallback manager.
    pub enabled: bool,
    /// Directory scanned for installed backends.
    pub backend_dir: PathBuf,
    /// Backend interface description that must be present.
    pub interface_file: PathBuf,
    /// Where staging files are created (`None` = system temp dir).
    pub spool_dir: Option<PathBuf>,
    /// File-name prefix of staging files.
    pub spool_prefix: String,
    pub change_detection: ChangeDetection,
    pub defaults: PrinterDefaults,
}

impl Default for CpdConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend_dir: PathBuf::from(DEFAULT_BACKEND_DIR),
            interface_file: PathBuf::from(DEFAULT_INTERFACE_FILE),
            spool_dir: None,
            spool_prefix: "cpd-spool-".into(),
            change_detection: ChangeDetection::Auto,
            defaults: PrinterDefaults::default(),
        }
    }
}

impl CpdConfig {
    /// Default settings with the process environment toggle applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_disable_toggle(std::env::var(DISABLE_ENV).ok().as_deref());
        config
    }

    /// Parse a serialized configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Disable the backend when the toggle value is non-empty.
    pub fn apply_disable_toggle(&mut self, value: Option<&str>) {
        if value.is_some_and(|v| !v.is_empty()) {
            info!(env = DISABLE_ENV, "print backends disabled by environment");
            self.enabled = false;
        }
    }

    /// Check that the backend interface file exists and at least one backend
    /// is installed.
    pub fn check_backends(&self) -> Result<()> {
        if !self.interface_file.is_file() {
            return Err(CpdError::BackendsMissing(format!(
                "interface file {} not found",
                self.interface_file.display()
            )));
        }
        if !dir_has_entries(&self.backend_dir) {
            return Err(CpdError::BackendsMissing(format!(
                "no backends in {}",
                self.backend_dir.display()
            )));
        }
        Ok(())
    }

    /// Validate the values a deserialized config may carry.
    pub fn validate(&self) -> Result<()> {
        if self.spool_prefix.contains(std::path::MAIN_SEPARATOR) {
            return Err(CpdError::Config(format!(
                "spool prefix '{}' must not contain a path separator",
                self.spool_prefix
            )));
        }
        if self.defaults.copies == 0 {
            return Err(CpdError::Config("default copy count must be at least 1".into()));
        }
        Ok(())
    }
}

fn dir_has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toggle_keeps_backend_enabled() {
        let mut config = CpdConfig::default();
        config.apply_disable_toggle(Some(""));
        assert!(config.enabled);
        config.apply_disable_toggle(None);
        assert!(config.enabled);
    }

    #[test]
    fn non_empty_toggle_disables_backend() {
        let mut config = CpdConfig::default();
        config.apply_disable_toggle(Some("1"));
        assert!(!config.enabled);
    }

    #[test]
    fn json_config_round_trips_through_serde() {
        let config = CpdConfig {
            change_detection: ChangeDetection::Polling,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).expect("serialize");
        let parsed = CpdConfig::from_json(&json).expect("parse");
        assert_eq!(parsed.change_detection, ChangeDetection::Polling);
        assert_eq!(parsed.backend_dir, PathBuf::from(DEFAULT_BACKEND_DIR));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        assert!(matches!(
            CpdConfig::from_json("{"),
            Err(CpdError::Serialization(_))
        ));
    }

    #[test]
    fn backends_check_requires_interface_and_backend_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backends = dir.path().join("backends");
        std::fs::create_dir(&backends).expect("mkdir");
        let interface = dir.path().join("Backend.xml");

        let config = CpdConfig {
            backend_dir: backends.clone(),
            interface_file: interface.clone(),
            ..Default::default()
        };
        assert!(config.check_backends().is_err());

        std::fs::write(&interface, "<node/>").expect("write interface");
        assert!(config.check_backends().is_err());

        std::fs::write(backends.join("org.openprinting.Backend.CUPS"), "").expect("write backend");
        assert!(config.check_backends().is_ok());
    }

    #[test]
    fn zero_default_copies_is_rejected() {
        let mut config = CpdConfig::default();
        config.defaults.copies = 0;
        assert!(matches!(config.validate(), Err(CpdError::Config(_))));
    }
}
