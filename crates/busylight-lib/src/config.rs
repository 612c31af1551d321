//! Application configuration — TOML-based, platform-aware paths.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::{Rgb, parse_color};
use crate::duration::parse_duration;

/// Longest fade accepted from the config file.
pub const MAX_FADE_MS: u32 = 10_000;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# Busylight configuration — changes made outside the app may be overwritten.\n\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Color shown while lit (name or "#RRGGBB"). Default: "red".
    #[serde(default = "default_alert_color")]
    pub alert_color: String,

    /// Fade time for color changes in milliseconds. 0 = instant.
    #[serde(default)]
    pub fade_ms: u32,

    /// Preferred device serial number. Empty = first device found.
    #[serde(default)]
    pub device_serial: String,

    /// Auto-off presets offered in the tray menu ("30m", "1h", "5400", ...).
    #[serde(default = "default_presets")]
    pub presets: Vec<String>,

    /// Show a desktop notification when an auto-off timer expires.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Start application on login.
    #[serde(default)]
    pub autostart: bool,

    /// Command to run when the light turns on. Empty = disabled.
    #[serde(default)]
    pub on_lit_command: String,

    /// Command to run when the light turns off. Empty = disabled.
    #[serde(default)]
    pub on_off_command: String,
}

fn default_alert_color() -> String {
    "red".into()
}

fn default_presets() -> Vec<String> {
    ["30m", "1h", "90m", "2h"].map(String::from).to_vec()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            alert_color: default_alert_color(),
            fade_ms: 0,
            device_serial: String::new(),
            presets: default_presets(),
            notifications_enabled: true,
            autostart: false,
            on_lit_command: String::new(),
            on_off_command: String::new(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The `alert_color` field could not be parsed as a usable color.
    InvalidColor(String),
    /// `fade_ms` is above [`MAX_FADE_MS`].
    FadeTooLong(u32),
    /// A `presets` entry is not a positive duration of at most one week.
    InvalidPreset(String),
    /// `presets` is empty.
    NoPresets,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidColor(e) => write!(f, "Invalid alert color: {e}"),
            ValidationError::FadeTooLong(ms) => {
                write!(f, "fade_ms {ms} is too long (max {MAX_FADE_MS})")
            }
            ValidationError::InvalidPreset(p) => {
                write!(f, "Invalid preset \"{p}\" (expected e.g. 30m, 1h, 90; at most 168h)")
            }
            ValidationError::NoPresets => write!(f, "At least one preset is required"),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            dirs::config_dir().map(|p| p.join("Busylight"))
        }
        #[cfg(not(windows))]
        {
            dirs::config_dir().map(|p| p.join("busylight"))
        }
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Full path to the log file (tray app).
    pub fn log_path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("busylight.log"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Save config to an arbitrary path atomically (write to temp file, then rename).
    ///
    /// A header comment is prepended to warn that manual edits may be overwritten.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Save config to the default platform path.
    pub fn save(&self) -> std::io::Result<()> {
        let Some(path) = Self::path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config directory",
            ));
        };
        self.save_to(&path)
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// The alert color, falling back to red if the configured one is unusable.
    pub fn alert_rgb(&self) -> Rgb {
        parse_color(&self.alert_color).unwrap_or_else(|e| {
            log::warn!("{e}, using red");
            Rgb::RED
        })
    }

    /// Parsed presets in configured order, duplicates and invalid entries dropped.
    pub fn preset_durations(&self) -> Vec<Duration> {
        let mut out: Vec<Duration> = Vec::with_capacity(self.presets.len());
        for d in self.presets.iter().filter_map(|p| parse_duration(p)) {
            if !out.contains(&d) {
                out.push(d);
            }
        }
        out
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = parse_color(&self.alert_color) {
            errors.push(ValidationError::InvalidColor(e.to_string()));
        }

        if self.fade_ms > MAX_FADE_MS {
            errors.push(ValidationError::FadeTooLong(self.fade_ms));
        }

        if self.presets.is_empty() {
            errors.push(ValidationError::NoPresets);
        }
        for p in &self.presets {
            if parse_duration(p).is_none() {
                errors.push(ValidationError::InvalidPreset(p.clone()));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mins(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.alert_color, "red");
        assert_eq!(c.fade_ms, 0);
        assert!(c.device_serial.is_empty());
        assert_eq!(c.presets, vec!["30m", "1h", "90m", "2h"]);
        assert!(c.notifications_enabled);
        assert!(!c.autostart);
        assert!(c.on_lit_command.is_empty());
        assert!(c.on_off_command.is_empty());
    }

    #[test]
    fn default_presets_are_exact() {
        assert_eq!(
            Config::default().preset_durations(),
            vec![mins(30), mins(60), mins(90), mins(120)]
        );
    }

    #[test]
    fn preset_durations_dedup_and_skip_invalid() {
        let c = Config {
            presets: vec!["30m".into(), "1800".into(), "bogus".into(), "1h".into()],
            ..Config::default()
        };
        assert_eq!(c.preset_durations(), vec![mins(30), mins(60)]);
    }

    #[test]
    fn padded_presets_can_be_configured() {
        let c = Config {
            presets: vec!["32m".into(), "62m".into(), "92m".into(), "122m".into()],
            ..Config::default()
        };
        assert_eq!(
            c.preset_durations(),
            vec![mins(32), mins(62), mins(92), mins(122)]
        );
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: Config = toml::from_str("alert_color = \"blue\"\n").unwrap();
        assert_eq!(c.alert_color, "blue");
        assert_eq!(c.presets.len(), 4);
        assert!(c.notifications_enabled);
    }

    #[test]
    fn empty_toml_is_default() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c.alert_color, "red");
        assert_eq!(c.fade_ms, 0);
    }

    #[test]
    fn alert_rgb_parses_or_falls_back() {
        let c = Config {
            alert_color: "#00FF00".into(),
            ..Config::default()
        };
        assert_eq!(c.alert_rgb(), Rgb::new(0, 0xFF, 0));

        let c = Config {
            alert_color: "chartreuse-ish".into(),
            ..Config::default()
        };
        assert_eq!(c.alert_rgb(), Rgb::RED);
    }

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_invalid_color() {
        let c = Config {
            alert_color: "nope".into(),
            ..Config::default()
        };
        let errs = c.validate().unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], ValidationError::InvalidColor(_)));
    }

    #[test]
    fn validate_black_is_rejected() {
        let c = Config {
            alert_color: "#000000".into(),
            ..Config::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_fade_too_long() {
        let c = Config {
            fade_ms: MAX_FADE_MS + 1,
            ..Config::default()
        };
        assert_eq!(
            c.validate().unwrap_err(),
            vec![ValidationError::FadeTooLong(MAX_FADE_MS + 1)]
        );
    }

    #[test]
    fn validate_presets() {
        let c = Config {
            presets: vec![],
            ..Config::default()
        };
        assert_eq!(c.validate().unwrap_err(), vec![ValidationError::NoPresets]);

        let c = Config {
            presets: vec!["30m".into(), "0".into()],
            ..Config::default()
        };
        assert_eq!(
            c.validate().unwrap_err(),
            vec![ValidationError::InvalidPreset("0".into())]
        );
    }

    #[test]
    fn validate_rejects_preset_beyond_a_week() {
        let c = Config {
            presets: vec!["30m".into(), "5000000000000000h".into()],
            ..Config::default()
        };
        assert_eq!(
            c.validate().unwrap_err(),
            vec![ValidationError::InvalidPreset("5000000000000000h".into())]
        );
        assert_eq!(c.preset_durations(), vec![mins(30)]);
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let c = Config {
            alert_color: "nope".into(),
            fade_ms: 20_000,
            presets: vec!["x".into()],
            ..Config::default()
        };
        assert_eq!(c.validate().unwrap_err().len(), 3);
    }

    #[test]
    fn validation_error_display() {
        assert_eq!(
            ValidationError::NoPresets.to_string(),
            "At least one preset is required"
        );
        assert_eq!(
            ValidationError::FadeTooLong(20_000).to_string(),
            format!("fade_ms 20000 is too long (max {MAX_FADE_MS})")
        );
        assert!(
            ValidationError::InvalidPreset("5d".into())
                .to_string()
                .contains("\"5d\"")
        );
    }

    #[test]
    fn load_ignores_header_comment() {
        let toml_str = r##"# Busylight configuration — changes made outside the app may be overwritten.

alert_color = "#00FF00"
fade_ms = 300
device_serial = ""
presets = ["15m", "45m"]
notifications_enabled = false
autostart = true
on_lit_command = ""
on_off_command = ""
"##;
        let c: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(c.alert_color, "#00FF00");
        assert_eq!(c.fade_ms, 300);
        assert_eq!(c.preset_durations(), vec![mins(15), mins(45)]);
        assert!(!c.notifications_enabled);
        assert!(c.autostart);
    }

    // ── save_to / load_from ──

    #[test]
    fn save_to_load_from_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            alert_color: "orange".into(),
            fade_ms: 500,
            device_serial: "2000ABCD".into(),
            presets: vec!["10m".into(), "1h".into()],
            notifications_enabled: false,
            autostart: true,
            on_lit_command: "echo lit".into(),
            on_off_command: "echo off".into(),
        };
        config.save_to(&path).unwrap();

        let (loaded, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(loaded.alert_color, config.alert_color);
        assert_eq!(loaded.fade_ms, config.fade_ms);
        assert_eq!(loaded.device_serial, config.device_serial);
        assert_eq!(loaded.presets, config.presets);
        assert_eq!(loaded.notifications_enabled, config.notifications_enabled);
        assert_eq!(loaded.autostart, config.autostart);
        assert_eq!(loaded.on_lit_command, config.on_lit_command);
        assert_eq!(loaded.on_off_command, config.on_off_command);
    }

    #[test]
    fn save_to_includes_header_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        Config::default().save_to(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# Busylight configuration"));
    }

    #[test]
    fn save_to_creates_parent_dirs_and_cleans_up_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::default().save_to(&path).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("nested").join("config.toml.tmp").exists());
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = Config::load_from(&dir.path().join("nonexistent.toml"));
        assert!(warnings.is_empty());
        assert_eq!(config.alert_color, "red");
    }

    #[test]
    fn load_from_invalid_toml_returns_defaults_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is { not valid toml").unwrap();

        let (config, warnings) = Config::load_from(&path);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("config parse error"));
        assert_eq!(config.alert_color, "red");
    }

    #[test]
    fn paths_share_config_dir() {
        if let (Some(dir), Some(cfg), Some(log)) =
            (Config::dir(), Config::path(), Config::log_path())
        {
            assert_eq!(cfg.parent(), Some(dir.as_path()));
            assert_eq!(log.parent(), Some(dir.as_path()));
            assert!(log.ends_with("busylight.log"));
        }
    }
}
