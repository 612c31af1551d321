//! CLI subcommands — one-shot on/off, timed auto-off, device and config info.

mod config_cmd;
mod devices;
mod on_off;
mod status;
mod timed;

use std::path::Path;

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use busylight_lib::color::format_color;
pub(super) use busylight_lib::config::Config;
pub(super) use busylight_lib::controller::{TimedStateController, VisualState};
pub(super) use busylight_lib::device::{self, DiscoveredDevice, UsbConnector};
pub(super) use busylight_lib::duration::{duration_label, format_remaining, parse_duration};
pub(super) use busylight_lib::error::Result;

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Serialize `value` as pretty JSON on stdout.
pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        busylight_lib::BusylightError::Config(format!("JSON serialization failed: {e}"))
    })?;
    println!("{json}");
    Ok(())
}

/// Load config from `path` if given, else from the default location.
pub(super) fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(p) => {
            let (config, warnings) = Config::load_from(p);
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    }
}

/// Open the configured light. Fails if no blink(1) is reachable.
pub(super) fn open_controller(config: &Config) -> Result<TimedStateController<UsbConnector>> {
    let connector = UsbConnector::from_config(config);
    let controller = TimedStateController::new(connector, config.alert_rgb())?;
    if let Some(info) = controller.device_info() {
        log::info!("using {} at {}", info.product, info.path);
    }
    Ok(controller)
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct StatusOutput {
    pub version: String,
    pub device: Option<DeviceStatusJson>,
    pub device_count: usize,
    pub config: ConfigSummaryJson,
}

#[derive(Serialize)]
pub(super) struct DeviceStatusJson {
    pub path: String,
    pub serial: Option<String>,
}

#[derive(Serialize)]
pub(super) struct ConfigSummaryJson {
    pub alert_color: String,
    pub fade_ms: u32,
    pub presets: Vec<String>,
    pub notifications_enabled: bool,
    pub autostart: bool,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub log_file: Option<String>,
    pub settings: Config,
    pub problems: Vec<String>,
}

#[derive(Serialize)]
pub(super) struct DevicesOutput {
    pub count: usize,
    pub devices: Vec<DiscoveredDevice>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Turn the light on in the alert color
    On,

    /// Turn the light off
    Off,

    /// Turn the light on, then off again after DURATION (e.g. 90, 30m, 2h)
    For {
        /// Seconds, or a number with an `s`, `m` or `h` suffix
        duration: String,
    },

    /// List connected blink(1) devices
    Devices,

    /// Show device presence and a config summary
    Status,

    /// Show current configuration and file paths
    Config,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, json: bool, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        Command::On => {
            if json {
                warn_json_unsupported("on");
            }
            on_off::cmd_set_light(VisualState::Lit, config_path)
        }
        Command::Off => {
            if json {
                warn_json_unsupported("off");
            }
            on_off::cmd_set_light(VisualState::Off, config_path)
        }
        Command::For { duration } => {
            if json {
                warn_json_unsupported("for");
            }
            timed::cmd_for(&duration, config_path)
        }
        Command::Devices => devices::cmd_devices(json),
        Command::Status => status::cmd_status(json, config_path),
        Command::Config => config_cmd::cmd_config(json, config_path),
    }
}
