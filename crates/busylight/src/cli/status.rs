//! `status` subcommand — show device presence and a config summary.
//!
//! Enumerates instead of opening: opening a session would reset the light.

use std::path::Path;

use super::{
    Config, ConfigSummaryJson, DeviceStatusJson, DiscoveredDevice, Result, StatusOutput, device,
    duration_label, format_color, kv, kv_indent, kv_width, load_config, print_json,
};

/// Pick the device the tray would use: the configured serial, else the first.
fn select_device(devices: &[DiscoveredDevice], serial: &str) -> Option<DeviceStatusJson> {
    let serial = serial.trim();
    let found = if serial.is_empty() {
        devices.first()
    } else {
        devices
            .iter()
            .find(|d| d.serial.as_deref() == Some(serial))
    }?;
    Some(DeviceStatusJson {
        path: found.path.clone(),
        serial: found.serial.clone(),
    })
}

fn summarize_config(config: &Config) -> ConfigSummaryJson {
    let alert_color = match busylight_lib::color::parse_color(&config.alert_color) {
        Ok(c) => format_color(c),
        Err(_) => format!("{} (invalid)", config.alert_color),
    };
    ConfigSummaryJson {
        alert_color,
        fade_ms: config.fade_ms,
        presets: config
            .preset_durations()
            .into_iter()
            .map(duration_label)
            .collect(),
        notifications_enabled: config.notifications_enabled,
        autostart: config.autostart,
    }
}

fn print_status(
    device_status: Option<DeviceStatusJson>,
    device_count: usize,
    config: &Config,
    json: bool,
) -> Result<()> {
    let summary = summarize_config(config);

    if json {
        return print_json(&StatusOutput {
            version: env!("CARGO_PKG_VERSION").to_string(),
            device: device_status,
            device_count,
            config: summary,
        });
    }

    let w = kv_width(
        &["Version:", "Device:"],
        &[
            "Path:",
            "Serial:",
            "Others:",
            "Alert color:",
            "Fade:",
            "Presets:",
            "Notifications:",
            "Autostart:",
        ],
    );

    kv("Version:", env!("CARGO_PKG_VERSION"), w);
    println!();

    match &device_status {
        Some(dev) => {
            kv("Device:", "CONNECTED", w);
            kv_indent("Path:", &dev.path, w);
            if let Some(ref serial) = dev.serial {
                kv_indent("Serial:", serial, w);
            }
            if device_count > 1 {
                kv_indent("Others:", device_count - 1, w);
            }
        }
        None if device_count > 0 => {
            kv(
                "Device:",
                format_args!("NOT FOUND (serial {})", config.device_serial.trim()),
                w,
            );
        }
        None => kv("Device:", "NOT CONNECTED", w),
    }
    println!();

    println!("Config:");
    kv_indent("Alert color:", &summary.alert_color, w);
    kv_indent("Fade:", format_args!("{} ms", summary.fade_ms), w);
    kv_indent("Presets:", summary.presets.join(", "), w);
    kv_indent(
        "Notifications:",
        if summary.notifications_enabled { "on" } else { "off" },
        w,
    );
    kv_indent("Autostart:", if summary.autostart { "on" } else { "off" }, w);

    Ok(())
}

pub(super) fn cmd_status(json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let devices = device::enumerate_devices();
    let selected = select_device(&devices, &config.device_serial);
    print_status(selected, devices.len(), &config, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<DiscoveredDevice> {
        vec![
            DiscoveredDevice {
                path: "usb:001/002".into(),
                serial: Some("AAA".into()),
            },
            DiscoveredDevice {
                path: "usb:001/003".into(),
                serial: Some("BBB".into()),
            },
        ]
    }

    #[test]
    fn select_first_without_serial() {
        let dev = select_device(&devices(), "").unwrap();
        assert_eq!(dev.path, "usb:001/002");
    }

    #[test]
    fn select_by_serial() {
        let dev = select_device(&devices(), " BBB ").unwrap();
        assert_eq!(dev.path, "usb:001/003");
        assert!(select_device(&devices(), "CCC").is_none());
        assert!(select_device(&[], "").is_none());
    }

    #[test]
    fn summary_labels_presets() {
        let s = summarize_config(&Config::default());
        assert_eq!(s.alert_color, "#FF0000");
        assert_eq!(
            s.presets,
            vec!["30 Minutes", "1 Hour", "1.5 Hours", "2 Hours"]
        );
    }

    #[test]
    fn summary_marks_invalid_color() {
        let config = Config {
            alert_color: "nope".into(),
            ..Config::default()
        };
        assert_eq!(summarize_config(&config).alert_color, "nope (invalid)");
    }

    #[test]
    fn print_status_variants_succeed() {
        let config = Config::default();
        assert!(print_status(None, 0, &config, false).is_ok());
        assert!(print_status(None, 0, &config, true).is_ok());
        let dev = select_device(&devices(), "");
        assert!(print_status(dev, 2, &config, false).is_ok());
    }
}
