//! `config` subcommand — show current configuration and file paths.

use std::path::Path;

use super::{
    Config, ConfigOutput, Result, duration_label, format_color, kv, kv_indent, kv_width,
    load_config, print_json,
};

pub(super) fn cmd_config(json: bool, custom_path: Option<&Path>) -> Result<()> {
    let config = load_config(custom_path);
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let log_path = Config::log_path();
    let problems: Vec<String> = match config.validate() {
        Ok(()) => vec![],
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };

    if json {
        return print_json(&ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            log_file: log_path.as_ref().map(|p| p.display().to_string()),
            settings: config,
            problems,
        });
    }

    let w = kv_width(
        &["Config file:", "Log file:"],
        &[
            "alert_color:",
            "fade_ms:",
            "device_serial:",
            "presets:",
            "notifications_enabled:",
            "autostart:",
            "on_lit_command:",
            "on_off_command:",
        ],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    match &log_path {
        Some(p) => kv("Log file:", p.display(), w),
        None => kv("Log file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    let color_display = match busylight_lib::color::parse_color(&config.alert_color) {
        Ok(c) => format!("{} -> {}", config.alert_color, format_color(c)),
        Err(_) => format!("{} (invalid)", config.alert_color),
    };
    kv_indent("alert_color:", &color_display, w);
    kv_indent("fade_ms:", config.fade_ms, w);
    let or_none = |s: &str| {
        if s.trim().is_empty() {
            "(none)".to_string()
        } else {
            s.to_string()
        }
    };
    kv_indent("device_serial:", or_none(&config.device_serial), w);
    let presets: Vec<String> = config
        .presets
        .iter()
        .map(|p| match busylight_lib::duration::parse_duration(p) {
            Some(d) => format!("{p} ({})", duration_label(d)),
            None => format!("{p} (invalid)"),
        })
        .collect();
    kv_indent("presets:", presets.join(", "), w);
    kv_indent("notifications_enabled:", config.notifications_enabled, w);
    kv_indent("autostart:", config.autostart, w);
    kv_indent("on_lit_command:", or_none(&config.on_lit_command), w);
    kv_indent("on_off_command:", or_none(&config.on_off_command), w);

    if !problems.is_empty() {
        println!();
        println!("Problems:");
        for p in &problems {
            println!("  {p}");
        }
    }
    Ok(())
}
