//! Linux system tray — GTK event loop.

use std::time::Duration;

use super::shared::{self, PlatformAdapter};

/// Longest a single GTK wait may block before the loop runs again.
const TICK: Duration = Duration::from_millis(50);

pub struct LinuxAdapter;

impl PlatformAdapter for LinuxAdapter {
    fn platform_init() -> busylight_lib::error::Result<()> {
        gtk::init().map_err(|e| {
            busylight_lib::BusylightError::Config(format!("Failed to initialize GTK: {e}"))
        })?;
        // Periodic wakeup so `main_iteration_do(true)` returns at least every
        // tick, keeping countdowns and menu events responsive.
        gtk::glib::timeout_add_local(TICK, || gtk::glib::ControlFlow::Continue);
        Ok(())
    }

    fn pump_events() {
        while gtk::events_pending() {
            gtk::main_iteration_do(false);
        }
    }

    fn wait_for_events(max: Duration) {
        if max.is_zero() {
            return;
        }
        // Blocks until the next GTK event; the tick timer bounds the wait.
        gtk::main_iteration_do(true);
    }

    fn autostart_label() -> &'static str {
        "Start on login"
    }
}

pub fn run() -> busylight_lib::error::Result<()> {
    shared::run_core::<LinuxAdapter>()
}
