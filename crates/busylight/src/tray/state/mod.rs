//! Shared tray state and business logic — used by both Windows and Linux tray apps.
//!
//! Platform-specific event loops live in `windows.rs` / `linux.rs`.
//! This module provides:
//! - Core `TrayState` (config + the timed state controller)
//! - Menu intents and their effect on the light (`Intent`, `Outcome`)
//! - Menu + tray icon construction (`build_tray_menu`, `build_tray_icon`)
//! - Procedural icons, autostart helpers, notifications

mod icon;
mod menu;

pub use icon::IconSet;
pub use menu::{
    TrayMenu, apply_visual_ui, build_tray_icon, build_tray_menu, refresh_status,
    show_notification, show_startup_warnings,
};

use std::time::Duration;

use busylight_lib::config::Config;
use busylight_lib::controller::{TimedStateController, VisualState};
use busylight_lib::device::{DeviceConnector, UsbConnector};
use busylight_lib::duration::format_remaining;
use busylight_lib::error::Result;
use busylight_lib::timer::{Clock, SystemClock};

use auto_launch::AutoLaunchBuilder;
use muda::MenuEvent;

// ── Autostart ──

pub fn get_auto_launch() -> Option<auto_launch::AutoLaunch> {
    let exe = std::env::current_exe().ok()?;
    let path = exe.to_str()?;
    AutoLaunchBuilder::new()
        .set_app_name("Busylight")
        .set_app_path(path)
        .build()
        .ok()
}

pub fn set_autostart(enabled: bool) {
    if let Some(al) = get_auto_launch() {
        let result = if enabled { al.enable() } else { al.disable() };
        if let Err(e) = result {
            log::error!("[autostart] {e}");
        }
    }
}

// ── Intents ──

/// What the user asked for through the menu or the icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Toggle,
    TurnOn,
    TurnOff,
    ArmFor(Duration),
    CancelTimer,
    SetAutostart(bool),
    Exit,
}

/// Result of applying an [`Intent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The light was commanded; `changed` is false when it already showed `state`.
    Visual { state: VisualState, changed: bool },
    /// Nothing visible happened.
    Unchanged,
    Quit,
}

// ── Shared tray state ──

/// Platform-independent tray application state.
pub struct TrayState<C: DeviceConnector = UsbConnector, K: Clock = SystemClock> {
    pub config: Config,
    pub controller: TimedStateController<C, K>,
    /// Visual state last reported to the UI.
    shown: VisualState,
}

impl TrayState {
    /// Open the configured light. Fails if no blink(1) is reachable.
    pub fn open(config: Config) -> Result<Self> {
        let connector = UsbConnector::from_config(&config);
        let controller = TimedStateController::new(connector, config.alert_rgb())?;
        Ok(Self::with_controller(config, controller))
    }
}

impl<C: DeviceConnector, K: Clock> TrayState<C, K> {
    pub fn with_controller(config: Config, controller: TimedStateController<C, K>) -> Self {
        let shown = controller.visual_state();
        Self {
            config,
            controller,
            shown,
        }
    }

    /// Apply a user intent. Device errors here mean the light is gone.
    pub fn apply(&mut self, intent: Intent) -> Result<Outcome> {
        let visual = match intent {
            Intent::Toggle => self.controller.toggle()?,
            Intent::TurnOn => self.controller.turn_on()?,
            Intent::TurnOff => self.controller.turn_off()?,
            Intent::ArmFor(d) => match self.controller.arm_for(d)? {
                Some(v) => v,
                None => return Ok(Outcome::Unchanged),
            },
            Intent::CancelTimer => {
                self.controller.disarm();
                return Ok(Outcome::Unchanged);
            }
            Intent::SetAutostart(enabled) => {
                self.config.autostart = enabled;
                return Ok(Outcome::Unchanged);
            }
            Intent::Exit => return Ok(Outcome::Quit),
        };
        Ok(self.record(visual))
    }

    /// Deliver a due countdown expiry.
    pub fn poll_timer(&mut self) -> Result<Outcome> {
        Ok(match self.controller.poll_timer()? {
            Some(v) => self.record(v),
            None => Outcome::Unchanged,
        })
    }

    /// Cancel any countdown and leave the light off.
    pub fn shutdown(&mut self) -> Result<Outcome> {
        let v = self.controller.shutdown()?;
        Ok(self.record(v))
    }

    pub fn shown(&self) -> VisualState {
        self.shown
    }

    /// Status line text, e.g. "On (auto-off in 29:59)".
    pub fn status_text(&self) -> String {
        match (self.shown, self.controller.remaining()) {
            (VisualState::Lit, Some(left)) => {
                format!("On (auto-off in {})", format_remaining(left))
            }
            (state, _) => state.to_string(),
        }
    }

    pub fn tooltip(&self) -> String {
        format!("Busylight — {}", self.status_text())
    }

    fn record(&mut self, state: VisualState) -> Outcome {
        let changed = state != self.shown;
        self.shown = state;
        Outcome::Visual { state, changed }
    }
}

/// Handle a menu event from the tray context menu.
///
/// Returns the outcome for the caller to reflect in the UI.
pub fn handle_menu_event<C: DeviceConnector, K: Clock>(
    event: &MenuEvent,
    menu: &TrayMenu,
    state: &mut TrayState<C, K>,
) -> Result<Outcome> {
    let Some(intent) = menu.intent_for(event.id()) else {
        return Ok(Outcome::Unchanged);
    };
    let outcome = state.apply(intent)?;
    if let Intent::SetAutostart(enabled) = intent {
        set_autostart(enabled);
        if let Err(e) = state.config.save() {
            log::warn!("could not save config: {e}");
        }
    }
    Ok(outcome)
}
