//! Tray menu construction, notifications, and visual-state UI updates.

use std::time::Duration;

use busylight_lib::controller::VisualState;
use busylight_lib::device::DeviceConnector;
use busylight_lib::duration::duration_label;
use busylight_lib::timer::Clock;

use muda::{CheckMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem};

use super::icon::IconSet;
use super::{Intent, TrayState, get_auto_launch};

// ── Shared menu construction ──

/// All menu items the tray uses, returned from `build_tray_menu`.
pub struct TrayMenu {
    pub status_item: MenuItem,
    pub preset_items: Vec<(MenuItem, Duration)>,
    pub toggle_item: MenuItem,
    pub on_item: MenuItem,
    pub off_item: MenuItem,
    pub cancel_item: MenuItem,
    pub autostart_item: CheckMenuItem,
    pub exit_item: MenuItem,
}

impl TrayMenu {
    /// Map a clicked menu item to what the user asked for.
    pub fn intent_for(&self, id: &MenuId) -> Option<Intent> {
        if id == self.exit_item.id() {
            Some(Intent::Exit)
        } else if id == self.toggle_item.id() {
            Some(Intent::Toggle)
        } else if id == self.on_item.id() {
            Some(Intent::TurnOn)
        } else if id == self.off_item.id() {
            Some(Intent::TurnOff)
        } else if id == self.cancel_item.id() {
            Some(Intent::CancelTimer)
        } else if id == self.autostart_item.id() {
            // muda has already flipped the check mark.
            Some(Intent::SetAutostart(self.autostart_item.is_checked()))
        } else {
            self.preset_items
                .iter()
                .find(|(item, _)| id == item.id())
                .map(|(_, d)| Intent::ArmFor(*d))
        }
    }
}

/// Build the tray context menu with all standard items.
pub fn build_tray_menu(
    presets: &[Duration],
    autostart_label: &str,
    autostart: bool,
) -> (Menu, TrayMenu) {
    let menu = Menu::new();
    let status_item = MenuItem::new("Off", false, None);
    let preset_items: Vec<(MenuItem, Duration)> = presets
        .iter()
        .map(|d| (MenuItem::new(duration_label(*d), true, None), *d))
        .collect();
    let toggle_item = MenuItem::new("Toggle", true, None);
    let on_item = MenuItem::new("On", true, None);
    let off_item = MenuItem::new("Off", true, None);
    let cancel_item = MenuItem::new("Cancel Timer", false, None);
    // The OS registration is the source of truth when it can be queried.
    let autostart_enabled = get_auto_launch()
        .and_then(|al| al.is_enabled().ok())
        .unwrap_or(autostart);
    let autostart_item = CheckMenuItem::new(autostart_label, true, autostart_enabled, None);
    let exit_item = MenuItem::new("Exit", true, None);

    let _ = menu.append(&status_item);
    let _ = menu.append(&PredefinedMenuItem::separator());
    for (item, _) in &preset_items {
        let _ = menu.append(item);
    }
    let _ = menu.append(&PredefinedMenuItem::separator());
    let _ = menu.append(&toggle_item);
    let _ = menu.append(&on_item);
    let _ = menu.append(&off_item);
    let _ = menu.append(&cancel_item);
    let _ = menu.append(&PredefinedMenuItem::separator());
    let _ = menu.append(&autostart_item);
    let _ = menu.append(&PredefinedMenuItem::separator());
    let _ = menu.append(&exit_item);

    (
        menu,
        TrayMenu {
            status_item,
            preset_items,
            toggle_item,
            on_item,
            off_item,
            cancel_item,
            autostart_item,
            exit_item,
        },
    )
}

/// Build the tray icon with the correct initial state.
///
/// Left click toggles the light; the menu opens on right click.
pub fn build_tray_icon(
    icons: &IconSet,
    initial: VisualState,
    tooltip: &str,
    menu: Menu,
) -> busylight_lib::error::Result<tray_icon::TrayIcon> {
    let mut builder = tray_icon::TrayIconBuilder::new()
        .with_tooltip(tooltip)
        .with_menu(Box::new(menu))
        .with_menu_on_left_click(false);
    if let Some(icon) = icons.icon_for(initial) {
        builder = builder.with_icon(icon);
    }
    builder.build().map_err(|e| {
        busylight_lib::BusylightError::Config(format!("Failed to create tray icon: {e}"))
    })
}

/// Show config problems as a desktop notification.
///
/// Always shown regardless of `notifications_enabled` — if the config is broken,
/// that flag itself may be wrong.
pub fn show_startup_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    let body = warnings.join("\n");
    show_notification(&format!("Config warnings:\n{body}"));
}

/// Show a desktop notification with the given body text.
pub fn show_notification(body: &str) {
    let mut n = notify_rust::Notification::new();
    n.summary("Busylight");
    n.body(body);
    if let Err(e) = n.show() {
        log::debug!("notification failed: {e}");
    }
}

/// Reflect a new visual state in the tray icon and run the state hook.
pub fn apply_visual_ui<C: DeviceConnector, K: Clock>(
    visual: VisualState,
    changed: bool,
    tray: &tray_icon::TrayIcon,
    icons: &IconSet,
    state: &TrayState<C, K>,
) {
    if let Some(icon) = icons.icon_for(visual) {
        tray.set_icon(Some(icon)).ok();
    }
    if changed {
        log::info!("light {visual}");
        busylight_lib::hooks::run_visual_hook(visual, &state.config);
    }
}

/// Refresh the status line and tooltip when the text has changed.
///
/// `shown` holds the last text written; the countdown changes it once a second.
pub fn refresh_status<C: DeviceConnector, K: Clock>(
    tray: &tray_icon::TrayIcon,
    menu: &TrayMenu,
    state: &TrayState<C, K>,
    shown: &mut String,
) {
    let text = state.status_text();
    if *shown == text {
        return;
    }
    menu.status_item.set_text(&text);
    menu.cancel_item.set_enabled(state.controller.is_armed());
    tray.set_tooltip(Some(state.tooltip())).ok();
    *shown = text;
}
