//! Shared tray event loop. Platform-specific behavior is injected via the
//! [`PlatformAdapter`] trait.
//!
//! Everything that touches the light runs on this one thread: menu clicks,
//! icon clicks and countdown expiry are handled in turn, so a fired timer can
//! never race a manual command.

use std::sync::atomic::Ordering;
use std::time::Duration;

use busylight_lib::config::Config;

use muda::MenuEvent;
use tray_icon::{MouseButton, MouseButtonState, TrayIconEvent};

use super::state::{self, IconSet, Intent, Outcome, TrayState};
use crate::RUNNING;

/// Longest the loop sleeps while no countdown is pending.
const IDLE_WAIT: Duration = Duration::from_millis(50);

/// Platform-specific hooks that differ between Windows and Linux.
pub trait PlatformAdapter {
    /// One-time platform init (GTK, etc.). Called before anything else.
    fn platform_init() -> busylight_lib::error::Result<()>;

    /// Pump platform-specific events (Win32 messages, GTK iterations).
    fn pump_events();

    /// Block until the next platform event or at most `max`.
    fn wait_for_events(max: Duration);

    /// Label for the autostart menu item, e.g. `"Start with Windows"`.
    fn autostart_label() -> &'static str;
}

fn is_left_click(event: &TrayIconEvent) -> bool {
    matches!(
        event,
        TrayIconEvent::Click {
            button: MouseButton::Left,
            button_state: MouseButtonState::Up,
            ..
        }
    )
}

/// Shared tray event loop.
///
/// Loads config, opens the light, builds menu and icon, then dispatches
/// events until Exit. A lost device ends the loop with an error.
pub fn run_core<P: PlatformAdapter>() -> busylight_lib::error::Result<()> {
    P::platform_init()?;

    let config = Config::load();
    let warnings: Vec<String> = match config.validate() {
        Ok(()) => vec![],
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    };
    for w in &warnings {
        log::warn!("[config] {w}");
    }

    let mut state = TrayState::open(config)?;
    state::show_startup_warnings(&warnings);

    let icons = IconSet::new(state.controller.alert());
    let (menu, tray_menu) = state::build_tray_menu(
        &state.config.preset_durations(),
        P::autostart_label(),
        state.config.autostart,
    );
    let tray = state::build_tray_icon(&icons, state.shown(), &state.tooltip(), menu)?;
    let mut status_text = String::new();
    state::refresh_status(&tray, &tray_menu, &state, &mut status_text);

    let menu_rx = MenuEvent::receiver();
    let tray_rx = TrayIconEvent::receiver();

    loop {
        if !RUNNING.load(Ordering::SeqCst) {
            break;
        }

        // 1. Platform event pump
        P::pump_events();

        // 2. Menu events
        while let Ok(event) = menu_rx.try_recv() {
            match state::handle_menu_event(&event, &tray_menu, &mut state)? {
                Outcome::Visual { state: v, changed } => {
                    state::apply_visual_ui(v, changed, &tray, &icons, &state)
                }
                Outcome::Quit => {
                    RUNNING.store(false, Ordering::SeqCst);
                    break;
                }
                Outcome::Unchanged => {}
            }
        }

        // 3. Icon clicks
        while let Ok(event) = tray_rx.try_recv() {
            if is_left_click(&event)
                && let Outcome::Visual { state: v, changed } = state.apply(Intent::Toggle)?
            {
                state::apply_visual_ui(v, changed, &tray, &icons, &state);
            }
        }

        // 4. Countdown expiry
        if let Outcome::Visual { state: v, changed } = state.poll_timer()? {
            state::apply_visual_ui(v, changed, &tray, &icons, &state);
            if state.config.notifications_enabled {
                state::show_notification("Timer expired, light is off.");
            }
        }

        // 5. Status line / tooltip countdown
        state::refresh_status(&tray, &tray_menu, &state, &mut status_text);

        // 6. Sleep until the next event, or until the countdown is due
        let wait = state
            .controller
            .next_wakeup()
            .map_or(IDLE_WAIT, |d| d.min(IDLE_WAIT));
        P::wait_for_events(wait);
    }

    // Leave the light off on exit.
    if let Outcome::Visual { state: v, changed } = state.shutdown()? {
        state::apply_visual_ui(v, changed, &tray, &icons, &state);
    }
    Ok(())
}
