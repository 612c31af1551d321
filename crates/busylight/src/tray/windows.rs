//! Windows system tray — Win32 message loop.

use std::sync::atomic::Ordering;
use std::time::Duration;

use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, MSG, MsgWaitForMultipleObjects, PM_REMOVE, PeekMessageW, QS_ALLINPUT,
    TranslateMessage, WM_QUIT,
};

use super::shared::{self, PlatformAdapter};
use crate::RUNNING;

/// Longest a single message wait may block before the loop runs again.
const TICK: Duration = Duration::from_millis(50);

/// Pump all pending Win32 messages. Required for tray-icon to receive its
/// internal window messages on Windows.
fn pump_messages() {
    unsafe {
        let mut msg: MSG = std::mem::zeroed();
        while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
            if msg.message == WM_QUIT {
                RUNNING.store(false, Ordering::SeqCst);
                return;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

pub struct WindowsAdapter;

impl PlatformAdapter for WindowsAdapter {
    fn platform_init() -> busylight_lib::error::Result<()> {
        Ok(())
    }

    fn pump_events() {
        pump_messages();
    }

    fn wait_for_events(max: Duration) {
        let ms = max.min(TICK).as_millis() as u32;
        unsafe {
            MsgWaitForMultipleObjects(None, false, ms, QS_ALLINPUT);
        }
    }

    fn autostart_label() -> &'static str {
        "Start with Windows"
    }
}

pub fn run() -> busylight_lib::error::Result<()> {
    shared::run_core::<WindowsAdapter>()
}
